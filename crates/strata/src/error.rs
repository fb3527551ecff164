//! Error types for Strata operations.
//!
//! Every failure in the engine is recoverable at the session level; the
//! [`StrataError`] umbrella exists for callers (the CLI, a shell) that load
//! input and drive the engine end to end.

use std::io;

use thiserror::Error;

use crate::{
    assign::AssignmentError,
    hierarchy::{LevelsFetchError, ProviderError},
    layout::LayoutFailure,
};

/// The main error type for Strata operations.
#[derive(Debug, Error)]
pub enum StrataError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid input: {0}")]
    Input(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] ProviderError),

    #[error("Levels error: {0}")]
    Levels(#[from] LevelsFetchError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutFailure),

    #[error("Assignment error: {0}")]
    Assignment(#[from] AssignmentError),
}

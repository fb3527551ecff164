//! Strata Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Strata engine
//! and its command-line front-end. It includes:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Geometry**: Positions and bounding boxes ([`geometry`] module)
//! - **Domain**: The authoritative node/edge model being edited ([`domain`] module)
//! - **Hierarchy**: Classification hierarchies and their typed levels ([`hierarchy`] module)
//! - **Element**: The validated element set handed to a rendering engine ([`element`] module)

pub mod domain;
pub mod element;
pub mod geometry;
pub mod hierarchy;
pub mod identifier;

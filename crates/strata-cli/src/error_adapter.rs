//! Error adapter for converting StrataError to miette diagnostics.
//!
//! This module provides the bridge between the library's error types and
//! miette's report formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use strata::{StrataError, assign::AssignmentError, hierarchy::LevelsFetchError};

/// Adapter that renders a [`StrataError`] through miette.
pub struct ErrorAdapter<'a>(pub &'a StrataError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            StrataError::Io(_) => "strata::io",
            StrataError::Input(_) => "strata::input",
            StrataError::Config(_) => "strata::config",
            StrataError::Hierarchy(_) => "strata::hierarchy",
            StrataError::Levels(_) => "strata::levels",
            StrataError::Layout(_) => "strata::layout",
            StrataError::Assignment(_) => "strata::assignment",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            StrataError::Input(_) => {
                "graph files are JSON objects with `nodes` and `edges` arrays; \
                 hierarchy files are JSON arrays of `{id, name, levels}`"
            }
            StrataError::Levels(LevelsFetchError::Invalid { .. }) => {
                "level ids and level numbers must be unique within a hierarchy"
            }
            StrataError::Layout(_) => "run without --strict to fall back to the previous positions",
            StrataError::Assignment(err) if err.is_retryable() => "the operation may succeed if retried",
            StrataError::Assignment(AssignmentError::Rejected(_)) => {
                "check the level's allowed types"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Wrap a [`StrataError`] for rendering.
pub fn to_reportable(err: &StrataError) -> ErrorAdapter<'_> {
    ErrorAdapter(err)
}

#[cfg(test)]
mod tests {
    use strata::{hierarchy::ProviderError, identifier::Id};

    use super::*;

    #[test]
    fn test_codes_follow_variant() {
        let err = StrataError::Hierarchy(ProviderError::UnknownHierarchy(Id::new("h9")));
        let adapter = to_reportable(&err);

        assert_eq!(adapter.code().unwrap().to_string(), "strata::hierarchy");
        assert!(adapter.help().is_none());
        assert_eq!(adapter.to_string(), err.to_string());
    }

    #[test]
    fn test_input_errors_carry_help() {
        let err = StrataError::from(serde_json::from_str::<u32>("nope").unwrap_err());
        let adapter = to_reportable(&err);

        assert_eq!(adapter.code().unwrap().to_string(), "strata::input");
        assert!(adapter.help().unwrap().to_string().contains("`nodes`"));
    }
}

//! Error Types
//!
//! Failures a caller may want to tell apart. Everything else (plain I/O,
//! malformed CSV) travels as `anyhow::Error` with file context attached.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading inputs or evaluating rules.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// A mutation rule could not be parsed.
    #[error("invalid mutation rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    /// An asserted position lies past the end of a sequence (strict mode only).
    #[error(
        "mutation {rule} asserts position {position} but sequence '{sequence}' has only {length} residues"
    )]
    PositionOutOfRange {
        sequence: String,
        rule: String,
        position: usize,
        length: usize,
    },

    /// An input file does not exist.
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The catalog has no column with the requested name.
    #[error("column '{column}' not found in {}", .path.display())]
    MissingColumn { column: String, path: PathBuf },

    /// The catalog yielded no rules at all.
    #[error("no mutation rules found in {}", .0.display())]
    EmptyCatalog(PathBuf),
}

impl ScreenError {
    pub(crate) fn invalid_rule(rule: &str, reason: impl Into<String>) -> Self {
        ScreenError::InvalidRule {
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ScreenError::invalid_rule("F2x4L", "position 'x' is not a number");
        assert_eq!(
            err.to_string(),
            "invalid mutation rule 'F2x4L': position 'x' is not a number"
        );

        let err = ScreenError::PositionOutOfRange {
            sequence: "seqA".to_string(),
            rule: "M500K".to_string(),
            position: 500,
            length: 10,
        };
        assert_eq!(
            err.to_string(),
            "mutation M500K asserts position 500 but sequence 'seqA' has only 10 residues"
        );

        let err = ScreenError::InputNotFound(PathBuf::from("missing.fasta"));
        assert_eq!(err.to_string(), "input file not found: missing.fasta");
    }
}

//! Errors
//!
//! Custom error types used throughout the `lgbm_text` crate.
use thiserror::Error;

fn tree_context(tree: &Option<usize>) -> String {
    match tree {
        Some(t) => format!(" (tree {})", t),
        None => String::new(),
    }
}

/// Errors that can occur while reading a model text.
///
/// Tree numbers are the 0-based position of the `Tree=` block in the text,
/// line numbers are 1-based.
#[derive(Debug, Error)]
pub enum ModelTextError {
    /// A required marker line is absent, or its section is malformed.
    #[error("Malformed header at marker `{marker}`: {reason}.")]
    MalformedHeader { marker: String, reason: String },
    /// A required field is missing, or a tree field is structurally invalid.
    #[error("Tree {tree} (line {line}) is malformed at field `{field}`: {reason}.")]
    MalformedTreeBlock {
        tree: usize,
        line: usize,
        field: String,
        reason: String,
    },
    /// A token is neither a float sentinel nor a valid number.
    #[error("Invalid numeric token `{token}` in field `{field}` at line {line}{}.", tree_context(.tree))]
    MalformedNumericToken {
        tree: Option<usize>,
        line: usize,
        field: String,
        token: String,
    },
    /// A field's length disagrees with the counts implied by `num_leaves`.
    #[error("Tree {tree}: field `{field}` at line {line} has {actual} values, expected {expected}.")]
    InconsistentArrayLengths {
        tree: usize,
        line: usize,
        field: String,
        expected: usize,
        actual: usize,
    },
    /// Unable to read a model or ensemble.
    #[error("Unable to read model: {0}")]
    UnableToRead(String),
    /// Unable to write an ensemble.
    #[error("Unable to write ensemble: {0}")]
    UnableToWrite(String),
}

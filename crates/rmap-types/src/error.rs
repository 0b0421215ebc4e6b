use thiserror::Error;

use crate::scalar::ScalarKind;

/// Errors produced while turning stored text back into a scalar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("invalid {kind} text: {text:?}")]
    InvalidNumber { kind: ScalarKind, text: String },

    #[error("invalid boolean text: {0:?}")]
    InvalidBoolean(String),

    #[error("invalid date text {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("expected a {expected} value, got {actual}")]
    KindMismatch {
        expected: ScalarKind,
        actual: ScalarKind,
    },
}

//! Error types for pattern construction and capture lookup.
//!
//! A pattern that does not match is *not* an error: it produces an empty
//! [`Match`](crate::Match). The variants here are programmer errors that
//! surface immediately to the caller and are never recovered internally.

/// Errors raised by capture lookup and pattern construction.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// The capture was never bound in the consulted binding set.
    #[error("unknown capture {capture}: it was never bound by this match")]
    UnknownCapture { capture: String },

    /// A capture was requested from a match that did not succeed.
    #[error("empty match contains no value for capture {capture}")]
    EmptyMatchCapture { capture: String },

    /// A pattern was rejected at construction time.
    #[error("invalid pattern: {reason}")]
    InvalidPattern { reason: &'static str },

    /// The bound value does not narrow to the capture's declared type.
    ///
    /// Only reachable through `Pattern::upcast` or hand-built `Captures`.
    #[error("capture {capture} is bound to a `{found}`, not a `{expected}`")]
    CaptureTypeMismatch {
        capture: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Result alias for fallible engine operations.
pub type MatchResult<T> = Result<T, MatchError>;

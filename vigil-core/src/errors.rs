//! Structured Errors
//!
//! Every fallible operation in the service contract returns an [`Error`]
//! carrying a taxonomy [`ErrorCode`], the name of the operation that failed,
//! a human-readable message and an optional underlying cause. The HTTP layer
//! performs a single code-to-status translation and never re-derives a code
//! from the message text.

use std::fmt;

/// Operation names attached to check service errors.
pub const OP_FIND_CHECK_BY_ID: &str = "FindCheckByID";
pub const OP_FIND_CHECK: &str = "FindCheck";
pub const OP_FIND_CHECKS: &str = "FindChecks";
pub const OP_CREATE_CHECK: &str = "CreateCheck";
pub const OP_UPDATE_CHECK: &str = "UpdateCheck";
pub const OP_DELETE_CHECK: &str = "DeleteCheck";

/// Error taxonomy shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed input: bad id, bad tag, bad filter value, bad JSON.
    Invalid,
    /// Missing organization, check or id.
    NotFound,
    /// Name uniqueness violation.
    Conflict,
    /// Out-of-range pagination parameters.
    UnprocessableEntity,
    /// Anything the backend could not express in the taxonomy above.
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Invalid => "invalid",
            ErrorCode::NotFound => "not found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::UnprocessableEntity => "unprocessable entity",
            ErrorCode::Internal => "internal error",
        };
        f.write_str(s)
    }
}

/// Structured error value.
#[derive(Debug, thiserror::Error)]
#[error("{msg}")]
pub struct Error {
    code: ErrorCode,
    op: Option<&'static str>,
    msg: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            op: None,
            msg: msg.into(),
            source: None,
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Invalid, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, msg)
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnprocessableEntity, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// Attach the name of the failing operation. An error that already
    /// names one is left untouched, so a wrapped error keeps the operation
    /// closest to where it happened.
    pub fn with_op(mut self, op: &'static str) -> Self {
        self.op.get_or_insert(op);
        self
    }

    /// Attach the underlying cause.
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn op(&self) -> Option<&'static str> {
        self.op
    }

    pub fn message(&self) -> &str {
        &self.msg
    }
}

// The wrapped cause is intentionally ignored: the conformance harness
// compares errors by taxonomy code, operation and message.
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.op == other.op && self.msg == other.msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_op_keeps_the_first_operation() {
        let err = Error::not_found("check not found")
            .with_op(OP_FIND_CHECKS)
            .with_op(OP_FIND_CHECK);
        assert_eq!(err.op(), Some(OP_FIND_CHECKS));
    }

    #[test]
    fn equality_ignores_the_source() {
        let a = Error::invalid("bad id").with_source("json: unexpected token");
        let b = Error::invalid("bad id");
        assert_eq!(a, b);
    }
}

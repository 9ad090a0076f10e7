use std::fmt;

/// Error kind, for callers that branch on the category without matching the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Overflow,
}

/// Conversion error, returned by every serialize/deserialize entry point.
///
/// Failures are raised synchronously by the call that hit them. The caller's
/// input is never touched, so nothing needs to be rolled back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No conversion rule applies, or a rule-specific validation failed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An integer does not fit the target representation.
    #[error("overflow: {0}")]
    Overflow(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn overflow(msg: impl Into<String>) -> Self {
        Error::Overflow(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::Overflow(_) => ErrorKind::Overflow,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::InvalidArgument(msg) | Error::Overflow(msg) => msg,
        }
    }

    /// Add context to the error, preserving the kind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        match self {
            Error::InvalidArgument(msg) => Error::InvalidArgument(format!("{ctx}: {msg}")),
            Error::Overflow(msg) => Error::Overflow(format!("{ctx}: {msg}")),
        }
    }
}

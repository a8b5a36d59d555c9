//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Absent data during policy resolution is not an
/// error; only configuration gaps and confirmation-time return checks surface
/// here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. stale version / optimistic concurrency).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Required configuration is not set (e.g. the default return policy).
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// The origin of a return line is already claimed by another active sale.
    #[error(
        "The line set as origin on Sale Line {line} has already been returned on Sale #{sale_reference}."
    )]
    DuplicateReturnOrigin { line: String, sale_reference: String },

    /// An origin reference does not resolve to an existing record.
    #[error("dangling origin: {0}")]
    DanglingOrigin(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn configuration_missing(msg: impl Into<String>) -> Self {
        Self::ConfigurationMissing(msg.into())
    }

    pub fn duplicate_return_origin(
        line: impl core::fmt::Display,
        sale_reference: impl Into<String>,
    ) -> Self {
        Self::DuplicateReturnOrigin {
            line: line.to_string(),
            sale_reference: sale_reference.into(),
        }
    }

    pub fn dangling_origin(msg: impl Into<String>) -> Self {
        Self::DanglingOrigin(msg.into())
    }
}

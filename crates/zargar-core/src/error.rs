//! # Error Types
//!
//! Domain-specific error types for zargar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  zargar-core errors (this file)                                        │
//! │  └── CoreError        - Business rule violations                       │
//! │                                                                         │
//! │  zargar-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures (wraps CoreError)  │
//! │                                                                         │
//! │  API errors (in app)                                                   │
//! │  └── ApiError         - What clients see (HTTP status + JSON body)     │
//! │                                                                         │
//! │  Flow: CoreError → DbError → ApiError → Client                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity name, ID, status)
//! 3. Every business rule violation is raised BEFORE any mutation is
//!    applied; the enclosing database transaction rolls back completely
//!    on any of these

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations and domain logic failures.
///
/// Each variant corresponds to one abstract error kind of the domain,
/// independent of how the API layer maps it to a status code.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist (transaction, payment, item,
    /// ledger, contact, ...).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Operation attempted against the aggregate's current status.
    ///
    /// ## When This Occurs
    /// - Editing items on a non-draft transaction
    /// - Approving past the terminal tier
    /// - Rejecting a draft payment
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Caller lacks ownership or the role/permission for the target
    /// resource.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A structural rule was violated.
    ///
    /// ## When This Occurs
    /// - Zero or multiple settlement targets on a payment
    /// - INTERNAL_TRANSFER without a ledger link
    /// - Payment amount exceeding the outstanding ledger debt
    #[error("validation conflict: {0}")]
    ValidationConflict(String),

    /// Uniqueness violation on a dependent create.
    #[error("duplicate {field}: '{value}' already exists")]
    Conflict { field: String, value: String },
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidState error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        CoreError::InvalidState(msg.into())
    }

    /// Creates a PermissionDenied error.
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        CoreError::PermissionDenied(msg.into())
    }

    /// Creates a ValidationConflict error.
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::ValidationConflict(msg.into())
    }

    /// Creates a Conflict (duplicate) error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        CoreError::Conflict {
            field: field.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::not_found("Transaction", "abc-123");
        assert_eq!(err.to_string(), "Transaction not found: abc-123");

        let err = CoreError::invalid_state("only draft transactions can be updated");
        assert_eq!(
            err.to_string(),
            "invalid state: only draft transactions can be updated"
        );

        let err = CoreError::duplicate("name", "new_gold");
        assert_eq!(err.to_string(), "duplicate name: 'new_gold' already exists");
    }
}

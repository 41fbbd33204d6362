//! # Error Types
//!
//! Domain-specific error types for invoicer-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  invoicer-core errors (this file)                                      │
//! │  ├── CoreError        - Contract and invariant violations              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  invoicer-db errors (separate crate)                                   │
//! │  ├── DbError          - Database operation failures                    │
//! │  ├── AllocationError  - Sequence allocation failures                   │
//! │  └── ServiceError     - What callers of invoice creation see           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing in this crate logs. Errors are returned and the caller decides
//! how to surface them.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// `InvalidLineItem` and `LayoutInvariantViolation` are defects, not
/// runtime conditions: inputs are range-checked upstream and the planner is
/// covered by property tests.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A line item broke the calculator's preconditions.
    ///
    /// ## When This Occurs
    /// - Negative quantity or rate slipped past the form layer
    /// - Discount or tax percent outside 0-100
    #[error("Invalid line item at position {index}: {reason}")]
    InvalidLineItem { index: usize, reason: String },

    /// Page slices do not cover the item sequence exactly once.
    #[error("Layout invariant violated: {0}")]
    LayoutInvariantViolation(String),

    /// Page capacity constants are unusable (rows per page must exceed the
    /// rows reserved on the first page).
    #[error("Invalid page capacity: {rows_per_page} rows per page, {reserved} reserved on first page")]
    InvalidCapacity { rows_per_page: usize, reserved: usize },

    /// A numbering scope key or year/month pair could not be parsed.
    #[error("Invalid sequence scope: {0}")]
    InvalidScope(String),

    /// A string is not an invoice number produced by the formatter.
    #[error("Invalid invoice number: {0}")]
    InvalidInvoiceNumber(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These mirror the checks the entry form performs before an invoice is
/// submitted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: String, max: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g. mobile number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A collection that must have entries is empty.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },
}

impl ValidationError {
    /// Prefixes the field name, e.g. `receiver.` or `items[3].`.
    pub fn within(self, prefix: &str) -> Self {
        let scoped = |field: String| format!("{prefix}{field}");
        match self {
            ValidationError::Required { field } => ValidationError::Required {
                field: scoped(field),
            },
            ValidationError::TooShort { field, min } => ValidationError::TooShort {
                field: scoped(field),
                min,
            },
            ValidationError::OutOfRange { field, min, max } => ValidationError::OutOfRange {
                field: scoped(field),
                min,
                max,
            },
            ValidationError::Negative { field } => ValidationError::Negative {
                field: scoped(field),
            },
            ValidationError::InvalidFormat { field, reason } => ValidationError::InvalidFormat {
                field: scoped(field),
                reason,
            },
            ValidationError::Empty { field } => ValidationError::Empty {
                field: scoped(field),
            },
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
        let err = CoreError::InvalidLineItem {
            index: 2,
            reason: "discount must be between 0 and 100".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid line item at position 2: discount must be between 0 and 100"
        );

        let err = CoreError::InvalidCapacity {
            rows_per_page: 2,
            reserved: 2,
        };
        assert!(err.to_string().contains("2 rows per page"));
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "description".to_string(),
        };
        assert_eq!(err.to_string(), "description is required");

        let err = ValidationError::TooShort {
            field: "address".to_string(),
            min: 10,
        };
        assert_eq!(err.to_string(), "address must be at least 10 characters");
    }

    #[test]
    fn test_within_prefixes_field() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        }
        .within("receiver.");
        assert_eq!(err.to_string(), "receiver.name is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Empty {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

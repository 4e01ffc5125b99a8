//! # Validation Errors
//!
//! Input validation failures for atlas-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  atlas-core (this file)                                                 │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  atlas-store (separate crate)                                           │
//! │  └── StoreError       - Persistence failures                            │
//! │                                                                         │
//! │  atlas-engine (separate crate)                                          │
//! │  └── EngineError      - The full operation contract                     │
//! │      (Validation | NotFound | InsufficientStock | PermissionDenied      │
//! │       | RateLimited | Store)                                            │
//! │                                                                         │
//! │  Flow: ValidationError → EngineError → boundary layer → caller          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field names, limits)
//! 3. Errors are enum variants, never String
//! 4. Validation failures are always recoverable by correcting input

use thiserror::Error;

/// Input validation errors.
///
/// These occur when caller input does not meet requirements, before any
/// business logic runs or any state is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A collection that must have members is empty (e.g. line items).
    #[error("{field} must not be empty")]
    Empty { field: String },

    /// Value must be strictly positive (quantities).
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative (prices, discounts).
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g. malformed id, malformed date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Mutating operations require a resolved actor for audit attribution.
    #[error("operation requires an authenticated actor")]
    AnonymousActor,
}

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");

        let err = ValidationError::Empty {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items must not be empty");
    }
}

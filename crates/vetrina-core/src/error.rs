//! # Error Types
//!
//! Domain-specific error types for vetrina-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vetrina-core errors (this file)                                        │
//! │  ├── CoreError        - Page consistency failures                       │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  vetrina-client errors (separate crate)                                 │
//! │  └── ClientError      - Transport, HTTP status, decode, config          │
//! │                                                                         │
//! │  Flow: ValidationError → ClientError → last_error (String) → screen    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Streams only ever store the rendered message, so the `Display` text of
//! each variant is what a user eventually reads.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A fetched page is inconsistent with the request that produced it.
    ///
    /// ## When This Occurs
    /// - The backend answered a different offset than the one requested
    /// - The page carries more items than its own `limit`
    ///
    /// Streams log this and still apply the page; the backend is trusted
    /// for content, only flagged for shape.
    #[error("Inconsistent page: {reason}")]
    InvalidPage { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before a request is issued, so a bad scope never reaches the
/// network.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. whitespace inside an item code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
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
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "collection_name".to_string(),
        };
        assert_eq!(err.to_string(), "collection_name is required");

        let err = ValidationError::OutOfRange {
            field: "page_size".to_string(),
            min: 1,
            max: 100,
        };
        assert_eq!(err.to_string(), "page_size must be between 1 and 100");
    }

    #[test]
    fn test_invalid_page_message() {
        let err = CoreError::InvalidPage {
            reason: "requested offset 20, received 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Inconsistent page: requested offset 20, received 0"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "category".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

//! # Validation Module
//!
//! Input validation for scope keys and pages.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (CLI arguments, screen inputs)                         │
//! │  ├── Scope keys checked here before begin_initial                      │
//! │  └── Bad input never produces a request                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Wire decoding (vetrina-client)                                │
//! │  └── Typed deserialization of envelopes                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Page consistency (validate_page)                              │
//! │  └── Offset / limit mismatches logged, page still applied              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vetrina_core::validation::{validate_collection_name, validate_page_size};
//!
//! assert!(validate_collection_name("gas-fryers").is_ok());
//! assert!(validate_page_size(0).is_err());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::language::Language;
use crate::types::Page;
use crate::MAX_PAGE_LIMIT;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest category or collection name accepted.
const MAX_KEY_LENGTH: usize = 200;
const MAX_ITEM_CODE_LENGTH: usize = 64;
const MAX_EMAIL_LENGTH: usize = 254;
const MAX_NAME_LENGTH: usize = 100;

/// Shortest password the backend accepts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Digits in a password reset code.
pub const OTP_LENGTH: usize = 6;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested page size.
///
/// ## Rules
/// - Between 1 and [`MAX_PAGE_LIMIT`]
pub fn validate_page_size(size: u32) -> ValidationResult<u32> {
    if size == 0 || size > MAX_PAGE_LIMIT {
        return Err(ValidationError::OutOfRange {
            field: "page_size".to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_LIMIT),
        });
    }

    Ok(size)
}

// =============================================================================
// Scope Validators
// =============================================================================

fn validate_key(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_KEY_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_KEY_LENGTH,
        });
    }

    Ok(value.to_string())
}

/// Validates a category name used to request subcategories.
///
/// ## Returns
/// The trimmed name.
pub fn validate_category(name: &str) -> ValidationResult<String> {
    validate_key("category", name)
}

/// Validates a collection name used to request products.
///
/// ## Returns
/// The trimmed collection name.
pub fn validate_collection_name(name: &str) -> ValidationResult<String> {
    validate_key("collection_name", name)
}

/// Validates an item code used to request a product detail.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - No whitespace inside the code
///
/// ## Example
/// ```rust
/// use vetrina_core::validation::validate_item_code;
///
/// assert_eq!(validate_item_code(" 7178.0010 ").unwrap(), "7178.0010");
/// assert!(validate_item_code("7178 0010").is_err());
/// ```
pub fn validate_item_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "item_code".to_string(),
        });
    }

    if code.len() > MAX_ITEM_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "item_code".to_string(),
            max: MAX_ITEM_CODE_LENGTH,
        });
    }

    if code.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "item_code".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(code.to_string())
}

/// Validates a language code against the supported languages.
pub fn validate_language_code(code: &str) -> ValidationResult<Language> {
    Language::from_code(code)
}

// =============================================================================
// Account Validators
// =============================================================================

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty, at most 254 characters
/// - No whitespace
/// - Exactly one `@` with a non-empty local part
/// - Domain has a dot with text on both sides
///
/// ## Returns
/// The trimmed address.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("missing @"))?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid("expected name@domain"));
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(email.to_string()),
        _ => Err(invalid("domain must contain a dot")),
    }
}

/// Validates a password for registration or reset.
///
/// Passwords are never trimmed.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: format!("must be at least {} characters long", MIN_PASSWORD_LENGTH),
        });
    }

    Ok(())
}

/// Validates a password reset code: exactly six digits.
pub fn validate_otp(otp: &str) -> ValidationResult<String> {
    let otp = otp.trim();

    if otp.is_empty() {
        return Err(ValidationError::Required {
            field: "otp".to_string(),
        });
    }

    if otp.len() != OTP_LENGTH || !otp.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "otp".to_string(),
            reason: format!("must be exactly {} digits", OTP_LENGTH),
        });
    }

    Ok(otp.to_string())
}

/// Validates a person name field (`first_name`, `last_name`).
pub fn validate_person_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(name.to_string())
}

// =============================================================================
// Page Consistency
// =============================================================================

/// Checks that a page matches the request that produced it.
///
/// The backend is trusted for content; this only flags shape problems so
/// the coordinator can log them.
pub fn validate_page<T>(page: &Page<T>, requested_offset: u32) -> CoreResult<()> {
    if page.offset != requested_offset {
        return Err(CoreError::InvalidPage {
            reason: format!(
                "requested offset {}, received {}",
                requested_offset, page.offset
            ),
        });
    }

    if page.limit > 0 && page.len() > page.limit as usize {
        return Err(CoreError::InvalidPage {
            reason: format!("{} items exceed limit {}", page.len(), page.limit),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_page_size() {
        assert_eq!(validate_page_size(20).unwrap(), 20);
        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(100).is_ok());
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(101).is_err());
    }

    #[test]
    fn test_validate_scope_keys() {
        assert_eq!(validate_category("  Ovens ").unwrap(), "Ovens");
        assert!(validate_category("   ").is_err());
        assert_eq!(validate_collection_name("gas-fryers").unwrap(), "gas-fryers");
        assert!(validate_collection_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_item_code() {
        assert!(validate_item_code("7178.0010").is_ok());
        assert!(matches!(
            validate_item_code(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_item_code(&"9".repeat(65)),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(matches!(
            validate_item_code("71 78"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_language_code() {
        assert_eq!(validate_language_code("fr").unwrap().name, "Français");
        assert!(validate_language_code("nl").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" chef@example.com ").unwrap(), "chef@example.com");
        assert!(matches!(
            validate_email(""),
            Err(ValidationError::Required { .. })
        ));
        for bad in ["chef", "@example.com", "chef@example", "chef@.com", "a@b@c.com", "chef @x.it"] {
            assert!(
                matches!(validate_email(bad), Err(ValidationError::InvalidFormat { .. })),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("  pass  ").is_ok());
        assert!(matches!(
            validate_password(""),
            Err(ValidationError::Required { .. })
        ));
        let err = validate_password("12345").unwrap_err();
        assert_eq!(
            err.to_string(),
            "password has invalid format: must be at least 6 characters long"
        );
    }

    #[test]
    fn test_validate_otp() {
        assert_eq!(validate_otp(" 042917 ").unwrap(), "042917");
        assert!(validate_otp("04291").is_err());
        assert!(validate_otp("04291a").is_err());
        assert!(validate_otp("").is_err());
    }

    #[test]
    fn test_validate_person_name() {
        assert_eq!(validate_person_name("first_name", " Ada ").unwrap(), "Ada");
        assert!(validate_person_name("last_name", " ").is_err());
        assert!(validate_person_name("last_name", &"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_page() {
        let page = Page::new(vec![1, 2, 3], 20, 20, 45);
        assert!(validate_page(&page, 20).is_ok());
        assert!(validate_page(&page, 0).is_err());

        let oversized = Page::new(vec![0; 25], 0, 20, 45);
        assert!(validate_page(&oversized, 0).is_err());

        let empty: Page<u8> = Page::empty(0, 20, 0);
        assert!(validate_page(&empty, 0).is_ok());
    }
}

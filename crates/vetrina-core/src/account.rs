//! # Account Types
//!
//! Users, sign-in requests and profile changes.
//!
//! ## Account Flows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Account Flows                                  │
//! │                                                                         │
//! │  Registration ──► register ──┐                                          │
//! │                              ├──► User (held by the session)            │
//! │  Credentials ───► login ─────┘         │                                │
//! │                                        │ ProfileChanges (+ ProfileImage)│
//! │                                        ▼                                │
//! │                                  update_profile ──► ProfileUpdated      │
//! │                                                                         │
//! │  forgot_password(email) ──► OTP by mail ──► PasswordReset{otp, new}     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests carrying a secret implement `Debug` by hand so the secret never
//! reaches a log line. Every request has a `validated()` step that trims
//! and checks its fields before anything is sent.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::validation::{
    validate_email, validate_otp, validate_password, validate_person_name, ValidationResult,
};

const REDACTED: &str = "***";

// =============================================================================
// User
// =============================================================================

/// A storefront customer as returned by the account endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend identifier. Some endpoints send it as a number, others as a
    /// string; it is always held as text.
    #[serde(deserialize_with = "id_as_text")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    /// "First Last", skipping whichever part is blank.
    pub fn full_name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The identifier as the number the profile endpoint expects.
    pub fn numeric_id(&self) -> ValidationResult<u64> {
        self.id
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidFormat {
                field: "user_id".to_string(),
                reason: format!("expected a number, got {:?}", self.id),
            })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(u64),
    Text(String),
}

fn id_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Number(n) => n.to_string(),
        IdRepr::Text(s) => s,
    })
}

/// Result of a profile update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdated {
    pub user: User,
    /// Names of the fields the backend changed.
    #[serde(default)]
    pub updated_fields: Vec<String>,
}

// =============================================================================
// Sign-in Requests
// =============================================================================

/// Sign-up form.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Registration {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Registration {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password: password.into(),
            phone: None,
            address: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Trims and checks every field.
    pub fn validated(self) -> ValidationResult<Self> {
        validate_password(&self.password)?;
        Ok(Registration {
            first_name: validate_person_name("first_name", &self.first_name)?,
            last_name: validate_person_name("last_name", &self.last_name)?,
            email: validate_email(&self.email)?,
            password: self.password,
            phone: optional_text(self.phone),
            address: optional_text(self.address),
        })
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &REDACTED)
            .field("phone", &self.phone)
            .field("address", &self.address)
            .finish()
    }
}

/// Email and password sign-in.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Checks the email format and that a password was given. The
    /// password length rule only applies to new passwords.
    pub fn validated(self) -> ValidationResult<Self> {
        if self.password.is_empty() {
            return Err(ValidationError::Required {
                field: "password".to_string(),
            });
        }
        Ok(Credentials {
            email: validate_email(&self.email)?,
            password: self.password,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Second step of the password reset flow.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct PasswordReset {
    pub otp: String,
    pub new_password: String,
}

impl PasswordReset {
    pub fn new(otp: impl Into<String>, new_password: impl Into<String>) -> Self {
        PasswordReset {
            otp: otp.into(),
            new_password: new_password.into(),
        }
    }

    pub fn validated(self) -> ValidationResult<Self> {
        validate_password(&self.new_password)?;
        Ok(PasswordReset {
            otp: validate_otp(&self.otp)?,
            new_password: self.new_password,
        })
    }
}

impl fmt::Debug for PasswordReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordReset")
            .field("otp", &REDACTED)
            .field("new_password", &REDACTED)
            .finish()
    }
}

// =============================================================================
// Profile Changes
// =============================================================================

/// Fields to change on the signed-in user's profile. `None` leaves a field
/// as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ProfileChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    pub fn phone(mut self, value: impl Into<String>) -> Self {
        self.phone = Some(value.into());
        self
    }

    pub fn address(mut self, value: impl Into<String>) -> Self {
        self.address = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.address.is_none()
    }

    /// Trims every given field. Names must stay non-empty; a blank phone or
    /// address is dropped from the change set.
    pub fn validated(self) -> ValidationResult<Self> {
        Ok(ProfileChanges {
            first_name: self
                .first_name
                .map(|v| validate_person_name("first_name", &v))
                .transpose()?,
            last_name: self
                .last_name
                .map(|v| validate_person_name("last_name", &v))
                .transpose()?,
            phone: optional_text(self.phone),
            address: optional_text(self.address),
        })
    }

    /// Set fields as `(name, value)` pairs, in wire order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("phone", &self.phone),
            ("address", &self.address),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.clone().map(|v| (name, v)))
        .collect()
    }
}

/// A profile picture to upload alongside [`ProfileChanges`].
#[derive(Clone, PartialEq, Eq)]
pub struct ProfileImage {
    file_name: String,
    content_type: &'static str,
    bytes: Vec<u8>,
}

impl ProfileImage {
    /// Wraps image bytes; the content type follows the file extension.
    ///
    /// ## Rules
    /// - `bytes` must not be empty
    /// - Extension is one of jpg, jpeg, png, webp
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> ValidationResult<Self> {
        let file_name = file_name.into();

        if bytes.is_empty() {
            return Err(ValidationError::Required {
                field: "profile_image".to_string(),
            });
        }

        let extension = Path::new(&file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let content_type = match extension.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            _ => {
                return Err(ValidationError::NotAllowed {
                    field: "profile_image".to_string(),
                    allowed: vec!["jpg".into(), "jpeg".into(), "png".into(), "webp".into()],
                })
            }
        };

        Ok(ProfileImage {
            file_name,
            content_type,
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for ProfileImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileImage")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

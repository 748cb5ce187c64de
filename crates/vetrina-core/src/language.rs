//! # Storefront Languages
//!
//! The fixed set of languages the catalogue backend can translate into.
//! Product listings and descriptions take the language code as a request
//! parameter; everything else is language-neutral.

use serde::Serialize;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// One supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Language {
    /// ISO 639-1 code sent to the backend (`lang` field).
    pub code: &'static str,
    /// Name of the language in the language itself.
    pub name: &'static str,
}

/// Languages offered by the language picker, in display order.
pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language { code: "en", name: "English" },
    Language { code: "it", name: "Italiano" },
    Language { code: "de", name: "Deutsch" },
    Language { code: "fr", name: "Français" },
    Language { code: "pt", name: "Português" },
    Language { code: "es", name: "Español" },
];

impl Language {
    /// English, the backend fallback.
    pub const fn english() -> Language {
        Language { code: "en", name: "English" }
    }

    /// Looks up a language by code (case-insensitive, surrounding whitespace ignored).
    pub fn find(code: &str) -> Option<Language> {
        let code = code.trim();
        SUPPORTED_LANGUAGES
            .iter()
            .copied()
            .find(|lang| lang.code.eq_ignore_ascii_case(code))
    }

    /// Like [`Language::find`], but reports an unsupported code as a validation error.
    pub fn from_code(code: &str) -> ValidationResult<Language> {
        if code.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "language".to_string(),
            });
        }

        Language::find(code).ok_or_else(|| ValidationError::NotAllowed {
            field: "language".to_string(),
            allowed: SUPPORTED_LANGUAGES.iter().map(|l| l.code.to_string()).collect(),
        })
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::english()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(Language::find("IT").map(|l| l.name), Some("Italiano"));
        assert_eq!(Language::find(" de ").map(|l| l.code), Some("de"));
        assert!(Language::find("jp").is_none());
    }

    #[test]
    fn test_from_code_errors() {
        assert!(matches!(
            Language::from_code(""),
            Err(ValidationError::Required { .. })
        ));
        match Language::from_code("xx") {
            Err(ValidationError::NotAllowed { allowed, .. }) => {
                assert_eq!(allowed.len(), SUPPORTED_LANGUAGES.len());
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_default_is_english() {
        assert_eq!(Language::default().code, crate::DEFAULT_LANGUAGE_CODE);
        assert_eq!(SUPPORTED_LANGUAGES[0], Language::english());
    }
}

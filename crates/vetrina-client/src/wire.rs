//! # Wire Format
//!
//! Request bodies and response envelopes of the catalogue backend.
//!
//! ## Message Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Wire Format                                     │
//! │                                                                         │
//! │  Client                                        Backend                  │
//! │    │                                               │                    │
//! │    │  POST categories.php                          │                    │
//! │    │  token=...&offset=20&limit=20                 │                    │
//! │    │──────────────────────────────────────────────►│                    │
//! │    │                                               │                    │
//! │    │  {"categories":[...],"offset":20,             │                    │
//! │    │   "limit":20,"total":45}                      │                    │
//! │    │◄──────────────────────────────────────────────│                    │
//! │    │                                               │                    │
//! │  Envelope::into_page(requested offset, limit) ──► Page<T>              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Leniency
//! - A missing item array decodes as an empty page.
//! - Missing `offset` / `limit` fall back to the values that were requested.
//! - Numbers may arrive as JSON numbers or numeric strings.
//! - `total` is required: without it pagination cannot continue.

use serde::{Deserialize, Deserializer, Serialize};

use vetrina_core::{Category, Page, Product, ProfileChanges, SortOrder, SubCategory, User};

// =============================================================================
// Request Bodies
// =============================================================================

/// Form body of `categories.php`.
#[derive(Debug, Clone, Serialize)]
pub struct CategoriesForm<'a> {
    pub token: &'a str,
    pub offset: u32,
    pub limit: u32,
}

/// Form body of `subcategories.php`.
#[derive(Debug, Clone, Serialize)]
pub struct SubCategoriesForm<'a> {
    pub token: &'a str,
    pub category: &'a str,
    pub offset: u32,
    pub limit: u32,
}

/// Form body of `products.php`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductsForm<'a> {
    pub token: &'a str,
    pub collection_name: &'a str,
    pub offset: u32,
    pub limit: u32,
    pub sort: SortOrder,
    pub lang: &'a str,
}

/// Form body of `product_detail.php`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetailForm<'a> {
    pub token: &'a str,
    pub item_code: &'a str,
}

// =============================================================================
// Response Envelopes
// =============================================================================

/// Response of `categories.php`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesEnvelope {
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

/// Response of `subcategories.php`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubCategoriesEnvelope {
    /// Category the listing belongs to, echoed by the backend.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategories: Option<Vec<SubCategory>>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

/// Response of `products.php`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductsEnvelope {
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub products: Option<Vec<Product>>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

/// Pagination fields shared by every list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    #[serde(default, deserialize_with = "lenient_u32_opt")]
    pub offset: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32_opt")]
    pub limit: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub total: u32,
}

impl PageMeta {
    fn into_page<T>(self, items: Option<Vec<T>>, offset: u32, limit: u32) -> Page<T> {
        Page::new(
            items.unwrap_or_default(),
            self.offset.unwrap_or(offset),
            self.limit.unwrap_or(limit),
            self.total,
        )
    }
}

impl CategoriesEnvelope {
    pub fn into_page(self, offset: u32, limit: u32) -> Page<Category> {
        self.meta.into_page(self.categories, offset, limit)
    }
}

impl SubCategoriesEnvelope {
    pub fn into_page(self, offset: u32, limit: u32) -> Page<SubCategory> {
        self.meta.into_page(self.subcategories, offset, limit)
    }
}

impl ProductsEnvelope {
    pub fn into_page(self, offset: u32, limit: u32) -> Page<Product> {
        self.meta.into_page(self.products, offset, limit)
    }
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// The server-provided message, if any.
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }
}

// =============================================================================
// Account Bodies & Envelopes
// =============================================================================

/// JSON body of `forgot-password.php`.
#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordBody<'a> {
    pub email: &'a str,
}

/// JSON body of `update-profile.php`.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdateBody<'a> {
    pub user_id: u64,
    #[serde(flatten)]
    pub changes: &'a ProfileChanges,
}

/// Envelope of every account endpoint.
///
/// ```text
/// {"status":200,"message":"Login successful","timestamp":"...","data":{...}}
/// ```
///
/// The backend may answer HTTP 200 with a failing `status` in the body,
/// so the embedded status is checked as well.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct AccountEnvelope<T> {
    #[serde(default, deserialize_with = "lenient_u32_opt")]
    pub status: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> AccountEnvelope<T> {
    /// The embedded status, when it reports a failure.
    pub fn failure_status(&self) -> Option<u16> {
        self.status
            .filter(|status| *status >= 400)
            .map(|status| u16::try_from(status).unwrap_or(u16::MAX))
    }

    /// The server message, if it carries one.
    pub fn message(&self) -> Option<String> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }
}

/// `data` of the register and login responses.
#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub user: User,
}

// =============================================================================
// Lenient Numbers
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Float(f64),
    Text(String),
}

impl NumberOrString {
    fn to_u32<E: serde::de::Error>(&self) -> Result<u32, E> {
        let value = match self {
            NumberOrString::Number(n) => *n,
            NumberOrString::Float(f) if *f >= 0.0 && f.fract() == 0.0 => *f as u64,
            NumberOrString::Float(f) => {
                return Err(E::custom(format!("expected a whole number, got {}", f)))
            }
            NumberOrString::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| E::custom(format!("expected a number, got {:?}", s)))?,
        };
        u32::try_from(value).map_err(|_| E::custom(format!("{} is out of range", value)))
    }
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?.to_u32()
}

fn lenient_u32_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(value) => value.to_u32().map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_envelope() {
        let envelope: CategoriesEnvelope = serde_json::from_str(
            r#"{"categories":[{"name":"Ovens","image":"ovens.png"}],"offset":0,"limit":20,"total":45}"#,
        )
        .unwrap();

        let page = envelope.into_page(0, 20);
        assert_eq!(page.len(), 1);
        assert_eq!(page.items[0].name, "Ovens");
        assert_eq!(page.total, 45);
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let envelope: ProductsEnvelope = serde_json::from_str(
            r#"{"collection_name":"fryers","language":"it","products":[],"offset":"40","limit":"20","total":"45"}"#,
        )
        .unwrap();

        let page = envelope.into_page(40, 20);
        assert_eq!(page.offset, 40);
        assert_eq!(page.total, 45);
        assert!(page.is_empty());
    }

    #[test]
    fn test_missing_items_and_offset_fall_back() {
        let envelope: SubCategoriesEnvelope =
            serde_json::from_str(r#"{"category":"Ovens","total":0}"#).unwrap();

        let page = envelope.into_page(20, 20);
        assert!(page.is_empty());
        assert_eq!(page.offset, 20);
        assert_eq!(page.limit, 20);
    }

    #[test]
    fn test_missing_total_is_an_error() {
        let result: Result<CategoriesEnvelope, _> =
            serde_json::from_str(r#"{"categories":[],"offset":0,"limit":20}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_total_is_an_error() {
        let result: Result<CategoriesEnvelope, _> =
            serde_json::from_str(r#"{"categories":[],"total":-1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_body_message() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"Invalid token"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid token"));

        let body: ErrorBody = serde_json::from_str(r#"{"message":"  "}"#).unwrap();
        assert_eq!(body.into_message(), None);
    }

    #[test]
    fn test_account_envelope() {
        let envelope: AccountEnvelope<UserData> = serde_json::from_str(
            r#"{"status":200,"message":"Login successful","timestamp":"2025-01-01 10:00:00",
                "data":{"user":{"id":7,"first_name":"Ada","last_name":"Rossi","email":"ada@example.com"}}}"#,
        )
        .unwrap();
        assert_eq!(envelope.failure_status(), None);
        assert_eq!(envelope.message().as_deref(), Some("Login successful"));
        assert_eq!(envelope.data.unwrap().user.id, "7");

        let envelope: AccountEnvelope<UserData> =
            serde_json::from_str(r#"{"status":"401","message":"Invalid email or password"}"#)
                .unwrap();
        assert_eq!(envelope.failure_status(), Some(401));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_profile_update_body_flattens_changes() {
        let changes = ProfileChanges::new().first_name("Ada");
        let body = ProfileUpdateBody {
            user_id: 7,
            changes: &changes,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "user_id": 7, "first_name": "Ada" }));
    }

    #[test]
    fn test_products_form_encoding() {
        let form = ProductsForm {
            token: "t",
            collection_name: "gas fryers",
            offset: 20,
            limit: 20,
            sort: SortOrder::Desc,
            lang: "it",
        };
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["sort"], "desc");
        assert_eq!(json["lang"], "it");
    }
}

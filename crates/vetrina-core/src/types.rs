//! # Domain Types
//!
//! Catalogue types used throughout Vetrina.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │──►│  SubCategory    │──►│    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name (key)     │   │  name           │   │  product_id(key)│       │
//! │  │  image          │   │  collection_name│   │  gtin, price    │       │
//! │  └─────────────────┘   │  (key)          │   │  images         │       │
//! │                        └─────────────────┘   └────────┬────────┘       │
//! │                                                       │ item_code      │
//! │  ┌─────────────────┐                         ┌────────▼────────┐       │
//! │  │    Page<T>      │                         │ ProductDetail   │       │
//! │  │  items, offset  │                         │ descriptions    │       │
//! │  │  limit, total   │                         │ data (attrs)    │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Keys
//! Items are opaque to the pagination machinery. The [`Keyed`] trait exposes
//! the resource-specific identifier, which is only consulted by the
//! dedupe merge policy. Uniqueness is never assumed.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::DEFAULT_LANGUAGE_CODE;

// =============================================================================
// Keyed
// =============================================================================

/// An item with a resource-specific identifier.
pub trait Keyed {
    /// Returns the identifier of this item within its collection.
    fn key(&self) -> &str;
}

// =============================================================================
// Resource
// =============================================================================

/// The remote collections served by the catalogue backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Categories,
    SubCategories,
    Products,
    ProductDetail,
    Featured,
    Account,
}

impl Resource {
    /// Returns the stable name used in logs and error messages.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Resource::Categories => "categories",
            Resource::SubCategories => "subcategories",
            Resource::Products => "products",
            Resource::ProductDetail => "product_detail",
            Resource::Featured => "featured",
            Resource::Account => "account",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sort Order
// =============================================================================

/// Sort direction for product listings.
///
/// Sent on the wire as `asc` / `desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending (backend default).
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Returns the wire value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(ValidationError::NotAllowed {
                field: "sort".to_string(),
                allowed: vec!["asc".to_string(), "desc".to_string()],
            }),
        }
    }
}

// =============================================================================
// Page
// =============================================================================

/// One fetched batch of items plus its pagination metadata.
///
/// ## Fields
/// - `offset`: start position of this page in the logical collection
/// - `limit`: page size that was requested
/// - `total`: size of the logical collection at fetch time. It may change
///   between calls and is not monotonic across refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub offset: u32,
    pub limit: u32,
    pub total: u32,
}

impl<T> Page<T> {
    /// Creates a page.
    pub fn new(items: Vec<T>, offset: u32, limit: u32, total: u32) -> Self {
        Page {
            items,
            offset,
            limit,
            total,
        }
    }

    /// Creates a page with no items.
    pub fn empty(offset: u32, limit: u32, total: u32) -> Self {
        Page::new(Vec::new(), offset, limit, total)
    }

    /// Number of items carried by this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks if the page carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item count as a collection position.
    pub fn received(&self) -> u32 {
        u32::try_from(self.items.len()).unwrap_or(u32::MAX)
    }

    /// Position just past the last item of this page.
    pub fn end(&self) -> u32 {
        self.offset.saturating_add(self.received())
    }

    /// Maps the items, keeping the pagination metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            offset: self.offset,
            limit: self.limit,
            total: self.total,
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// A top-level catalogue category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Display name, also the key used to request subcategories.
    pub name: String,

    /// Image file name or URL.
    #[serde(default)]
    pub image: String,
}

impl Category {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Category {
            name: name.into(),
            image: image.into(),
        }
    }
}

impl Keyed for Category {
    fn key(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// SubCategory
// =============================================================================

/// A subcategory inside a category. Its `collection_name` selects products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub name: String,
    pub collection_name: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl Keyed for SubCategory {
    fn key(&self) -> &str {
        &self.collection_name
    }
}

// =============================================================================
// Product
// =============================================================================

/// Images attached to a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImages {
    #[serde(default)]
    pub featured: String,
    #[serde(default)]
    pub gallery: Vec<String>,
}

/// A product as listed inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Item code, used to request the product detail.
    pub product_id: String,

    /// Global Trade Item Number.
    #[serde(default)]
    pub gtin: String,

    #[serde(default)]
    pub collection_name: String,

    /// Price exactly as the backend formats it.
    #[serde(default)]
    pub price: String,

    pub name: String,

    #[serde(default)]
    pub images: ProductImages,
}

impl Keyed for Product {
    fn key(&self) -> &str {
        &self.product_id
    }
}

// =============================================================================
// Product Detail
// =============================================================================

/// Per-language description texts, keyed by language code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescriptions {
    #[serde(default)]
    pub short: BTreeMap<String, String>,
    #[serde(default)]
    pub long: BTreeMap<String, String>,
}

/// Full product sheet for one item code.
///
/// `data` carries the technical attributes ("Voltage (V)", "Capacity",
/// ...). The key set differs per product, so it is kept as a free-form map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub product_id: String,
    #[serde(default)]
    pub gtin: String,
    #[serde(default)]
    pub catalogue: String,
    #[serde(default)]
    pub list_price: f64,
    #[serde(default)]
    pub images: ProductImages,
    #[serde(default)]
    pub descriptions: ProductDescriptions,
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,
}

impl ProductDetail {
    /// Short description in `language`, falling back to English.
    pub fn short_description(&self, language: &str) -> Option<&str> {
        localized(&self.descriptions.short, language)
    }

    /// Long description in `language`, falling back to English.
    pub fn long_description(&self, language: &str) -> Option<&str> {
        localized(&self.descriptions.long, language)
    }

    /// Returns one attribute rendered as text.
    ///
    /// Numbers are rendered without a trailing `.0`; empty strings and
    /// nulls count as absent.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.data.get(name).and_then(render_attribute)
    }

    /// Iterates the attributes that carry a value, in key order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.data
            .iter()
            .filter_map(|(key, value)| render_attribute(value).map(|v| (key.as_str(), v)))
    }
}

fn localized<'a>(texts: &'a BTreeMap<String, String>, language: &str) -> Option<&'a str> {
    let pick = |code: &str| {
        texts
            .get(code)
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
    };
    pick(language).or_else(|| pick(DEFAULT_LANGUAGE_CODE))
}

fn render_attribute(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        serde_json::Value::Number(n) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        other => Some(other.to_string()),
    }
}

// =============================================================================
// Featured Products
// =============================================================================

/// Result of the featured chain: the first products page of the first
/// subcategory of the first category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedProducts {
    pub category: String,
    pub subcategory: String,
    pub collection_name: String,
    pub language: String,
    pub products: Vec<Product>,
    /// Total of the products collection (before any local limit).
    pub total: u32,
}

// =============================================================================
// Scope Keys
// =============================================================================

/// Scope of the categories stream. The endpoint takes no parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryScope;

/// Scope of the subcategories stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubCategoryScope {
    pub category: String,
}

impl SubCategoryScope {
    pub fn new(category: impl Into<String>) -> Self {
        SubCategoryScope {
            category: category.into(),
        }
    }
}

/// Scope of the products stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductScope {
    pub collection_name: String,
    pub language: String,
    pub sort: SortOrder,
}

impl ProductScope {
    /// Ascending listing of `collection_name` in `language`.
    pub fn new(collection_name: impl Into<String>, language: impl Into<String>) -> Self {
        ProductScope {
            collection_name: collection_name.into(),
            language: language.into(),
            sort: SortOrder::default(),
        }
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

/// Scope of the featured slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeaturedScope {
    pub language: String,
    /// Keep at most this many products from the first page.
    pub limit: Option<usize>,
}

impl FeaturedScope {
    pub fn new(language: impl Into<String>) -> Self {
        FeaturedScope {
            language: language.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

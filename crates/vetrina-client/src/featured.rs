//! # Featured Products
//!
//! The home screen shows a strip of "featured" products. They are not a
//! backend resource of their own but the result of a sequential chain:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Featured Chain                                  │
//! │                                                                         │
//! │  categories(0, page)        ── empty ──► "No categories found"          │
//! │        │ first                                                          │
//! │        ▼                                                                │
//! │  subcategories(first, 0)    ── empty ──► "No subcategories found for    │
//! │        │ first                             the first category"          │
//! │        ▼                                                                │
//! │  products(collection, lang, asc, 0)                                     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  truncate to limit (if set) ──► FeaturedProducts                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first failing step aborts the chain and its error is surfaced as is.

use tracing::{debug, info};

use vetrina_core::{FeaturedProducts, FeaturedScope, Product, ProductScope, SortOrder};

use crate::error::{ClientError, ClientResult};
use crate::http::CatalogApi;

/// Runs the featured chain against `api`.
pub async fn fetch_featured(
    api: &CatalogApi,
    scope: &FeaturedScope,
) -> ClientResult<FeaturedProducts> {
    let limit = api.page_size();

    let categories = api.fetch_categories(0, limit).await?;
    let category = categories
        .items
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::EmptyCollection("No categories found".to_string()))?;
    debug!(category = %category.name, "Featured: first category");

    let subcategories = api.fetch_subcategories(&category.name, 0, limit).await?;
    let subcategory = subcategories.items.into_iter().next().ok_or_else(|| {
        ClientError::EmptyCollection("No subcategories found for the first category".to_string())
    })?;
    debug!(
        subcategory = %subcategory.name,
        collection = %subcategory.collection_name,
        "Featured: first subcategory"
    );

    let product_scope =
        ProductScope::new(subcategory.collection_name.clone(), scope.language.clone())
            .with_sort(SortOrder::Asc);
    let page = api.fetch_products(&product_scope, 0, limit).await?;

    let products = truncate(page.items, scope.limit);
    info!(
        category = %category.name,
        collection = %subcategory.collection_name,
        lang = %scope.language,
        products = products.len(),
        total = page.total,
        "Featured products loaded"
    );

    Ok(FeaturedProducts {
        category: category.name,
        subcategory: subcategory.name,
        collection_name: subcategory.collection_name,
        language: scope.language.clone(),
        products,
        total: page.total,
    })
}

fn truncate(mut products: Vec<Product>, limit: Option<usize>) -> Vec<Product> {
    if let Some(limit) = limit {
        products.truncate(limit);
    }
    products
}

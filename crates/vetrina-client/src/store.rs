//! # Storefront Store
//!
//! The single owner of every stream and slot of the storefront.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StorefrontStore                                  │
//! │                                                                         │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────┐        │
//! │  │ categories       │ │ subcategories    │ │ products         │        │
//! │  │ ResourceStream   │ │ ResourceStream   │ │ ResourceStream   │        │
//! │  │ <CategoryFetcher>│ │ <SubCategory..>  │ │ <ProductFetcher> │        │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────┘        │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────┐        │
//! │  │ product_detail   │ │ featured         │ │ language         │        │
//! │  │ ResourceSlot     │ │ ResourceSlot     │ │ watch<Language>  │        │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────┘        │
//! │  ┌──────────────────┐                                                  │
//! │  │ account          │  sign_out() clears it together with the rest     │
//! │  │ AccountSession   │                                                  │
//! │  └──────────────────┘                                                  │
//! │                                                                         │
//! │  All share one CatalogApi (one connection pool).                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Screens get the store by reference (or behind an `Arc`) instead of
//! reaching for a global. Changing the language does not reload anything:
//! screens observe the language channel and issue `load_initial` with a
//! scope built from the new language.

use tokio::sync::watch;
use tracing::info;

use vetrina_core::validation::{validate_category, validate_collection_name};
use vetrina_core::{FeaturedScope, Language, ProductScope, SortOrder, SubCategoryScope};

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::fetcher::{
    CategoryFetcher, FeaturedFetcher, ProductDetailFetcher, ProductFetcher, SubCategoryFetcher,
};
use crate::http::CatalogApi;
use crate::session::AccountSession;
use crate::slot::ResourceSlot;
use crate::stream::{ResourceStream, StreamSettings};

pub type CategoryStream = ResourceStream<CategoryFetcher>;
pub type SubCategoryStream = ResourceStream<SubCategoryFetcher>;
pub type ProductStream = ResourceStream<ProductFetcher>;
pub type ProductDetailSlot = ResourceSlot<ProductDetailFetcher>;
pub type FeaturedSlot = ResourceSlot<FeaturedFetcher>;

/// Storefront state shared by every screen.
pub struct StorefrontStore {
    api: CatalogApi,
    categories: CategoryStream,
    subcategories: SubCategoryStream,
    products: ProductStream,
    product_detail: ProductDetailSlot,
    featured: FeaturedSlot,
    account: AccountSession,
    language: watch::Sender<Language>,
    default_sort: SortOrder,
}

impl StorefrontStore {
    /// Builds the store and its HTTP client from `config`.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let api = CatalogApi::new(config)?;
        Self::with_api(api, config)
    }

    /// Builds the store around an existing client.
    pub fn with_api(api: CatalogApi, config: &ClientConfig) -> ClientResult<Self> {
        let language = Language::from_code(&config.paging.default_language)?;
        let settings = StreamSettings::from_config(config);
        let (language, _) = watch::channel(language);

        Ok(StorefrontStore {
            categories: ResourceStream::new(CategoryFetcher::new(api.clone()), settings),
            subcategories: ResourceStream::new(SubCategoryFetcher::new(api.clone()), settings),
            products: ResourceStream::new(ProductFetcher::new(api.clone()), settings),
            product_detail: ResourceSlot::new(
                ProductDetailFetcher::new(api.clone()),
                settings.request_timeout,
            ),
            featured: ResourceSlot::new(
                FeaturedFetcher::new(api.clone()),
                settings.request_timeout,
            ),
            account: AccountSession::new(api.clone(), settings.request_timeout),
            api,
            language,
            default_sort: config.paging.default_sort,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn api(&self) -> &CatalogApi {
        &self.api
    }

    pub fn categories(&self) -> &CategoryStream {
        &self.categories
    }

    pub fn subcategories(&self) -> &SubCategoryStream {
        &self.subcategories
    }

    pub fn products(&self) -> &ProductStream {
        &self.products
    }

    pub fn product_detail(&self) -> &ProductDetailSlot {
        &self.product_detail
    }

    pub fn featured(&self) -> &FeaturedSlot {
        &self.featured
    }

    pub fn account(&self) -> &AccountSession {
        &self.account
    }

    // =========================================================================
    // Language
    // =========================================================================

    /// Current storefront language.
    pub fn language(&self) -> Language {
        *self.language.borrow()
    }

    /// Switches the storefront language.
    ///
    /// Unknown codes are rejected and leave the language unchanged.
    pub fn set_language(&self, code: &str) -> ClientResult<Language> {
        let language = Language::from_code(code)?;
        let previous = self.language.send_replace(language);
        if previous != language {
            info!(from = previous.code, to = language.code, "Language changed");
        }
        Ok(language)
    }

    pub fn subscribe_language(&self) -> watch::Receiver<Language> {
        self.language.subscribe()
    }

    // =========================================================================
    // Scope Builders
    // =========================================================================

    pub fn subcategory_scope(&self, category: &str) -> ClientResult<SubCategoryScope> {
        Ok(SubCategoryScope::new(validate_category(category)?))
    }

    /// Product scope for `collection` in the current language and the
    /// configured default sort.
    pub fn product_scope(&self, collection: &str) -> ClientResult<ProductScope> {
        let collection = validate_collection_name(collection)?;
        Ok(ProductScope::new(collection, self.language().code).with_sort(self.default_sort))
    }

    /// Featured scope in the current language.
    pub fn featured_scope(&self, limit: Option<usize>) -> FeaturedScope {
        FeaturedScope {
            language: self.language().code.to_string(),
            limit,
        }
    }

    /// Clears every catalogue stream and slot. The account is left alone.
    pub async fn clear_all(&self) {
        self.categories.clear().await;
        self.subcategories.clear().await;
        self.products.clear().await;
        self.product_detail.clear().await;
        self.featured.clear().await;
    }

    /// Signs out and drops everything loaded so far.
    pub async fn sign_out(&self) {
        self.account.logout().await;
        self.clear_all().await;
    }
}

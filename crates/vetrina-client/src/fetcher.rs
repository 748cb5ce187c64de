//! # Fetchers
//!
//! The seam between the request coordinators and the backend.
//!
//! A [`PageFetcher`] knows how to fetch one page of one resource for one
//! scope; a [`ValueFetcher`] fetches one value for one key. Coordinators
//! are generic over these traits, so tests drive them with scripted
//! in-memory fetchers instead of a server.

use std::fmt::Debug;

use async_trait::async_trait;

use vetrina_core::{
    Category, CategoryScope, FeaturedProducts, FeaturedScope, Keyed, Page, Product,
    ProductDetail, ProductScope, Resource, SubCategory, SubCategoryScope,
};

use crate::error::ClientResult;
use crate::featured::fetch_featured;
use crate::http::CatalogApi;

// =============================================================================
// Traits
// =============================================================================

/// Fetches pages of one paginated resource.
#[async_trait]
pub trait PageFetcher: Send + Sync + 'static {
    type Item: Keyed + Clone + Send + Sync + 'static;
    type Scope: Clone + PartialEq + Debug + Send + Sync + 'static;

    /// Resource name for logs.
    fn resource(&self) -> Resource;

    async fn fetch_page(
        &self,
        scope: &Self::Scope,
        offset: u32,
        limit: u32,
    ) -> ClientResult<Page<Self::Item>>;
}

/// Fetches a single value for a key.
#[async_trait]
pub trait ValueFetcher: Send + Sync + 'static {
    type Value: Clone + Send + Sync + 'static;
    type Key: Clone + PartialEq + Debug + Send + Sync + 'static;

    fn resource(&self) -> Resource;

    async fn fetch(&self, key: &Self::Key) -> ClientResult<Self::Value>;
}

// =============================================================================
// Paginated Fetchers
// =============================================================================

#[derive(Debug, Clone)]
pub struct CategoryFetcher {
    api: CatalogApi,
}

impl CategoryFetcher {
    pub fn new(api: CatalogApi) -> Self {
        CategoryFetcher { api }
    }
}

#[async_trait]
impl PageFetcher for CategoryFetcher {
    type Item = Category;
    type Scope = CategoryScope;

    fn resource(&self) -> Resource {
        Resource::Categories
    }

    async fn fetch_page(
        &self,
        _scope: &CategoryScope,
        offset: u32,
        limit: u32,
    ) -> ClientResult<Page<Category>> {
        self.api.fetch_categories(offset, limit).await
    }
}

#[derive(Debug, Clone)]
pub struct SubCategoryFetcher {
    api: CatalogApi,
}

impl SubCategoryFetcher {
    pub fn new(api: CatalogApi) -> Self {
        SubCategoryFetcher { api }
    }
}

#[async_trait]
impl PageFetcher for SubCategoryFetcher {
    type Item = SubCategory;
    type Scope = SubCategoryScope;

    fn resource(&self) -> Resource {
        Resource::SubCategories
    }

    async fn fetch_page(
        &self,
        scope: &SubCategoryScope,
        offset: u32,
        limit: u32,
    ) -> ClientResult<Page<SubCategory>> {
        self.api.fetch_subcategories(&scope.category, offset, limit).await
    }
}

#[derive(Debug, Clone)]
pub struct ProductFetcher {
    api: CatalogApi,
}

impl ProductFetcher {
    pub fn new(api: CatalogApi) -> Self {
        ProductFetcher { api }
    }
}

#[async_trait]
impl PageFetcher for ProductFetcher {
    type Item = Product;
    type Scope = ProductScope;

    fn resource(&self) -> Resource {
        Resource::Products
    }

    async fn fetch_page(
        &self,
        scope: &ProductScope,
        offset: u32,
        limit: u32,
    ) -> ClientResult<Page<Product>> {
        self.api.fetch_products(scope, offset, limit).await
    }
}

// =============================================================================
// Value Fetchers
// =============================================================================

/// Fetches a product sheet by item code.
#[derive(Debug, Clone)]
pub struct ProductDetailFetcher {
    api: CatalogApi,
}

impl ProductDetailFetcher {
    pub fn new(api: CatalogApi) -> Self {
        ProductDetailFetcher { api }
    }
}

#[async_trait]
impl ValueFetcher for ProductDetailFetcher {
    type Value = ProductDetail;
    type Key = String;

    fn resource(&self) -> Resource {
        Resource::ProductDetail
    }

    async fn fetch(&self, item_code: &String) -> ClientResult<ProductDetail> {
        self.api.fetch_product_detail(item_code).await
    }
}

/// Runs the featured chain for a language.
#[derive(Debug, Clone)]
pub struct FeaturedFetcher {
    api: CatalogApi,
}

impl FeaturedFetcher {
    pub fn new(api: CatalogApi) -> Self {
        FeaturedFetcher { api }
    }
}

#[async_trait]
impl ValueFetcher for FeaturedFetcher {
    type Value = FeaturedProducts;
    type Key = FeaturedScope;

    fn resource(&self) -> Resource {
        Resource::Featured
    }

    async fn fetch(&self, scope: &FeaturedScope) -> ClientResult<FeaturedProducts> {
        fetch_featured(&self.api, scope).await
    }
}

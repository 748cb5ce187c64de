//! # vetrina-client: Catalogue Client for Vetrina
//!
//! This crate turns the pure state machines of `vetrina-core` into live,
//! observable streams backed by the catalogue REST backend.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Request Coordination                               │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 StorefrontStore (explicit store object)          │  │
//! │  │                                                                  │  │
//! │  │  categories ─┐   subcategories ─┐   products ─┐   language      │  │
//! │  │  product_detail (slot)          featured (slot)                  │  │
//! │  │  account (AccountSession, the signed-in user)                    │  │
//! │  └───────────────┬──────────────────┬────────────┬──────────────────┘  │
//! │                  ▼                  ▼            ▼                      │
//! │  ┌────────────────────────────────────────────────────────────────┐    │
//! │  │  ResourceStream<F> / ResourceSlot<F>                           │    │
//! │  │                                                                │    │
//! │  │  1. lock, begin_* (bump generation), publish, unlock           │    │
//! │  │  2. await fetch under tokio::time::timeout                     │    │
//! │  │  3. lock, apply_* (stale tickets dropped), publish, unlock     │    │
//! │  └───────────────────────────────┬────────────────────────────────┘    │
//! │                                  ▼                                      │
//! │  ┌────────────────────────────────────────────────────────────────┐    │
//! │  │  PageFetcher / ValueFetcher  ──►  CatalogApi (reqwest)         │    │
//! │  │  POST application/x-www-form-urlencoded, token in every body   │    │
//! │  │  account endpoints: JSON, profile picture as multipart         │    │
//! │  └────────────────────────────────────────────────────────────────┘    │
//! │                                                                         │
//! │  OBSERVATION:                                                          │
//! │  • tokio::sync::watch snapshot per stream and slot                     │
//! │  • subscribers always see the latest state, never a partial one        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Client configuration (server, paging, endpoints)
//! - [`error`] - Client error taxonomy
//! - [`wire`] - Form bodies and JSON response envelopes
//! - [`http`] - `CatalogApi`, the reqwest-backed backend client
//! - [`fetcher`] - Fetcher traits and the per-resource fetchers
//! - [`stream`] - `ResourceStream`, the paginated request coordinator
//! - [`slot`] - `ResourceSlot`, the single-value request coordinator
//! - [`featured`] - Featured products chain
//! - [`session`] - `AccountSession`, the signed-in user
//! - [`store`] - `StorefrontStore`, owner of every stream and slot
//!
//! ## Example
//! ```rust,no_run
//! use vetrina_client::{ClientConfig, LoadOutcome, StorefrontStore};
//!
//! # async fn run() -> vetrina_client::ClientResult<()> {
//! let config = ClientConfig::load(None)?;
//! let store = StorefrontStore::new(&config)?;
//!
//! let categories = store.categories();
//! categories.load_initial(Default::default()).await;
//! while categories.snapshot().has_more {
//!     let before = categories.snapshot().cursor;
//!     if categories.load_more().await != LoadOutcome::Applied {
//!         break;
//!     }
//!     // An empty page leaves the cursor where it was.
//!     if categories.snapshot().cursor == before {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod featured;
pub mod fetcher;
pub mod http;
pub mod session;
pub mod slot;
pub mod store;
pub mod stream;
pub mod wire;

// Re-exports for convenience
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use fetcher::{
    CategoryFetcher, FeaturedFetcher, PageFetcher, ProductDetailFetcher, ProductFetcher,
    SubCategoryFetcher, ValueFetcher,
};
pub use http::CatalogApi;
pub use session::{AccountBackend, AccountSession, AccountSnapshot};
pub use slot::ResourceSlot;
pub use store::StorefrontStore;
pub use stream::{LoadOutcome, ResourceStream, StreamSettings};

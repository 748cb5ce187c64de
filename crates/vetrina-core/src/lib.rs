//! # vetrina-core: Pure Storefront Logic
//!
//! This crate holds the catalogue types and the state machines that the
//! storefront screens observe. It performs no I/O: fetching is the job of
//! `vetrina-client`, which drives the machines defined here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vetrina Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentation (screens, CLI)                     │   │
//! │  │   Catalog ──► SubCategory ──► Products ──► Product Detail       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ subscribe / dispatch                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              vetrina-client (StorefrontStore)                   │   │
//! │  │   ResourceStream ×3, ResourceSlot ×2, AccountSession, CatalogApi │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ vetrina-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌──────────┐  ┌────────────┐  │   │
//! │  │   │   types   │  │ pagination │  │   slot   │  │ validation │  │   │
//! │  │   │  Page<T>  │  │ Paginated  │  │  Slot    │  │  rules     │  │   │
//! │  │   │  Product  │  │ List, Tick │  │  (value) │  │  checks    │  │   │
//! │  │   └───────────┘  └────────────┘  └──────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO RUNTIME • NO NETWORK • PURE TRANSITIONS          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalogue types (Page, Category, Product, ProductDetail, scopes)
//! - [`pagination`] - The paginated list state machine with generation tickets
//! - [`slot`] - Single-value counterpart used for product detail and featured
//! - [`account`] - Users, sign-in requests and profile changes
//! - [`language`] - Supported storefront languages
//! - [`validation`] - Input and page consistency rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use vetrina_core::pagination::{ApplyOutcome, PaginatedList};
//! use vetrina_core::types::{Category, Page};
//!
//! let mut list: PaginatedList<Category, ()> = PaginatedList::new();
//!
//! let ticket = list.begin_initial(());
//! let page = Page::new(vec![Category::new("Ovens", "ovens.png")], 0, 20, 45);
//! assert_eq!(list.apply_page(ticket, page), ApplyOutcome::Applied);
//!
//! assert_eq!(list.cursor(), 1);
//! assert!(list.has_more());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod account;
pub mod error;
pub mod language;
pub mod pagination;
pub mod slot;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use account::{
    Credentials, PasswordReset, ProfileChanges, ProfileImage, ProfileUpdated, Registration, User,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use language::Language;
pub use pagination::{
    ApplyOutcome, LoadKind, MergePolicy, PaginatedList, Phase, StreamSnapshot, Ticket,
};
pub use slot::{Slot, SlotPhase, SlotSnapshot, SlotTicket};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size requested when the caller does not choose one.
///
/// Matches the backend's own default, so a page that comes back with
/// `limit = 20` was served exactly as asked.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page size the client will ask for.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Language used for product listings and descriptions when none is chosen.
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

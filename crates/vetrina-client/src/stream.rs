//! # Resource Stream
//!
//! Async request coordinator over one [`PaginatedList`].
//!
//! ## Operation Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ResourceStream::load_more()                          │
//! │                                                                         │
//! │  ┌──────────────┐   write lock                                          │
//! │  │ guard        │   phase == Idle && has_more ? ─── no ──► Skipped       │
//! │  │              │   begin_more() → Ticket{generation, offset=cursor}     │
//! │  │              │   publish snapshot (is_loading_more = true)            │
//! │  └──────┬───────┘   unlock                                              │
//! │         │                                                               │
//! │  ┌──────▼───────┐   no lock held                                        │
//! │  │ fetch        │   timeout(request_timeout, fetch_page(scope, offset))  │
//! │  └──────┬───────┘                                                       │
//! │         │                                                               │
//! │  ┌──────▼───────┐   write lock                                          │
//! │  │ apply        │   apply_page / apply_failure                          │
//! │  │              │   ├── current generation → publish, Applied/Failed    │
//! │  │              │   └── superseded          → dropped, Stale            │
//! │  └──────────────┘   unlock                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Subscribers observe the stream through a `watch` channel of
//! [`StreamSnapshot`]s, published after every mutation while the write
//! lock is still held, so the channel never lags the state.

use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use vetrina_core::validation::validate_page;
use vetrina_core::{ApplyOutcome, MergePolicy, PaginatedList, StreamSnapshot, Ticket};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::fetcher::PageFetcher;

// =============================================================================
// Settings & Outcome
// =============================================================================

/// Per-stream request settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    pub page_size: u32,
    pub request_timeout: Duration,
    pub merge_policy: MergePolicy,
}

impl StreamSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        StreamSettings {
            page_size: config.page_size(),
            request_timeout: config.request_timeout(),
            merge_policy: config.paging.merge_policy,
        }
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// What happened to one consumer operation.
///
/// The snapshot stays the authoritative state; this only tells the caller
/// whether its own request was the one that landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The fetched page (or value) was applied.
    Applied,
    /// The fetch failed; the message is now the stream's `last_error`.
    Failed(String),
    /// A newer operation superseded this one; its result was dropped.
    Stale,
    /// Nothing was fetched (no scope bound, busy, or nothing more to load).
    Skipped,
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied)
    }
}

// =============================================================================
// Resource Stream
// =============================================================================

/// One observable paginated stream.
pub struct ResourceStream<F: PageFetcher> {
    fetcher: F,
    state: RwLock<PaginatedList<F::Item, F::Scope>>,
    updates: watch::Sender<StreamSnapshot<F::Item, F::Scope>>,
    page_size: u32,
    request_timeout: Duration,
}

impl<F: PageFetcher> ResourceStream<F> {
    pub fn new(fetcher: F, settings: StreamSettings) -> Self {
        let list = PaginatedList::with_merge_policy(settings.merge_policy);
        let (updates, _) = watch::channel(list.snapshot());

        ResourceStream {
            fetcher,
            state: RwLock::new(list),
            updates,
            page_size: settings.page_size,
            request_timeout: settings.request_timeout,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Latest published state.
    pub fn snapshot(&self) -> StreamSnapshot<F::Item, F::Scope> {
        self.updates.borrow().clone()
    }

    /// Receives a snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<StreamSnapshot<F::Item, F::Scope>> {
        self.updates.subscribe()
    }

    // =========================================================================
    // Consumer Operations
    // =========================================================================

    /// Loads the first page of `scope`, replacing whatever is shown.
    ///
    /// Always issues a request. An earlier request still in flight is
    /// superseded and its result will be dropped.
    pub async fn load_initial(&self, scope: F::Scope) -> LoadOutcome {
        let ticket = {
            let mut state = self.state.write().await;
            let ticket = state.begin_initial(scope);
            self.publish(&state);
            ticket
        };

        debug!(
            resource = %self.fetcher.resource(),
            scope = ?ticket.scope(),
            generation = ticket.generation(),
            "Loading initial page"
        );
        self.run(ticket).await
    }

    /// Reloads the first page of the bound scope.
    pub async fn refresh(&self) -> LoadOutcome {
        let ticket = {
            let mut state = self.state.write().await;
            match state.begin_refresh() {
                Some(ticket) => {
                    self.publish(&state);
                    ticket
                }
                None => {
                    debug!(
                        resource = %self.fetcher.resource(),
                        "Refresh skipped, no scope loaded or initial load pending"
                    );
                    return LoadOutcome::Skipped;
                }
            }
        };

        debug!(
            resource = %self.fetcher.resource(),
            generation = ticket.generation(),
            "Refreshing"
        );
        self.run(ticket).await
    }

    /// Loads the next page of the bound scope.
    ///
    /// Skipped unless the stream is idle and reports more items.
    pub async fn load_more(&self) -> LoadOutcome {
        let ticket = {
            let mut state = self.state.write().await;
            if !state.phase().is_idle() || !state.has_more() {
                debug!(
                    resource = %self.fetcher.resource(),
                    phase = ?state.phase(),
                    cursor = state.cursor(),
                    total = state.total(),
                    "Load more skipped"
                );
                return LoadOutcome::Skipped;
            }

            match state.begin_more() {
                Some(ticket) => {
                    self.publish(&state);
                    ticket
                }
                None => return LoadOutcome::Skipped,
            }
        };

        debug!(
            resource = %self.fetcher.resource(),
            offset = ticket.offset(),
            generation = ticket.generation(),
            "Loading more"
        );
        self.run(ticket).await
    }

    /// Loads the first page of `scope`, then keeps loading while the
    /// stream reports more, up to `max_pages` pages in total (0 means no
    /// bound).
    ///
    /// Stops early when a page lands without advancing the cursor, which
    /// happens when the backend returns an empty page below its reported
    /// total. Returns the outcome of the last request that did not apply,
    /// or `Applied` when every requested page landed.
    pub async fn load_pages(&self, scope: F::Scope, max_pages: u32) -> LoadOutcome {
        let outcome = self.load_initial(scope).await;
        if !outcome.is_applied() {
            return outcome;
        }

        let mut loaded = 1;
        while max_pages == 0 || loaded < max_pages {
            let before = self.snapshot().cursor;
            match self.load_more().await {
                LoadOutcome::Applied => loaded += 1,
                LoadOutcome::Skipped => break,
                other => return other,
            }

            let after = self.snapshot().cursor;
            if after == before {
                warn!(
                    resource = %self.fetcher.resource(),
                    cursor = after,
                    total = self.snapshot().total,
                    "Page did not advance the cursor, stopping"
                );
                break;
            }
        }

        LoadOutcome::Applied
    }

    /// Resets the stream. Any in-flight result will be dropped.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.clear();
        self.publish(&state);
        debug!(resource = %self.fetcher.resource(), generation = state.generation(), "Cleared");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn run(&self, ticket: Ticket<F::Scope>) -> LoadOutcome {
        let resource = self.fetcher.resource();
        let result = match tokio::time::timeout(
            self.request_timeout,
            self.fetcher
                .fetch_page(ticket.scope(), ticket.offset(), self.page_size),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(self.request_timeout.as_secs())),
        };

        let generation = ticket.generation();
        let kind = ticket.kind();
        let mut state = self.state.write().await;

        match result {
            Ok(page) => {
                if let Err(e) = validate_page(&page, ticket.offset()) {
                    warn!(%resource, error = %e, "Applying inconsistent page");
                }

                let items = page.len();
                let total = page.total;
                match state.apply_page(ticket, page) {
                    ApplyOutcome::Applied => {
                        self.publish(&state);
                        info!(
                            %resource,
                            kind = kind.as_str(),
                            items,
                            cursor = state.cursor(),
                            total,
                            "Page applied"
                        );
                        LoadOutcome::Applied
                    }
                    ApplyOutcome::Stale => {
                        debug!(
                            %resource,
                            generation,
                            current = state.generation(),
                            "Dropping stale page"
                        );
                        LoadOutcome::Stale
                    }
                }
            }
            Err(err) => {
                let message = err.to_string();
                match state.apply_failure(&ticket, message.clone()) {
                    ApplyOutcome::Applied => {
                        self.publish(&state);
                        warn!(%resource, kind = kind.as_str(), error = %message, "Load failed");
                        LoadOutcome::Failed(message)
                    }
                    ApplyOutcome::Stale => {
                        debug!(%resource, generation, error = %message, "Dropping stale failure");
                        LoadOutcome::Stale
                    }
                }
            }
        }
    }

    fn publish(&self, state: &PaginatedList<F::Item, F::Scope>) {
        self.updates.send_replace(state.snapshot());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

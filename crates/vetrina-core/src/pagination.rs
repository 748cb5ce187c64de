//! # Paginated List
//!
//! The state machine behind every paginated catalogue stream.
//!
//! ## Phases
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     PaginatedList Phase Machine                         │
//! │                                                                         │
//! │                 begin_initial(scope)                                    │
//! │        ┌──────────────────────────────────► LoadingInitial ──┐          │
//! │        │                                                     │          │
//! │        │        begin_more()                                 │ apply_*  │
//! │      Idle ─────────────────────────────────► LoadingMore ────┤          │
//! │        ▲                                                     │          │
//! │        │        begin_refresh()                              │          │
//! │        ├─────────────────────────────────► Refreshing ───────┤          │
//! │        │                                                     │          │
//! │        └─────────────────────────────────────────────────────┘          │
//! │                                                                         │
//! │  clear() resets to Idle from any phase.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Generations
//! Every `begin_*` call and every `clear()` bumps a monotonic generation
//! counter and hands out a [`Ticket`] stamped with it. A completion applies
//! only while its ticket is still current; anything older is reported as
//! [`ApplyOutcome::Stale`] and leaves the list untouched. This makes
//! "newest request wins" hold regardless of response arrival order.
//!
//! The list does no I/O. The async coordinator in `vetrina-client` calls
//! `begin_*`, performs the fetch, and feeds the result back through
//! [`PaginatedList::apply_page`] or [`PaginatedList::apply_failure`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Keyed, Page};

// =============================================================================
// Phase & Kind
// =============================================================================

/// What a list is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    LoadingInitial,
    LoadingMore,
    Refreshing,
}

impl Phase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Phase::Idle)
    }
}

/// Which operation produced a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadKind {
    /// First page for a (possibly new) scope. Replaces items.
    Initial,
    /// Next page for the bound scope. Appends items.
    More,
    /// First page again for the bound scope. Replaces items.
    Refresh,
}

impl LoadKind {
    /// Whether a successful page replaces the loaded items.
    pub fn replaces(&self) -> bool {
        !matches!(self, LoadKind::More)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadKind::Initial => "initial",
            LoadKind::More => "more",
            LoadKind::Refresh => "refresh",
        }
    }
}

/// How appended pages are merged into the loaded items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Append every received item. Server-side drift between pages may
    /// cause duplicates or gaps; they are accepted as-is.
    #[default]
    KeepAll,

    /// Drop appended items whose key is already loaded.
    ///
    /// The cursor still advances by the received count, since it tracks
    /// the server position rather than the local list length.
    DedupeByKey,
}

/// Result of feeding a completion back into the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The completion was current and has been applied.
    Applied,
    /// The completion belonged to a superseded request and was discarded.
    Stale,
}

// =============================================================================
// Ticket
// =============================================================================

/// Handle for one in-flight request.
///
/// Carries everything the coordinator needs to issue the fetch, plus the
/// generation that decides whether its result still counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    generation: u64,
    kind: LoadKind,
    offset: u32,
    scope: K,
}

impl<K> Ticket<K> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn kind(&self) -> LoadKind {
        self.kind
    }

    /// Offset to request.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Scope to request.
    pub fn scope(&self) -> &K {
        &self.scope
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Read-only copy of the observable fields of a list.
///
/// This is what subscribers receive after every mutation. The generation
/// counter is internal bookkeeping and is not part of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamSnapshot<T, K> {
    pub items: Vec<T>,
    pub cursor: u32,
    pub total: u32,
    pub has_more: bool,
    pub phase: Phase,
    pub last_error: Option<String>,
    pub scope: Option<K>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl<T, K> StreamSnapshot<T, K> {
    /// First page of a new scope is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::LoadingInitial)
    }

    pub fn is_loading_more(&self) -> bool {
        matches!(self.phase, Phase::LoadingMore)
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self.phase, Phase::Refreshing)
    }

    /// Whether any request is in flight.
    pub fn is_busy(&self) -> bool {
        !self.phase.is_idle()
    }
}

impl<T, K> Default for StreamSnapshot<T, K> {
    fn default() -> Self {
        StreamSnapshot {
            items: Vec::new(),
            cursor: 0,
            total: 0,
            has_more: false,
            phase: Phase::Idle,
            last_error: None,
            scope: None,
            loaded_at: None,
        }
    }
}

// =============================================================================
// Paginated List
// =============================================================================

/// Accumulated items of one remote collection plus the bookkeeping needed
/// to continue, restart or discard its pagination.
///
/// ## Invariants
/// - `has_more() == (cursor < total)`
/// - after a replace, `cursor == page.offset + page.len()`
/// - after an append, `cursor` grew by exactly `page.len()`
/// - a failure never touches items, cursor, total or scope
#[derive(Debug, Clone)]
pub struct PaginatedList<T, K> {
    items: Vec<T>,
    cursor: u32,
    total: u32,
    phase: Phase,
    last_error: Option<String>,
    scope: Option<K>,
    generation: u64,
    merge_policy: MergePolicy,
    loaded_at: Option<DateTime<Utc>>,
}

impl<T, K> Default for PaginatedList<T, K> {
    fn default() -> Self {
        PaginatedList {
            items: Vec::new(),
            cursor: 0,
            total: 0,
            phase: Phase::Idle,
            last_error: None,
            scope: None,
            generation: 0,
            merge_policy: MergePolicy::default(),
            loaded_at: None,
        }
    }
}

impl<T, K> PaginatedList<T, K> {
    /// Creates an empty list with the default merge policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty list with the given merge policy.
    pub fn with_merge_policy(merge_policy: MergePolicy) -> Self {
        PaginatedList {
            merge_policy,
            ..Self::default()
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of items consumed from the server so far.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Server-reported total as of the last applied page.
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn has_more(&self) -> bool {
        self.cursor < self.total
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Scope of the currently displayed items.
    pub fn scope(&self) -> Option<&K> {
        self.scope.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn merge_policy(&self) -> MergePolicy {
        self.merge_policy
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Starts loading the first page of `scope`.
    ///
    /// Legal in any phase. An overlapping request is superseded: its
    /// completion will come back stale.
    pub fn begin_initial(&mut self, scope: K) -> Ticket<K>
    where
        K: Clone,
    {
        self.start(LoadKind::Initial, Phase::LoadingInitial, 0, scope)
    }

    /// Starts reloading the first page of the bound scope.
    ///
    /// Returns `None` when no scope has been loaded yet, and while an
    /// initial load is in flight, so a refresh never displaces the
    /// pending scope with the previously bound one.
    pub fn begin_refresh(&mut self) -> Option<Ticket<K>>
    where
        K: Clone,
    {
        if self.phase == Phase::LoadingInitial {
            return None;
        }
        let scope = self.scope.clone()?;
        Some(self.start(LoadKind::Refresh, Phase::Refreshing, 0, scope))
    }

    /// Starts loading the page at the current cursor.
    ///
    /// Returns `None` when no scope has been loaded yet. Whether more
    /// items exist (`has_more`) is for the caller to check.
    pub fn begin_more(&mut self) -> Option<Ticket<K>>
    where
        K: Clone,
    {
        let scope = self.scope.clone()?;
        let offset = self.cursor;
        Some(self.start(LoadKind::More, Phase::LoadingMore, offset, scope))
    }

    fn start(&mut self, kind: LoadKind, phase: Phase, offset: u32, scope: K) -> Ticket<K> {
        self.generation += 1;
        self.phase = phase;
        self.last_error = None;

        Ticket {
            generation: self.generation,
            kind,
            offset,
            scope,
        }
    }

    /// Applies a successfully fetched page.
    ///
    /// A zero-item page is a success like any other: for a replace it
    /// empties the list, for an append it only updates `total`.
    pub fn apply_page(&mut self, ticket: Ticket<K>, page: Page<T>) -> ApplyOutcome
    where
        T: Keyed,
    {
        if !self.is_current(&ticket) {
            return ApplyOutcome::Stale;
        }

        let received = page.received();

        if ticket.kind.replaces() {
            self.cursor = page.offset.saturating_add(received);
            self.items = page.items;
            self.scope = Some(ticket.scope);
        } else {
            self.cursor = self.cursor.saturating_add(received);
            match self.merge_policy {
                MergePolicy::KeepAll => self.items.extend(page.items),
                MergePolicy::DedupeByKey => {
                    let mut seen: HashSet<String> =
                        self.items.iter().map(|item| item.key().to_string()).collect();
                    for item in page.items {
                        if seen.insert(item.key().to_string()) {
                            self.items.push(item);
                        }
                    }
                }
            }
        }

        self.total = page.total;
        self.phase = Phase::Idle;
        self.last_error = None;
        self.loaded_at = Some(Utc::now());

        ApplyOutcome::Applied
    }

    /// Records a failed fetch.
    ///
    /// Loaded items, cursor, total and scope stay as they were.
    pub fn apply_failure(
        &mut self,
        ticket: &Ticket<K>,
        message: impl Into<String>,
    ) -> ApplyOutcome {
        if !self.is_current(ticket) {
            return ApplyOutcome::Stale;
        }

        self.last_error = Some(message.into());
        self.phase = Phase::Idle;

        ApplyOutcome::Applied
    }

    /// Resets every observable field and invalidates in-flight requests.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.items.clear();
        self.cursor = 0;
        self.total = 0;
        self.phase = Phase::Idle;
        self.last_error = None;
        self.scope = None;
        self.loaded_at = None;
    }

    /// Whether `ticket` is still the newest request.
    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        ticket.generation == self.generation
    }

    /// Whether the displayed items belong to `scope`.
    pub fn scope_matches(&self, scope: &K) -> bool
    where
        K: PartialEq,
    {
        self.scope.as_ref() == Some(scope)
    }

    /// Copies the observable state.
    pub fn snapshot(&self) -> StreamSnapshot<T, K>
    where
        T: Clone,
        K: Clone,
    {
        StreamSnapshot {
            items: self.items.clone(),
            cursor: self.cursor,
            total: self.total,
            has_more: self.has_more(),
            phase: self.phase,
            last_error: self.last_error.clone(),
            scope: self.scope.clone(),
            loaded_at: self.loaded_at,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Slot
//!
//! Single-value counterpart of [`PaginatedList`](crate::pagination::PaginatedList),
//! used for the product detail sheet and the featured products block.
//!
//! A slot holds at most one value for one key. Loading a new key keeps the
//! previous value visible until the new one lands; a failure keeps it
//! as well and only sets `last_error`. Generations work exactly like in
//! the paginated list: the newest `begin_*` or `clear()` wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pagination::ApplyOutcome;

/// What a slot is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPhase {
    #[default]
    Idle,
    Loading,
    Refreshing,
}

/// Handle for one in-flight slot request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTicket<K> {
    generation: u64,
    key: K,
    refreshing: bool,
}

impl<K> SlotTicket<K> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn is_refresh(&self) -> bool {
        self.refreshing
    }
}

/// Read-only copy of the observable fields of a slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotSnapshot<T, K> {
    pub value: Option<T>,
    pub key: Option<K>,
    pub phase: SlotPhase,
    pub last_error: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl<T, K> SlotSnapshot<T, K> {
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, SlotPhase::Loading)
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self.phase, SlotPhase::Refreshing)
    }
}

impl<T, K> Default for SlotSnapshot<T, K> {
    fn default() -> Self {
        SlotSnapshot {
            value: None,
            key: None,
            phase: SlotPhase::Idle,
            last_error: None,
            loaded_at: None,
        }
    }
}

/// State of one single-value resource.
#[derive(Debug, Clone)]
pub struct Slot<T, K> {
    value: Option<T>,
    key: Option<K>,
    phase: SlotPhase,
    last_error: Option<String>,
    generation: u64,
    loaded_at: Option<DateTime<Utc>>,
}

impl<T, K> Default for Slot<T, K> {
    fn default() -> Self {
        Slot {
            value: None,
            key: None,
            phase: SlotPhase::Idle,
            last_error: None,
            generation: 0,
            loaded_at: None,
        }
    }
}

impl<T, K> Slot<T, K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Key of the held value.
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn phase(&self) -> SlotPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Starts loading the value for `key`.
    pub fn begin_load(&mut self, key: K) -> SlotTicket<K> {
        self.start(key, SlotPhase::Loading)
    }

    /// Starts reloading the held key.
    ///
    /// `None` when nothing was loaded yet, and while a load of a new key
    /// is in flight.
    pub fn begin_refresh(&mut self) -> Option<SlotTicket<K>>
    where
        K: Clone,
    {
        if self.phase == SlotPhase::Loading {
            return None;
        }
        let key = self.key.clone()?;
        Some(self.start(key, SlotPhase::Refreshing))
    }

    fn start(&mut self, key: K, phase: SlotPhase) -> SlotTicket<K> {
        self.generation += 1;
        self.phase = phase;
        self.last_error = None;

        SlotTicket {
            generation: self.generation,
            key,
            refreshing: matches!(phase, SlotPhase::Refreshing),
        }
    }

    /// Stores a fetched value.
    pub fn apply_value(&mut self, ticket: SlotTicket<K>, value: T) -> ApplyOutcome {
        if ticket.generation != self.generation {
            return ApplyOutcome::Stale;
        }

        self.value = Some(value);
        self.key = Some(ticket.key);
        self.phase = SlotPhase::Idle;
        self.last_error = None;
        self.loaded_at = Some(Utc::now());
        ApplyOutcome::Applied
    }

    /// Records a failed fetch. The held value stays visible.
    pub fn apply_failure(
        &mut self,
        ticket: &SlotTicket<K>,
        message: impl Into<String>,
    ) -> ApplyOutcome {
        if ticket.generation != self.generation {
            return ApplyOutcome::Stale;
        }

        self.last_error = Some(message.into());
        self.phase = SlotPhase::Idle;
        ApplyOutcome::Applied
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.value = None;
        self.key = None;
        self.phase = SlotPhase::Idle;
        self.last_error = None;
        self.loaded_at = None;
    }

    pub fn snapshot(&self) -> SlotSnapshot<T, K>
    where
        T: Clone,
        K: Clone,
    {
        SlotSnapshot {
            value: self.value.clone(),
            key: self.key.clone(),
            phase: self.phase,
            last_error: self.last_error.clone(),
            loaded_at: self.loaded_at,
        }
    }
}

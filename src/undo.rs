use crate::clock::Clock;
use crate::errors::{DeskError, Result};
use crate::keys::{CategoryStatKey, MainKey, SubKey};
use crate::stats::StatsAggregate;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_UNDO_WINDOW_SECS: u64 = 60;

/// Everything needed to take back the most recent commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastLoggedCall {
    pub category_stat_key: CategoryStatKey,
    pub main_key: MainKey,
    pub sub_key: SubKey,
    pub inbound_minutes: u64,
    pub outbound_minutes: u64,
    pub timestamp: String,
}

#[derive(Debug)]
struct Armed {
    snapshot: LastLoggedCall,
    expires_at: DateTime<Utc>,
    generation: u64,
}

/// Single undo slot with a grace window.
pub struct UndoController {
    slot: Option<Armed>,
    generation: u64,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl UndoController {
    pub fn new(clock: Arc<dyn Clock>, window_secs: u64) -> Self {
        Self {
            slot: None,
            generation: 0,
            window: Duration::seconds(window_secs as i64),
            clock,
        }
    }

    pub fn window_secs(&self) -> u64 {
        self.window.num_seconds().max(0) as u64
    }

    /// Replaces whatever was pending. Returns the generation of the new
    /// slot, used to match a later [`UndoController::expire`].
    pub fn arm(&mut self, snapshot: LastLoggedCall) -> u64 {
        self.generation += 1;
        if let Some(previous) = self.slot.take() {
            info!(key = %previous.snapshot.category_stat_key, "pending undo discarded");
        }
        self.slot = Some(Armed {
            snapshot,
            expires_at: self.clock.now() + self.window,
            generation: self.generation,
        });
        self.generation
    }

    pub fn pending(&mut self) -> Option<&LastLoggedCall> {
        self.drop_if_expired();
        self.slot.as_ref().map(|armed| &armed.snapshot)
    }

    /// Whole seconds left before the pending undo lapses.
    pub fn seconds_left(&mut self) -> Option<u64> {
        self.drop_if_expired();
        let armed = self.slot.as_ref()?;
        let left = armed.expires_at - self.clock.now();
        Some(((left.num_milliseconds() + 999) / 1000).max(0) as u64)
    }

    pub fn apply(&mut self, stats: &mut StatsAggregate) -> Result<LastLoggedCall> {
        self.drop_if_expired();
        // Consumed even when persisting the reversal fails.
        let call = self.slot.take().ok_or(DeskError::NothingToUndo)?.snapshot;
        stats.reverse(
            &call.category_stat_key,
            call.inbound_minutes,
            call.outbound_minutes,
            &call.timestamp,
        )?;
        info!(key = %call.category_stat_key, "last call undone");
        Ok(call)
    }

    /// Clears the slot if it still belongs to `generation`.
    pub fn expire(&mut self, generation: u64) -> bool {
        if self.slot.as_ref().is_some_and(|armed| armed.generation == generation) {
            self.slot = None;
            info!(generation, "undo window expired");
            return true;
        }
        false
    }

    fn drop_if_expired(&mut self) {
        let now = self.clock.now();
        if let Some(armed) = &self.slot {
            if now >= armed.expires_at {
                let generation = armed.generation;
                self.expire(generation);
            }
        }
    }
}

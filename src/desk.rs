//! The owned state of one desk: categories, statistics, custom fields, the
//! stopwatch and the undo slot, opened from a single store.

use crate::categories::CategoryStore;
use crate::clock::Clock;
use crate::custom_fields::CustomFields;
use crate::errors::{DeskError, LoadOutcome, Result};
use crate::export::{export_csv, CsvExport};
use crate::keys::{CategoryStatKey, MainKey, SubKey};
use crate::logger::{CallLogger, CallRequest, LoggedCall};
use crate::stats::{build_breakdown, CallStats, CategoryBreakdown, StatsAggregate, Window};
use crate::stopwatch::Stopwatch;
use crate::storage::KeyValueStore;
use crate::summary::{compose, SummaryInput};
use crate::undo::{LastLoggedCall, UndoController};
use std::sync::Arc;

/// Confirmations the user must give before a destructive action runs.
pub const MAIN_CATEGORY_CONFIRMATIONS: u8 = 2;
pub const SUBCATEGORY_CONFIRMATIONS: u8 = 1;
pub const CUSTOM_FIELD_CONFIRMATIONS: u8 = 1;
pub const STOPWATCH_ENTRY_CONFIRMATIONS: u8 = 1;

pub struct Desk {
    pub categories: CategoryStore,
    pub stats: StatsAggregate,
    pub custom_fields: CustomFields,
    pub stopwatch: Stopwatch,
    pub undo: UndoController,
    clock: Arc<dyn Clock>,
    notices: Vec<String>,
}

impl Desk {
    pub fn open(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, undo_window_secs: u64) -> Result<Self> {
        let mut notices = Vec::new();

        let (categories, outcome) = CategoryStore::load(store.clone())?;
        note_recovery(&mut notices, outcome, "Restored default categories.");
        let (stats, outcome) = StatsAggregate::load(store.clone(), clock.clone())?;
        note_recovery(&mut notices, outcome, "Started with empty call statistics.");
        let (custom_fields, outcome) = CustomFields::load(store.clone())?;
        note_recovery(&mut notices, outcome, "Cleared custom fields.");
        let (stopwatch, outcome) = Stopwatch::load(store, clock.clone())?;
        note_recovery(&mut notices, outcome, "Cleared stopwatch history.");

        Ok(Self {
            categories,
            stats,
            custom_fields,
            stopwatch,
            undo: UndoController::new(clock.clone(), undo_window_secs),
            clock,
            notices,
        })
    }

    /// Messages waiting to be shown to the user.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Logging pauses a running stopwatch, whether or not the call is
    /// accepted.
    pub fn log_call(&mut self, request: &CallRequest) -> Result<LoggedCall> {
        self.stopwatch.pause();
        let logged = CallLogger {
            categories: &mut self.categories,
            stats: &mut self.stats,
            undo: &mut self.undo,
        }
        .log_call(request)?;

        if let Some(name) = &logged.created_subcategory {
            self.notices.push(format!("New subcategory \"{name}\" added!"));
        }
        Ok(logged)
    }

    pub fn undo_last_call(&mut self) -> Result<LastLoggedCall> {
        self.undo.apply(&mut self.stats)
    }

    pub fn stats_for(&self, key: &CategoryStatKey, window: Window) -> CallStats {
        self.stats.stats_for(key, window)
    }

    pub fn breakdown(&self, window: Window) -> CategoryBreakdown {
        build_breakdown(&self.categories, &self.stats, window)
    }

    pub fn export(&self, window: Window) -> Result<CsvExport> {
        export_csv(&self.categories, &self.stats, window, self.clock.now())
    }

    pub fn summary(&self, input: &SummaryInput) -> Option<String> {
        compose(&self.categories, self.custom_fields.fields(), input)
    }

    pub fn delete_main_category(&mut self, main: &MainKey, confirmations: u8) -> Result<()> {
        require(confirmations, MAIN_CATEGORY_CONFIRMATIONS)?;
        self.categories.delete_main_category(main)?;
        Ok(())
    }

    pub fn delete_subcategory(&mut self, main: &MainKey, sub: &SubKey, confirmations: u8) -> Result<()> {
        require(confirmations, SUBCATEGORY_CONFIRMATIONS)?;
        self.categories.delete_subcategory(main, sub)?;
        Ok(())
    }

    pub fn delete_stopwatch_entry(&mut self, index: usize, confirmations: u8) -> Result<()> {
        require(confirmations, STOPWATCH_ENTRY_CONFIRMATIONS)?;
        self.stopwatch.delete_entry(index)?;
        Ok(())
    }

    pub fn delete_custom_field(&mut self, index: usize, confirmations: u8) -> Result<()> {
        require(confirmations, CUSTOM_FIELD_CONFIRMATIONS)?;
        self.custom_fields.delete(index)?;
        Ok(())
    }
}

fn require(given: u8, needed: u8) -> Result<()> {
    if given < needed {
        return Err(DeskError::ConfirmationRequired { needed });
    }
    Ok(())
}

fn note_recovery(notices: &mut Vec<String>, outcome: LoadOutcome, action: &str) {
    if let LoadOutcome::Recovered(err) = outcome {
        notices.push(format!("{} {action}", capitalize(&err.to_string())));
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

//! Task stopwatch with a short persisted history of finished sessions.

use crate::clock::{iso_timestamp, Clock};
use crate::errors::{DeskError, LoadOutcome, Result};
use crate::storage::{save_json, KeyValueStore, Slot};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const HISTORY_LIMIT: usize = 20;
pub const UNNAMED_TASK: &str = "Unnamed Task";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopwatchEntry {
    pub name: String,
    /// Whole seconds.
    pub duration: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopwatchStatus {
    pub running: bool,
    pub elapsed_secs: u64,
}

pub struct Stopwatch {
    accumulated: Duration,
    running_since: Option<DateTime<Utc>>,
    /// Newest first.
    history: Vec<StopwatchEntry>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl Stopwatch {
    /// Only the history is persisted; a running session does not survive a
    /// restart.
    pub fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Result<(Self, LoadOutcome)> {
        let (history, outcome) = match store.read(Slot::StopwatchHistory)? {
            None => (Vec::new(), LoadOutcome::Created),
            Some(raw) => match serde_json::from_str::<Vec<StopwatchEntry>>(&raw) {
                Ok(mut history) => {
                    history.truncate(HISTORY_LIMIT);
                    (history, LoadOutcome::Loaded)
                }
                Err(err) => {
                    warn!(error = %err, "saved stopwatch history unusable, starting empty");
                    let err = DeskError::CorruptPersistedState {
                        slot: "stopwatch sessions",
                        reason: err.to_string(),
                    };
                    (Vec::new(), LoadOutcome::Recovered(err))
                }
            },
        };

        let loaded = Self {
            accumulated: Duration::zero(),
            running_since: None,
            history,
            store,
            clock,
        };
        if let LoadOutcome::Recovered(_) = outcome {
            loaded.persist()?;
        }
        Ok((loaded, outcome))
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn elapsed_secs(&self) -> u64 {
        let running = self
            .running_since
            .map(|since| self.clock.now() - since)
            .unwrap_or_else(Duration::zero);
        (self.accumulated + running).num_seconds().max(0) as u64
    }

    pub fn status(&self) -> StopwatchStatus {
        StopwatchStatus {
            running: self.is_running(),
            elapsed_secs: self.elapsed_secs(),
        }
    }

    pub fn history(&self) -> &[StopwatchEntry] {
        &self.history
    }

    /// Returns false when it was already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.running_since = Some(self.clock.now());
        info!(elapsed = self.elapsed_secs(), "stopwatch started");
        true
    }

    /// Returns false when it was not running.
    pub fn pause(&mut self) -> bool {
        let Some(since) = self.running_since.take() else {
            return false;
        };
        self.accumulated = self.accumulated + (self.clock.now() - since);
        info!(elapsed = self.elapsed_secs(), "stopwatch paused");
        true
    }

    /// Stops and zeroes the stopwatch. A session with elapsed time is
    /// recorded at the top of the history under `name`.
    pub fn reset(&mut self, name: &str) -> Result<Option<StopwatchEntry>> {
        let elapsed = self.elapsed_secs();
        self.running_since = None;
        self.accumulated = Duration::zero();
        if elapsed == 0 {
            return Ok(None);
        }

        let name = match name.trim() {
            "" => UNNAMED_TASK,
            trimmed => trimmed,
        };
        let entry = StopwatchEntry {
            name: name.to_string(),
            duration: elapsed,
            timestamp: iso_timestamp(self.clock.now()),
        };
        self.history.insert(0, entry.clone());
        self.history.truncate(HISTORY_LIMIT);
        self.persist()?;
        info!(name, duration = elapsed, "stopwatch session recorded");
        Ok(Some(entry))
    }

    pub fn delete_entry(&mut self, index: usize) -> Result<StopwatchEntry> {
        if index >= self.history.len() {
            return Err(DeskError::UnknownStopwatchEntry(index));
        }
        let removed = self.history.remove(index);
        self.persist()?;
        info!(name = %removed.name, "stopwatch session deleted");
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        save_json(self.store.as_ref(), Slot::StopwatchHistory, &self.history)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn setup() -> (Arc<MemoryStore>, Arc<ManualClock>, Stopwatch) {
        let memory = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()));
        let (stopwatch, _) = Stopwatch::load(memory.clone(), clock.clone()).unwrap();
        (memory, clock, stopwatch)
    }

    #[test]
    fn elapsed_time_only_grows_while_running() {
        let (_, clock, mut stopwatch) = setup();
        assert!(stopwatch.start());
        assert!(!stopwatch.start());
        clock.advance(Duration::seconds(90));
        assert!(stopwatch.pause());
        assert!(!stopwatch.pause());

        clock.advance(Duration::seconds(600));
        assert_eq!(stopwatch.status(), StopwatchStatus { running: false, elapsed_secs: 90 });

        stopwatch.start();
        clock.advance(Duration::milliseconds(2500));
        assert_eq!(stopwatch.elapsed_secs(), 92);
    }

    #[test]
    fn reset_records_a_named_session() {
        let (memory, clock, mut stopwatch) = setup();
        stopwatch.start();
        clock.advance(Duration::seconds(75));

        let entry = stopwatch.reset("  ").unwrap().unwrap();
        assert_eq!(entry.name, UNNAMED_TASK);
        assert_eq!(entry.duration, 75);
        assert_eq!(stopwatch.status(), StopwatchStatus { running: false, elapsed_secs: 0 });
        assert!(memory.get(Slot::StopwatchHistory).unwrap().contains(UNNAMED_TASK));

        assert_eq!(stopwatch.reset("Nothing").unwrap(), None);
        assert_eq!(stopwatch.history().len(), 1);
    }

    #[test]
    fn history_keeps_the_newest_sessions() {
        let (_, clock, mut stopwatch) = setup();
        for n in 0..(HISTORY_LIMIT + 3) {
            stopwatch.start();
            clock.advance(Duration::seconds(1));
            stopwatch.reset(&format!("Task {n}")).unwrap();
        }

        assert_eq!(stopwatch.history().len(), HISTORY_LIMIT);
        assert_eq!(stopwatch.history()[0].name, format!("Task {}", HISTORY_LIMIT + 2));
        assert_eq!(stopwatch.history()[HISTORY_LIMIT - 1].name, "Task 3");
    }

    #[test]
    fn delete_entry_checks_the_index() {
        let (memory, clock, mut stopwatch) = setup();
        stopwatch.start();
        clock.advance(Duration::seconds(5));
        stopwatch.reset("Backup").unwrap();

        assert!(matches!(stopwatch.delete_entry(3), Err(DeskError::UnknownStopwatchEntry(3))));
        assert_eq!(stopwatch.delete_entry(0).unwrap().name, "Backup");
        assert_eq!(memory.get(Slot::StopwatchHistory).unwrap().trim(), "[]");
    }

    #[test]
    fn corrupt_history_starts_empty() {
        let memory = Arc::new(MemoryStore::new().with_slot(Slot::StopwatchHistory, "{oops"));
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()));
        let (stopwatch, outcome) = Stopwatch::load(memory, clock).unwrap();
        assert!(matches!(outcome, LoadOutcome::Recovered(_)));
        assert!(stopwatch.history().is_empty());
    }
}

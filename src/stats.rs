//! Call statistics for the "today" and "all-time" windows, plus the
//! derived views shown in the statistics tables.

use crate::categories::CategoryStore;
use crate::clock::{date_key, iso_timestamp, Clock};
use crate::errors::{DeskError, LoadOutcome, Result};
use crate::keys::{CategoryStatKey, MainKey, SubKey};
use crate::storage::{save_json, KeyValueStore, Slot};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Window {
    Today,
    #[serde(alias = "all-time", alias = "alltime")]
    AllTime,
}

impl Window {
    pub fn as_str(self) -> &'static str {
        match self {
            Window::Today => "today",
            Window::AllTime => "allTime",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStats {
    pub calls: u64,
    pub inbound: u64,
    pub outbound: u64,
}

impl CallStats {
    pub fn total_minutes(&self) -> u64 {
        self.inbound.saturating_add(self.outbound)
    }

    /// Rounded minutes per call, 0 without calls.
    pub fn average_minutes(&self) -> u64 {
        if self.calls == 0 {
            return 0;
        }
        (self.total_minutes() as f64 / self.calls as f64).round() as u64
    }

    fn add(&mut self, other: CallStats) {
        self.calls = self.calls.saturating_add(other.calls);
        self.inbound = self.inbound.saturating_add(other.inbound);
        self.outbound = self.outbound.saturating_add(other.outbound);
    }
}

type Counters = BTreeMap<CategoryStatKey, u64>;

/// Persisted shape of the aggregate. Maps are sparse: a zero counter is
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    #[serde(default, alias = "today")]
    pub today_calls: Counters,
    #[serde(default)]
    pub today_inbound: Counters,
    #[serde(default)]
    pub today_outbound: Counters,
    #[serde(default, alias = "allTime")]
    pub all_time_calls: Counters,
    #[serde(default)]
    pub all_time_inbound: Counters,
    #[serde(default)]
    pub all_time_outbound: Counters,
    #[serde(default)]
    pub today_timestamps: Vec<String>,
    #[serde(default)]
    pub all_time_timestamps: Vec<String>,
    #[serde(default, alias = "lastDate")]
    pub last_reset_date: String,
}

impl StatsData {
    fn empty(today: String) -> Self {
        Self {
            today_calls: Counters::new(),
            today_inbound: Counters::new(),
            today_outbound: Counters::new(),
            all_time_calls: Counters::new(),
            all_time_inbound: Counters::new(),
            all_time_outbound: Counters::new(),
            today_timestamps: Vec::new(),
            all_time_timestamps: Vec::new(),
            last_reset_date: today,
        }
    }

    fn window(&self, window: Window) -> [&Counters; 3] {
        match window {
            Window::Today => [&self.today_calls, &self.today_inbound, &self.today_outbound],
            Window::AllTime => [
                &self.all_time_calls,
                &self.all_time_inbound,
                &self.all_time_outbound,
            ],
        }
    }

    fn window_mut(&mut self, window: Window) -> ([&mut Counters; 3], &mut Vec<String>) {
        match window {
            Window::Today => (
                [
                    &mut self.today_calls,
                    &mut self.today_inbound,
                    &mut self.today_outbound,
                ],
                &mut self.today_timestamps,
            ),
            Window::AllTime => (
                [
                    &mut self.all_time_calls,
                    &mut self.all_time_inbound,
                    &mut self.all_time_outbound,
                ],
                &mut self.all_time_timestamps,
            ),
        }
    }
}

pub struct StatsAggregate {
    data: StatsData,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl StatsAggregate {
    pub fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Result<(Self, LoadOutcome)> {
        let today = date_key(clock.today());
        let (data, outcome) = match store.read(Slot::Stats)? {
            None => (StatsData::empty(today), LoadOutcome::Created),
            Some(raw) => match serde_json::from_str::<StatsData>(&raw) {
                Ok(data) => (data, LoadOutcome::Loaded),
                Err(err) => {
                    warn!(error = %err, "saved call stats unusable, starting empty");
                    let err = DeskError::CorruptPersistedState {
                        slot: "call statistics",
                        reason: err.to_string(),
                    };
                    (StatsData::empty(today), LoadOutcome::Recovered(err))
                }
            },
        };

        let mut aggregate = Self { data, store, clock };
        if !aggregate.roll_over_if_stale()? && !matches!(outcome, LoadOutcome::Loaded) {
            aggregate.persist()?;
        }
        Ok((aggregate, outcome))
    }

    /// Clears the today window when the stored reset date is not the
    /// clock's current day. Returns whether a rollover happened.
    pub fn roll_over_if_stale(&mut self) -> Result<bool> {
        let today = date_key(self.clock.today());
        if self.data.last_reset_date == today {
            return Ok(false);
        }

        let previous = std::mem::replace(&mut self.data.last_reset_date, today);
        self.data.today_calls.clear();
        self.data.today_inbound.clear();
        self.data.today_outbound.clear();
        self.data.today_timestamps.clear();
        self.persist()?;
        info!(previous = %previous, today = %self.data.last_reset_date, "today stats rolled over");
        Ok(true)
    }

    pub fn data(&self) -> &StatsData {
        &self.data
    }

    pub fn stats_for(&self, key: &CategoryStatKey, window: Window) -> CallStats {
        let [calls, inbound, outbound] = self.data.window(window);
        CallStats {
            calls: calls.get(key).copied().unwrap_or(0),
            inbound: inbound.get(key).copied().unwrap_or(0),
            outbound: outbound.get(key).copied().unwrap_or(0),
        }
    }

    /// Totals over every key, including keys of deleted categories.
    pub fn window_totals(&self, window: Window) -> CallStats {
        let [calls, inbound, outbound] = self.data.window(window);
        CallStats {
            calls: saturating_sum(calls),
            inbound: saturating_sum(inbound),
            outbound: saturating_sum(outbound),
        }
    }

    pub fn timestamps(&self, window: Window) -> &[String] {
        match window {
            Window::Today => &self.data.today_timestamps,
            Window::AllTime => &self.data.all_time_timestamps,
        }
    }

    /// Fails with [`DeskError::TimeOutOfRange`] when committing these
    /// amounts would overflow a counter of `key`.
    pub fn check_commit(&self, key: &CategoryStatKey, inbound: u64, outbound: u64) -> Result<()> {
        for window in [Window::Today, Window::AllTime] {
            let [calls, inbound_map, outbound_map] = self.data.window(window);
            let fits = [(calls, 1), (inbound_map, inbound), (outbound_map, outbound)]
                .iter()
                .all(|(map, amount)| map.get(key).copied().unwrap_or(0).checked_add(*amount).is_some());
            if !fits {
                return Err(DeskError::TimeOutOfRange);
            }
        }
        Ok(())
    }

    /// Records one call in both windows and returns the timestamp used.
    pub fn commit(&mut self, key: &CategoryStatKey, inbound: u64, outbound: u64) -> Result<String> {
        self.check_commit(key, inbound, outbound)?;
        let timestamp = iso_timestamp(self.clock.now());

        for window in [Window::Today, Window::AllTime] {
            let ([calls, inbound_map, outbound_map], timestamps) = self.data.window_mut(window);
            increment(calls, key, 1);
            increment(inbound_map, key, inbound);
            increment(outbound_map, key, outbound);
            timestamps.push(timestamp.clone());
        }

        self.persist()?;
        info!(key = %key, inbound, outbound, %timestamp, "call committed");
        Ok(timestamp)
    }

    /// Takes back a commit. A window whose counters are already below the
    /// amounts (e.g. today's window after a rollover) is left untouched.
    pub fn reverse(
        &mut self,
        key: &CategoryStatKey,
        inbound: u64,
        outbound: u64,
        timestamp: &str,
    ) -> Result<()> {
        for window in [Window::Today, Window::AllTime] {
            let ([calls, inbound_map, outbound_map], timestamps) = self.data.window_mut(window);
            let amounts = [(&mut *calls, 1), (&mut *inbound_map, inbound), (&mut *outbound_map, outbound)];
            if amounts
                .iter()
                .any(|(map, amount)| map.get(key).copied().unwrap_or(0) < *amount)
            {
                warn!(key = %key, window = window.as_str(), "counters below reversal amount, skipping window");
                continue;
            }
            for (map, amount) in amounts {
                decrement(map, key, amount);
            }
            if let Some(index) = timestamps.iter().position(|t| t == timestamp) {
                timestamps.remove(index);
            }
        }

        self.persist()?;
        info!(key = %key, inbound, outbound, timestamp, "call reversed");
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        save_json(self.store.as_ref(), Slot::Stats, &self.data)?;
        Ok(())
    }
}

fn increment(map: &mut Counters, key: &CategoryStatKey, amount: u64) {
    if amount > 0 {
        let value = map.entry(key.clone()).or_insert(0);
        *value = value.saturating_add(amount);
    }
}

fn saturating_sum(map: &Counters) -> u64 {
    map.values().fold(0, |sum, value| sum.saturating_add(*value))
}

fn decrement(map: &mut Counters, key: &CategoryStatKey, amount: u64) {
    if let Some(value) = map.get_mut(key) {
        *value -= amount;
        if *value == 0 {
            map.remove(key);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubcategoryRow {
    pub key: SubKey,
    pub name: String,
    pub stats: CallStats,
    pub average_minutes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MainCategoryRow {
    pub key: MainKey,
    pub name: String,
    pub totals: CallStats,
    pub average_minutes: u64,
    /// Share of the window's calls, one decimal.
    pub percentage: f64,
    pub subcategories: Vec<SubcategoryRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdown {
    pub window: Window,
    pub total_calls: u64,
    pub totals: CallStats,
    pub average_minutes: u64,
    pub categories: Vec<MainCategoryRow>,
}

/// Per-category statistics for every category currently defined.
pub fn build_breakdown(
    categories: &CategoryStore,
    stats: &StatsAggregate,
    window: Window,
) -> CategoryBreakdown {
    let mut totals = CallStats::default();
    let mut rows = Vec::with_capacity(categories.tree().len());

    for (main_key, category) in categories.sorted() {
        let mut main_totals = CallStats::default();
        let subcategories = category
            .subcategories
            .iter()
            .map(|(sub_key, sub)| {
                let sub_stats = stats.stats_for(&CategoryStatKey::compose(main_key, sub_key), window);
                main_totals.add(sub_stats);
                SubcategoryRow {
                    key: sub_key.clone(),
                    name: sub.name.clone(),
                    stats: sub_stats,
                    average_minutes: sub_stats.average_minutes(),
                }
            })
            .collect();

        totals.add(main_totals);
        rows.push(MainCategoryRow {
            key: main_key.clone(),
            name: category.name.clone(),
            totals: main_totals,
            average_minutes: main_totals.average_minutes(),
            percentage: 0.0,
            subcategories,
        });
    }

    for row in &mut rows {
        row.percentage = percentage(row.totals.calls, totals.calls);
    }

    CategoryBreakdown {
        window,
        total_calls: totals.calls,
        totals,
        average_minutes: totals.average_minutes(),
        categories: rows,
    }
}

pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Running totals shown beside the time inputs.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TodayTotals {
    pub inbound: u64,
    pub outbound: u64,
    pub total: u64,
}

pub fn today_totals(stats: &StatsAggregate, pending_inbound: u64, pending_outbound: u64) -> TodayTotals {
    let logged = stats.window_totals(Window::Today);
    let inbound = logged.inbound.saturating_add(pending_inbound);
    let outbound = logged.outbound.saturating_add(pending_outbound);
    TodayTotals {
        inbound,
        outbound,
        total: inbound.saturating_add(outbound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn setup() -> (Arc<MemoryStore>, Arc<ManualClock>, StatsAggregate) {
        let memory = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap(),
        ));
        let (stats, _) = StatsAggregate::load(memory.clone(), clock.clone()).unwrap();
        (memory, clock, stats)
    }

    fn key(raw: &str) -> CategoryStatKey {
        CategoryStatKey::from(raw)
    }

    #[test]
    fn fresh_aggregate_is_empty_and_dated_today() {
        let (memory, _, stats) = setup();
        assert_eq!(stats.data().last_reset_date, "2026-10-19");
        assert_eq!(stats.stats_for(&key("helppi_vpn"), Window::AllTime), CallStats::default());
        assert!(memory.get(Slot::Stats).is_some());
    }

    #[test]
    fn commit_updates_both_windows() {
        let (_, _, mut stats) = setup();
        let k = key("helppi_password_reset");
        let ts = stats.commit(&k, 5, 0).unwrap();
        stats.commit(&k, 2, 3).unwrap();

        let expected = CallStats { calls: 2, inbound: 7, outbound: 3 };
        assert_eq!(stats.stats_for(&k, Window::Today), expected);
        assert_eq!(stats.stats_for(&k, Window::AllTime), expected);
        assert_eq!(ts, "2026-10-19T09:00:00.000Z");
        assert_eq!(stats.timestamps(Window::Today).len(), 2);
    }

    #[test]
    fn reverse_restores_sparse_maps() {
        let (_, clock, mut stats) = setup();
        let other = key("aspa_lasku");
        stats.commit(&other, 4, 4).unwrap();
        let before = stats.data().clone();

        clock.advance(Duration::seconds(10));
        let k = key("helppi_password_reset");
        let ts = stats.commit(&k, 5, 0).unwrap();
        assert!(!stats.data().today_outbound.contains_key(&k));

        stats.reverse(&k, 5, 0, &ts).unwrap();
        assert_eq!(stats.data(), &before);
        assert!(!stats.data().today_calls.contains_key(&k));
    }

    #[test]
    fn reverse_removes_only_the_first_matching_timestamp() {
        let (_, _, mut stats) = setup();
        let k = key("helppi_vpn");
        let ts = stats.commit(&k, 1, 0).unwrap();
        stats.commit(&k, 1, 0).unwrap();

        stats.reverse(&k, 1, 0, &ts).unwrap();
        assert_eq!(stats.timestamps(Window::AllTime), &[ts.clone()]);
        assert_eq!(stats.stats_for(&k, Window::AllTime).calls, 1);
    }

    #[test]
    fn reverse_skips_window_with_insufficient_counters() {
        let (_, clock, mut stats) = setup();
        let k = key("helppi_vpn");
        let ts = stats.commit(&k, 5, 1).unwrap();

        clock.advance(Duration::days(1));
        assert!(stats.roll_over_if_stale().unwrap());
        stats.reverse(&k, 5, 1, &ts).unwrap();

        assert_eq!(stats.stats_for(&k, Window::Today), CallStats::default());
        assert_eq!(stats.stats_for(&k, Window::AllTime), CallStats::default());
        assert!(stats.timestamps(Window::AllTime).is_empty());
    }

    #[test]
    fn rollover_clears_today_once_per_day() {
        let (memory, clock, mut stats) = setup();
        let k = key("aspa_lasku");
        stats.commit(&k, 3, 0).unwrap();

        clock.advance(Duration::days(1));
        let (mut reloaded, _) = StatsAggregate::load(memory.clone(), clock.clone()).unwrap();
        assert_eq!(reloaded.stats_for(&k, Window::Today), CallStats::default());
        assert_eq!(reloaded.stats_for(&k, Window::AllTime).calls, 1);
        assert_eq!(reloaded.data().last_reset_date, "2026-10-20");

        reloaded.commit(&k, 1, 0).unwrap();
        let (again, _) = StatsAggregate::load(memory, clock).unwrap();
        assert_eq!(again.stats_for(&k, Window::Today).calls, 1);
        assert_eq!(again.stats_for(&k, Window::AllTime).calls, 2);
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let raw = r#"{"today":{"helppi_vpn":2},"todayInbound":{"helppi_vpn":9},
            "allTime":{"helppi_vpn":5},"lastDate":"Mon Oct 19 2026"}"#;
        let memory = Arc::new(MemoryStore::new().with_slot(Slot::Stats, raw));
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()));
        let (stats, outcome) = StatsAggregate::load(memory, clock).unwrap();

        assert!(matches!(outcome, LoadOutcome::Loaded));
        assert_eq!(stats.stats_for(&key("helppi_vpn"), Window::AllTime).calls, 5);
        assert_eq!(stats.stats_for(&key("helppi_vpn"), Window::Today), CallStats::default());
    }

    #[test]
    fn corrupt_stats_start_empty() {
        let memory = Arc::new(MemoryStore::new().with_slot(Slot::Stats, "[oops"));
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()));
        let (stats, outcome) = StatsAggregate::load(memory.clone(), clock).unwrap();
        assert!(matches!(outcome, LoadOutcome::Recovered(_)));
        assert_eq!(stats.window_totals(Window::AllTime), CallStats::default());
        assert!(memory.get(Slot::Stats).unwrap().contains("lastResetDate"));
    }

    #[test]
    fn breakdown_sums_per_main_category() {
        let memory = Arc::new(MemoryStore::new());
        let (mut categories, _) = CategoryStore::load(memory.clone()).unwrap();
        let helppi = MainKey::from("helppi");
        let vpn = categories.add_subcategory(&helppi, "VPN", "").unwrap();
        let mfa = categories.add_subcategory(&helppi, "MFA", "").unwrap();
        let aspa = MainKey::from("aspa");
        let lasku = categories.add_subcategory(&aspa, "Lasku", "").unwrap();

        let (_, clock, mut stats) = setup();
        stats.commit(&CategoryStatKey::compose(&helppi, &vpn), 10, 0).unwrap();
        stats.commit(&CategoryStatKey::compose(&helppi, &mfa), 0, 5).unwrap();
        clock.advance(Duration::minutes(1));
        stats.commit(&CategoryStatKey::compose(&aspa, &lasku), 3, 0).unwrap();
        stats.commit(&key("deleted_old"), 50, 50).unwrap();

        let breakdown = build_breakdown(&categories, &stats, Window::Today);
        assert_eq!(breakdown.total_calls, 3);
        let helppi_row = breakdown.categories.iter().find(|row| row.key == helppi).unwrap();
        assert_eq!(helppi_row.totals, CallStats { calls: 2, inbound: 10, outbound: 5 });
        assert_eq!(helppi_row.average_minutes, 8);
        assert_eq!(helppi_row.percentage, 66.7);
        assert_eq!(stats.window_totals(Window::Today).calls, 4);
    }

    #[test]
    fn overflowing_commit_is_rejected_before_any_counter_moves() {
        let (_, _, mut stats) = setup();
        let k = key("helppi_vpn");
        stats.commit(&k, u64::MAX, 0).unwrap();
        let before = stats.data().clone();

        assert!(matches!(stats.commit(&k, 1, 0), Err(DeskError::TimeOutOfRange)));
        assert_eq!(stats.data(), &before);

        stats.commit(&key("aspa_lasku"), 5, 0).unwrap();
        let totals = stats.window_totals(Window::Today);
        assert_eq!((totals.calls, totals.inbound), (2, u64::MAX));
        assert_eq!(today_totals(&stats, 10, 0).total, u64::MAX);
    }

    #[test]
    fn today_totals_include_pending_minutes() {
        let (_, _, mut stats) = setup();
        stats.commit(&key("aspa_lasku"), 3, 2).unwrap();
        let totals = today_totals(&stats, 4, 0);
        assert_eq!((totals.inbound, totals.outbound, totals.total), (7, 2, 9));
    }
}

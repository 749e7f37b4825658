use crate::categories::CategoryStore;
use crate::keys::{MainKey, SubKey};
use crate::logger::{sum_entries, CallRequest, LoggedCall};
use crate::stats::{CallStats, CategoryBreakdown, TodayTotals};
use crate::stopwatch::{Stopwatch, StopwatchEntry, StopwatchStatus};
use crate::undo::LastLoggedCall;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SubcategoryRequest {
    pub name: String,
    #[serde(default)]
    pub template: String,
}

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub template: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StopwatchResetRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: u8,
}

#[derive(Debug, Default, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PendingMinutesQuery {
    #[serde(default)]
    pub inbound: u64,
    #[serde(default)]
    pub outbound: u64,
}

/// Logging form as posted by the page: every time input is one entry,
/// `null` when left blank.
#[derive(Debug, Deserialize)]
pub struct LogCallBody {
    #[serde(default)]
    pub main_key: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub inbound: Vec<Option<u64>>,
    #[serde(default)]
    pub outbound: Vec<Option<u64>>,
}

impl LogCallBody {
    pub fn into_request(self) -> CallRequest {
        CallRequest {
            inbound_minutes: sum_entries(&self.inbound),
            outbound_minutes: sum_entries(&self.outbound),
            main_key: self.main_key,
            subcategory: self.subcategory,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogCallResponse {
    #[serde(flatten)]
    pub logged: LoggedCall,
    pub today: CallStats,
    pub undo_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct UndoStatus {
    pub pending: Option<LastLoggedCall>,
    pub seconds_left: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SubcategoryView {
    pub key: SubKey,
    pub name: String,
    pub template: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub key: MainKey,
    pub name: String,
    pub subcategories: Vec<SubcategoryView>,
}

pub fn category_views(categories: &CategoryStore) -> Vec<CategoryView> {
    categories
        .sorted()
        .into_iter()
        .map(|(key, category)| CategoryView {
            key: key.clone(),
            name: category.name.clone(),
            subcategories: category
                .subcategories
                .iter()
                .map(|(sub_key, sub)| SubcategoryView {
                    key: sub_key.clone(),
                    name: sub.name.clone(),
                    template: sub.template.clone(),
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct SuggestionView {
    pub key: SubKey,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub breakdown: CategoryBreakdown,
    /// Includes statistics of deleted categories.
    pub all_keys: CallStats,
}

#[derive(Debug, Serialize)]
pub struct TotalsResponse {
    pub date: String,
    #[serde(flatten)]
    pub totals: TodayTotals,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomFieldView {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct StopwatchView {
    #[serde(flatten)]
    pub status: StopwatchStatus,
    pub history: Vec<StopwatchEntry>,
}

impl StopwatchView {
    pub fn of(stopwatch: &Stopwatch) -> Self {
        Self {
            status: stopwatch.status(),
            history: stopwatch.history().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_time_entries_stay_absent() {
        let body: LogCallBody = serde_json::from_str(
            r#"{"main_key":"helppi","subcategory":"VPN","inbound":[null,null],"outbound":[0]}"#,
        )
        .unwrap();
        let request = body.into_request();
        assert_eq!(request.inbound_minutes, None);
        assert_eq!(request.outbound_minutes, Some(0));
    }
}

//! Logging a call: validation, subcategory creation, commit, undo arming.

use crate::categories::CategoryStore;
use crate::errors::{DeskError, Result};
use crate::keys::{CategoryStatKey, MainKey, SubKey};
use crate::stats::StatsAggregate;
use crate::undo::{LastLoggedCall, UndoController};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Raw input of the logging form. `None` minutes mean the field was left
/// blank, which is different from an explicit `0`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallRequest {
    #[serde(default)]
    pub main_key: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub inbound_minutes: Option<u64>,
    #[serde(default)]
    pub outbound_minutes: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggedCall {
    pub call: LastLoggedCall,
    /// Display name of a subcategory created by this call.
    pub created_subcategory: Option<String>,
    pub undo_generation: u64,
}

/// Sums the filled-in entries; `None` when every entry is blank.
pub fn sum_entries(entries: &[Option<u64>]) -> Option<u64> {
    entries
        .iter()
        .flatten()
        .fold(None, |sum, minutes| Some(sum.unwrap_or(0).saturating_add(*minutes)))
}

pub struct CallLogger<'a> {
    pub categories: &'a mut CategoryStore,
    pub stats: &'a mut StatsAggregate,
    pub undo: &'a mut UndoController,
}

enum Target {
    Existing(SubKey),
    Create(String),
}

impl CallLogger<'_> {
    pub fn log_call(&mut self, request: &CallRequest) -> Result<LoggedCall> {
        let main_input = request.main_key.trim();
        if main_input.is_empty() {
            return Err(DeskError::MissingMainCategory);
        }
        let subcategory_input = request.subcategory.trim();
        if subcategory_input.is_empty() {
            return Err(DeskError::MissingSubcategory);
        }

        let main_key = MainKey::from(main_input);
        let category = self
            .categories
            .get(&main_key)
            .ok_or_else(|| DeskError::UnknownMainCategory(main_key.to_string()))?;

        let target = match self.categories.resolve_subcategory(&main_key, subcategory_input) {
            Some(key) => Target::Existing(key),
            None => {
                let key = SubKey::from_name(subcategory_input);
                if key.is_empty() {
                    return Err(DeskError::EmptyName);
                }
                if category.subcategories.contains_key(&key) {
                    return Err(DeskError::DuplicateKey(subcategory_input.to_string()));
                }
                Target::Create(subcategory_input.to_string())
            }
        };

        if request.inbound_minutes.is_none() && request.outbound_minutes.is_none() {
            return Err(DeskError::NoTimeEntered);
        }
        let inbound_minutes = request.inbound_minutes.unwrap_or(0);
        let outbound_minutes = request.outbound_minutes.unwrap_or(0);
        let planned_key = match &target {
            Target::Existing(key) => key.clone(),
            Target::Create(name) => SubKey::from_name(name),
        };
        self.stats.check_commit(
            &CategoryStatKey::compose(&main_key, &planned_key),
            inbound_minutes,
            outbound_minutes,
        )?;

        let (sub_key, created_subcategory) = match target {
            Target::Existing(key) => (key, None),
            Target::Create(name) => {
                let key = self.categories.add_subcategory(&main_key, &name, "")?;
                (key, Some(name))
            }
        };

        let category_stat_key = CategoryStatKey::compose(&main_key, &sub_key);
        let timestamp = self
            .stats
            .commit(&category_stat_key, inbound_minutes, outbound_minutes)?;

        let call = LastLoggedCall {
            category_stat_key,
            main_key,
            sub_key,
            inbound_minutes,
            outbound_minutes,
            timestamp,
        };
        let undo_generation = self.undo.arm(call.clone());
        info!(
            key = %call.category_stat_key,
            inbound_minutes,
            outbound_minutes,
            created = created_subcategory.is_some(),
            "call logged"
        );

        Ok(LoggedCall {
            call,
            created_subcategory,
            undo_generation,
        })
    }
}

//! Main categories, their subcategories and subcategory templates.

use crate::errors::{DeskError, LoadOutcome, Result};
use crate::keys::{MainKey, SubKey};
use crate::storage::{save_json, KeyValueStore, Slot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub name: String,
    #[serde(default)]
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub subcategories: BTreeMap<SubKey, Subcategory>,
}

impl Category {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subcategories: BTreeMap::new(),
        }
    }
}

pub type CategoryTree = BTreeMap<MainKey, Category>;

/// Baseline categories that every load restores.
pub const DEFAULT_CATEGORIES: [(&str, &str); 3] = [
    ("helppi", "Helppi"),
    ("kayttotuki", "Käyttötuki"),
    ("aspa", "Aspa"),
];

pub fn default_categories() -> CategoryTree {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(key, name)| (MainKey::from(*key), Category::new(*name)))
        .collect()
}

pub struct CategoryStore {
    tree: CategoryTree,
    store: Arc<dyn KeyValueStore>,
}

impl CategoryStore {
    /// Reads the persisted tree, healing it with the baseline categories.
    /// Unusable data is replaced by the defaults and reported as
    /// [`LoadOutcome::Recovered`].
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<(Self, LoadOutcome)> {
        let raw = store.read(Slot::Categories)?;

        let (tree, outcome) = match raw {
            None => (default_categories(), LoadOutcome::Created),
            Some(raw) => match parse_tree(&raw) {
                Ok(mut tree) => {
                    for (key, category) in default_categories() {
                        tree.entry(key).or_insert(category);
                    }
                    (tree, LoadOutcome::Loaded)
                }
                Err(reason) => {
                    warn!(%reason, "saved categories unusable, restoring defaults");
                    let err = DeskError::CorruptPersistedState {
                        slot: "categories",
                        reason,
                    };
                    (default_categories(), LoadOutcome::Recovered(err))
                }
            },
        };

        let loaded = Self { tree, store };
        loaded.persist()?;
        Ok((loaded, outcome))
    }

    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    pub fn get(&self, main: &MainKey) -> Option<&Category> {
        self.tree.get(main)
    }

    pub fn subcategory(&self, main: &MainKey, sub: &SubKey) -> Option<&Subcategory> {
        self.tree.get(main)?.subcategories.get(sub)
    }

    /// Main categories ordered by display name.
    pub fn sorted(&self) -> Vec<(&MainKey, &Category)> {
        let mut entries: Vec<_> = self.tree.iter().collect();
        entries.sort_by(|(a_key, a), (b_key, b)| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a_key.cmp(b_key))
        });
        entries
    }

    pub fn add_main_category(&mut self, display_name: &str) -> Result<MainKey> {
        let name = display_name.trim();
        let key = MainKey::from_name(name);
        if key.is_empty() {
            return Err(DeskError::EmptyName);
        }
        let name_taken = self
            .tree
            .values()
            .any(|category| category.name.to_lowercase() == name.to_lowercase());
        if self.tree.contains_key(&key) || name_taken {
            return Err(DeskError::DuplicateKey(name.to_string()));
        }

        self.tree.insert(key.clone(), Category::new(name));
        self.persist()?;
        info!(main = %key, name, "main category added");
        Ok(key)
    }

    pub fn add_subcategory(
        &mut self,
        main: &MainKey,
        display_name: &str,
        template: &str,
    ) -> Result<SubKey> {
        let name = display_name.trim();
        let category = self
            .tree
            .get_mut(main)
            .ok_or_else(|| DeskError::UnknownMainCategory(main.to_string()))?;
        let key = SubKey::from_name(name);
        if key.is_empty() {
            return Err(DeskError::EmptyName);
        }
        let name_taken = category
            .subcategories
            .values()
            .any(|sub| sub.name.to_lowercase() == name.to_lowercase());
        if category.subcategories.contains_key(&key) || name_taken {
            return Err(DeskError::DuplicateKey(name.to_string()));
        }

        category.subcategories.insert(
            key.clone(),
            Subcategory {
                name: name.to_string(),
                template: template.trim().to_string(),
            },
        );
        self.persist()?;
        info!(main = %main, sub = %key, name, "subcategory added");
        Ok(key)
    }

    /// Finds an existing subcategory by case-insensitive name, then by
    /// literal key. `None` means the caller may create it.
    pub fn resolve_subcategory(&self, main: &MainKey, input: &str) -> Option<SubKey> {
        let subcategories = &self.tree.get(main)?.subcategories;
        let wanted = input.trim().to_lowercase();

        subcategories
            .iter()
            .find(|(_, sub)| sub.name.to_lowercase() == wanted)
            .map(|(key, _)| key.clone())
            .or_else(|| {
                let literal = SubKey::from(input.trim());
                subcategories.contains_key(&literal).then_some(literal)
            })
    }

    /// Subcategory names under `main` containing `input`, ignoring case.
    pub fn suggest_subcategories(&self, main: &MainKey, input: &str) -> Vec<(SubKey, String)> {
        let Some(category) = self.tree.get(main) else {
            return Vec::new();
        };
        let needle = input.trim().to_lowercase();
        category
            .subcategories
            .iter()
            .filter(|(_, sub)| needle.is_empty() || sub.name.to_lowercase().contains(&needle))
            .map(|(key, sub)| (key.clone(), sub.name.clone()))
            .collect()
    }

    pub fn update_subcategory_template(
        &mut self,
        main: &MainKey,
        sub: &SubKey,
        template: &str,
    ) -> Result<()> {
        let entry = self
            .tree
            .get_mut(main)
            .and_then(|category| category.subcategories.get_mut(sub))
            .ok_or_else(|| unknown_category(main, sub))?;
        entry.template = template.to_string();
        self.persist()?;
        info!(main = %main, sub = %sub, "subcategory template updated");
        Ok(())
    }

    pub fn delete_subcategory(&mut self, main: &MainKey, sub: &SubKey) -> Result<Subcategory> {
        let removed = self
            .tree
            .get_mut(main)
            .and_then(|category| category.subcategories.remove(sub))
            .ok_or_else(|| unknown_category(main, sub))?;
        self.persist()?;
        info!(main = %main, sub = %sub, "subcategory deleted");
        Ok(removed)
    }

    /// Removes the category with all of its subcategories. Statistics
    /// recorded against it are left alone.
    pub fn delete_main_category(&mut self, main: &MainKey) -> Result<Category> {
        let removed = self
            .tree
            .remove(main)
            .ok_or_else(|| DeskError::UnknownMainCategory(main.to_string()))?;
        self.persist()?;
        info!(
            main = %main,
            subcategories = removed.subcategories.len(),
            "main category deleted"
        );
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        save_json(self.store.as_ref(), Slot::Categories, &self.tree)?;
        Ok(())
    }
}

fn unknown_category(main: &MainKey, sub: &SubKey) -> DeskError {
    DeskError::UnknownCategory {
        main: main.to_string(),
        sub: sub.to_string(),
    }
}

/// Keeps every usable entry of a stored tree. The tree as a whole is only
/// rejected when it is not a mapping or no entry has a display name.
fn parse_tree(raw: &str) -> std::result::Result<CategoryTree, String> {
    let value: Value = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    let Value::Object(entries) = value else {
        return Err("expected a mapping of categories".to_string());
    };

    let mut tree = CategoryTree::new();
    for (key, entry) in entries {
        match parse_category(entry) {
            Some(category) => {
                tree.insert(MainKey::from(key), category);
            }
            None => warn!(main = %key, "skipping unusable saved category"),
        }
    }
    if tree.is_empty() {
        return Err("no category has a display name".to_string());
    }
    Ok(tree)
}

fn parse_category(entry: Value) -> Option<Category> {
    let Value::Object(mut fields) = entry else {
        return None;
    };
    let name = display_name(fields.get("name"))?;
    let mut category = Category::new(name);

    if let Some(Value::Object(subcategories)) = fields.remove("subcategories") {
        for (key, sub) in subcategories {
            match serde_json::from_value::<Subcategory>(sub) {
                Ok(sub) if !sub.name.trim().is_empty() => {
                    category.subcategories.insert(SubKey::from(key), sub);
                }
                _ => warn!(sub = %key, "skipping unusable saved subcategory"),
            }
        }
    }
    Some(category)
}

fn display_name(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
}

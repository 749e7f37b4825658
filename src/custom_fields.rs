use crate::errors::{DeskError, LoadOutcome, Result};
use crate::storage::{save_json, KeyValueStore, Slot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub name: String,
}

/// User-defined extra summary lines, in display order.
pub struct CustomFields {
    fields: Vec<CustomField>,
    store: Arc<dyn KeyValueStore>,
}

impl CustomFields {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<(Self, LoadOutcome)> {
        let (fields, outcome) = match store.read(Slot::CustomFields)? {
            None => (Vec::new(), LoadOutcome::Created),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(fields) => (fields, LoadOutcome::Loaded),
                Err(err) => {
                    warn!(error = %err, "saved custom fields unusable, starting empty");
                    let err = DeskError::CorruptPersistedState {
                        slot: "custom fields",
                        reason: err.to_string(),
                    };
                    (Vec::new(), LoadOutcome::Recovered(err))
                }
            },
        };

        let loaded = Self { fields, store };
        if let LoadOutcome::Recovered(_) = outcome {
            loaded.persist()?;
        }
        Ok((loaded, outcome))
    }

    pub fn fields(&self) -> &[CustomField] {
        &self.fields
    }

    pub fn add(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DeskError::EmptyName);
        }
        if self
            .fields
            .iter()
            .any(|field| field.name.to_lowercase() == name.to_lowercase())
        {
            return Err(DeskError::DuplicateKey(name.to_string()));
        }

        self.fields.push(CustomField {
            name: name.to_string(),
        });
        self.persist()?;
        info!(name, "custom field added");
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<CustomField> {
        if index >= self.fields.len() {
            return Err(DeskError::UnknownCustomField(index));
        }
        let removed = self.fields.remove(index);
        self.persist()?;
        info!(name = %removed.name, "custom field deleted");
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        save_json(self.store.as_ref(), Slot::CustomFields, &self.fields)?;
        Ok(())
    }
}

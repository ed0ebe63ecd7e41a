//! Per-dataset display preferences persisted through a [`KeyValueStore`].
//!
//! A dataset with nothing stored reads back as `None` ("unset"), which is
//! different from a stored value that happens to equal a default.

use crate::kv::KeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const KEY_PREFIX: &str = "bowser:prefs:";

/// Colormap and value range remembered for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetPreference {
    pub colormap: String,
    pub vmin: f64,
    pub vmax: f64,
}

impl DatasetPreference {
    pub fn new(colormap: &str, vmin: f64, vmax: f64) -> Self {
        Self {
            colormap: colormap.to_string(),
            vmin,
            vmax,
        }
    }
}

/// Stored shape before numeric coercion; older writers stored the range
/// bounds as strings.
#[derive(Deserialize)]
struct StoredPreference {
    colormap: String,
    vmin: Value,
    vmax: Value,
}

fn coerce_number(field: &str, value: &Value) -> anyhow::Result<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.ok_or_else(|| anyhow::anyhow!("stored {} is not numeric: {}", field, value))
}

fn key_for(dataset_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, dataset_id)
}

/// Read/write access to durable per-dataset preferences.
#[derive(Clone)]
pub struct PreferenceStore<K: KeyValueStore> {
    store: K,
}

impl<K: KeyValueStore> PreferenceStore<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    /// Load the preference for a dataset. `Ok(None)` means unset.
    pub fn get(&self, dataset_id: &str) -> anyhow::Result<Option<DatasetPreference>> {
        let Some(raw) = self.store.get(&key_for(dataset_id))? else {
            return Ok(None);
        };
        let stored: StoredPreference = serde_json::from_str(&raw)?;
        Ok(Some(DatasetPreference {
            colormap: stored.colormap,
            vmin: coerce_number("vmin", &stored.vmin)?,
            vmax: coerce_number("vmax", &stored.vmax)?,
        }))
    }

    /// Persist the preference for a dataset, replacing any previous value.
    ///
    /// Non-finite bounds are refused; JSON would store them as `null`.
    pub fn set(&self, dataset_id: &str, preference: &DatasetPreference) -> anyhow::Result<()> {
        if !(preference.vmin.is_finite() && preference.vmax.is_finite()) {
            anyhow::bail!(
                "range [{}, {}] for {} is not finite",
                preference.vmin,
                preference.vmax,
                dataset_id
            );
        }
        let raw = serde_json::to_string(preference)?;
        self.store.set(&key_for(dataset_id), &raw)?;
        log::debug!("preferences: saved {} -> {}", dataset_id, raw);
        Ok(())
    }
}

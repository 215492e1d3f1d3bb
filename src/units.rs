use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::docstore::DocumentStore;

const UNITS_DOC: &str = "units";
const SETTINGS_DOC: &str = "item_settings";

/// Item settings every deployment starts with: item, default units per
/// container, unit label. `seed_defaults` only installs the ones missing
/// from the current table.
const DEFAULT_ITEM_SETTINGS: &[(&str, u32, &str)] = &[
    ("長ネギ", 50, "本"),
    ("長ねぎバラ", 50, "本"),
    ("長ネギバラ", 50, "本"),
    ("胡瓜", 30, "袋"),
    ("胡瓜バラ", 100, "本"),
    ("青梗菜", 20, "袋"),
    ("春菊", 20, "袋"),
];

/// Per-item fallback settings: the coarse layer under the per-store unit
/// facts, and the source of the explicit unit label shown on labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemSetting {
    pub default_unit: u32,
    pub unit_type: String,
    pub receive_as_boxes: bool,
}

impl Default for ItemSetting {
    fn default() -> Self {
        Self {
            default_unit: 0,
            unit_type: "袋".to_string(),
            receive_as_boxes: false,
        }
    }
}

/// Units-per-container facts keyed by `(item, spec, store)`, plus the
/// per-item settings table. Facts self-populate via `insert_if_absent`
/// and only change through the explicit `set` path, so a human correction
/// is never undone by the normalizer re-reading the same noisy sheet.
pub struct UnitMaster<S: DocumentStore> {
    backend: S,
    units: BTreeMap<String, u32>,
    settings: BTreeMap<String, ItemSetting>,
}

impl<S: DocumentStore> UnitMaster<S> {
    pub fn new(backend: S) -> Self {
        let mut master = Self {
            backend,
            units: BTreeMap::new(),
            settings: BTreeMap::new(),
        };
        master.load();
        master
    }

    fn load(&mut self) {
        // The fine layer parses entry by entry: one bad value drops that
        // entry, not the document.
        self.units = match self.backend.read(UNITS_DOC) {
            Some(raw) => match serde_json::from_str::<BTreeMap<String, Value>>(&raw) {
                Ok(entries) => entries
                    .into_iter()
                    .filter_map(|(key, value)| {
                        let unit = value.as_u64().map(|v| v.min(u64::from(u32::MAX)) as u32);
                        match unit {
                            Some(unit) if unit > 0 => Some((key, unit)),
                            _ => {
                                warn!(key = %key, "Dropping unit entry without a positive count");
                                None
                            }
                        }
                    })
                    .collect(),
                Err(e) => {
                    warn!(doc = UNITS_DOC, error = %e, "Corrupt document, starting empty");
                    BTreeMap::new()
                }
            },
            None => BTreeMap::new(),
        };
        self.settings = match self.backend.read(SETTINGS_DOC) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(doc = SETTINGS_DOC, error = %e, "Corrupt document, starting empty");
                    BTreeMap::new()
                }
            },
            None => BTreeMap::new(),
        };
    }

    fn persist_units(&mut self) {
        match serde_json::to_string_pretty(&self.units) {
            Ok(json) => {
                self.backend.write(UNITS_DOC, &json);
            }
            Err(e) => warn!(doc = UNITS_DOC, error = %e, "Could not serialize document"),
        }
    }

    fn persist_settings(&mut self) {
        match serde_json::to_string_pretty(&self.settings) {
            Ok(json) => {
                self.backend.write(SETTINGS_DOC, &json);
            }
            Err(e) => warn!(doc = SETTINGS_DOC, error = %e, "Could not serialize document"),
        }
    }

    /// Composite key: components trimmed, internal whitespace stripped,
    /// joined with `|`. An empty spec is its own key, not a wildcard.
    fn key(item: &str, spec: &str, store: &str) -> String {
        format!(
            "{}|{}|{}",
            strip_whitespace(item),
            strip_whitespace(spec),
            strip_whitespace(store)
        )
    }

    /// Units per container for `(item, spec, store)`; 0 means unknown.
    pub fn lookup(&self, item: &str, spec: &str, store: &str) -> u32 {
        self.units
            .get(&Self::key(item, spec, store))
            .copied()
            .unwrap_or(0)
    }

    /// Records a fact only when the key is new. Returns whether an insert
    /// happened; an existing fact (or a zero unit) is a defined no-op.
    pub fn insert_if_absent(&mut self, item: &str, spec: &str, store: &str, unit: u32) -> bool {
        if unit == 0 {
            return false;
        }
        let key = Self::key(item, spec, store);
        if self.units.contains_key(&key) {
            return false;
        }
        self.units.insert(key.clone(), unit);
        self.persist_units();
        info!(key = %key, unit, "Registered packing unit");
        true
    }

    /// Unconditional overwrite, the human correction path. Zero units are
    /// ignored.
    pub fn set(&mut self, item: &str, spec: &str, store: &str, unit: u32) {
        if unit == 0 {
            return;
        }
        let key = Self::key(item, spec, store);
        self.units.insert(key.clone(), unit);
        self.persist_units();
        info!(key = %key, unit, "Set packing unit");
    }

    /// Settings for an item; unknown items get the zero-valued default.
    pub fn item_setting(&self, item: &str) -> ItemSetting {
        self.settings.get(item.trim()).cloned().unwrap_or_default()
    }

    /// The stored unit label for an item, only when one was explicitly
    /// configured. Items that merely inherit the default record return
    /// `None` so the heuristic cascade still runs for them.
    pub fn explicit_unit_type(&self, item: &str) -> Option<String> {
        self.settings
            .get(item.trim())
            .filter(|s| !s.unit_type.trim().is_empty())
            .map(|s| s.unit_type.clone())
    }

    pub fn set_item_setting(&mut self, item: &str, setting: ItemSetting) {
        self.settings.insert(item.trim().to_string(), setting);
        self.persist_settings();
    }

    /// Removes an item's settings. Returns `false` when it was absent.
    pub fn remove_item_setting(&mut self, item: &str) -> bool {
        if self.settings.remove(item.trim()).is_none() {
            return false;
        }
        self.persist_settings();
        true
    }

    /// Installs the built-in item settings for items missing from the
    /// table. Safe to call on every start; returns how many were added.
    pub fn seed_defaults(&mut self) -> usize {
        let mut added = 0;
        for (item, default_unit, unit_type) in DEFAULT_ITEM_SETTINGS {
            if self.settings.contains_key(*item) {
                continue;
            }
            self.settings.insert(
                item.to_string(),
                ItemSetting {
                    default_unit: *default_unit,
                    unit_type: unit_type.to_string(),
                    receive_as_boxes: false,
                },
            );
            added += 1;
        }
        if added > 0 {
            self.persist_settings();
            info!(added, "Seeded default item settings");
        }
        added
    }

    /// Items whose orders arrive as a grand total rather than a box
    /// count, for the upstream prompt builder.
    pub fn box_count_items(&self) -> Vec<String> {
        self.settings
            .iter()
            .filter(|(_, s)| s.receive_as_boxes)
            .map(|(item, _)| item.clone())
            .collect()
    }

    #[cfg(test)]
    pub fn backend(&self) -> &S {
        &self.backend
    }
}

fn strip_whitespace(s: &str) -> String {
    s.trim().chars().filter(|c| !c.is_whitespace()).collect()
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::docstore::DocumentStore;

const STORES_DOC: &str = "stores";
const ITEMS_DOC: &str = "items";

/// Store names every deployment starts with.
const DEFAULT_STORES: &[&str] = &[
    "鎌ケ谷",
    "五香",
    "八柱",
    "青葉台",
    "咲が丘",
    "習志野台",
    "八千代台",
];

/// Item spellings every deployment starts with: canonical name and the
/// variants it accepts. Matching walks entries in order, so order matters.
const DEFAULT_ITEMS: &[(&str, &[&str])] = &[
    (
        "青梗菜",
        &["青梗菜", "チンゲン菜", "ちんげん菜", "チンゲンサイ", "ちんげんさい"],
    ),
    ("胡瓜", &["胡瓜", "きゅうり", "キュウリ"]),
    ("長ネギ", &["長ネギ", "ネギ", "ねぎ", "長ねぎ"]),
    ("春菊", &["春菊", "しゅんぎく", "シュンギク"]),
];

#[derive(Serialize, Deserialize)]
struct StoresDoc {
    stores: Vec<String>,
}

/// Self-learning name dictionaries: an ordered list of canonical store
/// names and an ordered map of canonical item names to accepted variant
/// spellings. Mutations persist write-through; a missing document is
/// seeded from the compiled-in defaults, a corrupt one falls back to them
/// without writing.
pub struct Dictionary<S: DocumentStore> {
    backend: S,
    stores: Vec<String>,
    items: IndexMap<String, Vec<String>>,
}

impl<S: DocumentStore> Dictionary<S> {
    pub fn new(backend: S) -> Self {
        let mut dict = Self {
            backend,
            stores: Vec::new(),
            items: IndexMap::new(),
        };
        dict.load();
        dict
    }

    fn load(&mut self) {
        self.stores = match self.backend.read(STORES_DOC) {
            Some(raw) => match serde_json::from_str::<StoresDoc>(&raw) {
                Ok(doc) => doc.stores,
                Err(e) => {
                    warn!(doc = STORES_DOC, error = %e, "Corrupt document, using defaults");
                    default_stores()
                }
            },
            None => {
                self.stores = default_stores();
                self.persist_stores();
                return self.load_items();
            }
        };
        self.load_items();
    }

    fn load_items(&mut self) {
        self.items = match self.backend.read(ITEMS_DOC) {
            Some(raw) => match serde_json::from_str::<IndexMap<String, Vec<String>>>(&raw) {
                Ok(items) => items,
                Err(e) => {
                    warn!(doc = ITEMS_DOC, error = %e, "Corrupt document, using defaults");
                    default_items()
                }
            },
            None => {
                self.items = default_items();
                self.persist_items();
                return;
            }
        };
    }

    fn persist_stores(&mut self) {
        let doc = StoresDoc {
            stores: self.stores.clone(),
        };
        match serde_json::to_string_pretty(&doc) {
            Ok(json) => {
                self.backend.write(STORES_DOC, &json);
            }
            Err(e) => warn!(doc = STORES_DOC, error = %e, "Could not serialize document"),
        }
    }

    fn persist_items(&mut self) {
        match serde_json::to_string_pretty(&self.items) {
            Ok(json) => {
                self.backend.write(ITEMS_DOC, &json);
            }
            Err(e) => warn!(doc = ITEMS_DOC, error = %e, "Could not serialize document"),
        }
    }

    /// All canonical store names, in match order.
    pub fn stores(&self) -> &[String] {
        &self.stores
    }

    /// All item entries, in match order.
    pub fn items(&self) -> &IndexMap<String, Vec<String>> {
        &self.items
    }

    /// Resolve a store candidate: exact match first, then the first
    /// canonical that is contained in the candidate or contains it.
    pub fn lookup_store(&self, candidate: &str) -> Option<String> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return None;
        }
        if let Some(found) = self.stores.iter().find(|s| s.as_str() == candidate) {
            return Some(found.clone());
        }
        self.stores
            .iter()
            .find(|s| candidate.contains(s.as_str()) || s.contains(candidate))
            .cloned()
    }

    /// Resolve a store candidate, adding it as a new canonical name when
    /// nothing matches. Near matches (substring either way) merge into
    /// the existing canonical instead of creating a duplicate. Returns
    /// the resolved name and whether a new entry was created.
    pub fn learn_store(&mut self, candidate: &str) -> (String, bool) {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return (String::new(), false);
        }
        if let Some(existing) = self.lookup_store(candidate) {
            return (existing, false);
        }
        self.stores.push(candidate.to_string());
        self.persist_stores();
        info!(store = %candidate, "Learned new store name");
        (candidate.to_string(), true)
    }

    /// Last-resort store match: the first canonical sharing at least one
    /// character with the candidate. Only consulted on strict passes
    /// after a normal lookup failed.
    pub fn store_by_shared_char(&self, candidate: &str) -> Option<String> {
        self.stores
            .iter()
            .find(|s| candidate.chars().any(|c| s.contains(c)))
            .cloned()
    }

    /// Resolve an item candidate against the variant sets: exact variant
    /// membership, or some variant being a substring of the candidate.
    /// Returns the owning canonical name.
    pub fn lookup_item(&self, candidate: &str) -> Option<String> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return None;
        }
        for (canonical, variants) in &self.items {
            let hit = variants
                .iter()
                .any(|v| v == candidate || (!v.is_empty() && candidate.contains(v.as_str())));
            if hit {
                return Some(canonical.clone());
            }
        }
        None
    }

    /// Resolve an item candidate, creating a new canonical entry (with
    /// the candidate as its only variant) when nothing matches. Returns
    /// the resolved name and whether a new entry was created.
    pub fn learn_item(&mut self, candidate: &str) -> (String, bool) {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return (String::new(), false);
        }
        if let Some(existing) = self.lookup_item(candidate) {
            return (existing, false);
        }
        self.items
            .insert(candidate.to_string(), vec![candidate.to_string()]);
        self.persist_items();
        info!(item = %candidate, "Learned new item name");
        (candidate.to_string(), true)
    }

    /// Adds a canonical store name. Returns `false` when it already
    /// exists.
    pub fn add_store(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.stores.iter().any(|s| s == name) {
            return false;
        }
        self.stores.push(name.to_string());
        self.persist_stores();
        true
    }

    /// Removes a canonical store name. Returns `false` when it was
    /// absent.
    pub fn remove_store(&mut self, name: &str) -> bool {
        let before = self.stores.len();
        self.stores.retain(|s| s != name);
        if self.stores.len() == before {
            return false;
        }
        self.persist_stores();
        true
    }

    /// Adds a canonical item with itself as the first accepted variant.
    /// Returns `false` when it already exists.
    pub fn add_item(&mut self, canonical: &str) -> bool {
        let canonical = canonical.trim();
        if canonical.is_empty() || self.items.contains_key(canonical) {
            return false;
        }
        self.items
            .insert(canonical.to_string(), vec![canonical.to_string()]);
        self.persist_items();
        true
    }

    /// Adds an accepted variant spelling to an existing canonical item.
    /// Returns `false` when the canonical is unknown or the variant is
    /// already listed.
    pub fn add_item_variant(&mut self, canonical: &str, variant: &str) -> bool {
        let variant = variant.trim();
        if variant.is_empty() {
            return false;
        }
        let Some(variants) = self.items.get_mut(canonical) else {
            return false;
        };
        if variants.iter().any(|v| v == variant) {
            return false;
        }
        variants.push(variant.to_string());
        self.persist_items();
        true
    }

    /// Removes a canonical item and all its variants. Returns `false`
    /// when it was absent.
    pub fn remove_item(&mut self, canonical: &str) -> bool {
        if self.items.shift_remove(canonical).is_none() {
            return false;
        }
        self.persist_items();
        true
    }

    #[cfg(test)]
    pub fn backend(&self) -> &S {
        &self.backend
    }
}

fn default_stores() -> Vec<String> {
    DEFAULT_STORES.iter().map(|s| s.to_string()).collect()
}

fn default_items() -> IndexMap<String, Vec<String>> {
    DEFAULT_ITEMS
        .iter()
        .map(|(canonical, variants)| {
            (
                canonical.to_string(),
                variants.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect()
}

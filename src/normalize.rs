use std::fmt;

use tracing::{debug, info};

use crate::dictionary::Dictionary;
use crate::docstore::DocumentStore;
use crate::records::{NormalizedOrderRecord, RawOrderRecord, coerce_count, coerce_text};
use crate::units::UnitMaster;

/// Non-blocking findings from a normalization pass. Rows are 1-based as
/// the operator sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    UnknownStore { row: usize, text: String },
    UnresolvedItem { row: usize, text: String },
    AllZero { row: usize, store: String, item: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownStore { row, text } => {
                write!(f, "行{row}: 店舗名「{text}」が辞書にありません")
            }
            Diagnostic::UnresolvedItem { row, text } => {
                write!(f, "行{row}: 品目名「{text}」を正規化できません")
            }
            Diagnostic::AllZero { row, store, item } => {
                write!(f, "行{row}: {store} {item} の数量がすべて0です")
            }
        }
    }
}

/// Everything one pass produced: the normalized rows (same order and
/// length as the input), the diagnostics, and the names the pass learned
/// into each dictionary.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub records: Vec<NormalizedOrderRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub learned_stores: Vec<String>,
    pub learned_items: Vec<String>,
}

/// Normalizes a raw batch against the dictionaries and the unit master.
///
/// With `auto_learn` the pass writes back what it resolved: unknown names
/// become dictionary entries and resolved units become master facts
/// (insert-only, so a prior human correction stays). Without it the pass
/// is strictly read-only — the re-validation run before label generation
/// must never mutate state.
pub fn normalize_batch<S: DocumentStore, T: DocumentStore>(
    dictionary: &mut Dictionary<S>,
    master: &mut UnitMaster<T>,
    raw: &[RawOrderRecord],
    auto_learn: bool,
) -> BatchReport {
    let mut report = BatchReport::default();

    for (index, record) in raw.iter().enumerate() {
        let row = index + 1;

        let store_text = coerce_text(&record.store);
        let store = resolve_store(dictionary, &store_text, auto_learn, row, &mut report);

        let item_text = coerce_text(&record.item);
        let item = resolve_item(dictionary, &item_text, auto_learn, row, &mut report);

        let spec = coerce_text(&record.spec);
        let mut unit = coerce_count(&record.unit);
        let boxes = coerce_count(&record.boxes);
        let remainder = coerce_count(&record.remainder);

        if unit == 0 {
            unit = master.lookup(&item, &spec, &store);
            if unit == 0 {
                unit = master.item_setting(&item).default_unit;
            }
            if unit > 0 {
                debug!(row, item = %item, unit, "Filled missing unit from master");
            }
        }

        if unit == 0 && boxes == 0 && remainder == 0 {
            report.diagnostics.push(Diagnostic::AllZero {
                row,
                store: store.clone(),
                item: item.clone(),
            });
        }

        if unit > 0 && auto_learn {
            master.insert_if_absent(&item, &spec, &store, unit);
        }

        report.records.push(NormalizedOrderRecord {
            store,
            item,
            spec,
            unit,
            boxes,
            remainder,
        });
    }

    info!(
        records = report.records.len(),
        diagnostics = report.diagnostics.len(),
        learned_stores = report.learned_stores.len(),
        learned_items = report.learned_items.len(),
        auto_learn,
        "Normalized batch"
    );
    report
}

fn resolve_store<S: DocumentStore>(
    dictionary: &mut Dictionary<S>,
    text: &str,
    auto_learn: bool,
    row: usize,
    report: &mut BatchReport,
) -> String {
    if text.is_empty() {
        return String::new();
    }
    if let Some(canonical) = dictionary.lookup_store(text) {
        return canonical;
    }
    if auto_learn {
        let (canonical, learned) = dictionary.learn_store(text);
        if learned {
            report.learned_stores.push(canonical.clone());
        }
        return canonical;
    }
    report.diagnostics.push(Diagnostic::UnknownStore {
        row,
        text: text.to_string(),
    });
    // last resort before passing the raw text through
    dictionary
        .store_by_shared_char(text)
        .unwrap_or_else(|| text.to_string())
}

fn resolve_item<S: DocumentStore>(
    dictionary: &mut Dictionary<S>,
    text: &str,
    auto_learn: bool,
    row: usize,
    report: &mut BatchReport,
) -> String {
    if text.is_empty() {
        return String::new();
    }
    if let Some(canonical) = dictionary.lookup_item(text) {
        return canonical;
    }
    if auto_learn {
        let (canonical, learned) = dictionary.learn_item(text);
        if learned {
            report.learned_items.push(canonical.clone());
        }
        return canonical;
    }
    report.diagnostics.push(Diagnostic::UnresolvedItem {
        row,
        text: text.to_string(),
    });
    text.to_string()
}

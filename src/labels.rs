use serde::Serialize;
use time::Date;

use crate::docstore::DocumentStore;
use crate::heuristics;
use crate::records::NormalizedOrderRecord;
use crate::units::UnitMaster;

/// One physical label: a full container, or the single fractional label
/// a remainder produces. Built fresh on every expansion, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelUnit {
    pub store: String,
    pub item: String,
    pub spec: String,
    /// Pre-formatted count plus unit label, e.g. `30袋`.
    pub quantity: String,
    /// Position within the record's label group, e.g. `2/3`.
    pub sequence: String,
    pub is_fraction: bool,
    pub shipment_date: String,
    pub unit: u32,
    pub boxes: u32,
    pub remainder: u32,
}

/// Non-padded month/day, the form printed on the physical label.
pub fn label_date(date: Date) -> String {
    format!("{}/{}", u8::from(date.month()), date.day())
}

/// Expands a normalized batch into labels: one per full container and
/// one fractional label when a remainder exists, numbered `i/total`
/// within each record. Records with an unknown unit produce nothing
/// (they were already flagged during normalization); so does a record
/// whose quantities were corrected down to zero. Output keeps the input
/// record order.
pub fn expand_labels<S: DocumentStore>(
    master: &UnitMaster<S>,
    records: &[NormalizedOrderRecord],
    shipment_date: Date,
) -> Vec<LabelUnit> {
    let date_display = label_date(shipment_date);
    let mut labels = Vec::new();

    for record in records {
        if record.unit == 0 {
            continue;
        }
        let unit_label = heuristics::unit_label(master, &record.item, &record.spec);
        let total = record.boxes + u32::from(record.remainder > 0);

        for i in 1..=record.boxes {
            labels.push(LabelUnit {
                store: record.store.clone(),
                item: record.item.clone(),
                spec: record.spec.clone(),
                quantity: format!("{}{}", record.unit, unit_label),
                sequence: format!("{i}/{total}"),
                is_fraction: false,
                shipment_date: date_display.clone(),
                unit: record.unit,
                boxes: record.boxes,
                remainder: record.remainder,
            });
        }
        if record.remainder > 0 {
            labels.push(LabelUnit {
                store: record.store.clone(),
                item: record.item.clone(),
                spec: record.spec.clone(),
                quantity: format!("{}{}", record.remainder, unit_label),
                sequence: format!("{total}/{total}"),
                is_fraction: true,
                shipment_date: date_display.clone(),
                unit: record.unit,
                boxes: record.boxes,
                remainder: record.remainder,
            });
        }
    }
    labels
}

use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;

use crate::docstore::DocumentStore;
use crate::heuristics;
use crate::records::NormalizedOrderRecord;
use crate::units::UnitMaster;

/// One printed summary line. Rows stay one-per-record on purpose:
/// the table mirrors the order sheet line by line so the operator can
/// check it against the paper. Only the grand-total block merges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub store: String,
    pub item: String,
    pub spec: String,
    pub boxes: u32,
    pub rem_box: u32,
    pub total_packs: u32,
    pub total_quantity: u32,
    pub unit: u32,
    pub unit_label: String,
}

/// One row per input record, no merging across duplicate
/// (store, item, spec) lines. Zero-unit records still get a row.
pub fn summary_rows<S: DocumentStore>(
    master: &UnitMaster<S>,
    records: &[NormalizedOrderRecord],
) -> Vec<SummaryRow> {
    records
        .iter()
        .map(|record| {
            let rem_box = u32::from(record.remainder > 0);
            SummaryRow {
                store: record.store.clone(),
                item: record.item.clone(),
                spec: record.spec.clone(),
                boxes: record.boxes,
                rem_box,
                total_packs: record.boxes + rem_box,
                total_quantity: total_quantity(record),
                unit: record.unit,
                unit_label: heuristics::unit_label(master, &record.item, &record.spec),
            }
        })
        .collect()
}

/// The copy-paste block for the chat channel: totals per (item, spec)
/// across every store, sorted by item then spec. The separators are part
/// of the contract — the receiving side keys on them.
pub fn grand_total_text<S: DocumentStore>(
    master: &UnitMaster<S>,
    records: &[NormalizedOrderRecord],
    today: Date,
) -> String {
    let mut groups: BTreeMap<(String, String), u32> = BTreeMap::new();
    for record in records {
        let key = (record.item.clone(), record.spec.clone());
        let entry = groups.entry(key).or_insert(0);
        *entry = entry.saturating_add(total_quantity(record));
    }

    let mut text = format!(
        "【{:02}/{:02} 出荷・作成総数】\n",
        u8::from(today.month()),
        today.day()
    );
    for ((item, spec), total) in &groups {
        let unit_label = heuristics::unit_label(master, item, spec);
        if spec.is_empty() {
            text.push_str(&format!("・{item}：{total}{unit_label}\n"));
        } else {
            text.push_str(&format!("・{item}({spec})：{total}{unit_label}\n"));
        }
    }
    text
}

fn total_quantity(record: &NormalizedOrderRecord) -> u32 {
    record
        .unit
        .saturating_mul(record.boxes)
        .saturating_add(record.remainder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docstore::MemoryStore;
    use time::Month;

    fn record(store: &str, item: &str, spec: &str, unit: u32, boxes: u32, remainder: u32) -> NormalizedOrderRecord {
        NormalizedOrderRecord {
            store: store.to_string(),
            item: item.to_string(),
            spec: spec.to_string(),
            unit,
            boxes,
            remainder,
        }
    }

    fn today() -> Date {
        Date::from_calendar_date(2025, Month::March, 4).unwrap()
    }

    #[test]
    fn test_one_row_per_record_no_merging() {
        let master = UnitMaster::new(MemoryStore::new());
        let rows = summary_rows(
            &master,
            &[
                record("鎌ケ谷", "胡瓜", "", 30, 2, 10),
                record("鎌ケ谷", "胡瓜", "", 30, 1, 0),
            ],
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rem_box, 1);
        assert_eq!(rows[0].total_packs, 3);
        assert_eq!(rows[0].total_quantity, 70);
        assert_eq!(rows[0].unit_label, "袋");
        assert_eq!(rows[1].rem_box, 0);
        assert_eq!(rows[1].total_packs, 1);
        assert_eq!(rows[1].total_quantity, 30);
    }

    #[test]
    fn test_zero_unit_record_still_gets_a_row() {
        let master = UnitMaster::new(MemoryStore::new());
        let rows = summary_rows(&master, &[record("五香", "人参", "", 0, 0, 5)]);
        assert_eq!(rows[0].total_quantity, 5);
        assert_eq!(rows[0].total_packs, 1);
    }

    #[test]
    fn test_grand_total_merges_across_stores() {
        let master = UnitMaster::new(MemoryStore::new());
        let text = grand_total_text(
            &master,
            &[
                record("A", "胡瓜", "", 30, 2, 0),
                record("B", "胡瓜", "", 30, 1, 10),
            ],
            today(),
        );
        assert_eq!(text, "【03/04 出荷・作成総数】\n・胡瓜：100袋\n");
    }

    #[test]
    fn test_grand_total_spec_is_part_of_the_group() {
        let master = UnitMaster::new(MemoryStore::new());
        let text = grand_total_text(
            &master,
            &[
                record("A", "胡瓜", "バラ", 100, 1, 0),
                record("A", "胡瓜", "", 30, 1, 0),
                record("B", "春菊", "", 20, 1, 0),
            ],
            today(),
        );
        let lines: Vec<_> = text.lines().collect();
        // sorted by item then spec; empty spec sorts first
        assert_eq!(
            lines,
            [
                "【03/04 出荷・作成総数】",
                "・春菊：20袋",
                "・胡瓜：30袋",
                "・胡瓜(バラ)：100袋",
            ]
        );
    }
}

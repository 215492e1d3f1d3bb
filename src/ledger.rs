use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::LedgerConfig;
use crate::records::NormalizedOrderRecord;

/// One bookkeeping-spreadsheet row. The append itself happens elsewhere;
/// this module only builds the rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRow {
    pub id: String,
    pub delivery_date: String,
    pub farmer: String,
    pub destination: String,
    pub billing: String,
    pub item: String,
    pub carry_date: String,
    pub spec: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub amount: i64,
    pub tax_rate: f64,
    pub checked: bool,
}

/// Deterministic row id: first 8 hex chars of a SHA-256 over the row's
/// identity, so re-running the same batch produces the same ids.
pub fn row_id(delivery_date: &str, store: &str, item: &str, spec: &str, index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(delivery_date.as_bytes());
    hasher.update(store.as_bytes());
    hasher.update(item.as_bytes());
    hasher.update(spec.as_bytes());
    hasher.update(index.to_string().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..8].to_string()
}

/// `YYYY/MM/DD` with zero padding, accepting `-` or `/` separators.
/// Anything that does not split into three numeric parts passes through
/// unchanged.
pub fn normalize_date(text: &str) -> String {
    let parts: Vec<&str> = text.trim().split(['-', '/']).collect();
    if parts.len() != 3 {
        return text.trim().to_string();
    }
    let nums: Option<Vec<u32>> = parts.iter().map(|p| p.trim().parse().ok()).collect();
    match nums.as_deref() {
        Some([y, m, d]) => format!("{y:04}/{m:02}/{d:02}"),
        _ => text.trim().to_string(),
    }
}

/// Unit price for an item and spec: exact `(item, spec)` key, then exact
/// item key, then the first price whose item key is contained in the
/// item. Unpriced items get 0.0 with a logged note.
fn unit_price(cfg: &LedgerConfig, item: &str, spec: &str) -> f64 {
    if !spec.is_empty() {
        if let Some(price) = cfg.prices.get(&format!("{item}|{spec}")) {
            return *price;
        }
    }
    if let Some(price) = cfg.prices.get(item) {
        return *price;
    }
    let partial = cfg
        .prices
        .iter()
        .find(|(key, _)| !key.contains('|') && item.contains(key.as_str()));
    match partial {
        Some((_, price)) => *price,
        None => {
            debug!(item = %item, spec = %spec, "No unit price configured");
            0.0
        }
    }
}

/// Converts a normalized batch into ledger rows for one delivery date.
/// Rows with zero quantity are skipped.
pub fn records_to_delivery_rows(
    cfg: &LedgerConfig,
    records: &[NormalizedOrderRecord],
    delivery_date: &str,
) -> Vec<DeliveryRow> {
    let delivery_date = normalize_date(delivery_date);
    let mut rows = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let quantity = record
            .unit
            .saturating_mul(record.boxes)
            .saturating_add(record.remainder);
        if quantity == 0 {
            continue;
        }

        let (destination, billing) = match cfg.destinations.get(&record.store) {
            Some(dest) => (dest.destination.clone(), dest.billing.clone()),
            None => (record.store.clone(), record.store.clone()),
        };
        let unit_price = unit_price(cfg, &record.item, &record.spec);

        rows.push(DeliveryRow {
            id: row_id(&delivery_date, &record.store, &record.item, &record.spec, index),
            delivery_date: delivery_date.clone(),
            farmer: cfg.farmer.clone(),
            destination,
            billing,
            item: record.item.clone(),
            carry_date: delivery_date.clone(),
            spec: record.spec.clone(),
            unit_price,
            quantity,
            amount: (unit_price * f64::from(quantity)).round() as i64,
            tax_rate: cfg.tax_rate,
            checked: false,
        });
    }
    rows
}

/// The inverse conversion for re-importing ledger rows: the total
/// quantity comes back as a remainder-only record.
pub fn delivery_rows_to_records(rows: &[DeliveryRow]) -> Vec<NormalizedOrderRecord> {
    rows.iter()
        .map(|row| NormalizedOrderRecord {
            store: row.destination.clone(),
            item: row.item.clone(),
            spec: row.spec.clone(),
            unit: 1,
            boxes: 0,
            remainder: row.quantity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreDestination;
    use std::collections::BTreeMap;

    fn cfg() -> LedgerConfig {
        let mut destinations = BTreeMap::new();
        destinations.insert(
            "鎌ケ谷".to_string(),
            StoreDestination {
                destination: "鎌ケ谷青果部".to_string(),
                billing: "本部一括".to_string(),
            },
        );
        let mut prices = BTreeMap::new();
        prices.insert("胡瓜|バラ".to_string(), 40.0);
        prices.insert("胡瓜".to_string(), 120.0);
        prices.insert("ネギ".to_string(), 150.0);
        LedgerConfig {
            farmer: "山田農園".to_string(),
            tax_rate: 8.0,
            destinations,
            prices,
        }
    }

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

    #[test]
    fn test_date_normalization() {
        assert_eq!(normalize_date("2025-3-4"), "2025/03/04");
        assert_eq!(normalize_date("2025/03/04"), "2025/03/04");
        assert_eq!(normalize_date("わからない"), "わからない");
        assert_eq!(normalize_date("2025-03"), "2025-03");
    }

    #[test]
    fn test_rows_skip_zero_quantity() {
        let rows = records_to_delivery_rows(
            &cfg(),
            &[
                record("鎌ケ谷", "胡瓜", "", 30, 2, 10),
                record("鎌ケ谷", "胡瓜", "", 30, 0, 0),
            ],
            "2025-03-04",
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 70);
        assert_eq!(rows[0].amount, 8400); // 120.0 * 70
        assert_eq!(rows[0].delivery_date, "2025/03/04");
        assert_eq!(rows[0].carry_date, "2025/03/04");
        assert_eq!(rows[0].destination, "鎌ケ谷青果部");
        assert_eq!(rows[0].billing, "本部一括");
        assert!(!rows[0].checked);
    }

    #[test]
    fn test_unmapped_store_uses_its_own_name() {
        let rows = records_to_delivery_rows(&cfg(), &[record("五香", "胡瓜", "", 30, 1, 0)], "2025-03-04");
        assert_eq!(rows[0].destination, "五香");
        assert_eq!(rows[0].billing, "五香");
    }

    #[test]
    fn test_price_resolution_order() {
        let c = cfg();
        assert_eq!(unit_price(&c, "胡瓜", "バラ"), 40.0); // exact (item, spec)
        assert_eq!(unit_price(&c, "胡瓜", "3本P"), 120.0); // exact item
        assert_eq!(unit_price(&c, "長ネギ", ""), 150.0); // partial key match
        assert_eq!(unit_price(&c, "人参", ""), 0.0);
    }

    #[test]
    fn test_row_ids_are_deterministic_and_distinct() {
        let records = [
            record("鎌ケ谷", "胡瓜", "", 30, 1, 0),
            record("鎌ケ谷", "胡瓜", "", 30, 1, 0),
        ];
        let a = records_to_delivery_rows(&cfg(), &records, "2025-03-04");
        let b = records_to_delivery_rows(&cfg(), &records, "2025-03-04");
        assert_eq!(a[0].id, b[0].id);
        assert_ne!(a[0].id, a[1].id); // index keeps duplicate lines apart
        assert_eq!(a[0].id.len(), 8);
    }

    #[test]
    fn test_round_trip_back_to_records() {
        let rows = records_to_delivery_rows(&cfg(), &[record("鎌ケ谷", "胡瓜", "", 30, 2, 10)], "2025-03-04");
        let records = delivery_rows_to_records(&rows);
        assert_eq!(records[0].unit, 1);
        assert_eq!(records[0].boxes, 0);
        assert_eq!(records[0].remainder, 70);
        assert_eq!(records[0].item, "胡瓜");
    }
}

mod config;
mod dictionary;
mod docstore;
mod heuristics;
mod labels;
mod ledger;
mod normalize;
mod records;
mod summary;
mod units;

use std::fs;
use std::path::Path;

use time::{Date, Duration, Month, OffsetDateTime};
use tracing::{info, warn};

use dictionary::Dictionary;
use docstore::DirStore;
use units::UnitMaster;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter("info")
        .init();

    let mut args = std::env::args().skip(1);
    let Some(input_path) = args.next() else {
        eprintln!("usage: shipment_labels <orders.json> [shipment-date YYYY-MM-DD]");
        std::process::exit(2);
    };
    let date_arg = args.next();

    let cfg = config::Config::load("config/app.toml")?;
    let mut dict = Dictionary::new(DirStore::new(&cfg.data_dir));
    let mut master = UnitMaster::new(DirStore::new(&cfg.data_dir));
    master.seed_defaults();

    let today = OffsetDateTime::now_utc().date();
    let shipment_date = match &date_arg {
        Some(text) => parse_date(text).ok_or_else(|| format!("invalid shipment date: {text}"))?,
        None => today.saturating_add(Duration::days(cfg.ship_days_ahead)),
    };

    let input = fs::read_to_string(&input_path)?;
    let raw = records::parse_raw_records(&input)?;
    info!(path = %input_path, records = raw.len(), "Loaded order batch");

    // first pass learns; the strict pass re-validates what generation
    // will actually use without touching any state
    let learned = normalize::normalize_batch(&mut dict, &mut master, &raw, true);
    for name in &learned.learned_stores {
        info!(store = %name, "New store learned this batch");
    }
    for name in &learned.learned_items {
        info!(item = %name, "New item learned this batch");
    }
    let report = normalize::normalize_batch(&mut dict, &mut master, &raw, false);
    for diagnostic in &report.diagnostics {
        warn!("{diagnostic}");
    }

    let label_units = labels::expand_labels(&master, &report.records, shipment_date);
    let rows = summary::summary_rows(&master, &report.records);
    let totals = summary::grand_total_text(&master, &report.records, today);

    let out_dir = Path::new(&cfg.output_dir);
    fs::create_dir_all(out_dir)?;
    fs::write(
        out_dir.join("labels.json"),
        serde_json::to_string_pretty(&label_units)?,
    )?;
    fs::write(
        out_dir.join("summary.json"),
        serde_json::to_string_pretty(&rows)?,
    )?;

    if let Some(ledger_cfg) = &cfg.ledger {
        let shipment_display = format!(
            "{:04}-{:02}-{:02}",
            shipment_date.year(),
            u8::from(shipment_date.month()),
            shipment_date.day()
        );
        let ledger_rows =
            ledger::records_to_delivery_rows(ledger_cfg, &report.records, &shipment_display);
        fs::write(
            out_dir.join("ledger.json"),
            serde_json::to_string_pretty(&ledger_rows)?,
        )?;
        info!(rows = ledger_rows.len(), "Wrote ledger rows");
    }

    print!("{totals}");

    info!(
        labels = label_units.len(),
        summary_rows = rows.len(),
        diagnostics = report.diagnostics.len(),
        "Batch complete"
    );
    Ok(())
}

/// `YYYY-MM-DD` (or `/` separated) to a calendar date.
fn parse_date(text: &str) -> Option<Date> {
    let parts: Vec<&str> = text.trim().split(['-', '/']).collect();
    let [year, month, day] = parts.as_slice() else {
        return None;
    };
    let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;
    Date::from_calendar_date(year.parse().ok()?, month, day.parse().ok()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let date = parse_date("2025-03-04").unwrap();
        assert_eq!(date.to_string(), "2025-03-04");
        assert_eq!(parse_date("2025/3/4"), Some(date));
        assert_eq!(parse_date("tomorrow"), None);
        assert_eq!(parse_date("2025-13-01"), None);
    }
}

use serde::Deserialize;
use std::collections::BTreeMap;
use std::{fs, path::Path};
use tracing::info;

#[derive(Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: String,
    pub output_dir: String,
    /// Days between receiving an order sheet and shipping it, used when
    /// no shipment date is given on the command line.
    pub ship_days_ahead: i64,
    pub ledger: Option<LedgerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            output_dir: "out".to_string(),
            ship_days_ahead: 1,
            ledger: None,
        }
    }
}

/// Settings for the delivery-ledger conversion. Present only when the
/// deployment feeds the bookkeeping spreadsheet.
#[derive(Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub farmer: String,
    pub tax_rate: f64,
    /// Store name → spreadsheet destination and billing columns.
    pub destinations: BTreeMap<String, StoreDestination>,
    /// `item` or `item|spec` → unit price.
    pub prices: BTreeMap<String, f64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            farmer: String::new(),
            tax_rate: 8.0,
            destinations: BTreeMap::new(),
            prices: BTreeMap::new(),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct StoreDestination {
    pub destination: String,
    pub billing: String,
}

impl Config {
    /// Loads the TOML config. A missing file is the normal first-run
    /// state and yields the defaults; a file that exists but does not
    /// parse is an error worth stopping for.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

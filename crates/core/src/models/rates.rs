use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Exchange-rate table for one base currency.
///
/// Maps currency code → units of that currency per 1 unit of the base
/// (e.g., with base "USD", `rates["EUR"] == 0.93` means 1 USD = 0.93 EUR).
/// The table is always replaced wholesale (on a successful fetch or on
/// fallback), never partially merged, so readers only ever observe a
/// complete, internally consistent set of rates.
pub type RateTable = HashMap<String, f64>;

/// Where the currently installed rate table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateSource {
    /// No fetch has resolved yet; the table is empty and all conversions
    /// are identity.
    Empty,
    /// Rates came from the live exchange-rate provider.
    Live,
    /// The last fetch failed; rates are the static sample table.
    Fallback,
}

impl std::fmt::Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateSource::Empty => write!(f, "Empty"),
            RateSource::Live => write!(f, "Live"),
            RateSource::Fallback => write!(f, "Fallback"),
        }
    }
}

/// Static sample rates used whenever the live rate source cannot be
/// reached. The exact literals are load-bearing: existing deployments
/// display these values when offline, so they must not drift.
#[must_use]
pub fn fallback_rates() -> RateTable {
    let mut rates = RateTable::new();
    rates.insert("USD".to_string(), 1.0);
    rates.insert("EUR".to_string(), 0.93);
    rates.insert("GBP".to_string(), 0.79);
    rates.insert("JPY".to_string(), 150.37);
    rates.insert("CAD".to_string(), 1.36);
    rates.insert("AUD".to_string(), 1.52);
    rates.insert("INR".to_string(), 83.12);
    rates
}

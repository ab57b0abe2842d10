use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::rates::RateTable;

/// Trait abstraction for exchange-rate sources (SOLID: Dependency Inversion).
///
/// The conversion service only ever sees this trait. If the live API stops
/// working or changes, we replace one implementation — the rest of the
/// codebase (and every test, via mock providers) is untouched.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait RateProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch the full rate table for the given base currency.
    ///
    /// On success the returned mapping holds one positive rate per
    /// currency code, expressed as units of that currency per 1 unit of
    /// `base` (the base itself maps to 1). Any failure (transport error,
    /// non-success status, malformed payload) surfaces as `CoreError`;
    /// the caller decides how to recover.
    async fn fetch_rates(&self, base: &str) -> Result<RateTable, CoreError>;
}

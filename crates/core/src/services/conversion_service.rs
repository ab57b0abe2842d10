use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::errors::CoreError;
use crate::models::rates::{fallback_rates, RateSource, RateTable};
use crate::providers::traits::RateProvider;

/// A rate fetch that has been issued but not yet applied.
///
/// Each request is tagged with the generation counter current at issue
/// time. `apply_update` compares tags, so a request that was superseded
/// by a later `set_base_currency` call can still resolve; its result is
/// simply discarded instead of overwriting the newer table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRequest {
    /// Base currency this fetch was issued for.
    pub base: String,
    generation: u64,
}

/// The resolved outcome of a `RateRequest`, ready to be applied.
#[derive(Debug)]
pub struct RateUpdate {
    base: String,
    generation: u64,
    outcome: Result<RateTable, CoreError>,
}

impl RateUpdate {
    /// Base currency the underlying request was issued for.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Caches the exchange-rate table for one base currency and converts
/// amounts out of it.
///
/// State machine: `Idle → Loading → {Ready | Fallback}`, re-entering
/// `Loading` on every base-currency change. The service is the single
/// writer of its table; `convert` reads are synchronous and only ever see
/// a fully replaced table.
///
/// A fetch failure never propagates: the service installs a static sample
/// table and records the reason in `last_error`, so conversion can always
/// proceed with best-effort data.
pub struct ConversionService {
    base_currency: String,
    rates: RateTable,
    source: RateSource,
    loading: bool,
    last_error: Option<String>,
    last_refreshed: Option<DateTime<Utc>>,
    /// Bumped on every issued fetch; stale completions compare unequal.
    generation: u64,
}

impl std::fmt::Debug for ConversionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionService")
            .field("base_currency", &self.base_currency)
            .field("rates", &self.rates.len())
            .field("source", &self.source)
            .field("loading", &self.loading)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl ConversionService {
    /// Create a converter with the default base currency ("USD") and an
    /// empty table. Until the first fetch resolves, all conversions are
    /// identity.
    pub fn new() -> Self {
        Self::with_base_currency("USD")
    }

    pub fn with_base_currency(code: &str) -> Self {
        Self {
            base_currency: code.trim().to_uppercase(),
            rates: RateTable::new(),
            source: RateSource::Empty,
            loading: false,
            last_error: None,
            last_refreshed: None,
            generation: 0,
        }
    }

    // ── Read accessors ──────────────────────────────────────────────

    #[must_use]
    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// The currently installed rate table. Empty until the first fetch
    /// (or fallback) resolves.
    #[must_use]
    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Rate table as a (code, rate) listing sorted by currency code,
    /// for stable display.
    #[must_use]
    pub fn rates_sorted(&self) -> Vec<(String, f64)> {
        let mut listing: Vec<(String, f64)> = self
            .rates
            .iter()
            .map(|(code, rate)| (code.clone(), *rate))
            .collect();
        listing.sort_by(|a, b| a.0.cmp(&b.0));
        listing
    }

    #[must_use]
    pub fn source(&self) -> RateSource {
        self.source
    }

    /// `true` while a fetch has been issued but not yet applied.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Reason the last fetch failed, if the installed table is the
    /// fallback. Cleared on the next successful fetch.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// When the installed table was last replaced by a live fetch.
    #[must_use]
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    // ── Conversion ──────────────────────────────────────────────────

    /// Convert `amount` (in the base currency) to `target_code`.
    ///
    /// If the target is missing from the table (unknown code, or the
    /// table is still empty before the first fetch resolves), the amount
    /// is returned unchanged. Missing data degrades to identity rather
    /// than failing, so the caller can always display *something*.
    #[must_use]
    pub fn convert(&self, amount: f64, target_code: &str) -> f64 {
        match self.rates.get(&target_code.to_uppercase()) {
            Some(rate) => amount * rate,
            None => amount,
        }
    }

    // ── Fetch protocol: issue → fetch → apply ───────────────────────

    /// Switch to a new base currency and issue a fetch for it.
    ///
    /// The previous table stays installed and usable until a matching
    /// update is applied, so there is no flicker through an empty state.
    /// The returned request must be driven through `fetch` and the result
    /// handed to `apply_update`.
    pub fn set_base_currency(&mut self, code: &str) -> RateRequest {
        self.base_currency = code.trim().to_uppercase();
        self.issue_request()
    }

    /// Issue a fetch for the current base currency (initial load or
    /// explicit refresh).
    pub fn begin_refresh(&mut self) -> RateRequest {
        self.issue_request()
    }

    fn issue_request(&mut self) -> RateRequest {
        self.generation += 1;
        self.loading = true;
        debug!(
            "issuing rate fetch for base {} (generation {})",
            self.base_currency, self.generation
        );
        RateRequest {
            base: self.base_currency.clone(),
            generation: self.generation,
        }
    }

    /// Drive the injected provider for an issued request.
    ///
    /// An associated function rather than a method: the await happens
    /// outside any borrow of the service, which is what makes overlapping
    /// fetches expressible at all. Success payloads are sanity-checked:
    /// a table containing a non-finite or non-positive rate counts as
    /// malformed and resolves as a failure.
    pub async fn fetch(provider: &dyn RateProvider, request: &RateRequest) -> RateUpdate {
        let outcome = match provider.fetch_rates(&request.base).await {
            Ok(table) => Self::validate_table(provider.name(), &request.base, table),
            Err(e) => Err(e),
        };
        RateUpdate {
            base: request.base.clone(),
            generation: request.generation,
            outcome,
        }
    }

    fn validate_table(
        provider: &str,
        base: &str,
        table: RateTable,
    ) -> Result<RateTable, CoreError> {
        if let Some((code, rate)) = table
            .iter()
            .find(|(_, rate)| !rate.is_finite() || **rate <= 0.0)
        {
            return Err(CoreError::Api {
                provider: provider.to_string(),
                message: format!(
                    "Invalid rate {rate} for {code} in table for base {base} (must be finite and positive)"
                ),
            });
        }
        Ok(table)
    }

    /// Apply a resolved update. Single writer: the table is swapped
    /// wholesale, never merged.
    ///
    /// Returns `false` if the update is stale (issued before a newer
    /// `set_base_currency`/`begin_refresh`), in which case nothing
    /// changes (last-issued request wins) and `loading` stays set for the
    /// still-outstanding request.
    ///
    /// A failed update installs the static fallback table and records the
    /// failure reason; it never leaves the table empty and never raises.
    pub fn apply_update(&mut self, update: RateUpdate) -> bool {
        if update.generation != self.generation {
            debug!(
                "discarding stale rate update for base {} (generation {} != {})",
                update.base, update.generation, self.generation
            );
            return false;
        }

        self.loading = false;
        match update.outcome {
            Ok(table) => {
                self.rates = table;
                self.source = RateSource::Live;
                self.last_error = None;
                self.last_refreshed = Some(Utc::now());
                debug!(
                    "installed {} live rates for base {}",
                    self.rates.len(),
                    self.base_currency
                );
            }
            Err(e) => {
                warn!(
                    "rate fetch for base {} failed, using sample rates: {e}",
                    update.base
                );
                self.rates = fallback_rates();
                self.source = RateSource::Fallback;
                self.last_error = Some(format!("Failed to fetch exchange rates: {e}"));
            }
        }
        true
    }

    // ── Sequential convenience paths ────────────────────────────────

    /// Switch base currency and resolve the fetch in one call (the
    /// common non-overlapping path).
    pub async fn change_base_currency(&mut self, provider: &dyn RateProvider, code: &str) {
        let request = self.set_base_currency(code);
        let update = Self::fetch(provider, &request).await;
        self.apply_update(update);
    }

    /// Re-fetch rates for the current base currency in one call.
    pub async fn refresh(&mut self, provider: &dyn RateProvider) {
        let request = self.begin_refresh();
        let update = Self::fetch(provider, &request).await;
        self.apply_update(update);
    }
}

impl Default for ConversionService {
    fn default() -> Self {
        Self::new()
    }
}

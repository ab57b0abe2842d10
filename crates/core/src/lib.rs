pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::{DateTime, Utc};
use models::{
    loan::{LoanCalculationResult, LoanInput},
    rates::{RateSource, RateTable},
};
use providers::{exchange_rate_api::ExchangeRateApiProvider, traits::RateProvider};
use services::{conversion_service::ConversionService, loan_service::LoanService};

use errors::CoreError;

/// Environment variable holding the ExchangeRate-API key (native only).
#[cfg(not(target_arch = "wasm32"))]
const API_KEY_ENV: &str = "EXCHANGE_RATE_API_KEY";

/// Main entry point for the Loan Calculator core library.
///
/// Owns the two independent engines (amortization and currency
/// conversion) and wires them together for the consuming UI: calculate a
/// loan, then convert the payment (or any other figure) into a selected
/// currency. The engines share no state; only this facade composes them.
#[must_use]
pub struct LoanCalculator {
    loan_service: LoanService,
    converter: ConversionService,
    provider: Box<dyn RateProvider>,
    /// Most recent calculation, replaced (never mutated) by the next one.
    result: Option<LoanCalculationResult>,
}

impl std::fmt::Debug for LoanCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoanCalculator")
            .field("provider", &self.provider.name())
            .field("converter", &self.converter)
            .field("has_result", &self.result.is_some())
            .finish()
    }
}

impl LoanCalculator {
    /// Create a calculator backed by the live ExchangeRate-API provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_provider(Box::new(ExchangeRateApiProvider::new(api_key.into())))
    }

    /// Create a calculator with an injected rate provider. This is the
    /// seam for tests and for frontends that bring their own transport.
    pub fn with_provider(provider: Box<dyn RateProvider>) -> Self {
        Self {
            loan_service: LoanService::new(),
            converter: ConversionService::new(),
            provider,
            result: None,
        }
    }

    /// Create a calculator reading the API key from the
    /// `EXCHANGE_RATE_API_KEY` environment variable (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self, CoreError> {
        let key = std::env::var(API_KEY_ENV).map_err(|_| {
            CoreError::ValidationError(format!(
                "Missing {API_KEY_ENV} environment variable with the ExchangeRate-API key"
            ))
        })?;
        Ok(Self::new(key))
    }

    // ── Loan Calculation ────────────────────────────────────────────

    /// Validate inputs, compute the amortization schedule, and store the
    /// result (superseding any previous one).
    ///
    /// Non-positive principal, rate, or term is rejected here with
    /// `ValidationError`; the engine itself is precondition-only. On
    /// rejection the previously stored result is left untouched.
    pub fn calculate(
        &mut self,
        principal: f64,
        annual_rate_pct: f64,
        term_years: f64,
    ) -> Result<&LoanCalculationResult, CoreError> {
        let input = LoanInput::new(principal, annual_rate_pct, term_years);
        input.validate()?;

        let result = self
            .loan_service
            .calculate(input.principal, input.annual_rate_pct, input.term_years);
        Ok(&*self.result.insert(result))
    }

    /// Discard the stored calculation result.
    pub fn reset_calculation(&mut self) {
        self.result = None;
    }

    /// The most recent calculation result, if any.
    #[must_use]
    pub fn result(&self) -> Option<&LoanCalculationResult> {
        self.result.as_ref()
    }

    /// Monthly payment of the most recent calculation, in the base
    /// currency.
    #[must_use]
    pub fn monthly_payment(&self) -> Option<f64> {
        self.result.as_ref().map(|r| r.monthly_payment)
    }

    /// Monthly payment converted to `target_code` with the current rate
    /// table (identity if the code is unknown or rates are not loaded).
    #[must_use]
    pub fn monthly_payment_in(&self, target_code: &str) -> Option<f64> {
        self.monthly_payment()
            .map(|payment| self.converter.convert(payment, target_code))
    }

    /// Export the stored calculation result as pretty-printed JSON.
    pub fn export_result_to_json(&self) -> Result<String, CoreError> {
        let result = self.result.as_ref().ok_or(CoreError::NoResult)?;
        serde_json::to_string_pretty(result)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize result: {e}")))
    }

    // ── Currency Conversion ─────────────────────────────────────────

    /// Switch the base currency and refetch rates for it. A fetch failure
    /// falls back to the static sample table internally; this call never
    /// fails.
    pub async fn set_base_currency(&mut self, code: &str) {
        let request = self.converter.set_base_currency(code);
        let update = ConversionService::fetch(self.provider.as_ref(), &request).await;
        self.converter.apply_update(update);
    }

    /// Fetch (or re-fetch) rates for the current base currency.
    pub async fn refresh_rates(&mut self) {
        let request = self.converter.begin_refresh();
        let update = ConversionService::fetch(self.provider.as_ref(), &request).await;
        self.converter.apply_update(update);
    }

    /// Convert an amount from the base currency to `target_code`.
    /// Unknown codes (and a not-yet-loaded table) convert as identity.
    #[must_use]
    pub fn convert(&self, amount: f64, target_code: &str) -> f64 {
        self.converter.convert(amount, target_code)
    }

    // ── Rate State Accessors ────────────────────────────────────────

    #[must_use]
    pub fn base_currency(&self) -> &str {
        self.converter.base_currency()
    }

    #[must_use]
    pub fn exchange_rates(&self) -> &RateTable {
        self.converter.rates()
    }

    /// Rates as a code-sorted listing for stable display.
    #[must_use]
    pub fn exchange_rates_sorted(&self) -> Vec<(String, f64)> {
        self.converter.rates_sorted()
    }

    /// `true` while a rate fetch is in flight.
    #[must_use]
    pub fn rates_loading(&self) -> bool {
        self.converter.is_loading()
    }

    /// Why the last fetch failed, when the fallback table is installed.
    #[must_use]
    pub fn rates_error(&self) -> Option<&str> {
        self.converter.last_error()
    }

    /// Provenance of the installed table (empty / live / fallback).
    #[must_use]
    pub fn rate_source(&self) -> RateSource {
        self.converter.source()
    }

    /// When the table was last replaced by a live fetch.
    #[must_use]
    pub fn rates_last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.converter.last_refreshed()
    }
}

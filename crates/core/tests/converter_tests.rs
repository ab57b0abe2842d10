// ═══════════════════════════════════════════════════════════════════
// Converter Tests — ConversionService state machine, fallback policy,
// identity conversion, stale-fetch discarding
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use std::collections::HashMap;

use loan_calculator_core::errors::CoreError;
use loan_calculator_core::models::rates::{fallback_rates, RateSource, RateTable};
use loan_calculator_core::providers::traits::RateProvider;
use loan_calculator_core::services::conversion_service::ConversionService;

// ═══════════════════════════════════════════════════════════════════
// Test Helpers — Mock Providers
// ═══════════════════════════════════════════════════════════════════

/// Serves a fixed table per base currency; errors on unknown bases.
struct MockRateProvider {
    tables: HashMap<String, RateTable>,
}

impl MockRateProvider {
    fn new() -> Self {
        let mut tables = HashMap::new();

        let mut usd = RateTable::new();
        usd.insert("USD".into(), 1.0);
        usd.insert("EUR".into(), 0.9);
        usd.insert("PLN".into(), 4.0);
        usd.insert("JPY".into(), 150.0);
        tables.insert("USD".to_string(), usd);

        let mut eur = RateTable::new();
        eur.insert("EUR".into(), 1.0);
        eur.insert("USD".into(), 1.1);
        tables.insert("EUR".to_string(), eur);

        let mut gbp = RateTable::new();
        gbp.insert("GBP".into(), 1.0);
        gbp.insert("USD".into(), 1.27);
        tables.insert("GBP".to_string(), gbp);

        Self { tables }
    }
}

#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        "MockRates"
    }

    async fn fetch_rates(&self, base: &str) -> Result<RateTable, CoreError> {
        self.tables
            .get(base)
            .cloned()
            .ok_or_else(|| CoreError::Api {
                provider: "MockRates".into(),
                message: format!("No table for base {base}"),
            })
    }
}

/// Always fails, as if the network were down.
struct FailingRateProvider;

#[async_trait]
impl RateProvider for FailingRateProvider {
    fn name(&self) -> &str {
        "FailingRates"
    }

    async fn fetch_rates(&self, base: &str) -> Result<RateTable, CoreError> {
        Err(CoreError::Network(format!(
            "connection refused while fetching {base}"
        )))
    }
}

/// Returns a syntactically valid table poisoned with a bad rate.
struct BadRateProvider {
    bad_value: f64,
}

#[async_trait]
impl RateProvider for BadRateProvider {
    fn name(&self) -> &str {
        "BadRates"
    }

    async fn fetch_rates(&self, _base: &str) -> Result<RateTable, CoreError> {
        let mut table = RateTable::new();
        table.insert("EUR".into(), 0.9);
        table.insert("XXX".into(), self.bad_value);
        Ok(table)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Initial State
// ═══════════════════════════════════════════════════════════════════

mod initial_state {
    use super::*;

    #[test]
    fn starts_idle_with_empty_table() {
        let converter = ConversionService::new();
        assert_eq!(converter.base_currency(), "USD");
        assert!(converter.rates().is_empty());
        assert!(!converter.is_loading());
        assert!(converter.last_error().is_none());
        assert!(converter.last_refreshed().is_none());
        assert_eq!(converter.source(), RateSource::Empty);
    }

    #[test]
    fn custom_base_currency_is_uppercased() {
        let converter = ConversionService::with_base_currency("eur ");
        assert_eq!(converter.base_currency(), "EUR");
    }

    #[test]
    fn converts_as_identity_before_first_fetch() {
        let converter = ConversionService::new();
        assert_eq!(converter.convert(2052.25, "EUR"), 2052.25);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Conversion
// ═══════════════════════════════════════════════════════════════════

mod conversion {
    use super::*;

    async fn loaded_converter() -> ConversionService {
        let mut converter = ConversionService::new();
        converter.refresh(&MockRateProvider::new()).await;
        converter
    }

    #[tokio::test]
    async fn multiplies_by_known_rate() {
        let converter = loaded_converter().await;
        assert_eq!(converter.convert(100.0, "PLN"), 400.0);
        assert_eq!(converter.convert(2.0, "JPY"), 300.0);
    }

    #[tokio::test]
    async fn identity_for_unknown_code() {
        let converter = loaded_converter().await;
        assert_eq!(converter.convert(123.45, "CHF"), 123.45);
    }

    #[tokio::test]
    async fn target_code_is_case_insensitive() {
        let converter = loaded_converter().await;
        assert_eq!(converter.convert(100.0, "pln"), 400.0);
    }

    #[tokio::test]
    async fn base_converts_to_itself_via_identity_rate() {
        let converter = loaded_converter().await;
        assert_eq!(converter.convert(55.0, "USD"), 55.0);
    }

    #[tokio::test]
    async fn round_trip_through_reciprocal_rate_recovers_amount() {
        let converter = loaded_converter().await;
        let amount = 1000.0;
        let in_pln = converter.convert(amount, "PLN");
        let rate = converter.rates()["PLN"];
        assert!((in_pln * (1.0 / rate) - amount).abs() < 1e-9);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Fetching & Fallback
// ═══════════════════════════════════════════════════════════════════

mod fetching {
    use super::*;

    #[tokio::test]
    async fn successful_fetch_installs_live_table() {
        let mut converter = ConversionService::new();
        converter.refresh(&MockRateProvider::new()).await;

        assert_eq!(converter.source(), RateSource::Live);
        assert!(!converter.is_loading());
        assert!(converter.last_error().is_none());
        assert!(converter.last_refreshed().is_some());
        assert_eq!(converter.rates().len(), 4);
    }

    #[tokio::test]
    async fn change_base_currency_swaps_table() {
        let provider = MockRateProvider::new();
        let mut converter = ConversionService::new();
        converter.refresh(&provider).await;
        converter.change_base_currency(&provider, "EUR").await;

        assert_eq!(converter.base_currency(), "EUR");
        assert!((converter.convert(100.0, "USD") - 110.0).abs() < 1e-9);
        // Old USD-base rates are gone, wholesale replacement
        assert!(!converter.rates().contains_key("PLN"));
    }

    #[test]
    fn old_table_stays_usable_while_fetch_is_in_flight() {
        // set_base_currency issues the request but does not touch the
        // installed table; only apply_update swaps it.
        let mut converter = ConversionService::new();

        block_on(async {
            let request = converter.begin_refresh();
            let update = ConversionService::fetch(&MockRateProvider::new(), &request).await;
            converter.apply_update(update);
        });
        let before = converter.rates().clone();

        let _pending = converter.set_base_currency("EUR");
        assert!(converter.is_loading());
        assert_eq!(converter.rates(), &before);
        assert_eq!(converter.convert(100.0, "PLN"), 400.0);
    }

    #[tokio::test]
    async fn fetch_failure_installs_fallback_table() {
        let mut converter = ConversionService::new();
        converter.refresh(&FailingRateProvider).await;

        assert_eq!(converter.source(), RateSource::Fallback);
        assert_eq!(converter.rates(), &fallback_rates());
        assert!(!converter.is_loading());
        let err = converter.last_error().expect("failure reason recorded");
        assert!(!err.is_empty());
    }

    #[tokio::test]
    async fn fallback_rates_match_the_shipped_literals() {
        let mut converter = ConversionService::new();
        converter.refresh(&FailingRateProvider).await;

        let rates = converter.rates();
        assert_eq!(rates.len(), 7);
        assert_eq!(rates["USD"], 1.0);
        assert_eq!(rates["EUR"], 0.93);
        assert_eq!(rates["GBP"], 0.79);
        assert_eq!(rates["JPY"], 150.37);
        assert_eq!(rates["CAD"], 1.36);
        assert_eq!(rates["AUD"], 1.52);
        assert_eq!(rates["INR"], 83.12);
    }

    #[tokio::test]
    async fn conversion_keeps_working_off_fallback_data() {
        let mut converter = ConversionService::new();
        converter.refresh(&FailingRateProvider).await;
        assert!((converter.convert(100.0, "EUR") - 93.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn success_after_failure_clears_error() {
        let mut converter = ConversionService::new();
        converter.refresh(&FailingRateProvider).await;
        assert!(converter.last_error().is_some());

        converter.refresh(&MockRateProvider::new()).await;
        assert_eq!(converter.source(), RateSource::Live);
        assert!(converter.last_error().is_none());
    }

    #[tokio::test]
    async fn non_positive_rate_in_payload_counts_as_failure() {
        let mut converter = ConversionService::new();
        converter.refresh(&BadRateProvider { bad_value: -1.0 }).await;
        assert_eq!(converter.source(), RateSource::Fallback);
        assert_eq!(converter.rates(), &fallback_rates());
    }

    #[tokio::test]
    async fn non_finite_rate_in_payload_counts_as_failure() {
        let mut converter = ConversionService::new();
        converter.refresh(&BadRateProvider { bad_value: f64::NAN }).await;
        assert_eq!(converter.source(), RateSource::Fallback);
    }

    /// Tiny helper so a sync test can drive one resolved fetch.
    fn block_on<F: std::future::Future<Output = ()>>(fut: F) {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Overlapping Fetches — last-issued base currency wins
// ═══════════════════════════════════════════════════════════════════

mod staleness {
    use super::*;

    #[tokio::test]
    async fn stale_result_resolving_after_newer_one_is_discarded() {
        let provider = MockRateProvider::new();
        let mut converter = ConversionService::new();

        // Two overlapping requests: EUR issued first, GBP supersedes it.
        let eur_request = converter.set_base_currency("EUR");
        let gbp_request = converter.set_base_currency("GBP");

        let gbp_update = ConversionService::fetch(&provider, &gbp_request).await;
        assert!(converter.apply_update(gbp_update));
        assert_eq!(converter.base_currency(), "GBP");

        // The EUR fetch finally resolves, too late to matter.
        let eur_update = ConversionService::fetch(&provider, &eur_request).await;
        assert!(!converter.apply_update(eur_update));

        assert_eq!(converter.base_currency(), "GBP");
        assert_eq!(converter.convert(100.0, "USD"), 127.0);
    }

    #[tokio::test]
    async fn stale_result_resolving_before_newer_one_is_discarded() {
        let provider = MockRateProvider::new();
        let mut converter = ConversionService::new();

        let eur_request = converter.set_base_currency("EUR");
        let gbp_request = converter.set_base_currency("GBP");

        // EUR resolves first but was already superseded at issue time.
        let eur_update = ConversionService::fetch(&provider, &eur_request).await;
        assert!(!converter.apply_update(eur_update));
        // Still loading: the GBP request is outstanding.
        assert!(converter.is_loading());
        assert!(converter.rates().is_empty());

        let gbp_update = ConversionService::fetch(&provider, &gbp_request).await;
        assert!(converter.apply_update(gbp_update));
        assert!(!converter.is_loading());
        assert_eq!(converter.convert(100.0, "USD"), 127.0);
    }

    #[tokio::test]
    async fn stale_failure_does_not_install_fallback_over_newer_table() {
        let good = MockRateProvider::new();
        let mut converter = ConversionService::new();

        let old_request = converter.begin_refresh();
        let new_request = converter.set_base_currency("GBP");

        let new_update = ConversionService::fetch(&good, &new_request).await;
        converter.apply_update(new_update);
        assert_eq!(converter.source(), RateSource::Live);

        // The superseded request fails; it must not degrade the state.
        let old_update = ConversionService::fetch(&FailingRateProvider, &old_request).await;
        assert!(!converter.apply_update(old_update));
        assert_eq!(converter.source(), RateSource::Live);
        assert!(converter.last_error().is_none());
    }

    #[tokio::test]
    async fn refresh_of_same_base_supersedes_prior_request() {
        let provider = MockRateProvider::new();
        let mut converter = ConversionService::new();

        let first = converter.begin_refresh();
        let second = converter.begin_refresh();

        let second_update = ConversionService::fetch(&provider, &second).await;
        assert!(converter.apply_update(second_update));

        let first_update = ConversionService::fetch(&provider, &first).await;
        assert!(!converter.apply_update(first_update));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Update Introspection
// ═══════════════════════════════════════════════════════════════════

mod updates {
    use super::*;

    #[tokio::test]
    async fn update_reports_base_and_outcome() {
        let mut converter = ConversionService::new();
        let request = converter.set_base_currency("EUR");
        assert_eq!(request.base, "EUR");

        let update = ConversionService::fetch(&MockRateProvider::new(), &request).await;
        assert_eq!(update.base(), "EUR");
        assert!(update.is_success());

        let failed = ConversionService::fetch(&FailingRateProvider, &request).await;
        assert!(!failed.is_success());
    }
}

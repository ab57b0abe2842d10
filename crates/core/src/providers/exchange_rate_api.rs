use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::rates::RateTable;
use super::traits::RateProvider;

const BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

/// ExchangeRate-API provider for fiat currency exchange rates.
///
/// - **Free tier**: 1,500 requests/month.
/// - **Requires**: API key (embedded in the URL path, not a query param).
/// - **Coverage**: 160+ currencies, any base currency.
/// - **Endpoint**: `/v6/{key}/latest/{base}`
///
/// The response carries a `result` field that is `"success"` on valid
/// payloads; anything else is an application-level failure even when the
/// HTTP status is 200.
pub struct ExchangeRateApiProvider {
    client: Client,
    api_key: String,
}

impl ExchangeRateApiProvider {
    pub fn new(api_key: String) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
        }
    }
}

// ── ExchangeRate-API response types ─────────────────────────────────

#[derive(Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RateProvider for ExchangeRateApiProvider {
    fn name(&self) -> &str {
        "ExchangeRate-API"
    }

    async fn fetch_rates(&self, base: &str) -> Result<RateTable, CoreError> {
        let base = base.to_uppercase();
        let url = format!("{BASE_URL}/{}/latest/{base}", self.api_key);

        let resp: LatestResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "ExchangeRate-API".into(),
                message: format!("Failed to parse rates response for base {base}: {e}"),
            })?;

        if resp.result != "success" {
            return Err(CoreError::Api {
                provider: "ExchangeRate-API".into(),
                message: format!("Request for base {base} returned result '{}'", resp.result),
            });
        }

        if resp.conversion_rates.is_empty() {
            return Err(CoreError::Api {
                provider: "ExchangeRate-API".into(),
                message: format!("Empty conversion_rates mapping for base {base}"),
            });
        }

        Ok(resp.conversion_rates)
    }
}

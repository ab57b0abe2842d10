use thiserror::Error;

/// Unified error type for the entire loan-calculator-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Input validation failed: {0}")]
    ValidationError(String),

    #[error("No calculation result available — run a calculation first")]
    NoResult,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Sanitize error message: strip the path tail from URLs. reqwest
        // errors often contain the full request URL, and the exchange-rate
        // endpoint embeds the API key in its path.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find("/v6/") {
            format!("{}/v6/<key redacted>", &msg[..idx])
        } else if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

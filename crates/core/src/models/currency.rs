use serde::Serialize;

/// Display metadata for a currency: ISO code, human-readable name, symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
}

/// The common currencies offered by the calculator UI, in menu order.
pub const COMMON_CURRENCIES: &[CurrencyInfo] = &[
    CurrencyInfo { code: "USD", name: "US Dollar", symbol: "$" },
    CurrencyInfo { code: "EUR", name: "Euro", symbol: "€" },
    CurrencyInfo { code: "GBP", name: "British Pound", symbol: "£" },
    CurrencyInfo { code: "JPY", name: "Japanese Yen", symbol: "¥" },
    CurrencyInfo { code: "CAD", name: "Canadian Dollar", symbol: "C$" },
    CurrencyInfo { code: "AUD", name: "Australian Dollar", symbol: "A$" },
    CurrencyInfo { code: "INR", name: "Indian Rupee", symbol: "₹" },
];

/// Look up the display symbol for a currency code (case-insensitive).
/// Unknown codes fall back to "$".
#[must_use]
pub fn symbol_for(code: &str) -> &'static str {
    let upper = code.to_uppercase();
    COMMON_CURRENCIES
        .iter()
        .find(|c| c.code == upper)
        .map_or("$", |c| c.symbol)
}

/// Format a monetary amount with its currency symbol and two decimal
/// places, e.g. `format_amount(2052.2548, "USD")` → `"$2052.25"`.
#[must_use]
pub fn format_amount(amount: f64, code: &str) -> String {
    format!("{}{:.2}", symbol_for(code), amount)
}

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// The three user-supplied loan parameters.
///
/// Constructed fresh for every calculation request; never persisted.
/// Validation lives here (not in the engine) so that the engine can stay
/// a pure precondition-only function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    /// Initial loan amount, in units of the base currency.
    pub principal: f64,

    /// Annual interest rate as a percentage (e.g., 8.5 means 8.5%).
    pub annual_rate_pct: f64,

    /// Loan term in years. Fractional terms are allowed; the engine
    /// rounds `term_years * 12` to a whole number of monthly periods.
    pub term_years: f64,
}

impl LoanInput {
    pub fn new(principal: f64, annual_rate_pct: f64, term_years: f64) -> Self {
        Self {
            principal,
            annual_rate_pct,
            term_years,
        }
    }

    /// Reject non-positive (or non-finite) inputs before they reach the
    /// amortization engine, which would otherwise produce NaN/Infinity.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.principal.is_finite() || self.principal <= 0.0 {
            return Err(CoreError::ValidationError(
                "Please enter a valid loan amount (must be greater than 0)".into(),
            ));
        }
        if !self.annual_rate_pct.is_finite() || self.annual_rate_pct <= 0.0 {
            return Err(CoreError::ValidationError(
                "Please enter a valid interest rate (must be greater than 0)".into(),
            ));
        }
        if !self.term_years.is_finite() || self.term_years <= 0.0 {
            return Err(CoreError::ValidationError(
                "Please enter a valid loan term (must be greater than 0)".into(),
            ));
        }
        // A sub-half-month term rounds to zero periods, which the engine
        // cannot amortize.
        if (self.term_years * 12.0).round() < 1.0 {
            return Err(CoreError::ValidationError(
                "Loan term is too short: it must cover at least one monthly period".into(),
            ));
        }
        Ok(())
    }

    /// Number of monthly periods this input amortizes over.
    #[must_use]
    pub fn term_months(&self) -> u32 {
        (self.term_years * 12.0).round() as u32
    }
}

/// One row of the amortization schedule: the payment breakdown for a
/// single month.
///
/// Invariant: `principal + interest == payment` (within floating-point
/// tolerance) for every entry except possibly the last, where the final
/// principal portion is clamped so the balance lands exactly on zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// 1-based month number.
    pub month: u32,

    /// Fixed monthly payment.
    pub payment: f64,

    /// Portion of this month's payment that repays principal.
    pub principal: f64,

    /// Portion of this month's payment that covers interest.
    pub interest: f64,

    /// Outstanding balance after this month's payment. Never negative.
    pub remaining_balance: f64,
}

/// Complete output of one amortization calculation.
///
/// Immutable once returned: a subsequent calculation produces a new value
/// rather than mutating this one, and `reset_calculation` simply discards it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanCalculationResult {
    /// Fixed monthly payment (EMI).
    pub monthly_payment: f64,

    /// Total interest paid over the life of the loan.
    pub total_interest: f64,

    /// Total amount paid over the life of the loan (principal + interest).
    pub total_payment: f64,

    /// Per-month breakdown, months 1..=term_months in order.
    pub amortization_schedule: Vec<AmortizationEntry>,
}

impl LoanCalculationResult {
    /// Number of monthly periods in the schedule.
    #[must_use]
    pub fn term_months(&self) -> u32 {
        self.amortization_schedule.len() as u32
    }
}

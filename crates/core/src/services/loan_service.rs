use crate::models::loan::{AmortizationEntry, LoanCalculationResult};

/// Computes fixed-payment amortization schedules.
///
/// The service is a pure function of its inputs: no state is carried
/// between calls, so repeated calculations with different inputs are
/// fully independent. Inputs are precondition-only: callers validate
/// positivity (see `LoanInput::validate`) before calling; non-positive
/// principal or term here will produce NaN/Infinity rather than an error.
///
/// **Note on precision**: all monetary values are `f64` (~15-17
/// significant digits). Per-period rounding drift is absorbed by clamping
/// the final principal portion so the balance lands exactly on zero.
pub struct LoanService;

impl LoanService {
    pub fn new() -> Self {
        Self
    }

    /// Calculate the fixed monthly payment and full amortization schedule
    /// for a loan of `principal` at `annual_rate_pct` percent over
    /// `term_years` years.
    ///
    /// Uses the standard annuity formula
    /// `P * r * (1+r)^n / ((1+r)^n - 1)` with `r` the monthly rate and
    /// `n` the number of monthly periods. A zero rate makes that formula
    /// 0/0, so it is special-cased to straight-line repayment
    /// `P / n` (every payment is pure principal).
    #[must_use]
    pub fn calculate(
        &self,
        principal: f64,
        annual_rate_pct: f64,
        term_years: f64,
    ) -> LoanCalculationResult {
        let monthly_rate = annual_rate_pct / 100.0 / 12.0;
        let term_months = (term_years * 12.0).round() as u32;

        let monthly_payment = if monthly_rate == 0.0 {
            principal / f64::from(term_months)
        } else {
            let growth = (1.0 + monthly_rate).powi(term_months as i32);
            principal * monthly_rate * growth / (growth - 1.0)
        };

        let mut remaining_balance = principal;
        let mut amortization_schedule = Vec::with_capacity(term_months as usize);

        for month in 1..=term_months {
            let interest = remaining_balance * monthly_rate;
            // Rounding drift can make the final principal portion overshoot
            // the outstanding balance; clamp so the balance reaches zero
            // instead of going negative.
            let principal_portion = (monthly_payment - interest).min(remaining_balance);
            remaining_balance -= principal_portion;

            amortization_schedule.push(AmortizationEntry {
                month,
                payment: monthly_payment,
                principal: principal_portion,
                interest,
                remaining_balance,
            });
        }

        let total_payment = monthly_payment * f64::from(term_months);
        let total_interest = total_payment - principal;

        LoanCalculationResult {
            monthly_payment,
            total_interest,
            total_payment,
            amortization_schedule,
        }
    }
}

impl Default for LoanService {
    fn default() -> Self {
        Self::new()
    }
}

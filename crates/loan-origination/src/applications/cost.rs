//! Amortizing-loan economics.
//!
//! Every figure leaving this module is rounded to cents with half-up rounding, so identical
//! inputs always produce identical outputs and `monthly_payment * periods == total_cost` holds
//! exactly.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub const MONTHS_PER_YEAR: u32 = 12;
const MONEY_SCALE: u32 = 2;
const PERCENT: Decimal = dec!(100);

/// Principal, annual percentage rate and term in years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTerms {
    pub amount: Decimal,
    pub interest_rate: Decimal,
    pub term: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub monthly_payment: Decimal,
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CostError {
    #[error("invalid loan parameters: {reason}")]
    InvalidLoanParameters { reason: String },
}

impl CostError {
    fn invalid(reason: impl Into<String>) -> Self {
        CostError::InvalidLoanParameters {
            reason: reason.into(),
        }
    }

    fn overflow() -> Self {
        Self::invalid("loan figures exceed the supported numeric range")
    }
}

/// Rounds to cents, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Fixed monthly installment that fully retires the principal over the term.
pub fn monthly_payment(terms: &LoanTerms) -> Result<Decimal, CostError> {
    let periods = periods(terms)?;
    let count = Decimal::from(periods);

    if terms.interest_rate.is_zero() {
        return even_installment(terms.amount, count);
    }

    let rate = terms.interest_rate / PERCENT / Decimal::from(MONTHS_PER_YEAR);
    let growth = (Decimal::ONE + rate)
        .checked_powi(i64::from(periods))
        .ok_or_else(CostError::overflow)?;
    let denominator = growth - Decimal::ONE;
    if denominator <= Decimal::ZERO {
        // Rate vanishes below decimal precision; amortize as interest-free.
        return even_installment(terms.amount, count);
    }

    let payment = terms
        .amount
        .checked_mul(rate)
        .and_then(|value| value.checked_mul(growth))
        .and_then(|value| value.checked_div(denominator))
        .ok_or_else(CostError::overflow)?;

    Ok(round_money(payment))
}

fn even_installment(amount: Decimal, count: Decimal) -> Result<Decimal, CostError> {
    amount
        .checked_div(count)
        .map(round_money)
        .ok_or_else(CostError::overflow)
}

/// Monthly payment plus the sum of every installment (fees are not modeled).
pub fn calculate_cost(terms: &LoanTerms) -> Result<CostBreakdown, CostError> {
    let monthly_payment = monthly_payment(terms)?;
    let total_cost = monthly_payment
        .checked_mul(Decimal::from(periods(terms)?))
        .ok_or_else(CostError::overflow)?;

    Ok(CostBreakdown {
        monthly_payment,
        total_cost,
    })
}

fn periods(terms: &LoanTerms) -> Result<u32, CostError> {
    if terms.amount <= Decimal::ZERO {
        return Err(CostError::invalid("amount must be greater than zero"));
    }
    if terms.term == 0 {
        return Err(CostError::invalid("term must be at least one year"));
    }
    if terms.interest_rate < Decimal::ZERO {
        return Err(CostError::invalid("interest rate must not be negative"));
    }

    terms
        .term
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| CostError::invalid("term exceeds the supported number of periods"))
}

//! Level-payment loan amortization: fixed monthly payment, full per-month
//! schedule, and payment/interest totals. All math in `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LoanCalcResult;

/// Payments per year.
const MONTHS_PER_YEAR: u32 = 12;

/// Annual rate above this (in percent) is almost certainly a data-entry slip.
const RATE_WARNING_PCT: Decimal = dec!(100);

/// Terms beyond this many years fall outside normal lending products.
const TERM_WARNING_YEARS: u32 = 50;

/// Input for a fixed-rate, fully amortizing loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    /// Borrowed amount.
    pub principal: Money,
    /// Nominal annual interest rate in percent (5.0 = 5%).
    pub annual_rate_pct: Rate,
    /// Loan duration in whole years.
    pub term_years: u32,
}

/// A single month in the amortization schedule (1-indexed)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPeriod {
    pub period: u32,
    /// The level payment; identical for every period.
    pub payment: Money,
    /// Portion of the payment reducing the balance.
    pub principal_portion: Money,
    /// Portion of the payment that is interest on the open balance.
    pub interest_portion: Money,
    /// Balance after this payment, clamped at zero.
    pub remaining_balance: Money,
}

/// Full amortization output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub schedule: Vec<PaymentPeriod>,
}

/// Compute the level monthly payment and full schedule for a loan.
///
/// Rejects non-positive principal or term and negative rates as
/// `InvalidInput`; a zero rate degenerates to straight division of the
/// principal across the term.
pub fn compute_amortization(
    input: &LoanInput,
) -> LoanCalcResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.principal <= Decimal::ZERO {
        return Err(LoanCalcError::InvalidInput {
            field: "principal".into(),
            reason: "Loan amount must be positive".into(),
        });
    }
    if input.annual_rate_pct < Decimal::ZERO {
        return Err(LoanCalcError::InvalidInput {
            field: "annual_rate_pct".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if input.term_years == 0 {
        return Err(LoanCalcError::InvalidInput {
            field: "term_years".into(),
            reason: "Term must be at least 1 year".into(),
        });
    }

    if input.annual_rate_pct > RATE_WARNING_PCT {
        warnings.push(format!(
            "Annual rate of {}% exceeds 100%; check the input units",
            input.annual_rate_pct
        ));
    }
    if input.term_years > TERM_WARNING_YEARS {
        warnings.push(format!(
            "Term of {} years exceeds {} years",
            input.term_years, TERM_WARNING_YEARS
        ));
    }

    let periods = input.term_years * MONTHS_PER_YEAR;
    let monthly_rate = input.annual_rate_pct / dec!(100) / Decimal::from(MONTHS_PER_YEAR);

    let monthly_payment = if monthly_rate.is_zero() {
        // Zero-rate loan: the annuity formula degenerates to 0/0.
        input.principal / Decimal::from(periods)
    } else {
        let discount = iterative_pow_recip(Decimal::ONE + monthly_rate, periods);
        input.principal * monthly_rate / (Decimal::ONE - discount)
    };

    let total_payment = monthly_payment * Decimal::from(periods);
    let total_interest = total_payment - input.principal;

    let mut schedule = Vec::with_capacity(periods as usize);
    let mut balance = input.principal;

    for period in 1..=periods {
        let interest_portion = balance * monthly_rate;
        let principal_portion = monthly_payment - interest_portion;
        balance -= principal_portion;

        schedule.push(PaymentPeriod {
            period,
            payment: monthly_payment,
            principal_portion,
            interest_portion,
            // The clamp absorbs residual rounding on the final period.
            remaining_balance: balance.max(Decimal::ZERO),
        });
    }

    let output = AmortizationOutput {
        monthly_payment,
        total_payment,
        total_interest,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-Payment Amortization",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "term_years": input.term_years,
            "periods": periods,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Compute base^-n by repeated division (no f64, no powd). Shrinks toward
/// zero, so it cannot overflow however large the rate or term.
fn iterative_pow_recip(base: Decimal, n: u32) -> Decimal {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result /= base;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.01);

    fn loan(principal: Decimal, rate_pct: Decimal, years: u32) -> LoanInput {
        LoanInput {
            principal,
            annual_rate_pct: rate_pct,
            term_years: years,
        }
    }

    fn compute(principal: Decimal, rate_pct: Decimal, years: u32) -> AmortizationOutput {
        compute_amortization(&loan(principal, rate_pct, years))
            .unwrap()
            .result
    }

    #[test]
    fn test_known_monthly_payment() {
        // $100,000 at 5% over 30 years: the textbook $536.82/month.
        let result = compute(dec!(100000), dec!(5), 30);
        assert!((result.monthly_payment - dec!(536.82)).abs() < TOL);
        assert!((result.total_payment - dec!(193255.78)).abs() < dec!(1));
        assert!((result.total_interest - dec!(93255.78)).abs() < dec!(1));
    }

    #[test]
    fn test_payment_scales_with_principal() {
        let result = compute(dec!(1000000), dec!(5), 30);
        assert!((result.monthly_payment - dec!(5368.22)).abs() < TOL);
    }

    #[test]
    fn test_schedule_length() {
        assert_eq!(compute(dec!(100000), dec!(5), 30).schedule.len(), 360);
        assert_eq!(compute(dec!(5000), dec!(3.5), 1).schedule.len(), 12);
    }

    #[test]
    fn test_balance_never_increases_and_ends_at_zero() {
        let result = compute(dec!(100000), dec!(5), 30);
        let mut previous = dec!(100000);
        for p in &result.schedule {
            assert!(
                p.remaining_balance <= previous,
                "Period {}: balance rose from {} to {}",
                p.period,
                previous,
                p.remaining_balance
            );
            previous = p.remaining_balance;
        }
        let last = result.schedule.last().unwrap();
        assert!(last.remaining_balance >= Decimal::ZERO);
        assert!(last.remaining_balance < dec!(0.000001));
    }

    #[test]
    fn test_principal_portions_sum_to_principal() {
        let result = compute(dec!(250000), dec!(6.25), 15);
        let repaid: Decimal = result.schedule.iter().map(|p| p.principal_portion).sum();
        assert!((repaid - dec!(250000)).abs() < dec!(0.01));
    }

    #[test]
    fn test_payment_decomposition() {
        let result = compute(dec!(100000), dec!(5), 30);
        for p in &result.schedule {
            let recombined = p.principal_portion + p.interest_portion;
            assert!(
                (recombined - p.payment).abs() < dec!(0.000000001),
                "Period {}: {} + {} != {}",
                p.period,
                p.principal_portion,
                p.interest_portion,
                p.payment
            );
            assert_eq!(p.payment, result.monthly_payment);
        }
    }

    #[test]
    fn test_zero_rate_is_straight_division() {
        let result = compute(dec!(120000), dec!(0), 10);
        assert_eq!(result.monthly_payment, dec!(1000));
        assert_eq!(result.total_payment, dec!(120000));
        assert_eq!(result.total_interest, Decimal::ZERO);
        assert_eq!(result.schedule.len(), 120);
        for p in &result.schedule {
            assert_eq!(p.interest_portion, Decimal::ZERO);
            assert_eq!(p.principal_portion, dec!(1000));
        }
        assert_eq!(result.schedule.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(compute_amortization(&loan(dec!(0), dec!(5), 30)).is_err());
        assert!(compute_amortization(&loan(dec!(-100), dec!(5), 30)).is_err());
        assert!(compute_amortization(&loan(dec!(100000), dec!(-1), 30)).is_err());
        assert!(compute_amortization(&loan(dec!(100000), dec!(5), 0)).is_err());
    }

    #[test]
    fn test_invalid_input_names_the_field() {
        let err = compute_amortization(&loan(dec!(100000), dec!(-1), 30)).unwrap_err();
        match err {
            LoanCalcError::InvalidInput { field, .. } => assert_eq!(field, "annual_rate_pct"),
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[test]
    fn test_deterministic() {
        let first = compute(dec!(317500), dec!(4.875), 25);
        let second = compute(dec!(317500), dec!(4.875), 25);
        assert_eq!(first, second);
    }

    #[test]
    fn test_extreme_inputs_warn_but_compute() {
        let output = compute_amortization(&loan(dec!(1000), dec!(150), 60)).unwrap();
        assert_eq!(output.warnings.len(), 2);
        assert_eq!(output.result.schedule.len(), 720);
    }
}

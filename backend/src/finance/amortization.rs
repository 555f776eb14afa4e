//! Annuity arithmetic for repayment mortgages
//!
//! All functions are pure. Rates passed as `rate` are per-period (per tick)
//! fractions, e.g. 3 % a year at 4 ticks a year is `0.0075`.

/// Convert an annual percentage rate into a per-tick fraction
///
/// # Example
/// ```
/// use housing_simulator_core_rs::finance::per_tick_rate;
///
/// assert!((per_tick_rate(3.0, 4) - 0.0075).abs() < 1e-12);
/// ```
pub fn per_tick_rate(annual_percent: f64, ticks_per_year: usize) -> f64 {
    annual_percent / (ticks_per_year as f64 * 100.0)
}

/// Present value of `periods` repayments of `repayment` at per-period `rate`
///
/// `repayment * (1 - (1 + r)^-n) / r`, degrading to `repayment * n` for a
/// zero rate.
pub fn annuity_value(repayment: f64, rate: f64, periods: usize) -> f64 {
    if periods == 0 {
        return 0.0;
    }
    if rate == 0.0 {
        return repayment * periods as f64;
    }
    repayment * (1.0 - (1.0 + rate).powf(-(periods as f64))) / rate
}

/// Largest mortgage serviceable by `max_repayment` per period
///
/// `annual_rate` is a percentage; the mortgage runs for `years` with
/// `periods_per_year` repayments a year.
///
/// # Example
/// ```
/// use housing_simulator_core_rs::finance::{max_mortgage, repayment_for};
///
/// let principal = max_mortgage(1_000.0, 3.0, 4, 25);
/// let repayment = repayment_for(principal, 0.0075, 100);
/// assert!((repayment - 1_000.0).abs() < 1e-6);
/// ```
pub fn max_mortgage(max_repayment: f64, annual_rate: f64, periods_per_year: usize, years: usize) -> f64 {
    let rate = per_tick_rate(annual_rate, periods_per_year);
    annuity_value(max_repayment, rate, periods_per_year * years)
}

/// Per-period repayment that amortises `mortgage` over `periods` at `rate`
///
/// `mortgage * r / (1 - (1 + r)^-n)`, degrading to `mortgage / n` for a
/// zero rate.
pub fn repayment_for(mortgage: f64, rate: f64, periods: usize) -> f64 {
    if periods == 0 {
        return mortgage;
    }
    if rate == 0.0 {
        return mortgage / periods as f64;
    }
    mortgage * rate / (1.0 - (1.0 + rate).powf(-(periods as f64)))
}

/// Balance left after paying `repayment` for `periods` with interest accrual
///
/// Each period the balance grows by `rate` and then the repayment is
/// deducted. The result is not clamped so callers can observe overshoot.
pub fn outstanding_after(principal: f64, rate: f64, repayment: f64, periods: usize) -> f64 {
    (0..periods).fold(principal, |balance, _| balance * (1.0 + rate) - repayment)
}

/// Upper price bound implied by a deposit under a loan-to-value cap
///
/// `deposit / (1 - ltv)`; an LTV of 100 % or more imposes no cap.
pub fn ltv_price_cap(deposit: f64, max_ltv: f64) -> f64 {
    if max_ltv >= 1.0 {
        return f64::INFINITY;
    }
    deposit / (1.0 - max_ltv)
}

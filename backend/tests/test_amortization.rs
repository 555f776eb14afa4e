//! Annuity arithmetic and per-holding repayment behaviour

use housing_simulator_core_rs::finance::{
    annuity_value, ltv_price_cap, max_mortgage, outstanding_after, per_tick_rate, repayment_for,
};
use housing_simulator_core_rs::{Holding, HouseId};
use proptest::prelude::*;

proptest! {
    /// P == R * (1 - (1+r)^-n) / r
    #[test]
    fn prop_repayment_inverts_annuity(
        principal in 1_000.0f64..2_000_000.0,
        rate in 0.0001f64..0.05,
        periods in 1usize..600,
    ) {
        let repayment = repayment_for(principal, rate, periods);
        let value = annuity_value(repayment, rate, periods);
        prop_assert!((value - principal).abs() <= principal * 1e-9);
    }

    /// Paying R for n periods with interest clears the balance
    #[test]
    fn prop_full_term_clears_balance(
        principal in 1_000.0f64..2_000_000.0,
        rate in 0.0001f64..0.02,
        periods in 1usize..400,
    ) {
        let repayment = repayment_for(principal, rate, periods);
        let left = outstanding_after(principal, rate, repayment, periods);
        prop_assert!(left <= principal * 1e-8, "left {} of {}", left, principal);
    }

    #[test]
    fn prop_holding_balance_never_negative(
        principal in 1_000.0f64..500_000.0,
        ticks in 1usize..400,
    ) {
        let mut holding = Holding::financed(HouseId(0), principal, 0.0075, 100, 8);
        for _ in 0..ticks {
            holding.apply_repayment();
            prop_assert!(holding.balance >= 0.0);
        }
    }
}

#[test]
fn test_zero_rate_degrades_to_straight_line() {
    assert_eq!(repayment_for(12_000.0, 0.0, 12), 1_000.0);
    assert_eq!(annuity_value(1_000.0, 0.0, 12), 12_000.0);
}

#[test]
fn test_max_mortgage_matches_per_tick_annuity() {
    let direct = annuity_value(2_475.0, per_tick_rate(3.0, 4), 100);
    assert!((max_mortgage(2_475.0, 3.0, 4, 25) - direct).abs() < 1e-9);
}

#[test]
fn test_ltv_cap() {
    assert!((ltv_price_cap(10_000.0, 0.9) - 100_000.0).abs() < 1e-6);
    assert!(ltv_price_cap(10_000.0, 1.0).is_infinite());
}

#[test]
fn test_cleared_balance_stops_repayments() {
    let mut holding = Holding::financed(HouseId(3), 1_000.0, 0.0, 4, 4);
    assert_eq!(holding.repayment, 250.0);
    for _ in 0..4 {
        holding.apply_repayment();
    }
    assert_eq!(holding.balance, 0.0);
    assert_eq!(holding.repayment, 0.0);
    assert!(!holding.needs_rate_reset());
}

#[test]
fn test_rate_reset_uses_initial_principal() {
    let mut holding = Holding::financed(HouseId(1), 100_000.0, 0.0075, 100, 1);
    for _ in 0..10 {
        holding.apply_repayment();
    }
    holding.count_down_terms();
    assert!(holding.needs_rate_reset());

    let changed = holding.reset_rate(0.01, 100, 8);
    assert!(changed);
    assert!((holding.repayment - repayment_for(100_000.0, 0.01, 100)).abs() < 1e-9);
    assert_eq!(holding.rate_term, Some(8));
}

#[test]
fn test_rate_reset_at_same_rate_keeps_repayment() {
    let mut holding = Holding::financed(HouseId(1), 100_000.0, 0.0075, 100, 0);
    let before = holding.repayment;
    assert!(!holding.reset_rate(0.0075, 100, 12));
    assert_eq!(holding.repayment, before);
    assert_eq!(holding.rate_term, Some(12));
}

#[test]
fn test_pay_off_clears_debt_keeps_rent() {
    let mut holding = Holding::financed(HouseId(2), 50_000.0, 0.0075, 100, 8);
    holding.rent_income = 400.0;
    holding.pay_off();
    assert_eq!(holding.balance, 0.0);
    assert_eq!(holding.repayment, 0.0);
    assert_eq!(holding.rent_income, 400.0);
    assert_eq!(holding.equity_at(80_000.0), 80_000.0);
}

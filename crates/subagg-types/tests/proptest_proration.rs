//! Property-based tests for the proration engine
//!
//! These tests verify:
//! - Overlap is never negative
//! - Disjoint intervals never bill anything
//! - A subscription covering the window bills the whole window
//! - Cost scales with price

use proptest::prelude::*;
use subagg_types::proration::{cost, months_overlap};
use subagg_types::{BillingWindow, YearMonth};

// ============================================================================
// Strategies
// ============================================================================

/// Generate months across a few decades
fn arb_month() -> impl Strategy<Value = YearMonth> {
    (1990i32..2060, 1u32..=12).prop_map(|(year, month)| {
        YearMonth::new(year, month).expect("generated month is valid")
    })
}

/// Generate an ordered (start, end) pair of months
fn arb_window() -> impl Strategy<Value = (YearMonth, YearMonth)> {
    (arb_month(), arb_month()).prop_map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
}

fn span(start: YearMonth, end: YearMonth) -> i64 {
    end.ordinal() - start.ordinal() + 1
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Property: overlap is non-negative for any inputs, including reversed ones
    #[test]
    fn prop_overlap_non_negative(
        sub_start in arb_month(),
        sub_end in prop::option::of(arb_month()),
        window_start in arb_month(),
        window_end in arb_month(),
    ) {
        let months = months_overlap(sub_start, sub_end, window_start, window_end);
        prop_assert!(i64::from(months) >= 0);
    }

    /// Property: a subscription that ended before the window bills nothing
    #[test]
    fn prop_ended_before_window_is_zero(
        (window_start, window_end) in arb_window(),
        sub_start in arb_month(),
        gap in 1u32..120,
    ) {
        let end_ordinal = window_start.ordinal() - i64::from(gap);
        let sub_end = month_from_ordinal(end_ordinal);
        let sub_start = sub_start.min(sub_end);

        prop_assert_eq!(months_overlap(sub_start, Some(sub_end), window_start, window_end), 0);
    }

    /// Property: a subscription starting after the window bills nothing
    #[test]
    fn prop_started_after_window_is_zero(
        (window_start, window_end) in arb_window(),
        gap in 1u32..120,
        sub_end in prop::option::of(arb_month()),
    ) {
        let sub_start = month_from_ordinal(window_end.ordinal() + i64::from(gap));
        let sub_end = sub_end.map(|end| end.max(sub_start));

        prop_assert_eq!(months_overlap(sub_start, sub_end, window_start, window_end), 0);
    }

    /// Property: full containment bills the whole window length
    #[test]
    fn prop_containment_bills_full_window(
        (window_start, window_end) in arb_window(),
        lead in 0u32..60,
        tail in prop::option::of(0u32..60),
    ) {
        let sub_start = month_from_ordinal(window_start.ordinal() - i64::from(lead));
        let sub_end = tail.map(|t| month_from_ordinal(window_end.ordinal() + i64::from(t)));

        let months = months_overlap(sub_start, sub_end, window_start, window_end);
        prop_assert_eq!(i64::from(months), span(window_start, window_end));

        let window = BillingWindow::new(window_start, window_end).unwrap();
        prop_assert_eq!(window.months(), months);
    }

    /// Property: overlap never exceeds either interval's length
    #[test]
    fn prop_overlap_bounded(
        (sub_start, sub_end) in arb_window(),
        (window_start, window_end) in arb_window(),
    ) {
        let months = i64::from(months_overlap(sub_start, Some(sub_end), window_start, window_end));
        prop_assert!(months <= span(sub_start, sub_end));
        prop_assert!(months <= span(window_start, window_end));
    }

    /// Property: cost is price times overlap and strictly increases with price
    #[test]
    fn prop_cost_monotonic_in_price(
        price in 1i32..100_000,
        bump in 1i32..1_000,
        months in 1u32..600,
    ) {
        prop_assert_eq!(cost(price, months), i64::from(price) * i64::from(months));
        prop_assert!(cost(price + bump, months) > cost(price, months));
    }
}

fn month_from_ordinal(ordinal: i64) -> YearMonth {
    // ordinal = year * 12 + month, month in 1..=12
    let zero_based = ordinal - 1;
    let year = zero_based.div_euclid(12);
    let month = zero_based.rem_euclid(12) + 1;
    YearMonth::new(year as i32, month as u32).expect("ordinal maps to a valid month")
}

#[test]
fn test_month_from_ordinal_roundtrip() {
    let m = YearMonth::new(2025, 12).unwrap();
    assert_eq!(month_from_ordinal(m.ordinal()), m);
    let m = YearMonth::new(2025, 1).unwrap();
    assert_eq!(month_from_ordinal(m.ordinal()), m);
}

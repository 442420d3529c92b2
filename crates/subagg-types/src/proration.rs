//! Proration engine
//!
//! Computes how many whole calendar months a subscription was billed inside a
//! query window, and what that costs. Everything here is pure: no storage, no
//! clock, and no input makes it fail. Disjoint intervals simply yield zero.
//!
//! # Example
//!
//! ```
//! use subagg_types::proration::{cost, months_overlap};
//! use subagg_types::YearMonth;
//!
//! let ym = |s: &str| s.parse::<YearMonth>().unwrap();
//!
//! // Open-ended subscription since January, window January..June
//! let months = months_overlap(ym("01-2025"), None, ym("01-2025"), ym("06-2025"));
//! assert_eq!(months, 6);
//! assert_eq!(cost(300, months), 1800);
//! ```

use serde::{Deserialize, Serialize};

use crate::{Subscription, ValidationError, YearMonth};

/// The single currency all prices are recorded in
pub const CURRENCY: &str = "RUB";

/// Number of whole months during which `[sub_start, sub_end]` and
/// `[window_start, window_end]` overlap. An open end (`None`) runs through
/// the window end.
pub fn months_overlap(
    sub_start: YearMonth,
    sub_end: Option<YearMonth>,
    window_start: YearMonth,
    window_end: YearMonth,
) -> u32 {
    let effective_end = sub_end.map_or(window_end, |end| end.min(window_end));
    let effective_start = sub_start.max(window_start);

    let months = effective_end.ordinal() - effective_start.ordinal() + 1;
    // Negative means no overlap.
    u32::try_from(months).unwrap_or(0)
}

/// Cost of `months` billed months at a flat monthly `price`
pub fn cost(price: i32, months: u32) -> i64 {
    i64::from(price) * i64::from(months)
}

/// An inclusive range of months to aggregate cost over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct BillingWindow {
    start: YearMonth,
    end: YearMonth,
}

/// Unchecked wire form of a window; deserialization goes through
/// [`BillingWindow::new`].
#[derive(Deserialize)]
struct WindowBounds {
    start: YearMonth,
    end: YearMonth,
}

impl TryFrom<WindowBounds> for BillingWindow {
    type Error = ValidationError;

    fn try_from(bounds: WindowBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.start, bounds.end)
    }
}

impl BillingWindow {
    /// Create a window, rejecting one that starts after it ends
    pub fn new(start: YearMonth, end: YearMonth) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// First month of the window
    pub fn start(&self) -> YearMonth {
        self.start
    }

    /// Last month of the window
    pub fn end(&self) -> YearMonth {
        self.end
    }

    /// Length of the window in months
    pub fn months(&self) -> u32 {
        months_overlap(self.start, Some(self.end), self.start, self.end)
    }

    /// Whether a subscription active over `[start, end]` touches the window.
    ///
    /// This is the candidate filter applied before proration; rows failing
    /// it are excluded at the source.
    pub fn admits(&self, start: YearMonth, end: Option<YearMonth>) -> bool {
        start <= self.end && end.map_or(true, |end| end >= self.start)
    }

    /// Billed months of a subscription inside this window
    pub fn overlap(&self, sub: &Subscription) -> u32 {
        months_overlap(sub.start_date, sub.end_date, self.start, self.end)
    }

    /// Cost contribution of a subscription inside this window
    pub fn cost_of(&self, sub: &Subscription) -> i64 {
        if !self.admits(sub.start_date, sub.end_date) {
            return 0;
        }
        cost(sub.price, self.overlap(sub))
    }
}

/// Sum of the cost contributions of `subscriptions` inside `window`
pub fn total_cost<'a, I>(subscriptions: I, window: &BillingWindow) -> i64
where
    I: IntoIterator<Item = &'a Subscription>,
{
    subscriptions
        .into_iter()
        .filter(|sub| window.admits(sub.start_date, sub.end_date))
        .map(|sub| window.cost_of(sub))
        .sum()
}

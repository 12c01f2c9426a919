// 💳 Billing Engine - cycle normalization and next-charge projection
//
// Everything in here is a pure function of its arguments:
// no I/O, no shared state, safe to call from any number of handlers.
//
// Canonical factor table (price × factor = monthly equivalent):
//   daily      30
//   weekly     52 / 12
//   monthly    1
//   quarterly  1 / 3
//   yearly     1 / 12
// Yearly equivalent is always monthly equivalent × 12.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// BILLING CYCLE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

/// Error returned by the strict parser for labels outside the closed set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBillingCycle(pub String);

impl fmt::Display for UnknownBillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a valid billing cycle (expected daily, weekly, monthly, quarterly or yearly)",
            self.0
        )
    }
}

impl std::error::Error for UnknownBillingCycle {}

impl BillingCycle {
    pub const ALL: [BillingCycle; 5] = [
        BillingCycle::Daily,
        BillingCycle::Weekly,
        BillingCycle::Monthly,
        BillingCycle::Quarterly,
        BillingCycle::Yearly,
    ];

    /// Lenient parse used on already-stored data.
    ///
    /// Unknown labels are treated as `Monthly`. This is the only fallback
    /// policy in the crate: it applies to cost normalization and to date
    /// advancement alike.
    pub fn from_label(label: &str) -> BillingCycle {
        match label.parse() {
            Ok(cycle) => cycle,
            Err(UnknownBillingCycle(raw)) => {
                tracing::warn!(label = %raw, "unrecognized billing cycle, treating as monthly");
                BillingCycle::Monthly
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Daily => "daily",
            BillingCycle::Weekly => "weekly",
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Yearly => "yearly",
        }
    }

    /// Human-readable interval ("per month", "per year", ...)
    pub fn interval_display(&self) -> &'static str {
        match self {
            BillingCycle::Daily => "day",
            BillingCycle::Weekly => "week",
            BillingCycle::Monthly => "month",
            BillingCycle::Quarterly => "quarter",
            BillingCycle::Yearly => "year",
        }
    }

    /// Multiplier that turns one charge into its monthly equivalent
    pub fn monthly_factor(&self) -> f64 {
        match self {
            BillingCycle::Daily => 30.0,
            BillingCycle::Weekly => 52.0 / 12.0,
            BillingCycle::Monthly => 1.0,
            BillingCycle::Quarterly => 1.0 / 3.0,
            BillingCycle::Yearly => 1.0 / 12.0,
        }
    }
}

impl Default for BillingCycle {
    fn default() -> Self {
        BillingCycle::Monthly
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict, case-insensitive parse. Surrounding whitespace is ignored.
impl FromStr for BillingCycle {
    type Err = UnknownBillingCycle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(BillingCycle::Daily),
            "weekly" => Ok(BillingCycle::Weekly),
            "monthly" => Ok(BillingCycle::Monthly),
            "quarterly" => Ok(BillingCycle::Quarterly),
            "yearly" => Ok(BillingCycle::Yearly),
            _ => Err(UnknownBillingCycle(s.to_string())),
        }
    }
}

// ============================================================================
// COST NORMALIZATION
// ============================================================================

/// Price normalized to one month. Assumes `price` was validated upstream.
pub fn monthly_equivalent(price: f64, cycle: BillingCycle) -> f64 {
    price * cycle.monthly_factor()
}

/// Price normalized to one year (`monthly_equivalent * 12`)
pub fn yearly_equivalent(price: f64, cycle: BillingCycle) -> f64 {
    monthly_equivalent(price, cycle) * 12.0
}

// ============================================================================
// DATE PROJECTION
// ============================================================================

/// Next charge date: `anchor` plus exactly one billing cycle.
///
/// Month and year steps are calendar steps. When the target month is shorter
/// than the anchor's day, the result is clamped to that month's last day
/// (2024-01-31 + 1 month = 2024-02-29; 2024-02-29 + 1 year = 2025-02-28).
///
/// Returns `None` only when the result falls outside chrono's date range.
pub fn next_charge_date(anchor: NaiveDate, cycle: BillingCycle) -> Option<NaiveDate> {
    match cycle {
        BillingCycle::Daily => anchor.checked_add_days(Days::new(1)),
        BillingCycle::Weekly => anchor.checked_add_days(Days::new(7)),
        BillingCycle::Monthly => anchor.checked_add_months(Months::new(1)),
        BillingCycle::Quarterly => anchor.checked_add_months(Months::new(3)),
        BillingCycle::Yearly => anchor.checked_add_months(Months::new(12)),
    }
}

/// Apply `next_charge_date` `cycles` times (each step from the previous result)
pub fn advance_by(anchor: NaiveDate, cycle: BillingCycle, cycles: u32) -> Option<NaiveDate> {
    (0..cycles).try_fold(anchor, |date, _| next_charge_date(date, cycle))
}

/// Signed whole days from `today` to `date` (negative when overdue)
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    date.signed_duration_since(today).num_days()
}

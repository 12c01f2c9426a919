// 💵 Payments - "mark as paid" rules and payment history records
//
// The decision logic lives here as pure functions; db::mark_as_paid runs
// them inside a single SQLite transaction.

use crate::billing;
use crate::subscription::{Subscription, SubscriptionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Double-click protection window
pub const PAYMENT_DEBOUNCE_SECS: i64 = 10;
pub const DEFAULT_PAYMENT_METHOD: &str = "Manual";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    pub subscription_id: String,
    pub amount: f64,
    pub payment_method: String,
    pub paid_at: DateTime<Utc>,
}

/// Payment joined with the subscription it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryEntry {
    #[serde(flatten)]
    pub payment: PaymentRecord,
    pub subscription_name: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRejection {
    /// Last payment is younger than the debounce window
    TooSoon,
    /// A payment already exists since today's 00:00 UTC
    AlreadyPaidToday,
}

impl fmt::Display for PaymentRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentRejection::TooSoon => {
                f.write_str("Payment already recorded recently. Please wait a moment.")
            }
            PaymentRejection::AlreadyPaidToday => f.write_str("Payment already recorded for today"),
        }
    }
}

impl std::error::Error for PaymentRejection {}

/// Start of the current UTC day
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

/// Debounce + at-most-one-payment-per-day check
pub fn check_payment_allowed(
    subscription: &Subscription,
    paid_today: bool,
    now: DateTime<Utc>,
) -> Result<(), PaymentRejection> {
    if let Some(last) = subscription.last_payment_date {
        if (now - last).num_seconds() < PAYMENT_DEBOUNCE_SECS {
            return Err(PaymentRejection::TooSoon);
        }
    }
    if paid_today {
        return Err(PaymentRejection::AlreadyPaidToday);
    }
    Ok(())
}

/// Apply one payment: returns the updated subscription and the new record.
///
/// The next billing date advances one cycle from the stored next billing
/// date (today when none is stored). Status becomes active.
pub fn record_payment(
    subscription: &Subscription,
    payment_method: Option<&str>,
    now: DateTime<Utc>,
) -> (Subscription, PaymentRecord) {
    let payment = PaymentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        subscription_id: subscription.id.clone(),
        amount: subscription.price,
        payment_method: payment_method
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_PAYMENT_METHOD)
            .to_string(),
        paid_at: now,
    };

    let mut updated = subscription.clone();
    updated.payment_count += 1;
    updated.total_spent += subscription.price;
    updated.last_payment_date = Some(now);

    let from = subscription.next_billing_date.unwrap_or_else(|| now.date_naive());
    updated.next_billing_date =
        billing::next_charge_date(from, subscription.billing_cycle).or(Some(from));
    updated.status = SubscriptionStatus::Active;
    updated.updated_at = now;

    (updated, payment)
}

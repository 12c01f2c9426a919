// 📊 Dashboard Aggregator - totals, category breakdown, rankings, upcoming charges
//
// summarize() re-derives everything from the slice it is given.
// Nothing is cached and the input is never mutated.

use crate::billing::{self, BillingCycle};
use crate::subscription::Subscription;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Entries kept in `top_subscriptions`
pub const TOP_N: usize = 5;
/// Entries kept in `upcoming_payments`
pub const UPCOMING_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedSubscription {
    pub subscription: Subscription,
    pub monthly_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingPayment {
    pub subscription: Subscription,
    pub charge_date: NaiveDate,
    pub days_until: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_monthly: f64,
    pub total_yearly: f64,
    pub total_subscriptions: usize,
    /// Category -> summed monthly equivalent. Only categories present in the input.
    pub category_breakdown: BTreeMap<String, f64>,
    pub top_subscriptions: Vec<RankedSubscription>,
    pub upcoming_payments: Vec<UpcomingPayment>,
}

/// Reduce a subscription set into dashboard statistics.
///
/// Status is not filtered here; callers decide which records to pass in.
pub fn summarize(subscriptions: &[Subscription], now: DateTime<Utc>) -> DashboardSummary {
    let mut total_monthly = 0.0;
    let mut category_breakdown: BTreeMap<String, f64> = BTreeMap::new();
    let mut ranked = Vec::with_capacity(subscriptions.len());

    for sub in subscriptions {
        let monthly_cost = sub.monthly_equivalent();
        total_monthly += monthly_cost;
        *category_breakdown.entry(sub.category.clone()).or_insert(0.0) += monthly_cost;
        ranked.push(RankedSubscription {
            subscription: sub.clone(),
            monthly_cost,
        });
    }

    // sort_by is stable: equal costs keep input order
    ranked.sort_by(|a, b| b.monthly_cost.total_cmp(&a.monthly_cost));
    ranked.truncate(TOP_N);

    DashboardSummary {
        total_monthly,
        total_yearly: total_monthly * 12.0,
        total_subscriptions: subscriptions.len(),
        category_breakdown,
        top_subscriptions: ranked,
        upcoming_payments: upcoming_payments(subscriptions, now, UPCOMING_N),
    }
}

/// Charges dated strictly after `now`, soonest first, at most `limit`.
///
/// Charge dates are whole days starting at 00:00 UTC, so a date is in the
/// future iff it is after today's date. Unresolvable dates are skipped.
pub fn upcoming_payments(
    subscriptions: &[Subscription],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<UpcomingPayment> {
    let today = now.date_naive();

    let mut upcoming: Vec<UpcomingPayment> = subscriptions
        .iter()
        .filter_map(|sub| {
            let charge_date = sub.upcoming_charge_date()?;
            (charge_date > today).then(|| UpcomingPayment {
                subscription: sub.clone(),
                charge_date,
                days_until: billing::days_until(charge_date, today),
            })
        })
        .collect();

    upcoming.sort_by_key(|p| p.charge_date);
    upcoming.truncate(limit);
    upcoming
}

/// Active subscriptions whose next charge falls inside their reminder window
/// (0..=reminder_days days away), soonest first
pub fn due_reminders(subscriptions: &[Subscription], today: NaiveDate) -> Vec<UpcomingPayment> {
    let mut due: Vec<UpcomingPayment> = subscriptions
        .iter()
        .filter(|sub| sub.is_active())
        .filter_map(|sub| {
            let charge_date = sub.upcoming_charge_date()?;
            let days_until = billing::days_until(charge_date, today);
            (0..=sub.reminder_days as i64)
                .contains(&days_until)
                .then(|| UpcomingPayment {
                    subscription: sub.clone(),
                    charge_date,
                    days_until,
                })
        })
        .collect();

    due.sort_by_key(|p| p.charge_date);
    due
}

/// Monthly totals per billing cycle, for "where does the money go" views
pub fn breakdown_by_cycle(subscriptions: &[Subscription]) -> BTreeMap<BillingCycle, f64> {
    let mut by_cycle = BTreeMap::new();
    for sub in subscriptions {
        *by_cycle.entry(sub.billing_cycle).or_insert(0.0) += sub.monthly_equivalent();
    }
    by_cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::tests::{create_test_subscription, date, noon};
    use crate::subscription::SubscriptionStatus;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_input() {
        let summary = summarize(&[], noon(2024, 6, 1));

        assert_eq!(summary.total_monthly, 0.0);
        assert_eq!(summary.total_yearly, 0.0);
        assert_eq!(summary.total_subscriptions, 0);
        assert!(summary.category_breakdown.is_empty());
        assert!(summary.top_subscriptions.is_empty());
        assert!(summary.upcoming_payments.is_empty());
        assert_eq!(summary, DashboardSummary::default());
    }

    #[test]
    fn test_mixed_cycle_totals() {
        let subs = vec![
            create_test_subscription("Streaming", 100.0, BillingCycle::Monthly, "Entertainment", None),
            create_test_subscription("Cloud", 1200.0, BillingCycle::Yearly, "Cloud Storage", None),
            create_test_subscription("Meals", 700.0, BillingCycle::Weekly, "Others", None),
        ];
        let summary = summarize(&subs, noon(2024, 6, 1));

        let expected = 100.0 + 100.0 + 700.0 * 52.0 / 12.0;
        assert!(approx(summary.total_monthly, expected));
        assert!(approx(summary.total_monthly, 3233.333333333333));
        assert!(approx(summary.total_yearly, expected * 12.0));
        assert_eq!(summary.total_subscriptions, 3);
    }

    #[test]
    fn test_category_breakdown_sums_per_category() {
        let subs = vec![
            create_test_subscription("Spotify", 10.0, BillingCycle::Monthly, "Music", None),
            create_test_subscription("Tidal", 120.0, BillingCycle::Yearly, "Music", None),
            create_test_subscription("Steam", 30.0, BillingCycle::Quarterly, "Gaming", None),
        ];
        let summary = summarize(&subs, noon(2024, 6, 1));

        assert_eq!(summary.category_breakdown.len(), 2);
        assert!(approx(summary.category_breakdown["Music"], 20.0));
        assert!(approx(summary.category_breakdown["Gaming"], 10.0));
        assert!(!summary.category_breakdown.contains_key("Software"));
    }

    #[test]
    fn test_top_subscriptions_keeps_five_highest() {
        let subs: Vec<Subscription> = (1..=10)
            .map(|i| {
                create_test_subscription(
                    &format!("Sub {}", i),
                    i as f64,
                    BillingCycle::Monthly,
                    "Software",
                    None,
                )
            })
            .collect();
        let summary = summarize(&subs, noon(2024, 6, 1));

        let names: Vec<&str> = summary
            .top_subscriptions
            .iter()
            .map(|r| r.subscription.name.as_str())
            .collect();
        assert_eq!(names, vec!["Sub 10", "Sub 9", "Sub 8", "Sub 7", "Sub 6"]);
        assert!(approx(summary.top_subscriptions[0].monthly_cost, 10.0));
    }

    #[test]
    fn test_top_subscriptions_ties_keep_input_order() {
        let subs = vec![
            create_test_subscription("First", 12.0, BillingCycle::Monthly, "A", None),
            create_test_subscription("Second", 12.0, BillingCycle::Monthly, "B", None),
            create_test_subscription("Big", 50.0, BillingCycle::Monthly, "A", None),
            create_test_subscription("Third", 12.0, BillingCycle::Monthly, "C", None),
        ];
        let summary = summarize(&subs, noon(2024, 6, 1));

        let names: Vec<&str> = summary
            .top_subscriptions
            .iter()
            .map(|r| r.subscription.name.as_str())
            .collect();
        assert_eq!(names, vec!["Big", "First", "Second", "Third"]);
    }

    #[test]
    fn test_upcoming_excludes_past_and_today() {
        let now = noon(2024, 6, 10);
        let subs = vec![
            create_test_subscription("Past", 1.0, BillingCycle::Monthly, "A", Some(date(2024, 6, 1))),
            create_test_subscription("Today", 1.0, BillingCycle::Monthly, "A", Some(date(2024, 6, 10))),
            create_test_subscription("Later", 1.0, BillingCycle::Monthly, "A", Some(date(2024, 7, 1))),
            create_test_subscription("Soon", 1.0, BillingCycle::Monthly, "A", Some(date(2024, 6, 11))),
        ];
        let summary = summarize(&subs, now);

        let names: Vec<&str> = summary
            .upcoming_payments
            .iter()
            .map(|p| p.subscription.name.as_str())
            .collect();
        assert_eq!(names, vec!["Soon", "Later"]);
        assert_eq!(summary.upcoming_payments[0].days_until, 1);
        assert_eq!(summary.upcoming_payments[1].charge_date, date(2024, 7, 1));
    }

    #[test]
    fn test_upcoming_projects_from_start_when_no_next_date() {
        // start_date is 2024-01-01 in the helper
        let sub = create_test_subscription("Annual", 50.0, BillingCycle::Yearly, "A", None);
        let upcoming = upcoming_payments(&[sub], noon(2024, 6, 1), UPCOMING_N);

        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].charge_date, date(2025, 1, 1));
    }

    #[test]
    fn test_unresolvable_charge_date_is_skipped_but_counted() {
        let mut stuck = create_test_subscription("Forever", 120.0, BillingCycle::Yearly, "Software", None);
        stuck.start_date = NaiveDate::MAX;
        let normal = create_test_subscription("Music", 10.0, BillingCycle::Monthly, "Music", Some(date(2024, 7, 1)));

        let summary = summarize(&[stuck, normal], noon(2024, 6, 1));

        assert!(approx(summary.total_monthly, 20.0));
        assert_eq!(summary.total_subscriptions, 2);
        assert_eq!(summary.upcoming_payments.len(), 1);
        assert_eq!(summary.upcoming_payments[0].subscription.name, "Music");
    }

    #[test]
    fn test_upcoming_truncates_to_five_ascending() {
        let subs: Vec<Subscription> = (1..=8)
            .rev()
            .map(|d| {
                create_test_subscription(
                    &format!("Day {}", d),
                    1.0,
                    BillingCycle::Monthly,
                    "A",
                    Some(date(2024, 7, d)),
                )
            })
            .collect();
        let summary = summarize(&subs, noon(2024, 6, 1));

        let dates: Vec<NaiveDate> = summary.upcoming_payments.iter().map(|p| p.charge_date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 7, 1), date(2024, 7, 2), date(2024, 7, 3), date(2024, 7, 4), date(2024, 7, 5)]
        );
    }

    #[test]
    fn test_summarize_does_not_mutate_input() {
        let subs = vec![
            create_test_subscription("B", 5.0, BillingCycle::Monthly, "A", Some(date(2024, 7, 1))),
            create_test_subscription("A", 50.0, BillingCycle::Monthly, "A", Some(date(2024, 6, 20))),
        ];
        let before = subs.clone();
        let _ = summarize(&subs, noon(2024, 6, 1));
        assert_eq!(subs, before);
    }

    #[test]
    fn test_due_reminders_window() {
        let today = date(2024, 6, 10);
        let mut paused = create_test_subscription("Paused", 1.0, BillingCycle::Monthly, "A", Some(date(2024, 6, 11)));
        paused.status = SubscriptionStatus::Paused;

        let subs = vec![
            create_test_subscription("In window", 1.0, BillingCycle::Monthly, "A", Some(date(2024, 6, 12))),
            create_test_subscription("Due today", 1.0, BillingCycle::Monthly, "A", Some(today)),
            create_test_subscription("Too far", 1.0, BillingCycle::Monthly, "A", Some(date(2024, 6, 20))),
            create_test_subscription("Overdue", 1.0, BillingCycle::Monthly, "A", Some(date(2024, 6, 9))),
            paused,
        ];
        let due = due_reminders(&subs, today);

        let names: Vec<&str> = due.iter().map(|p| p.subscription.name.as_str()).collect();
        assert_eq!(names, vec!["Due today", "In window"]);
    }

    #[test]
    fn test_breakdown_by_cycle() {
        let subs = vec![
            create_test_subscription("A", 10.0, BillingCycle::Monthly, "X", None),
            create_test_subscription("B", 5.0, BillingCycle::Monthly, "X", None),
            create_test_subscription("C", 24.0, BillingCycle::Yearly, "X", None),
        ];
        let by_cycle = breakdown_by_cycle(&subs);

        assert!(approx(by_cycle[&BillingCycle::Monthly], 15.0));
        assert!(approx(by_cycle[&BillingCycle::Yearly], 2.0));
        assert!(!by_cycle.contains_key(&BillingCycle::Daily));
    }
}

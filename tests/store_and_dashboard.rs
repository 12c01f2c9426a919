// End-to-end: CSV import → store → payments → dashboard

use chrono::{NaiveDate, TimeZone, Utc};
use rusqlite::Connection;
use subtrack::{
    dashboard, get_all_subscriptions, get_payment_history, import_csv, import_csv_reader,
    mark_as_paid, setup_database, soft_delete_subscription, BillingCycle, Subscription,
};

const CSV: &str = "name,price,billingCycle,category,startDate,nextBillingDate,reminderDays\n\
Netflix,15.49,monthly,Entertainment,2024-01-15,2024-03-15,3\n\
Spotify,9.99,monthly,Music,2024-02-01,2024-03-02,3\n\
Domain,12,yearly,Software,2023-06-20,2024-06-20,7\n\
Gym,30,monthly,Health & Fitness,2024-01-05,2024-03-05,5\n\
Paper,2.5,weekly,News & Media,2024-02-26,,0\n";

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    let report = import_csv_reader(&conn, CSV.as_bytes(), Utc.with_ymd_and_hms(2024, 2, 28, 9, 0, 0).unwrap()).unwrap();
    assert_eq!(report.inserted, 5);
    assert!(report.rejected.is_empty());
    conn
}

fn find<'a>(subs: &'a [Subscription], name: &str) -> &'a Subscription {
    subs.iter().find(|s| s.name == name).unwrap()
}

#[test]
fn test_dashboard_over_imported_data() {
    let conn = setup();
    let subs = get_all_subscriptions(&conn).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    let summary = dashboard::summarize(&subs, now);

    let expected_monthly = 15.49 + 9.99 + 1.0 + 30.0 + 2.5 * 52.0 / 12.0;
    assert!((summary.total_monthly - expected_monthly).abs() < 1e-9);
    assert!((summary.total_yearly - expected_monthly * 12.0).abs() < 1e-9);
    assert_eq!(summary.total_subscriptions, 5);
    assert_eq!(summary.category_breakdown.len(), 5);

    let top: Vec<&str> = summary.top_subscriptions.iter().map(|r| r.subscription.name.as_str()).collect();
    assert_eq!(top, vec!["Gym", "Netflix", "Paper", "Spotify", "Domain"]);

    // Paper: no stored next date → start + 1 week = 2024-03-04
    let upcoming: Vec<(&str, NaiveDate)> = summary
        .upcoming_payments
        .iter()
        .map(|p| (p.subscription.name.as_str(), p.charge_date))
        .collect();
    assert_eq!(upcoming[0], ("Spotify", NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()));
    assert_eq!(upcoming[1], ("Paper", NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()));
    assert_eq!(upcoming[2], ("Gym", NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()));
    assert_eq!(upcoming.len(), 5);

    let by_cycle = dashboard::breakdown_by_cycle(&subs);
    assert!((by_cycle[&BillingCycle::Yearly] - 1.0).abs() < 1e-9);
}

#[test]
fn test_reminders_window() {
    let conn = setup();
    let subs = get_all_subscriptions(&conn).unwrap();
    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

    let due = dashboard::due_reminders(&subs, today);
    let names: Vec<&str> = due.iter().map(|r| r.subscription.name.as_str()).collect();

    // Spotify in 1 day (window 3), Gym in 4 days (window 5); Paper's window is 0
    assert_eq!(names, vec!["Spotify", "Gym"]);
}

#[test]
fn test_payment_moves_charge_out_of_upcoming_slot() {
    let mut conn = setup();
    let subs = get_all_subscriptions(&conn).unwrap();
    let spotify_id = find(&subs, "Spotify").id.clone();
    let paid_at = Utc.with_ymd_and_hms(2024, 3, 1, 18, 30, 0).unwrap();

    let (updated, _) = mark_as_paid(&mut conn, &spotify_id, None, paid_at).unwrap();
    assert_eq!(updated.next_billing_date, NaiveDate::from_ymd_opt(2024, 4, 2));

    let subs = get_all_subscriptions(&conn).unwrap();
    let summary = dashboard::summarize(&subs, paid_at);
    assert_ne!(summary.upcoming_payments[0].subscription.name, "Spotify");
    assert_eq!(get_payment_history(&conn).unwrap().len(), 1);
}

#[test]
fn test_deleted_subscriptions_leave_totals() {
    let conn = setup();
    let subs = get_all_subscriptions(&conn).unwrap();
    let gym_id = find(&subs, "Gym").id.clone();
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    let before = dashboard::summarize(&subs, now).total_monthly;
    soft_delete_subscription(&conn, &gym_id, now).unwrap();
    let after = dashboard::summarize(&get_all_subscriptions(&conn).unwrap(), now).total_monthly;

    assert!((before - after - 30.0).abs() < 1e-9);
}

#[test]
fn test_import_from_file_is_idempotent() {
    let path = std::env::temp_dir().join(format!("subtrack-import-{}.csv", std::process::id()));
    std::fs::write(&path, CSV).unwrap();

    let conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 2, 28, 9, 0, 0).unwrap();

    let first = import_csv(&conn, &path, now).unwrap();
    let second = import_csv(&conn, &path, now).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(first.inserted, 5);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 5);
}

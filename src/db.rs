// 🗄️ SQLite Store - subscriptions, categories, payments, audit events
//
// Every function takes the connection explicitly; there is no process-wide
// handle. Timestamps are stored as RFC 3339 text (UTC, microseconds) so that
// string comparison matches time order.

use crate::billing::BillingCycle;
use crate::category::{default_categories, Category, NewCategory};
use crate::error::{TrackerError, TrackerResult};
use crate::payments::{self, PaymentHistoryEntry, PaymentRecord};
use crate::subscription::{self, RawSubscription, Subscription};
use crate::validation::ValidationError;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// Event for audit trail ("Every change is an event")
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

/// Outcome of a CSV import
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub duplicates: usize,
    /// (CSV line number, reasons)
    pub rejected: Vec<(usize, Vec<ValidationError>)>,
}

pub fn setup_database(conn: &Connection) -> TrackerResult<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Subscriptions Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subscriptions (
            id TEXT PRIMARY KEY,
            idempotency_hash TEXT NOT NULL,
            name TEXT NOT NULL,
            price REAL NOT NULL CHECK (price >= 0),
            currency TEXT NOT NULL,
            billing_cycle TEXT NOT NULL,
            start_date TEXT NOT NULL,
            next_billing_date TEXT,
            category TEXT NOT NULL,
            status TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT '',
            website TEXT,
            auto_renew INTEGER NOT NULL DEFAULT 1,
            reminder_days INTEGER NOT NULL DEFAULT 3,
            total_spent REAL NOT NULL DEFAULT 0,
            payment_count INTEGER NOT NULL DEFAULT 0,
            last_payment_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        )",
        [],
    )?;

    // ==========================================================================
    // Categories / Payments
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            icon TEXT NOT NULL,
            color TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS payments (
            id TEXT PRIMARY KEY,
            subscription_id TEXT NOT NULL REFERENCES subscriptions(id),
            amount REAL NOT NULL,
            payment_method TEXT NOT NULL,
            paid_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_hash ON subscriptions(idempotency_hash)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_next_billing ON subscriptions(next_billing_date, status)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payments_subscription ON payments(subscription_id, paid_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    tracing::debug!("database schema ready");
    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_day(idx: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

const SUBSCRIPTION_COLUMNS: &str = "id, idempotency_hash, name, price, currency, billing_cycle,
    start_date, next_billing_date, category, status, description, notes, website,
    auto_renew, reminder_days, total_spent, payment_count, last_payment_date,
    created_at, updated_at, deleted_at";

fn row_to_subscription(row: &Row) -> rusqlite::Result<Subscription> {
    let billing_cycle: String = row.get(5)?;
    let start_date: String = row.get(6)?;
    let next_billing_date: Option<String> = row.get(7)?;
    let status: String = row.get(9)?;
    let last_payment_date: Option<String> = row.get(17)?;
    let created_at: String = row.get(18)?;
    let updated_at: String = row.get(19)?;
    let deleted_at: Option<String> = row.get(20)?;

    Ok(Subscription {
        id: row.get(0)?,
        idempotency_hash: row.get(1)?,
        name: row.get(2)?,
        price: row.get(3)?,
        currency: row.get(4)?,
        // Lenient: rows may have been edited by hand
        billing_cycle: BillingCycle::from_label(&billing_cycle),
        start_date: parse_day(6, &start_date)?,
        next_billing_date: next_billing_date.map(|d| parse_day(7, &d)).transpose()?,
        category: row.get(8)?,
        status: subscription::SubscriptionStatus::from_label(&status),
        description: row.get(10)?,
        notes: row.get(11)?,
        website: row.get(12)?,
        auto_renew: row.get(13)?,
        reminder_days: row.get(14)?,
        total_spent: row.get(15)?,
        payment_count: row.get(16)?,
        last_payment_date: last_payment_date.map(|d| parse_ts(17, &d)).transpose()?,
        created_at: parse_ts(18, &created_at)?,
        updated_at: parse_ts(19, &updated_at)?,
        deleted_at: deleted_at.map(|d| parse_ts(20, &d)).transpose()?,
    })
}

// ============================================================================
// SUBSCRIPTIONS
// ============================================================================

pub fn insert_subscription(conn: &Connection, sub: &Subscription) -> TrackerResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO subscriptions ({}) VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
            SUBSCRIPTION_COLUMNS
        ),
        params![
            sub.id,
            sub.idempotency_hash,
            sub.name,
            sub.price,
            sub.currency,
            sub.billing_cycle.as_str(),
            sub.start_date.to_string(),
            sub.next_billing_date.map(|d| d.to_string()),
            sub.category,
            sub.status.as_str(),
            sub.description,
            sub.notes,
            sub.website,
            sub.auto_renew,
            sub.reminder_days,
            sub.total_spent,
            sub.payment_count,
            sub.last_payment_date.map(fmt_ts),
            fmt_ts(sub.created_at),
            fmt_ts(sub.updated_at),
            sub.deleted_at.map(fmt_ts),
        ],
    )?;

    insert_event(
        conn,
        &Event::new(
            "subscription_created",
            "subscription",
            &sub.id,
            serde_json::json!({
                "name": sub.name,
                "price": sub.price,
                "billing_cycle": sub.billing_cycle,
            }),
            "store",
        ),
    )?;

    tracing::info!(id = %sub.id, name = %sub.name, "subscription created");
    Ok(())
}

/// Normalize raw input and persist it as a new subscription
pub fn create_subscription(
    conn: &Connection,
    raw: &RawSubscription,
    now: DateTime<Utc>,
) -> TrackerResult<Subscription> {
    let sub = subscription::normalize(raw, now.date_naive())?.into_subscription(now);
    insert_subscription(conn, &sub)?;
    Ok(sub)
}

/// Fetch one non-deleted subscription
pub fn get_subscription(conn: &Connection, id: &str) -> TrackerResult<Subscription> {
    get_subscription_any(conn, id)?
        .filter(|sub| sub.deleted_at.is_none())
        .ok_or_else(|| TrackerError::NotFound(format!("subscription {}", id)))
}

/// Fetch a subscription including soft-deleted ones
fn get_subscription_any(conn: &Connection, id: &str) -> TrackerResult<Option<Subscription>> {
    let sub = conn
        .query_row(
            &format!("SELECT {} FROM subscriptions WHERE id = ?1", SUBSCRIPTION_COLUMNS),
            [id],
            row_to_subscription,
        )
        .optional()?;
    Ok(sub)
}

/// All non-deleted subscriptions, newest first
pub fn get_all_subscriptions(conn: &Connection) -> TrackerResult<Vec<Subscription>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM subscriptions
         WHERE deleted_at IS NULL
         ORDER BY created_at DESC",
        SUBSCRIPTION_COLUMNS
    ))?;

    let subs = stmt
        .query_map([], row_to_subscription)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(subs)
}

pub fn count_subscriptions(conn: &Connection) -> TrackerResult<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM subscriptions WHERE deleted_at IS NULL",
        [],
        |row| row.get(0),
    )?;

    Ok(count)
}

/// Write every mutable column of `sub` back to its row
fn save_subscription(conn: &Connection, sub: &Subscription) -> TrackerResult<()> {
    let changed = conn.execute(
        "UPDATE subscriptions SET
            idempotency_hash = ?2, name = ?3, price = ?4, currency = ?5,
            billing_cycle = ?6, start_date = ?7, next_billing_date = ?8,
            category = ?9, status = ?10, description = ?11, notes = ?12,
            website = ?13, auto_renew = ?14, reminder_days = ?15,
            total_spent = ?16, payment_count = ?17, last_payment_date = ?18,
            updated_at = ?19, deleted_at = ?20
         WHERE id = ?1",
        params![
            sub.id,
            sub.idempotency_hash,
            sub.name,
            sub.price,
            sub.currency,
            sub.billing_cycle.as_str(),
            sub.start_date.to_string(),
            sub.next_billing_date.map(|d| d.to_string()),
            sub.category,
            sub.status.as_str(),
            sub.description,
            sub.notes,
            sub.website,
            sub.auto_renew,
            sub.reminder_days,
            sub.total_spent,
            sub.payment_count,
            sub.last_payment_date.map(fmt_ts),
            fmt_ts(sub.updated_at),
            sub.deleted_at.map(fmt_ts),
        ],
    )?;

    if changed == 0 {
        return Err(TrackerError::NotFound(format!("subscription {}", sub.id)));
    }
    Ok(())
}

/// Apply a partial update (legacy aliases accepted)
pub fn update_subscription(
    conn: &Connection,
    id: &str,
    raw: &RawSubscription,
    now: DateTime<Utc>,
) -> TrackerResult<Subscription> {
    let existing = get_subscription(conn, id)?;
    let updated = subscription::apply_update(&existing, raw, now)?;
    save_subscription(conn, &updated)?;

    insert_event(
        conn,
        &Event::new(
            "subscription_updated",
            "subscription",
            id,
            serde_json::to_value(raw)?,
            "store",
        ),
    )?;

    tracing::info!(id = %id, "subscription updated");
    Ok(updated)
}

/// Store a copy of an existing subscription starting today
pub fn duplicate_subscription(
    conn: &Connection,
    id: &str,
    now: DateTime<Utc>,
) -> TrackerResult<Subscription> {
    let original = get_subscription(conn, id)?;
    let copy = subscription::duplicate(&original, now);
    insert_subscription(conn, &copy)?;
    Ok(copy)
}

/// Soft delete: hidden from queries, status cancelled, row kept
pub fn soft_delete_subscription(
    conn: &Connection,
    id: &str,
    now: DateTime<Utc>,
) -> TrackerResult<Subscription> {
    let mut sub = get_subscription(conn, id)?;
    sub.deleted_at = Some(now);
    sub.status = subscription::SubscriptionStatus::Cancelled;
    sub.updated_at = now;
    save_subscription(conn, &sub)?;

    insert_event(
        conn,
        &Event::new("subscription_deleted", "subscription", id, serde_json::json!({}), "store"),
    )?;

    tracing::info!(id = %id, "subscription soft-deleted");
    Ok(sub)
}

/// Undo a soft delete; the subscription becomes active again.
/// Restoring a live subscription is a conflict.
pub fn restore_subscription(
    conn: &Connection,
    id: &str,
    now: DateTime<Utc>,
) -> TrackerResult<Subscription> {
    let mut sub = get_subscription_any(conn, id)?
        .ok_or_else(|| TrackerError::NotFound(format!("subscription {}", id)))?;
    if sub.deleted_at.is_none() {
        return Err(TrackerError::Conflict(format!("subscription {} is not deleted", id)));
    }
    sub.deleted_at = None;
    sub.status = subscription::SubscriptionStatus::Active;
    sub.updated_at = now;
    save_subscription(conn, &sub)?;

    insert_event(
        conn,
        &Event::new("subscription_restored", "subscription", id, serde_json::json!({}), "store"),
    )?;

    Ok(sub)
}

// ============================================================================
// PAYMENTS
// ============================================================================

/// Whether the subscription has a payment at or after `since`
pub fn has_payment_since(
    conn: &Connection,
    subscription_id: &str,
    since: DateTime<Utc>,
) -> TrackerResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM payments WHERE subscription_id = ?1 AND paid_at >= ?2",
        params![subscription_id, fmt_ts(since)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Record a payment and advance the next billing date.
///
/// Check, insert and update run in one SQLite transaction so two concurrent
/// requests cannot both pass the once-per-day check.
pub fn mark_as_paid(
    conn: &mut Connection,
    id: &str,
    payment_method: Option<&str>,
    now: DateTime<Utc>,
) -> TrackerResult<(Subscription, PaymentRecord)> {
    let tx = conn.transaction()?;

    let sub = get_subscription(&tx, id)?;
    let paid_today = has_payment_since(&tx, id, payments::start_of_day(now))?;
    payments::check_payment_allowed(&sub, paid_today, now)?;

    let (updated, payment) = payments::record_payment(&sub, payment_method, now);

    tx.execute(
        "INSERT INTO payments (id, subscription_id, amount, payment_method, paid_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            payment.id,
            payment.subscription_id,
            payment.amount,
            payment.payment_method,
            fmt_ts(payment.paid_at),
        ],
    )?;
    save_subscription(&tx, &updated)?;
    insert_event(
        &tx,
        &Event::new(
            "payment_recorded",
            "subscription",
            id,
            serde_json::json!({
                "payment_id": payment.id,
                "amount": payment.amount,
                "next_billing_date": updated.next_billing_date,
            }),
            "store",
        ),
    )?;

    tx.commit()?;

    tracing::info!(id = %id, amount = payment.amount, "payment recorded");
    Ok((updated, payment))
}

/// All payments, newest first, with the subscription name when still known
pub fn get_payment_history(conn: &Connection) -> TrackerResult<Vec<PaymentHistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.subscription_id, p.amount, p.payment_method, p.paid_at,
                s.name, s.category
         FROM payments p
         LEFT JOIN subscriptions s ON s.id = p.subscription_id
         ORDER BY p.paid_at DESC",
    )?;

    let history = stmt
        .query_map([], |row| {
            let paid_at: String = row.get(4)?;
            Ok(PaymentHistoryEntry {
                payment: PaymentRecord {
                    id: row.get(0)?,
                    subscription_id: row.get(1)?,
                    amount: row.get(2)?,
                    payment_method: row.get(3)?,
                    paid_at: parse_ts(4, &paid_at)?,
                },
                subscription_name: row.get(5)?,
                category: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(history)
}

// ============================================================================
// CATEGORIES
// ============================================================================

fn insert_category(conn: &Connection, category: &Category) -> TrackerResult<()> {
    conn.execute(
        "INSERT INTO categories (id, name, icon, color, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            category.id,
            category.name,
            category.icon,
            category.color,
            fmt_ts(category.created_at),
        ],
    )?;
    Ok(())
}

/// All categories by name; seeds the defaults into an empty table first
pub fn get_all_categories(conn: &Connection) -> TrackerResult<Vec<Category>> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
    if count == 0 {
        let defaults = default_categories();
        for category in &defaults {
            insert_category(conn, category)?;
        }
        tracing::info!(count = defaults.len(), "seeded default categories");
    }

    let mut stmt =
        conn.prepare("SELECT id, name, icon, color, created_at FROM categories ORDER BY name")?;

    let categories = stmt
        .query_map([], |row| {
            let created_at: String = row.get(4)?;
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                icon: row.get(2)?,
                color: row.get(3)?,
                created_at: parse_ts(4, &created_at)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(categories)
}

pub fn add_category(conn: &Connection, input: NewCategory) -> TrackerResult<Category> {
    let category = input.into_category().ok_or_else(|| {
        TrackerError::Validation(vec![ValidationError::new("name", "Category name is required")])
    })?;

    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM categories WHERE name = ?1",
        [&category.name],
        |row| row.get(0),
    )?;
    if exists > 0 {
        return Err(TrackerError::Conflict(
            "Category with this name already exists".to_string(),
        ));
    }

    insert_category(conn, &category)?;
    tracing::info!(name = %category.name, "category added");
    Ok(category)
}

// ============================================================================
// EVENTS
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> TrackerResult<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            fmt_ts(event.timestamp),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> TrackerResult<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: parse_ts(1, &timestamp_str)?,
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// CSV IMPORT
// ============================================================================

pub fn import_csv(conn: &Connection, csv_path: &Path, now: DateTime<Utc>) -> TrackerResult<ImportReport> {
    let file = std::fs::File::open(csv_path)?;
    import_csv_reader(conn, file, now)
}

/// Import subscriptions from CSV (header row with camelCase or legacy names).
///
/// Rows that fail to parse or validate are reported, not fatal. Rows whose
/// idempotency hash matches a stored subscription are skipped. Inserts run in
/// one transaction: an I/O or database error leaves the store untouched.
pub fn import_csv_reader<R: io::Read>(
    conn: &Connection,
    reader: R,
    now: DateTime<Utc>,
) -> TrackerResult<ImportReport> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut report = ImportReport::default();
    let tx = conn.unchecked_transaction()?;

    for (index, result) in rdr.deserialize::<RawSubscription>().enumerate() {
        // Line 1 is the header
        let line = index + 2;
        let raw = match result {
            Ok(raw) => raw,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Deserialize { .. }) => {
                let line = e.position().map_or(line, |pos| pos.line() as usize);
                tracing::warn!(line, error = %e, "unparseable CSV row");
                report
                    .rejected
                    .push((line, vec![ValidationError::new("row", &e.to_string())]));
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let draft = match subscription::normalize(&raw, now.date_naive()) {
            Ok(draft) => draft,
            Err(errors) => {
                tracing::warn!(line, errors = errors.len(), "rejected CSV row");
                report.rejected.push((line, errors));
                continue;
            }
        };

        let sub = draft.into_subscription(now);
        let existing: i64 = tx.query_row(
            "SELECT COUNT(*) FROM subscriptions WHERE idempotency_hash = ?1 AND deleted_at IS NULL",
            [&sub.idempotency_hash],
            |row| row.get(0),
        )?;
        if existing > 0 {
            report.duplicates += 1;
            continue;
        }

        insert_subscription(&tx, &sub)?;
        report.inserted += 1;
    }

    tx.commit()?;

    tracing::info!(
        inserted = report.inserted,
        duplicates = report.duplicates,
        rejected = report.rejected.len(),
        "CSV import finished"
    );
    Ok(report)
}

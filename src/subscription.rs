// 📦 Subscription Model - persisted record + boundary normalization
//
// Incoming data (API bodies, CSV rows) arrives as RawSubscription, which still
// carries the legacy field names (cost, frequency, nextPaymentDate).
// normalize() is the ONE place those aliases are resolved; everything past it
// works with the typed Subscription record only.

use crate::billing::{self, BillingCycle};
use crate::validation::{self, ValidationError, ValidationResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_REMINDER_DAYS: u32 = 3;

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl SubscriptionStatus {
    /// Lenient parse used on already-stored data: unknown labels read as `Active`
    pub fn from_label(label: &str) -> SubscriptionStatus {
        label.parse().unwrap_or_else(|_| {
            tracing::warn!(label = %label, "unrecognized subscription status, treating as active");
            SubscriptionStatus::Active
        })
    }
}

impl Default for SubscriptionStatus {
    fn default() -> Self {
        SubscriptionStatus::Active
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "paused" => Ok(SubscriptionStatus::Paused),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            "expired" => Ok(SubscriptionStatus::Expired),
            other => Err(format!("'{}' is not a valid status", other)),
        }
    }
}

// ============================================================================
// SUBSCRIPTION RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    // ========================================================================
    // IDENTITY
    // ========================================================================
    pub id: String,

    // ========================================================================
    // BILLING
    // ========================================================================
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub start_date: NaiveDate,
    /// Explicit next charge date. When absent the engine projects one
    /// cycle from `start_date`.
    pub next_billing_date: Option<NaiveDate>,

    // ========================================================================
    // ORGANIZATION
    // ========================================================================
    pub category: String,
    pub status: SubscriptionStatus,
    pub description: String,
    pub notes: String,
    pub website: Option<String>,
    pub auto_renew: bool,
    pub reminder_days: u32,

    // ========================================================================
    // PAYMENT STATISTICS
    // ========================================================================
    pub total_spent: f64,
    pub payment_count: i64,
    pub last_payment_date: Option<DateTime<Utc>>,

    // ========================================================================
    // BOOKKEEPING
    // ========================================================================
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing, default)]
    pub idempotency_hash: String,
}

impl Subscription {
    /// Date the next charge is projected from
    pub fn anchor_date(&self) -> NaiveDate {
        self.next_billing_date.unwrap_or(self.start_date)
    }

    /// Date of the next charge: the stored next billing date, or one cycle
    /// after the start date when none is stored
    pub fn upcoming_charge_date(&self) -> Option<NaiveDate> {
        match self.next_billing_date {
            Some(date) => Some(date),
            None => billing::next_charge_date(self.start_date, self.billing_cycle),
        }
    }

    pub fn monthly_equivalent(&self) -> f64 {
        billing::monthly_equivalent(self.price, self.billing_cycle)
    }

    pub fn yearly_equivalent(&self) -> f64 {
        billing::yearly_equivalent(self.price, self.billing_cycle)
    }

    pub fn days_until_billing(&self, today: NaiveDate) -> Option<i64> {
        self.upcoming_charge_date()
            .map(|date| billing::days_until(date, today))
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active && self.deleted_at.is_none()
    }

    /// Hash for duplicate detection on import (NOT identity, that's `id`)
    pub fn compute_idempotency_hash(&self) -> String {
        idempotency_hash(&self.name, self.price, self.billing_cycle, self.start_date)
    }
}

fn idempotency_hash(name: &str, price: f64, cycle: BillingCycle, start: NaiveDate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}|{:.2}|{}|{}",
        name.trim().to_lowercase(),
        price,
        cycle,
        start
    ));
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// RAW INPUT (legacy-tolerant)
// ============================================================================

/// A number that may arrive as JSON number or numeric string ("9.99")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    fn value(&self) -> Option<f64> {
        match self {
            Amount::Number(n) => Some(*n),
            Amount::Text(s) => s.trim().trim_start_matches('$').parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubscription {
    pub name: Option<String>,
    pub price: Option<Amount>,
    /// Legacy alias of `price`
    pub cost: Option<Amount>,
    pub currency: Option<String>,
    pub billing_cycle: Option<String>,
    /// Legacy alias of `billing_cycle`
    pub frequency: Option<String>,
    pub start_date: Option<String>,
    pub next_billing_date: Option<String>,
    /// Legacy alias of `next_billing_date`
    pub next_payment_date: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub website: Option<String>,
    pub auto_renew: Option<bool>,
    pub reminder_days: Option<i64>,
}

impl RawSubscription {
    /// Unparseable text becomes NaN so validation can flag it
    fn resolved_price(&self) -> Option<f64> {
        self.price
            .as_ref()
            .or(self.cost.as_ref())
            .map(|amount| amount.value().unwrap_or(f64::NAN))
    }

    fn resolved_cycle(&self) -> Option<&str> {
        non_empty(&self.billing_cycle).or_else(|| non_empty(&self.frequency))
    }

    fn resolved_next_billing(&self) -> Option<&str> {
        non_empty(&self.next_billing_date).or_else(|| non_empty(&self.next_payment_date))
    }

    /// `(notes, description)` as supplied. A legacy `description` also fills
    /// `notes` when no notes were sent; notes never flow into `description`.
    fn resolved_notes(&self) -> (Option<&str>, Option<&str>) {
        let description = non_empty(&self.description);
        (non_empty(&self.notes).or(description), description)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Validated, alias-free subscription data not yet persisted
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionDraft {
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub start_date: NaiveDate,
    pub next_billing_date: Option<NaiveDate>,
    pub category: String,
    pub status: SubscriptionStatus,
    pub description: String,
    pub notes: String,
    pub website: Option<String>,
    pub auto_renew: bool,
    pub reminder_days: u32,
}

/// Resolve legacy aliases, apply defaults and validate.
///
/// Start date defaults to `today`. When no next billing date is supplied it
/// is projected one cycle after the start date.
pub fn normalize(raw: &RawSubscription, today: NaiveDate) -> ValidationResult<SubscriptionDraft> {
    let mut errors = Vec::new();

    let name = validation::check_name(raw.name.as_deref(), &mut errors);
    let price = validation::check_price(raw.resolved_price(), &mut errors);
    let cycle = validation::check_billing_cycle(raw.resolved_cycle(), &mut errors);
    let category = validation::check_category(raw.category.as_deref(), &mut errors);
    let currency = validation::check_currency(
        raw.currency.as_deref().unwrap_or(DEFAULT_CURRENCY),
        &mut errors,
    );
    let start_date = validation::check_date("startDate", raw.start_date.as_deref(), &mut errors)
        .unwrap_or(today);
    let explicit_next =
        validation::check_date("nextBillingDate", raw.resolved_next_billing(), &mut errors);
    let status = parse_status(raw.status.as_deref(), &mut errors).unwrap_or_default();
    let reminder_days = validation::check_reminder_days(
        raw.reminder_days.unwrap_or(DEFAULT_REMINDER_DAYS as i64),
        &mut errors,
    );

    let (notes, description) = raw.resolved_notes();
    let notes = notes.unwrap_or_default().to_string();
    let description = description.unwrap_or_default().to_string();
    validation::check_max_len("description", &description, validation::DESCRIPTION_MAX_LEN, &mut errors);
    validation::check_max_len("notes", &notes, validation::NOTES_MAX_LEN, &mut errors);

    let (Some(name), Some(price), Some(billing_cycle), Some(category), Some(currency), Some(reminder_days)) =
        (name, price, cycle, category, currency, reminder_days)
    else {
        return Err(errors);
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    let next_billing_date =
        explicit_next.or_else(|| billing::next_charge_date(start_date, billing_cycle));

    Ok(SubscriptionDraft {
        name,
        price,
        currency,
        billing_cycle,
        start_date,
        next_billing_date,
        category,
        status,
        description,
        notes,
        website: non_empty(&raw.website).map(|w| w.trim().to_string()),
        auto_renew: raw.auto_renew.unwrap_or(true),
        reminder_days,
    })
}

fn parse_status(value: Option<&str>, errors: &mut Vec<ValidationError>) -> Option<SubscriptionStatus> {
    let value = value.filter(|v| !v.trim().is_empty())?;
    match value.parse() {
        Ok(status) => Some(status),
        Err(message) => {
            errors.push(ValidationError::new("status", &message));
            None
        }
    }
}

impl SubscriptionDraft {
    /// Create the persisted record with a fresh UUID
    pub fn into_subscription(self, now: DateTime<Utc>) -> Subscription {
        let idempotency_hash =
            idempotency_hash(&self.name, self.price, self.billing_cycle, self.start_date);

        Subscription {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name,
            price: self.price,
            currency: self.currency,
            billing_cycle: self.billing_cycle,
            start_date: self.start_date,
            next_billing_date: self.next_billing_date,
            category: self.category,
            status: self.status,
            description: self.description,
            notes: self.notes,
            website: self.website,
            auto_renew: self.auto_renew,
            reminder_days: self.reminder_days,
            total_spent: 0.0,
            payment_count: 0,
            last_payment_date: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            idempotency_hash,
        }
    }
}

// ============================================================================
// UPDATES
// ============================================================================

/// Partial update with the same alias rules as `normalize`.
///
/// Only fields present in `raw` change. An explicit next billing date wins;
/// otherwise a change of billing cycle or start date re-projects the next
/// billing date from the start date. Returns a new record.
pub fn apply_update(
    existing: &Subscription,
    raw: &RawSubscription,
    now: DateTime<Utc>,
) -> ValidationResult<Subscription> {
    let mut errors = Vec::new();
    let mut updated = existing.clone();

    if raw.name.is_some() {
        if let Some(name) = validation::check_name(raw.name.as_deref(), &mut errors) {
            updated.name = name;
        }
    }
    if let Some(price) = raw.resolved_price() {
        if let Some(price) = validation::check_price(Some(price), &mut errors) {
            updated.price = price;
        }
    }
    if let Some(currency) = non_empty(&raw.currency) {
        if let Some(currency) = validation::check_currency(currency, &mut errors) {
            updated.currency = currency;
        }
    }
    if raw.category.is_some() {
        if let Some(category) = validation::check_category(raw.category.as_deref(), &mut errors) {
            updated.category = category;
        }
    }

    let cycle_changed = match raw.resolved_cycle() {
        Some(label) => {
            if let Some(cycle) = validation::check_billing_cycle(Some(label), &mut errors) {
                updated.billing_cycle = cycle;
            }
            true
        }
        None => false,
    };
    let start_changed =
        match validation::check_date("startDate", raw.start_date.as_deref(), &mut errors) {
            Some(start) => {
                updated.start_date = start;
                true
            }
            None => false,
        };
    let explicit_next =
        validation::check_date("nextBillingDate", raw.resolved_next_billing(), &mut errors);

    if let Some(next) = explicit_next {
        updated.next_billing_date = Some(next);
    } else if cycle_changed || start_changed {
        updated.next_billing_date =
            billing::next_charge_date(updated.start_date, updated.billing_cycle);
    }

    if let Some(status) = parse_status(raw.status.as_deref(), &mut errors) {
        updated.status = status;
    }
    let (notes, description) = raw.resolved_notes();
    if let Some(notes) = notes {
        validation::check_max_len("notes", notes, validation::NOTES_MAX_LEN, &mut errors);
        updated.notes = notes.to_string();
    }
    if let Some(description) = description {
        validation::check_max_len("description", description, validation::DESCRIPTION_MAX_LEN, &mut errors);
        updated.description = description.to_string();
    }
    if raw.website.is_some() {
        updated.website = non_empty(&raw.website).map(|w| w.trim().to_string());
    }
    if let Some(auto_renew) = raw.auto_renew {
        updated.auto_renew = auto_renew;
    }
    if let Some(days) = raw.reminder_days {
        if let Some(days) = validation::check_reminder_days(days, &mut errors) {
            updated.reminder_days = days;
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    updated.updated_at = now;
    updated.idempotency_hash = updated.compute_idempotency_hash();
    Ok(updated)
}

/// Copy of `existing` starting today, with payment statistics reset
pub fn duplicate(existing: &Subscription, now: DateTime<Utc>) -> Subscription {
    let today = now.date_naive();
    let draft = SubscriptionDraft {
        name: format!("{} (Copy)", existing.name),
        price: existing.price,
        currency: existing.currency.clone(),
        billing_cycle: existing.billing_cycle,
        start_date: today,
        next_billing_date: billing::next_charge_date(today, existing.billing_cycle),
        category: existing.category.clone(),
        status: SubscriptionStatus::Active,
        description: existing.description.clone(),
        notes: existing.notes.clone(),
        website: existing.website.clone(),
        auto_renew: existing.auto_renew,
        reminder_days: existing.reminder_days,
    };
    draft.into_subscription(now)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    /// Helper to build a persisted subscription with all required fields
    pub(crate) fn create_test_subscription(
        name: &str,
        price: f64,
        cycle: BillingCycle,
        category: &str,
        next_billing_date: Option<NaiveDate>,
    ) -> Subscription {
        let draft = SubscriptionDraft {
            name: name.to_string(),
            price,
            currency: DEFAULT_CURRENCY.to_string(),
            billing_cycle: cycle,
            start_date: date(2024, 1, 1),
            next_billing_date,
            category: category.to_string(),
            status: SubscriptionStatus::Active,
            description: String::new(),
            notes: String::new(),
            website: None,
            auto_renew: true,
            reminder_days: DEFAULT_REMINDER_DAYS,
        };
        draft.into_subscription(noon(2024, 1, 1))
    }

    fn raw_json(json: &str) -> RawSubscription {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_normalize_current_field_names() {
        let raw = raw_json(
            r#"{"name":"Netflix","price":15.49,"billingCycle":"Monthly","category":"Entertainment",
                "startDate":"2024-03-10","nextBillingDate":"2024-04-10"}"#,
        );
        let draft = normalize(&raw, date(2024, 3, 1)).unwrap();

        assert_eq!(draft.name, "Netflix");
        assert_eq!(draft.price, 15.49);
        assert_eq!(draft.billing_cycle, BillingCycle::Monthly);
        assert_eq!(draft.start_date, date(2024, 3, 10));
        assert_eq!(draft.next_billing_date, Some(date(2024, 4, 10)));
        assert_eq!(draft.currency, "USD");
        assert_eq!(draft.status, SubscriptionStatus::Active);
        assert_eq!(draft.reminder_days, 3);
        assert!(draft.auto_renew);
    }

    #[test]
    fn test_normalize_resolves_legacy_aliases() {
        let raw = raw_json(
            r#"{"name":"Spotify","cost":"9.99","frequency":"WEEKLY","category":"Music",
                "nextPaymentDate":"2024-05-01","description":"family plan"}"#,
        );
        let draft = normalize(&raw, date(2024, 4, 1)).unwrap();

        assert_eq!(draft.price, 9.99);
        assert_eq!(draft.billing_cycle, BillingCycle::Weekly);
        assert_eq!(draft.next_billing_date, Some(date(2024, 5, 1)));
        assert_eq!(draft.notes, "family plan");
        assert_eq!(draft.description, "family plan");
    }

    #[test]
    fn test_current_names_win_over_aliases() {
        let raw = raw_json(
            r#"{"name":"X","price":5,"cost":50,"billingCycle":"yearly","frequency":"daily","category":"Software"}"#,
        );
        let draft = normalize(&raw, date(2024, 1, 1)).unwrap();
        assert_eq!(draft.price, 5.0);
        assert_eq!(draft.billing_cycle, BillingCycle::Yearly);
    }

    #[test]
    fn test_normalize_projects_next_billing_from_start() {
        let raw = raw_json(
            r#"{"name":"Gym","price":30,"billingCycle":"monthly","category":"Health & Fitness","startDate":"2024-01-31"}"#,
        );
        let draft = normalize(&raw, date(2024, 1, 15)).unwrap();
        assert_eq!(draft.next_billing_date, Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_normalize_defaults_start_to_today() {
        let raw = raw_json(r#"{"name":"News","price":4,"billingCycle":"weekly","category":"News & Media"}"#);
        let draft = normalize(&raw, date(2024, 6, 1)).unwrap();
        assert_eq!(draft.start_date, date(2024, 6, 1));
        assert_eq!(draft.next_billing_date, Some(date(2024, 6, 8)));
    }

    #[test]
    fn test_normalize_collects_all_errors() {
        let raw = raw_json(r#"{"price":-3,"billingCycle":"hourly","startDate":"soon","reminderDays":45}"#);
        let errors = normalize(&raw, date(2024, 1, 1)).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"price"));
        assert!(fields.contains(&"billingCycle"));
        assert!(fields.contains(&"category"));
        assert!(fields.contains(&"startDate"));
        assert!(fields.contains(&"reminderDays"));
    }

    #[test]
    fn test_normalize_rejects_non_numeric_price() {
        let raw = raw_json(r#"{"name":"X","price":"free","billingCycle":"monthly","category":"Others"}"#);
        let errors = normalize(&raw, date(2024, 1, 1)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "price");
    }

    #[test]
    fn test_anchor_and_upcoming_charge() {
        let mut sub = create_test_subscription("A", 10.0, BillingCycle::Quarterly, "Software", None);
        assert_eq!(sub.anchor_date(), date(2024, 1, 1));
        assert_eq!(sub.upcoming_charge_date(), Some(date(2024, 4, 1)));

        sub.next_billing_date = Some(date(2024, 2, 15));
        assert_eq!(sub.anchor_date(), date(2024, 2, 15));
        assert_eq!(sub.upcoming_charge_date(), Some(date(2024, 2, 15)));
        assert_eq!(sub.days_until_billing(date(2024, 2, 10)), Some(5));
    }

    #[test]
    fn test_update_recomputes_next_billing_on_cycle_change() {
        let sub = create_test_subscription("A", 10.0, BillingCycle::Monthly, "Software", Some(date(2024, 2, 1)));
        let raw = raw_json(r#"{"frequency":"Yearly"}"#);

        let updated = apply_update(&sub, &raw, noon(2024, 1, 20)).unwrap();
        assert_eq!(updated.billing_cycle, BillingCycle::Yearly);
        assert_eq!(updated.next_billing_date, Some(date(2025, 1, 1)));
        assert_eq!(updated.updated_at, noon(2024, 1, 20));
        // Input untouched
        assert_eq!(sub.billing_cycle, BillingCycle::Monthly);
    }

    #[test]
    fn test_update_explicit_next_billing_wins() {
        let sub = create_test_subscription("A", 10.0, BillingCycle::Monthly, "Software", None);
        let raw = raw_json(r#"{"billingCycle":"weekly","nextPaymentDate":"2024-03-03"}"#);

        let updated = apply_update(&sub, &raw, noon(2024, 2, 1)).unwrap();
        assert_eq!(updated.next_billing_date, Some(date(2024, 3, 3)));
    }

    #[test]
    fn test_update_partial_fields_only() {
        let sub = create_test_subscription("A", 10.0, BillingCycle::Monthly, "Software", Some(date(2024, 2, 1)));
        let raw = raw_json(r#"{"cost":12.5,"status":"paused"}"#);

        let updated = apply_update(&sub, &raw, noon(2024, 1, 5)).unwrap();
        assert_eq!(updated.price, 12.5);
        assert_eq!(updated.status, SubscriptionStatus::Paused);
        assert_eq!(updated.name, "A");
        assert_eq!(updated.next_billing_date, Some(date(2024, 2, 1)));
        assert_ne!(updated.idempotency_hash, sub.idempotency_hash);
    }

    #[test]
    fn test_update_rejects_invalid_values() {
        let sub = create_test_subscription("A", 10.0, BillingCycle::Monthly, "Software", None);
        let raw = raw_json(r#"{"price":-1,"status":"gone"}"#);

        let errors = apply_update(&sub, &raw, noon(2024, 1, 5)).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_long_notes_stay_out_of_description() {
        let notes = "n".repeat(700);
        let sub = create_test_subscription("A", 10.0, BillingCycle::Monthly, "Software", None);
        let raw = RawSubscription {
            notes: Some(notes.clone()),
            ..Default::default()
        };

        let updated = apply_update(&sub, &raw, noon(2024, 1, 5)).unwrap();
        assert_eq!(updated.notes, notes);
        assert_eq!(updated.description, "");

        let create = RawSubscription {
            name: Some("B".to_string()),
            price: Some(Amount::Number(3.0)),
            billing_cycle: Some("monthly".to_string()),
            category: Some("Software".to_string()),
            notes: Some(notes.clone()),
            ..Default::default()
        };
        let draft = normalize(&create, date(2024, 1, 1)).unwrap();
        assert_eq!(draft.notes, notes);
        assert_eq!(draft.description, "");

        let too_long = RawSubscription {
            notes: Some("n".repeat(1001)),
            ..Default::default()
        };
        let errors = apply_update(&sub, &too_long, noon(2024, 1, 5)).unwrap_err();
        assert_eq!(errors[0].field, "notes");
    }

    #[test]
    fn test_status_from_label_falls_back_to_active() {
        assert_eq!(SubscriptionStatus::from_label("Paused"), SubscriptionStatus::Paused);
        assert_eq!(SubscriptionStatus::from_label("zombie"), SubscriptionStatus::Active);
    }

    #[test]
    fn test_duplicate_resets_statistics() {
        let mut sub = create_test_subscription("Disney+", 7.99, BillingCycle::Monthly, "Entertainment", None);
        sub.total_spent = 31.96;
        sub.payment_count = 4;
        sub.last_payment_date = Some(noon(2024, 4, 1));

        let copy = duplicate(&sub, noon(2024, 5, 31));
        assert_ne!(copy.id, sub.id);
        assert_eq!(copy.name, "Disney+ (Copy)");
        assert_eq!(copy.start_date, date(2024, 5, 31));
        assert_eq!(copy.next_billing_date, Some(date(2024, 6, 30)));
        assert_eq!(copy.total_spent, 0.0);
        assert_eq!(copy.payment_count, 0);
        assert_eq!(copy.last_payment_date, None);
    }

    #[test]
    fn test_idempotency_hash_is_stable() {
        let a = create_test_subscription("Netflix", 15.49, BillingCycle::Monthly, "Entertainment", None);
        let b = create_test_subscription("netflix ", 15.49, BillingCycle::Monthly, "Other", None);

        assert_eq!(a.idempotency_hash.len(), 64);
        assert_eq!(a.idempotency_hash, a.compute_idempotency_hash());
        assert_eq!(a.idempotency_hash, b.idempotency_hash);
    }

    #[test]
    fn test_serializes_camel_case_without_hash() {
        let sub = create_test_subscription("A", 1.0, BillingCycle::Daily, "Others", None);
        let json = serde_json::to_value(&sub).unwrap();

        assert_eq!(json["billingCycle"], "daily");
        assert_eq!(json["nextBillingDate"], serde_json::Value::Null);
        assert!(json.get("idempotencyHash").is_none());
        assert!(json.get("deletedAt").is_none());
    }
}

// 📐 Boundary Validation - checks run before data reaches the billing engine
// All violations are collected so the caller can report them together

use crate::billing::BillingCycle;
use chrono::{DateTime, NaiveDate};
use serde::Serialize;

pub const NAME_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 500;
pub const NOTES_MAX_LEN: usize = 1000;
pub const REMINDER_DAYS_MAX: i64 = 30;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, Vec<ValidationError>>;

// ============================================================================
// FIELD CHECKS
// ============================================================================

/// Trimmed, non-empty name within the length limit
pub fn check_name(name: Option<&str>, errors: &mut Vec<ValidationError>) -> Option<String> {
    let trimmed = name.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        errors.push(ValidationError::new("name", "Subscription name is required"));
        return None;
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        errors.push(ValidationError::new("name", "Name cannot exceed 100 characters"));
        return None;
    }
    Some(trimmed.to_string())
}

pub fn check_price(price: Option<f64>, errors: &mut Vec<ValidationError>) -> Option<f64> {
    match price {
        None => {
            errors.push(ValidationError::new("price", "Price is required"));
            None
        }
        Some(p) if !p.is_finite() => {
            errors.push(ValidationError::new("price", "Price must be a valid number"));
            None
        }
        Some(p) if p < 0.0 => {
            errors.push(ValidationError::new("price", "Price cannot be negative"));
            None
        }
        Some(p) => Some(p),
    }
}

pub fn check_billing_cycle(
    label: Option<&str>,
    errors: &mut Vec<ValidationError>,
) -> Option<BillingCycle> {
    let Some(label) = label.filter(|l| !l.trim().is_empty()) else {
        errors.push(ValidationError::new("billingCycle", "Billing cycle is required"));
        return None;
    };
    match label.parse::<BillingCycle>() {
        Ok(cycle) => Some(cycle),
        Err(e) => {
            errors.push(ValidationError::new("billingCycle", &e.to_string()));
            None
        }
    }
}

pub fn check_category(category: Option<&str>, errors: &mut Vec<ValidationError>) -> Option<String> {
    let trimmed = category.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        errors.push(ValidationError::new("category", "Category is required"));
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// ISO-4217 style code: exactly three ASCII letters, stored uppercase
pub fn check_currency(currency: &str, errors: &mut Vec<ValidationError>) -> Option<String> {
    let trimmed = currency.trim();
    if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(trimmed.to_ascii_uppercase())
    } else {
        errors.push(ValidationError::new("currency", "Currency must be a 3-letter code"));
        None
    }
}

pub fn check_max_len(field: &str, value: &str, max: usize, errors: &mut Vec<ValidationError>) {
    if value.chars().count() > max {
        errors.push(ValidationError::new(
            field,
            &format!("Cannot exceed {} characters", max),
        ));
    }
}

pub fn check_reminder_days(days: i64, errors: &mut Vec<ValidationError>) -> Option<u32> {
    if (0..=REMINDER_DAYS_MAX).contains(&days) {
        Some(days as u32)
    } else {
        errors.push(ValidationError::new(
            "reminderDays",
            "Reminder days must be between 0 and 30",
        ));
        None
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part is kept)
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

pub fn check_date(
    field: &str,
    value: Option<&str>,
    errors: &mut Vec<ValidationError>,
) -> Option<NaiveDate> {
    let value = value.filter(|v| !v.trim().is_empty())?;
    let parsed = parse_date(value);
    if parsed.is_none() {
        errors.push(ValidationError::new(field, "Must be a valid date"));
    }
    parsed
}

// Subtrack - Subscription Tracker Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod billing;       // Billing cycle normalizer + date advancement
pub mod dashboard;     // Dashboard aggregation (pure)
pub mod subscription;  // Subscription record + input normalization
pub mod validation;    // Boundary checks
pub mod category;
pub mod payments;      // Mark-as-paid rules
pub mod db;
pub mod config;
pub mod error;

#[cfg(feature = "server")]
pub mod api;           // REST API (axum)

// Re-export commonly used types
pub use billing::{
    advance_by, days_until, monthly_equivalent, next_charge_date, yearly_equivalent,
    BillingCycle, UnknownBillingCycle,
};
pub use dashboard::{
    breakdown_by_cycle, due_reminders, summarize, upcoming_payments,
    DashboardSummary, RankedSubscription, UpcomingPayment,
};
pub use subscription::{
    apply_update, duplicate, normalize,
    RawSubscription, Subscription, SubscriptionDraft, SubscriptionStatus,
};
pub use validation::{ValidationError, ValidationResult};
pub use category::{default_categories, Category, NewCategory};
pub use payments::{PaymentHistoryEntry, PaymentRecord, PaymentRejection};
pub use db::{
    Event, ImportReport,
    setup_database, insert_subscription, create_subscription, get_subscription,
    get_all_subscriptions, count_subscriptions, update_subscription,
    duplicate_subscription, soft_delete_subscription, restore_subscription,
    has_payment_since, mark_as_paid, get_payment_history,
    get_all_categories, add_category, insert_event, get_events_for_entity,
    import_csv, import_csv_reader,
};
pub use config::Config;
pub use error::{TrackerError, TrackerResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

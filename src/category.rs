// 🏷️ Category Entity - grouping key for subscriptions
//
// "Category name is a VALUE, Category UUID is IDENTITY"
// Subscriptions reference categories by name; the billing engine treats the
// value as an opaque grouping key and never interprets it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ICON: &str = "📦";
pub const DEFAULT_COLOR: &str = "#6c757d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Stable identity (UUID) - NEVER changes
    pub id: String,

    /// Display name, unique across the store (e.g., "Music")
    pub name: String,

    /// Icon for UI (e.g., "🎵")
    pub icon: String,

    /// Hex color for UI (e.g., "#3498db")
    pub color: String,

    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create new category entity with UUID
    pub fn new(name: &str, icon: &str, color: &str) -> Self {
        Category {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Input for creating a category
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCategory {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl NewCategory {
    /// Trim the name and fill icon/color defaults. `None` if the name is blank.
    pub fn into_category(self) -> Option<Category> {
        let name = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
        let icon = self.icon.as_deref().filter(|i| !i.is_empty()).unwrap_or(DEFAULT_ICON);
        let color = self.color.as_deref().filter(|c| !c.is_empty()).unwrap_or(DEFAULT_COLOR);
        Some(Category::new(name, icon, color))
    }
}

/// Seed set written to an empty store
pub fn default_categories() -> Vec<Category> {
    [
        ("Entertainment", "🎬", "#e74c3c"),
        ("Music", "🎵", "#3498db"),
        ("Gaming", "🎮", "#2ecc71"),
        ("Productivity", "💼", "#f1c40f"),
        ("Cloud Storage", "☁️", "#9b59b6"),
        ("Software", "💻", "#34495e"),
        ("Health & Fitness", "💪", "#e67e22"),
        ("Education", "📚", "#16a085"),
        ("News & Media", "📰", "#c0392b"),
        ("Others", "📦", "#95a5a6"),
    ]
    .iter()
    .map(|(name, icon, color)| Category::new(name, icon, color))
    .collect()
}

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Id;

pub const DEFAULT_CATEGORY_ICON: &str = "category";
pub const DEFAULT_CATEGORY_COLOR: &str = "#38e07b";

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid hex color regex"));

/// A user-defined spending category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Id,
    pub user_id: Id,
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_color")]
    pub color: String,
    /// Insertion order. Sorting is left to presentation.
    #[serde(default)]
    pub subcategories: Vec<String>,
}

fn default_icon() -> String {
    DEFAULT_CATEGORY_ICON.to_string()
}

fn default_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub icon: String,
    pub color: String,
    pub subcategories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub subcategories: Option<Vec<String>>,
}

impl Category {
    pub fn new(id: Id, user_id: Id, draft: &NewCategory) -> Self {
        Self {
            id,
            user_id,
            name: draft.name.clone(),
            icon: draft.icon.clone(),
            color: draft.color.clone(),
            subcategories: draft.subcategories.clone(),
        }
    }

    pub fn apply_patch(&mut self, patch: &CategoryPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(icon) = &patch.icon {
            self.icon = icon.clone();
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(subcategories) = &patch.subcategories {
            self.subcategories = subcategories.clone();
        }
    }

    /// Case-insensitive name comparison; names are unique per user under it.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    pub fn has_subcategory(&self, name: &str) -> bool {
        self.subcategories.iter().any(|s| s == name)
    }

    /// Subcategories sorted for display, ignoring case.
    pub fn sorted_subcategories(&self) -> Vec<&str> {
        let mut subs: Vec<&str> = self.subcategories.iter().map(String::as_str).collect();
        subs.sort_by_key(|s| s.to_lowercase());
        subs
    }

    /// Color copied onto new transactions. A few legacy named colors map to
    /// their palette hex value; anything else passes through.
    pub fn transaction_color(&self) -> String {
        let color = self.color.trim();
        if color.is_empty() {
            return DEFAULT_CATEGORY_COLOR.to_string();
        }
        if HEX_COLOR.is_match(color) {
            return color.to_string();
        }
        match color.to_lowercase().as_str() {
            "orange" => "#e0a038".to_string(),
            "blue" => "#389ce0".to_string(),
            _ => color.to_string(),
        }
    }

    pub fn transaction_icon(&self) -> String {
        if self.icon.trim().is_empty() {
            DEFAULT_CATEGORY_ICON.to_string()
        } else {
            self.icon.clone()
        }
    }
}

/// Sort categories by name for display, ignoring case.
pub fn sort_categories_for_display(categories: &mut [Category]) {
    categories.sort_by_key(|c| c.name.to_lowercase());
}

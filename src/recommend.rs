//! Default category/subcategory for a new expense, inferred from the
//! user's recent history.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Category, Id, Transaction};

/// Default history window for [`recommend`].
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

impl Recommendation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
struct Usage {
    count: usize,
    /// Position of the most recent occurrence; 0 is the newest record.
    first_seen: usize,
}

fn record_use(stats: &mut HashMap<String, Usage>, key: &str, rank: usize) {
    stats
        .entry(key.to_string())
        .and_modify(|u| {
            u.count += 1;
            u.first_seen = u.first_seen.min(rank);
        })
        .or_insert(Usage {
            count: 1,
            first_seen: rank,
        });
}

/// Most used key; among equals, the one seen most recently.
fn pick_best(stats: &HashMap<String, Usage>) -> Option<String> {
    stats
        .iter()
        .max_by(|(_, a), (_, b)| {
            a.count
                .cmp(&b.count)
                .then_with(|| b.first_seen.cmp(&a.first_seen))
        })
        .map(|(key, _)| key.clone())
}

/// Rank categories, then subcategories within the winner, by frequency and
/// recency.
///
/// `recent` must be ordered newest first. Income is ignored, and records
/// without a subcategory do not vote for one.
pub fn recommend(recent: &[Transaction]) -> Recommendation {
    let mut categories: HashMap<String, Usage> = HashMap::new();
    let mut subcategories: HashMap<String, HashMap<String, Usage>> = HashMap::new();

    let expenses = recent
        .iter()
        .filter(|t| t.is_expense())
        .filter(|t| !t.category.is_empty());
    for (rank, tx) in expenses.enumerate() {
        record_use(&mut categories, &tx.category, rank);
        if let Some(sub) = tx.subcategory.as_deref() {
            record_use(
                subcategories.entry(tx.category.clone()).or_default(),
                sub,
                rank,
            );
        }
    }

    let category = pick_best(&categories);
    let subcategory = category
        .as_ref()
        .and_then(|c| subcategories.get(c))
        .and_then(pick_best);
    Recommendation {
        category,
        subcategory,
    }
}

/// Category/subcategory selection of the add-expense form.
///
/// The recommendation is applied at most once, and only once both it and
/// the category list are known. After that, or after the user picks a
/// category by hand, it never overrides the selection.
#[derive(Debug, Clone, Default)]
pub struct DefaultSelection {
    categories: Vec<Category>,
    loaded: bool,
    selected: Option<Id>,
    subcategory: Option<String>,
    recommendation: Option<Recommendation>,
    applied: bool,
}

impl DefaultSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_categories_loaded(&mut self, categories: Vec<Category>) {
        self.categories = categories;
        self.loaded = true;

        if self.categories.is_empty() {
            self.selected = None;
            self.subcategory = None;
            return;
        }

        if self.selected_category().is_none() {
            let recommended = self
                .recommendation
                .as_ref()
                .and_then(|r| r.category.as_deref())
                .and_then(|name| self.categories.iter().find(|c| c.name == name));
            let fallback = recommended.unwrap_or(&self.categories[0]).id.clone();
            self.select(fallback);
        }
        self.try_apply();
    }

    pub fn set_recommendation(&mut self, recommendation: Recommendation) {
        self.recommendation = Some(recommendation);
        self.try_apply();
    }

    /// Manual pick. Returns false if `id` is not a loaded category.
    pub fn select_category(&mut self, id: &Id) -> bool {
        if !self.categories.iter().any(|c| &c.id == id) {
            return false;
        }
        self.applied = true;
        self.select(id.clone());
        true
    }

    /// Manual pick. Returns false if the selected category has no such
    /// subcategory.
    pub fn select_subcategory(&mut self, name: &str) -> bool {
        match self.selected_category() {
            Some(category) if category.has_subcategory(name) => {
                self.subcategory = Some(name.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn selected_category(&self) -> Option<&Category> {
        let id = self.selected.as_ref()?;
        self.categories.iter().find(|c| &c.id == id)
    }

    pub fn selected_subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    pub fn recommendation_applied(&self) -> bool {
        self.applied
    }

    fn try_apply(&mut self) {
        if self.applied || !self.loaded {
            return;
        }
        let Some(rec) = &self.recommendation else {
            return;
        };
        let Some(name) = rec.category.as_deref() else {
            return;
        };
        let Some(category) = self.categories.iter().find(|c| c.name == name) else {
            return;
        };

        let id = category.id.clone();
        let subcategory = rec
            .subcategory
            .as_deref()
            .filter(|sub| category.has_subcategory(sub))
            .map(str::to_string);

        if subcategory.is_some() {
            self.subcategory = subcategory;
        }
        self.select(id);
        self.applied = true;
    }

    /// Select a category and keep the subcategory consistent with it: the
    /// current one if it belongs, else the first stored one, else none.
    fn select(&mut self, id: Id) {
        self.selected = Some(id);
        let subcategory = match self.selected_category() {
            Some(category) if !category.subcategories.is_empty() => {
                match self.subcategory.as_deref() {
                    Some(current) if category.has_subcategory(current) => Some(current.to_string()),
                    _ => Some(category.subcategories[0].clone()),
                }
            }
            _ => None,
        };
        self.subcategory = subcategory;
    }
}

use chrono::NaiveDate;

use crate::models::Transaction;

/// Narrowing applied to the transaction list. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Case-insensitive substring of the category or subcategory.
    pub search: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ListFilter {
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().is_none_or(|s| s.trim().is_empty())
            && self.category.is_none()
            && self.subcategory.is_none()
            && self.from.is_none()
            && self.to.is_none()
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                let needle = search.to_lowercase();
                let in_category = tx.category.to_lowercase().contains(&needle);
                let in_subcategory = tx
                    .subcategory
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(&needle));
                if !in_category && !in_subcategory {
                    return false;
                }
            }
        }
        if self.category.as_ref().is_some_and(|c| &tx.category != c) {
            return false;
        }
        if self
            .subcategory
            .as_deref()
            .is_some_and(|s| tx.subcategory.as_deref() != Some(s))
        {
            return false;
        }
        if self.from.is_some_and(|from| tx.date < from) {
            return false;
        }
        if self.to.is_some_and(|to| tx.date > to) {
            return false;
        }
        true
    }

    pub fn apply(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        transactions
            .iter()
            .filter(|t| self.matches(t))
            .cloned()
            .collect()
    }
}

/// Category labels present in `transactions`, sorted ignoring case.
pub fn distinct_categories(transactions: &[Transaction]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tx in transactions {
        if !tx.category.is_empty() && !out.contains(&tx.category) {
            out.push(tx.category.clone());
        }
    }
    out.sort_by_key(|c| c.to_lowercase());
    out
}

/// Subcategories used under `category`, in first-seen order.
pub fn subcategories_for(transactions: &[Transaction], category: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tx in transactions.iter().filter(|t| t.category == category) {
        if let Some(sub) = &tx.subcategory {
            if !out.contains(sub) {
                out.push(sub.clone());
            }
        }
    }
    out
}

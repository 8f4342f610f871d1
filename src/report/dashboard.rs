use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Category, Transaction};

use super::{resolve_style, sum_amounts};

/// Slice color when neither the category nor any transaction has one.
pub const DEFAULT_SLICE_COLOR: &str = "#9038e0";

/// Number of transactions listed under "recent".
const RECENT_ITEMS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSlice {
    pub category: String,
    pub amount: Decimal,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total_expenses: Decimal,
    pub distribution: Vec<DashboardSlice>,
    pub recent: Vec<Transaction>,
}

/// Summarize the live feed shown on the home screen.
///
/// `feed` is the capped, newest-first live query. Unlike reports this is
/// not windowed: it covers whatever the feed holds.
pub fn dashboard_summary(feed: &[Transaction], categories: &[Category]) -> DashboardSummary {
    let expenses: Vec<&Transaction> = feed.iter().filter(|t| t.is_expense()).collect();

    let mut distribution: Vec<DashboardSlice> = Vec::new();
    for tx in &expenses {
        match distribution.iter_mut().find(|s| s.category == tx.category) {
            Some(slice) => slice.amount = slice.amount.saturating_add(tx.amount),
            None => distribution.push(DashboardSlice {
                category: tx.category.clone(),
                amount: tx.amount,
                color: String::new(),
            }),
        }
    }
    for slice in &mut distribution {
        let first = feed.iter().find(|t| t.category == slice.category);
        slice.color = resolve_style(&slice.category, categories, first, DEFAULT_SLICE_COLOR).0;
    }

    DashboardSummary {
        total_expenses: sum_amounts(expenses.iter().map(|t| t.amount)),
        distribution,
        recent: feed.iter().take(RECENT_ITEMS).cloned().collect(),
    }
}

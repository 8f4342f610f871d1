//! Window totals, category breakdown and trend series.

mod dashboard;
mod period;

pub use dashboard::{dashboard_summary, DashboardSlice, DashboardSummary, DEFAULT_SLICE_COLOR};
pub use period::{ReportPeriod, ReportWindow};

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::format::Locale;
use crate::models::{
    Category, Currency, Transaction, TransactionKind, DEFAULT_CATEGORY_COLOR,
    DEFAULT_CATEGORY_ICON,
};

use period::{first_day_of_month, last_day_of_month};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub period: ReportPeriod,
    pub anchor: NaiveDate,
    /// Only count transactions in this currency. `None` sums every
    /// currency together.
    pub currency: Option<Currency>,
    pub locale: Locale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdownEntry {
    pub category: String,
    pub amount: Decimal,
    pub count: usize,
    /// `round(amount / total_expenses * 100)`.
    pub percentage: u32,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub period: ReportPeriod,
    pub window: ReportWindow,
    pub currency: Option<Currency>,
    pub total_expenses: Decimal,
    pub total_income: Decimal,
    pub balance: Decimal,
    pub category_breakdown: Vec<CategoryBreakdownEntry>,
    pub trend_series: Vec<TrendPoint>,
    pub average_per_day: Decimal,
}

/// Display color and icon for a category label.
///
/// The current category set wins; a transaction's own copy covers
/// categories that were renamed, deleted, or not loaded yet.
pub(crate) fn resolve_style<'a>(
    label: &str,
    categories: &'a [Category],
    fallback: Option<&'a Transaction>,
    default_color: &'a str,
) -> (String, String) {
    let category = categories.iter().find(|c| c.name == label);
    let color = category
        .map(|c| c.color.as_str())
        .filter(|c| !c.is_empty())
        .or_else(|| fallback.map(|t| t.color.as_str()).filter(|c| !c.is_empty()))
        .unwrap_or(default_color);
    let icon = category
        .map(|c| c.icon.as_str())
        .filter(|i| !i.is_empty())
        .or_else(|| fallback.map(|t| t.icon.as_str()).filter(|i| !i.is_empty()))
        .unwrap_or(DEFAULT_CATEGORY_ICON);
    (color.to_string(), icon.to_string())
}

/// Sum amounts, saturating at the `Decimal` bounds instead of overflowing.
pub(crate) fn sum_amounts(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(amount))
}

fn percentage_of(amount: Decimal, total: Decimal) -> u32 {
    if total.is_zero() {
        return 0;
    }
    (amount / total * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

struct Bucket {
    label: String,
    start: NaiveDate,
    end: NaiveDate,
}

fn trend_buckets(period: ReportPeriod, window: ReportWindow, locale: Locale) -> Vec<Bucket> {
    match period {
        ReportPeriod::Monthly => {
            let weeks = (window.days() + 6) / 7;
            (0..weeks)
                .map(|i| {
                    let start = window.start + Duration::days(7 * i);
                    Bucket {
                        label: locale.week_label(i as usize + 1),
                        start,
                        end: (start + Duration::days(6)).min(window.end),
                    }
                })
                .collect()
        }
        ReportPeriod::Weekly => (0..7)
            .map(|i| {
                let day = window.start + Duration::days(i);
                Bucket {
                    label: locale.weekday_short(day.weekday()).to_string(),
                    start: day,
                    end: day,
                }
            })
            .collect(),
        ReportPeriod::Yearly => (1..=12)
            .map(|month| Bucket {
                label: locale.month_short(month).to_string(),
                start: first_day_of_month(window.start.year(), month),
                end: last_day_of_month(window.start.year(), month),
            })
            .collect(),
    }
}

/// Aggregate `transactions` over the window of `options.period` around
/// `options.anchor`.
///
/// `categories` only styles the breakdown; it may be stale or empty.
pub fn compute_report(
    transactions: &[Transaction],
    categories: &[Category],
    options: &ReportOptions,
) -> Report {
    let window = options.period.window(options.anchor);
    let in_window: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| window.contains(t.date))
        .filter(|t| options.currency.is_none_or(|c| t.currency == c))
        .collect();

    let expenses: Vec<&Transaction> = in_window
        .iter()
        .copied()
        .filter(|t| t.kind == TransactionKind::Expense)
        .collect();
    let total_expenses = sum_amounts(expenses.iter().map(|t| t.amount));
    let total_income = sum_amounts(
        in_window
            .iter()
            .filter(|t| t.kind == TransactionKind::Income)
            .map(|t| t.amount),
    );

    // Insertion-ordered so the stable sort keeps first-seen order on ties.
    let mut groups: Vec<(String, Decimal, usize, &Transaction)> = Vec::new();
    for &tx in &expenses {
        let label = if tx.category.trim().is_empty() {
            options.locale.other_category().to_string()
        } else {
            tx.category.clone()
        };
        match groups.iter_mut().find(|(name, ..)| *name == label) {
            Some((_, amount, count, _)) => {
                *amount = amount.saturating_add(tx.amount);
                *count += 1;
            }
            None => groups.push((label, tx.amount, 1, tx)),
        }
    }
    groups.sort_by(|a, b| b.1.cmp(&a.1));

    let category_breakdown = groups
        .into_iter()
        .map(|(category, amount, count, first)| {
            let (color, icon) =
                resolve_style(&category, categories, Some(first), DEFAULT_CATEGORY_COLOR);
            CategoryBreakdownEntry {
                percentage: percentage_of(amount, total_expenses),
                category,
                amount,
                count,
                color,
                icon,
            }
        })
        .collect();

    let trend_series = trend_buckets(options.period, window, options.locale)
        .into_iter()
        .map(|bucket| TrendPoint {
            value: sum_amounts(
                expenses
                    .iter()
                    .filter(|t| bucket.start <= t.date && t.date <= bucket.end)
                    .map(|t| t.amount),
            ),
            label: bucket.label,
            start: bucket.start,
            end: bucket.end,
        })
        .collect();

    Report {
        period: options.period,
        window,
        currency: options.currency,
        total_expenses,
        total_income,
        balance: total_income.saturating_sub(total_expenses),
        category_breakdown,
        trend_series,
        average_per_day: total_expenses / options.period.average_divisor(),
    }
}

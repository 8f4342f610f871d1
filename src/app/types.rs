use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::format::{format_amount, format_amount_display};
use crate::listing::{DateGroup, GroupKind};
use crate::models::{Category, CreditCard, PaymentMethod, Transaction};
use crate::recommend::Recommendation;
use crate::report::{CategoryBreakdownEntry, DashboardSlice, Report, TrendPoint};

use rust_decimal::Decimal;

pub(crate) fn amount_string(value: Decimal, config: &ResolvedConfig) -> String {
    format_amount(value, config.display.currency_decimals)
}

/// Only rendered when the config asks for a symbol or digit grouping.
pub(crate) fn amount_display(value: Decimal, config: &ResolvedConfig) -> Option<String> {
    let display = &config.display;
    if display.currency_symbol.is_none() && !display.currency_grouping {
        return None;
    }
    Some(format_amount_display(
        value,
        display.currency_grouping,
        display.currency_symbol.as_deref(),
    ))
}

/// JSON output for card payment details
#[derive(Debug, Serialize)]
pub struct CardPaymentOutput {
    pub card_id: String,
    pub card_name: String,
    pub card_amount: String,
    pub payment_date: String,
}

/// JSON output for transactions
#[derive(Debug, Serialize)]
pub struct TransactionOutput {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub subcategory: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_display: Option<String>,
    pub currency: String,
    pub icon: String,
    pub color: String,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<CardPaymentOutput>,
}

impl TransactionOutput {
    pub fn new(tx: &Transaction, config: &ResolvedConfig) -> Self {
        let (payment_method, card) = match &tx.payment {
            PaymentMethod::Cash => ("cash", None),
            PaymentMethod::Card(card) => (
                "card",
                Some(CardPaymentOutput {
                    card_id: card.card_id.to_string(),
                    card_name: card.card_name.clone(),
                    card_amount: amount_string(card.card_amount, config),
                    payment_date: card.payment_date.to_string(),
                }),
            ),
        };
        Self {
            id: tx.id.to_string(),
            date: tx.date.to_string(),
            kind: if tx.is_expense() { "expense" } else { "income" }.to_string(),
            category: tx.category.clone(),
            subcategory: tx.subcategory_label().to_string(),
            amount: amount_string(tx.amount, config),
            amount_display: amount_display(tx.amount, config),
            currency: tx.currency.to_string(),
            icon: tx.icon.clone(),
            color: tx.color.clone(),
            payment_method: payment_method.to_string(),
            card,
        }
    }
}

/// JSON output for one display group of the transaction list
#[derive(Debug, Serialize)]
pub struct DateGroupOutput {
    pub label: String,
    pub kind: GroupKind,
    pub date: String,
    pub transactions: Vec<TransactionOutput>,
}

impl DateGroupOutput {
    pub fn new(group: &DateGroup, config: &ResolvedConfig) -> Self {
        Self {
            label: group.label.clone(),
            kind: group.kind,
            date: group.date.to_string(),
            transactions: group
                .transactions
                .iter()
                .map(|t| TransactionOutput::new(t, config))
                .collect(),
        }
    }
}

/// JSON output for the grouped transaction list
#[derive(Debug, Serialize)]
pub struct ListOutput {
    pub count: usize,
    pub groups: Vec<DateGroupOutput>,
    /// Set for paginated listings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct BreakdownOutput {
    pub category: String,
    pub amount: String,
    pub count: usize,
    pub percentage: u32,
    pub color: String,
    pub icon: String,
}

impl BreakdownOutput {
    fn new(entry: &CategoryBreakdownEntry, config: &ResolvedConfig) -> Self {
        Self {
            category: entry.category.clone(),
            amount: amount_string(entry.amount, config),
            count: entry.count,
            percentage: entry.percentage,
            color: entry.color.clone(),
            icon: entry.icon.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrendOutput {
    pub label: String,
    pub start: String,
    pub end: String,
    pub value: String,
}

impl TrendOutput {
    fn new(point: &TrendPoint, config: &ResolvedConfig) -> Self {
        Self {
            label: point.label.clone(),
            start: point.start.to_string(),
            end: point.end.to_string(),
            value: amount_string(point.value, config),
        }
    }
}

/// JSON output for period reports
#[derive(Debug, Serialize)]
pub struct ReportOutput {
    pub period: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub total_expenses: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_expenses_display: Option<String>,
    pub total_income: String,
    pub balance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_display: Option<String>,
    pub average_per_day: String,
    pub category_breakdown: Vec<BreakdownOutput>,
    pub trend: Vec<TrendOutput>,
}

impl ReportOutput {
    pub fn new(report: &Report, config: &ResolvedConfig) -> Self {
        Self {
            period: report.period.to_string(),
            start_date: report.window.start.to_string(),
            end_date: report.window.end.to_string(),
            currency: report.currency.map(|c| c.to_string()),
            total_expenses: amount_string(report.total_expenses, config),
            total_expenses_display: amount_display(report.total_expenses, config),
            total_income: amount_string(report.total_income, config),
            balance: amount_string(report.balance, config),
            balance_display: amount_display(report.balance, config),
            // Two decimals unless configured otherwise.
            average_per_day: format_amount(
                report.average_per_day,
                Some(config.display.currency_decimals.unwrap_or(2)),
            ),
            category_breakdown: report
                .category_breakdown
                .iter()
                .map(|e| BreakdownOutput::new(e, config))
                .collect(),
            trend: report
                .trend_series
                .iter()
                .map(|p| TrendOutput::new(p, config))
                .collect(),
        }
    }
}

/// JSON output for the recommended form defaults
#[derive(Debug, Serialize)]
pub struct RecommendationOutput {
    pub recommended: Recommendation,
    /// What the add-expense form would preselect given the current categories.
    pub selected_category: Option<String>,
    pub selected_subcategory: Option<String>,
    pub history_limit: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardSliceOutput {
    pub category: String,
    pub amount: String,
    pub color: String,
}

impl DashboardSliceOutput {
    pub fn new(slice: &DashboardSlice, config: &ResolvedConfig) -> Self {
        Self {
            category: slice.category.clone(),
            amount: amount_string(slice.amount, config),
            color: slice.color.clone(),
        }
    }
}

/// JSON output for the home-screen summary
#[derive(Debug, Serialize)]
pub struct DashboardOutput {
    pub total_expenses: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_expenses_display: Option<String>,
    pub feed_size: usize,
    pub distribution: Vec<DashboardSliceOutput>,
    pub recent: Vec<TransactionOutput>,
}

/// JSON output for categories
#[derive(Debug, Serialize)]
pub struct CategoryOutput {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    /// Sorted for display; storage order is kept in the store.
    pub subcategories: Vec<String>,
}

impl From<&Category> for CategoryOutput {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            icon: category.icon.clone(),
            color: category.color.clone(),
            subcategories: category
                .sorted_subcategories()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// JSON output for credit cards
#[derive(Debug, Serialize)]
pub struct CardOutput {
    pub id: String,
    pub name: String,
    pub last4: String,
    pub network: String,
    pub bg_image: String,
}

impl From<&CreditCard> for CardOutput {
    fn from(card: &CreditCard) -> Self {
        Self {
            id: card.id.to_string(),
            name: card.name.clone(),
            last4: card.last4.clone(),
            network: card.network.to_string(),
            bg_image: card.bg_image.clone(),
        }
    }
}

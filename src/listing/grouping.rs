use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::format::Locale;
use crate::models::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Today,
    Yesterday,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateGroup {
    pub label: String,
    pub kind: GroupKind,
    pub date: NaiveDate,
    pub transactions: Vec<Transaction>,
}

/// Partition a date-descending list into Today, Yesterday, then one group
/// per remaining date, newest first. Empty groups are left out and each
/// group keeps the input order.
///
/// Dates in the future get their own dated groups like any other day.
pub fn group_by_date(
    transactions: &[Transaction],
    today: NaiveDate,
    locale: Locale,
) -> Vec<DateGroup> {
    let yesterday = today - Duration::days(1);
    let mut today_txs = Vec::new();
    let mut yesterday_txs = Vec::new();
    let mut by_date: BTreeMap<NaiveDate, Vec<Transaction>> = BTreeMap::new();

    for tx in transactions {
        if tx.date == today {
            today_txs.push(tx.clone());
        } else if tx.date == yesterday {
            yesterday_txs.push(tx.clone());
        } else {
            by_date.entry(tx.date).or_default().push(tx.clone());
        }
    }

    let mut groups = Vec::with_capacity(by_date.len() + 2);
    if !today_txs.is_empty() {
        groups.push(DateGroup {
            label: locale.today().to_string(),
            kind: GroupKind::Today,
            date: today,
            transactions: today_txs,
        });
    }
    if !yesterday_txs.is_empty() {
        groups.push(DateGroup {
            label: locale.yesterday().to_string(),
            kind: GroupKind::Yesterday,
            date: yesterday,
            transactions: yesterday_txs,
        });
    }
    for (date, transactions) in by_date.into_iter().rev() {
        groups.push(DateGroup {
            label: locale.long_date(date),
            kind: GroupKind::Date,
            date,
            transactions,
        });
    }
    groups
}

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{format_iso_date, Id, TransactionRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOrder {
    /// Expense date, newest first; ties broken by id, descending.
    #[default]
    DateDesc,
    /// Creation instant, newest first. Documents without a timestamp sort last.
    TimestampDesc,
}

/// One-shot or live transaction query. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub order: QueryOrder,
    pub limit: Option<usize>,
}

impl TransactionQuery {
    /// The `limit` most recently created transactions.
    pub fn recent(limit: usize) -> Self {
        Self {
            order: QueryOrder::TimestampDesc,
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        }
    }

    /// Filter, order and cap `records`.
    ///
    /// Dates are compared as stored `YYYY-MM-DD` strings, which order the
    /// same way as the calendar dates they encode.
    pub(crate) fn apply(&self, records: &[TransactionRecord]) -> Vec<TransactionRecord> {
        let from = self.from.map(format_iso_date);
        let to = self.to.map(format_iso_date);
        let mut out: Vec<TransactionRecord> = records
            .iter()
            .filter(|r| from.as_deref().is_none_or(|from| r.date.as_str() >= from))
            .filter(|r| to.as_deref().is_none_or(|to| r.date.as_str() <= to))
            .cloned()
            .collect();
        match self.order {
            QueryOrder::DateDesc => out.sort_by(date_desc),
            QueryOrder::TimestampDesc => out.sort_by(timestamp_desc),
        }
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

fn date_desc(a: &TransactionRecord, b: &TransactionRecord) -> Ordering {
    b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id))
}

fn timestamp_desc(a: &TransactionRecord, b: &TransactionRecord) -> Ordering {
    // `None < Some`, so reversing puts untimestamped documents last.
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| b.id.cmp(&a.id))
}

/// Position after the last record of a page, in date-desc, id-desc order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    pub date: String,
    pub id: Id,
}

impl PageCursor {
    pub fn of(record: &TransactionRecord) -> Self {
        Self {
            date: record.date.clone(),
            id: record.id.clone(),
        }
    }

    /// Whether `record` sorts strictly after this cursor.
    fn precedes(&self, record: &TransactionRecord) -> bool {
        record.date < self.date || (record.date == self.date && record.id < self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page_size: usize,
    pub after: Option<PageCursor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<TransactionRecord>,
    /// Cursor of the last record returned, if any.
    pub last_cursor: Option<PageCursor>,
    pub count: usize,
}

impl PageRequest {
    pub(crate) fn apply(&self, records: &[TransactionRecord]) -> Page {
        let mut ordered: Vec<&TransactionRecord> = records
            .iter()
            .filter(|r| self.after.as_ref().is_none_or(|c| c.precedes(r)))
            .collect();
        ordered.sort_by(|a, b| date_desc(a, b));
        let records: Vec<TransactionRecord> = ordered
            .into_iter()
            .take(self.page_size)
            .cloned()
            .collect();
        Page {
            last_cursor: records.last().map(PageCursor::of),
            count: records.len(),
            records,
        }
    }
}

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cancel::CancelFlag;
use crate::models::{normalize_records, Id, Transaction};
use crate::storage::{PageCursor, PageRequest, Store};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageResult {
    pub transactions: Vec<Transaction>,
    /// True when the page came back full. This is a guess: when the total
    /// is an exact multiple of the page size, the last full page still
    /// reports more and the following fetch comes back empty.
    pub has_more: bool,
}

/// Walks one user's transactions page by page, newest expense date first.
#[derive(Debug, Clone)]
pub struct Paginator {
    user: Id,
    page_size: usize,
    cursor: Option<PageCursor>,
    exhausted: bool,
}

impl Paginator {
    /// A page size of zero is treated as one.
    pub fn new(user: Id, page_size: usize) -> Self {
        Self {
            user,
            page_size: page_size.max(1),
            cursor: None,
            exhausted: false,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    pub fn has_more(&self) -> bool {
        !self.exhausted
    }

    /// Start over from the newest transaction.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.exhausted = false;
    }

    pub async fn fetch_next_page(&mut self, store: &dyn Store) -> Result<PageResult> {
        let page = self
            .fetch_next_page_unless(store, &CancelFlag::new())
            .await?;
        Ok(page.unwrap_or_default())
    }

    /// Like [`Paginator::fetch_next_page`], but a fetch that resolves after
    /// `cancel` was set is dropped: returns `None` and leaves the cursor
    /// where it was.
    pub async fn fetch_next_page_unless(
        &mut self,
        store: &dyn Store,
        cancel: &CancelFlag,
    ) -> Result<Option<PageResult>> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        if self.exhausted {
            return Ok(Some(PageResult::default()));
        }

        let request = PageRequest {
            page_size: self.page_size,
            after: self.cursor.clone(),
        };
        let page = store
            .fetch_transaction_page(&self.user, &request)
            .await
            .with_context(|| format!("Failed to fetch transactions for {}", self.user))?;

        if cancel.is_cancelled() {
            tracing::debug!(user = %self.user, "Discarding page fetched after cancellation");
            return Ok(None);
        }

        let has_more = page.count == self.page_size;
        if page.last_cursor.is_some() {
            self.cursor = page.last_cursor;
        }
        self.exhausted = !has_more;
        Ok(Some(PageResult {
            transactions: normalize_records(&page.records),
            has_more,
        }))
    }
}

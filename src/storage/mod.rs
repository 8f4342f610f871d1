mod json_file;
mod lookup;
mod memory;
mod query;
mod subscription;

pub use json_file::JsonFileStore;
pub use lookup::{find_card, find_category_by_name};
pub use memory::MemoryStore;
pub use query::{Page, PageCursor, PageRequest, QueryOrder, TransactionQuery};
pub use subscription::{Snapshot, Subscription};

use anyhow::Result;

use crate::models::{
    Category, CategoryPatch, CreditCard, CreditCardPatch, Id, NewCategory, NewCreditCard,
    NewTransaction, TransactionPatch, TransactionRecord,
};

/// Failures a store reports in a form callers can match on. Everything
/// else travels as plain `anyhow` context.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Id },
    #[error("{kind} {id} belongs to another user")]
    PermissionDenied { kind: &'static str, id: Id },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Per-user document store for transactions, categories and cards.
///
/// Every call is scoped to one user; a store never returns another
/// user's documents. Transaction reads hand back stored documents as-is
/// and leave normalization to the caller.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // Transactions
    async fn query_transactions(
        &self,
        user: &Id,
        query: &TransactionQuery,
    ) -> Result<Vec<TransactionRecord>>;
    async fn subscribe_transactions(
        &self,
        user: &Id,
        query: TransactionQuery,
    ) -> Result<Subscription<TransactionRecord>>;
    async fn fetch_transaction_page(&self, user: &Id, request: &PageRequest) -> Result<Page>;
    async fn get_transaction(&self, user: &Id, id: &Id) -> Result<Option<TransactionRecord>>;
    /// Store assigns `id` and `timestamp`.
    async fn create_transaction(&self, user: &Id, draft: &NewTransaction) -> Result<Id>;
    async fn update_transaction(&self, user: &Id, id: &Id, patch: &TransactionPatch)
        -> Result<()>;
    async fn delete_transaction(&self, user: &Id, id: &Id) -> Result<bool>;

    // Categories
    async fn list_categories(&self, user: &Id) -> Result<Vec<Category>>;
    async fn subscribe_categories(&self, user: &Id) -> Result<Subscription<Category>>;
    async fn create_category(&self, user: &Id, draft: &NewCategory) -> Result<Id>;
    async fn update_category(&self, user: &Id, id: &Id, patch: &CategoryPatch) -> Result<()>;
    async fn delete_category(&self, user: &Id, id: &Id) -> Result<bool>;

    // Cards
    async fn list_cards(&self, user: &Id) -> Result<Vec<CreditCard>>;
    async fn create_card(&self, user: &Id, draft: &NewCreditCard) -> Result<Id>;
    async fn update_card(&self, user: &Id, id: &Id, patch: &CreditCardPatch) -> Result<()>;
    async fn delete_card(&self, user: &Id, id: &Id) -> Result<bool>;
}

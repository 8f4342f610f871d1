//! In-memory store, used by tests and as the reference collaborator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::models::{
    Category, CategoryPatch, CreditCard, CreditCardPatch, Id, IdGenerator, NewCategory,
    NewCreditCard, NewTransaction, TransactionPatch, TransactionRecord, UuidIdGenerator,
};

use super::subscription::ListenerRegistry;
use super::{Page, PageRequest, Snapshot, Store, StoreError, Subscription, TransactionQuery};

pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    transactions: Mutex<HashMap<Id, Vec<TransactionRecord>>>,
    categories: Mutex<HashMap<Id, Vec<Category>>>,
    cards: Mutex<HashMap<Id, Vec<CreditCard>>>,
    transaction_listeners: ListenerRegistry<TransactionRecord, TransactionQuery>,
    category_listeners: ListenerRegistry<Category, ()>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock_and_ids(Arc::new(SystemClock::default()), Arc::new(UuidIdGenerator))
    }

    pub fn with_clock_and_ids(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            clock,
            ids,
            transactions: Mutex::new(HashMap::new()),
            categories: Mutex::new(HashMap::new()),
            cards: Mutex::new(HashMap::new()),
            transaction_listeners: ListenerRegistry::new(),
            category_listeners: ListenerRegistry::new(),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Insert a stored document verbatim, bypassing id and timestamp
    /// assignment. Useful for seeding legacy or malformed documents.
    pub async fn insert_record(&self, record: TransactionRecord) {
        let user = record.user_id.clone();
        let mut all = self.transactions.lock().await;
        all.entry(user.clone()).or_default().push(record);
        self.notify_transactions(&user, &all);
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of live-query listeners still registered.
    pub fn listener_count(&self) -> usize {
        self.transaction_listeners.len() + self.category_listeners.len()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()).into());
        }
        Ok(())
    }

    fn notify_transactions(&self, user: &Id, all: &HashMap<Id, Vec<TransactionRecord>>) {
        let records = all.get(user).map(Vec::as_slice).unwrap_or_default();
        self.transaction_listeners
            .notify(user, |query| Snapshot::Ready(query.apply(records)));
    }

    fn notify_categories(&self, user: &Id, all: &HashMap<Id, Vec<Category>>) {
        let categories = all.get(user).cloned().unwrap_or_default();
        self.category_listeners
            .notify(user, |_| Snapshot::Ready(categories.clone()));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate `id` among `user`'s documents, telling "missing" apart from
/// "someone else's".
fn locate<'a, T>(
    all: &'a mut HashMap<Id, Vec<T>>,
    user: &Id,
    id: &Id,
    kind: &'static str,
    id_of: impl Fn(&T) -> &Id,
) -> Result<&'a mut T, StoreError> {
    let owned_elsewhere = all
        .iter()
        .filter(|(owner, _)| *owner != user)
        .any(|(_, docs)| docs.iter().any(|d| id_of(d) == id));
    if owned_elsewhere {
        return Err(StoreError::PermissionDenied {
            kind,
            id: id.clone(),
        });
    }
    all.get_mut(user)
        .and_then(|docs| docs.iter_mut().find(|d| id_of(d) == id))
        .ok_or_else(|| StoreError::NotFound {
            kind,
            id: id.clone(),
        })
}

fn remove<T>(
    all: &mut HashMap<Id, Vec<T>>,
    user: &Id,
    id: &Id,
    id_of: impl Fn(&T) -> &Id,
) -> bool {
    let Some(docs) = all.get_mut(user) else {
        return false;
    };
    let before = docs.len();
    docs.retain(|d| id_of(d) != id);
    docs.len() != before
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn query_transactions(
        &self,
        user: &Id,
        query: &TransactionQuery,
    ) -> Result<Vec<TransactionRecord>> {
        self.check_available()?;
        let all = self.transactions.lock().await;
        let records = all.get(user).map(Vec::as_slice).unwrap_or_default();
        Ok(query.apply(records))
    }

    async fn subscribe_transactions(
        &self,
        user: &Id,
        query: TransactionQuery,
    ) -> Result<Subscription<TransactionRecord>> {
        self.check_available()?;
        let all = self.transactions.lock().await;
        let records = all.get(user).map(Vec::as_slice).unwrap_or_default();
        let initial = Snapshot::Ready(query.apply(records));
        Ok(self
            .transaction_listeners
            .register(user.clone(), query, initial))
    }

    async fn fetch_transaction_page(&self, user: &Id, request: &PageRequest) -> Result<Page> {
        self.check_available()?;
        let all = self.transactions.lock().await;
        let records = all.get(user).map(Vec::as_slice).unwrap_or_default();
        Ok(request.apply(records))
    }

    async fn get_transaction(&self, user: &Id, id: &Id) -> Result<Option<TransactionRecord>> {
        self.check_available()?;
        let all = self.transactions.lock().await;
        Ok(all
            .get(user)
            .and_then(|records| records.iter().find(|r| &r.id == id))
            .cloned())
    }

    async fn create_transaction(&self, user: &Id, draft: &NewTransaction) -> Result<Id> {
        self.check_available()?;
        let id = self.ids.new_id();
        let record = TransactionRecord::new(id.clone(), user.clone(), self.clock.now(), draft);
        let mut all = self.transactions.lock().await;
        all.entry(user.clone()).or_default().push(record);
        self.notify_transactions(user, &all);
        tracing::debug!(transaction = %id, "Created transaction");
        Ok(id)
    }

    async fn update_transaction(
        &self,
        user: &Id,
        id: &Id,
        patch: &TransactionPatch,
    ) -> Result<()> {
        self.check_available()?;
        let mut all = self.transactions.lock().await;
        locate(&mut all, user, id, "Transaction", |r| &r.id)?.apply_patch(patch);
        self.notify_transactions(user, &all);
        Ok(())
    }

    async fn delete_transaction(&self, user: &Id, id: &Id) -> Result<bool> {
        self.check_available()?;
        let mut all = self.transactions.lock().await;
        let removed = remove(&mut all, user, id, |r| &r.id);
        if removed {
            self.notify_transactions(user, &all);
        }
        Ok(removed)
    }

    async fn list_categories(&self, user: &Id) -> Result<Vec<Category>> {
        self.check_available()?;
        let all = self.categories.lock().await;
        Ok(all.get(user).cloned().unwrap_or_default())
    }

    async fn subscribe_categories(&self, user: &Id) -> Result<Subscription<Category>> {
        self.check_available()?;
        let all = self.categories.lock().await;
        let initial = Snapshot::Ready(all.get(user).cloned().unwrap_or_default());
        Ok(self.category_listeners.register(user.clone(), (), initial))
    }

    async fn create_category(&self, user: &Id, draft: &NewCategory) -> Result<Id> {
        self.check_available()?;
        let id = self.ids.new_id();
        let mut all = self.categories.lock().await;
        all.entry(user.clone())
            .or_default()
            .push(Category::new(id.clone(), user.clone(), draft));
        self.notify_categories(user, &all);
        Ok(id)
    }

    async fn update_category(&self, user: &Id, id: &Id, patch: &CategoryPatch) -> Result<()> {
        self.check_available()?;
        let mut all = self.categories.lock().await;
        locate(&mut all, user, id, "Category", |c| &c.id)?.apply_patch(patch);
        self.notify_categories(user, &all);
        Ok(())
    }

    async fn delete_category(&self, user: &Id, id: &Id) -> Result<bool> {
        self.check_available()?;
        let mut all = self.categories.lock().await;
        let removed = remove(&mut all, user, id, |c| &c.id);
        if removed {
            self.notify_categories(user, &all);
        }
        Ok(removed)
    }

    async fn list_cards(&self, user: &Id) -> Result<Vec<CreditCard>> {
        self.check_available()?;
        let all = self.cards.lock().await;
        Ok(all.get(user).cloned().unwrap_or_default())
    }

    async fn create_card(&self, user: &Id, draft: &NewCreditCard) -> Result<Id> {
        self.check_available()?;
        let id = self.ids.new_id();
        let mut all = self.cards.lock().await;
        all.entry(user.clone())
            .or_default()
            .push(CreditCard::new(id.clone(), user.clone(), draft));
        Ok(id)
    }

    async fn update_card(&self, user: &Id, id: &Id, patch: &CreditCardPatch) -> Result<()> {
        self.check_available()?;
        let mut all = self.cards.lock().await;
        locate(&mut all, user, id, "Card", |c| &c.id)?.apply_patch(patch);
        Ok(())
    }

    async fn delete_card(&self, user: &Id, id: &Id) -> Result<bool> {
        self.check_available()?;
        let mut all = self.cards.lock().await;
        Ok(remove(&mut all, user, id, |c| &c.id))
    }
}

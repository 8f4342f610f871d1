use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::models::{
    Category, CategoryPatch, CreditCard, CreditCardPatch, Id, IdGenerator, NewCategory,
    NewCreditCard, NewTransaction, TransactionPatch, TransactionRecord, UuidIdGenerator,
};

use super::subscription::ListenerRegistry;
use super::{Page, PageRequest, Snapshot, Store, StoreError, Subscription, TransactionQuery};

/// JSON file-based store.
///
/// Directory structure:
/// ```text
/// data/
///   users/
///     {user_id}/
///       transactions.json
///       categories.json
///       cards.json
/// ```
///
/// Each file holds the whole collection as a JSON array. Writes go through
/// a single lock and replace the file atomically (write to a sibling temp
/// file, then rename).
///
/// A document that does not deserialize is skipped on read with a warning
/// and written back untouched on the next rewrite of its file.
pub struct JsonFileStore {
    base_path: PathBuf,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    write_lock: Mutex<()>,
    transaction_listeners: ListenerRegistry<TransactionRecord, TransactionQuery>,
    category_listeners: ListenerRegistry<Category, ()>,
}

impl JsonFileStore {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self::with_clock_and_ids(
            base_path,
            Arc::new(SystemClock::default()),
            Arc::new(UuidIdGenerator),
        )
    }

    pub fn with_clock_and_ids(
        base_path: impl AsRef<Path>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            clock,
            ids,
            write_lock: Mutex::new(()),
            transaction_listeners: ListenerRegistry::new(),
            category_listeners: ListenerRegistry::new(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.transaction_listeners.len() + self.category_listeners.len()
    }

    fn user_dir(&self, user: &Id) -> Result<PathBuf> {
        let checked = Id::from_string_checked(user.as_str())?;
        Ok(self.base_path.join("users").join(checked.as_str()))
    }

    fn transactions_file(&self, user: &Id) -> Result<PathBuf> {
        Ok(self.user_dir(user)?.join("transactions.json"))
    }

    fn categories_file(&self, user: &Id) -> Result<PathBuf> {
        Ok(self.user_dir(user)?.join("categories.json"))
    }

    fn cards_file(&self, user: &Id) -> Result<PathBuf> {
        Ok(self.user_dir(user)?.join("cards.json"))
    }

    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create directory")?;
        }
        Ok(())
    }

    async fn read_collection<T: DeserializeOwned>(&self, path: &Path) -> Result<Collection<T>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Collection::default())
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read file {}", path.display()))
            }
        };
        if content.trim().is_empty() {
            return Ok(Collection::default());
        }
        let documents: Vec<serde_json::Value> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;

        let mut collection = Collection::default();
        for (index, document) in documents.into_iter().enumerate() {
            match serde_json::from_value(document.clone()) {
                Ok(item) => collection.items.push(item),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        index,
                        error = %e,
                        "Skipping unreadable document"
                    );
                    collection.unreadable.push(document);
                }
            }
        }
        Ok(collection)
    }

    async fn write_collection<T: Serialize>(
        &self,
        path: &Path,
        items: &[T],
        unreadable: &[serde_json::Value],
    ) -> Result<()> {
        self.ensure_dir(path).await?;
        let mut documents = items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to serialize JSON")?;
        documents.extend(unreadable.iter().cloned());
        let content =
            serde_json::to_string_pretty(&documents).context("Failed to serialize JSON")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .await
            .with_context(|| format!("Failed to write file {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to replace file {}", path.display()))?;
        Ok(())
    }

    async fn load_transactions(&self, user: &Id) -> Result<Collection<TransactionRecord>> {
        let path = self.transactions_file(user)?;
        self.read_collection(&path).await
    }

    async fn save_transactions(
        &self,
        user: &Id,
        records: &Collection<TransactionRecord>,
    ) -> Result<()> {
        let path = self.transactions_file(user)?;
        self.write_collection(&path, &records.items, &records.unreadable)
            .await?;
        self.transaction_listeners
            .notify(user, |query| Snapshot::Ready(query.apply(&records.items)));
        Ok(())
    }

    async fn load_categories(&self, user: &Id) -> Result<Collection<Category>> {
        let path = self.categories_file(user)?;
        self.read_collection(&path).await
    }

    async fn save_categories(&self, user: &Id, categories: &Collection<Category>) -> Result<()> {
        let path = self.categories_file(user)?;
        self.write_collection(&path, &categories.items, &categories.unreadable)
            .await?;
        self.category_listeners
            .notify(user, |_| Snapshot::Ready(categories.items.clone()));
        Ok(())
    }

    async fn load_cards(&self, user: &Id) -> Result<Collection<CreditCard>> {
        let path = self.cards_file(user)?;
        self.read_collection(&path).await
    }

    async fn save_cards(&self, user: &Id, cards: &Collection<CreditCard>) -> Result<()> {
        let path = self.cards_file(user)?;
        self.write_collection(&path, &cards.items, &cards.unreadable)
            .await
    }
}

/// A collection file split into the documents that deserialized and the
/// ones that did not.
struct Collection<T> {
    items: Vec<T>,
    unreadable: Vec<serde_json::Value>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            unreadable: Vec::new(),
        }
    }
}

fn not_found(kind: &'static str, id: &Id) -> anyhow::Error {
    StoreError::NotFound {
        kind,
        id: id.clone(),
    }
    .into()
}

#[async_trait::async_trait]
impl Store for JsonFileStore {
    async fn query_transactions(
        &self,
        user: &Id,
        query: &TransactionQuery,
    ) -> Result<Vec<TransactionRecord>> {
        let records = self.load_transactions(user).await?;
        Ok(query.apply(&records.items))
    }

    async fn subscribe_transactions(
        &self,
        user: &Id,
        query: TransactionQuery,
    ) -> Result<Subscription<TransactionRecord>> {
        let initial = match self.load_transactions(user).await {
            Ok(records) => Snapshot::Ready(query.apply(&records.items)),
            Err(e) => {
                tracing::warn!(error = %e, user = %user, "Live transaction query failed");
                Snapshot::Failed(format!("{e:#}"))
            }
        };
        Ok(self
            .transaction_listeners
            .register(user.clone(), query, initial))
    }

    async fn fetch_transaction_page(&self, user: &Id, request: &PageRequest) -> Result<Page> {
        let records = self.load_transactions(user).await?;
        Ok(request.apply(&records.items))
    }

    async fn get_transaction(&self, user: &Id, id: &Id) -> Result<Option<TransactionRecord>> {
        let records = self.load_transactions(user).await?;
        Ok(records.items.into_iter().find(|r| &r.id == id))
    }

    async fn create_transaction(&self, user: &Id, draft: &NewTransaction) -> Result<Id> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_transactions(user).await?;
        let id = self.ids.new_id();
        records.items.push(TransactionRecord::new(
            id.clone(),
            user.clone(),
            self.clock.now(),
            draft,
        ));
        self.save_transactions(user, &records).await?;
        tracing::debug!(transaction = %id, "Created transaction");
        Ok(id)
    }

    async fn update_transaction(
        &self,
        user: &Id,
        id: &Id,
        patch: &TransactionPatch,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_transactions(user).await?;
        let record = records
            .items
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| not_found("Transaction", id))?;
        record.apply_patch(patch);
        self.save_transactions(user, &records).await
    }

    async fn delete_transaction(&self, user: &Id, id: &Id) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_transactions(user).await?;
        let before = records.items.len();
        records.items.retain(|r| &r.id != id);
        if records.items.len() == before {
            return Ok(false);
        }
        self.save_transactions(user, &records).await?;
        Ok(true)
    }

    async fn list_categories(&self, user: &Id) -> Result<Vec<Category>> {
        Ok(self.load_categories(user).await?.items)
    }

    async fn subscribe_categories(&self, user: &Id) -> Result<Subscription<Category>> {
        let initial = match self.list_categories(user).await {
            Ok(categories) => Snapshot::Ready(categories),
            Err(e) => {
                tracing::warn!(error = %e, user = %user, "Live category query failed");
                Snapshot::Failed(format!("{e:#}"))
            }
        };
        Ok(self.category_listeners.register(user.clone(), (), initial))
    }

    async fn create_category(&self, user: &Id, draft: &NewCategory) -> Result<Id> {
        let _guard = self.write_lock.lock().await;
        let mut categories = self.load_categories(user).await?;
        let id = self.ids.new_id();
        categories.items.push(Category::new(id.clone(), user.clone(), draft));
        self.save_categories(user, &categories).await?;
        Ok(id)
    }

    async fn update_category(&self, user: &Id, id: &Id, patch: &CategoryPatch) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut categories = self.load_categories(user).await?;
        let category = categories
            .items
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| not_found("Category", id))?;
        category.apply_patch(patch);
        self.save_categories(user, &categories).await
    }

    async fn delete_category(&self, user: &Id, id: &Id) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut categories = self.load_categories(user).await?;
        let before = categories.items.len();
        categories.items.retain(|c| &c.id != id);
        if categories.items.len() == before {
            return Ok(false);
        }
        self.save_categories(user, &categories).await?;
        Ok(true)
    }

    async fn list_cards(&self, user: &Id) -> Result<Vec<CreditCard>> {
        Ok(self.load_cards(user).await?.items)
    }

    async fn create_card(&self, user: &Id, draft: &NewCreditCard) -> Result<Id> {
        let _guard = self.write_lock.lock().await;
        let mut cards = self.load_cards(user).await?;
        let id = self.ids.new_id();
        cards.items.push(CreditCard::new(id.clone(), user.clone(), draft));
        self.save_cards(user, &cards).await?;
        Ok(id)
    }

    async fn update_card(&self, user: &Id, id: &Id, patch: &CreditCardPatch) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut cards = self.load_cards(user).await?;
        let card = cards
            .items
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| not_found("Card", id))?;
        card.apply_patch(patch);
        self.save_cards(user, &cards).await
    }

    async fn delete_card(&self, user: &Id, id: &Id) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut cards = self.load_cards(user).await?;
        let before = cards.items.len();
        cards.items.retain(|c| &c.id != id);
        if cards.items.len() == before {
            return Ok(false);
        }
        self.save_cards(user, &cards).await?;
        Ok(true)
    }
}

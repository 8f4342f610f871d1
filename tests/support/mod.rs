#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use expensebook::cancel::CancelFlag;
use expensebook::clock::{Clock, FixedClock, TimeZoneSpec};
use expensebook::config::{
    DashboardConfig, DisplayConfig, ListingConfig, RecommendationConfig, ResolvedConfig,
};
use expensebook::models::{
    Category, CategoryPatch, CreditCard, CreditCardPatch, Currency, Id, NewCategory,
    NewCreditCard, NewTransaction, PaymentMethod, SequentialIdGenerator, TransactionKind,
    TransactionPatch, TransactionRecord,
};
use expensebook::storage::{
    MemoryStore, Page, PageRequest, Store, Subscription, TransactionQuery,
};
use rust_decimal::Decimal;

pub const USER: &str = "user-1";

pub fn user() -> Id {
    Id::from_string(USER)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn noon(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
}

/// Clock that moves one minute forward on every reading, so documents
/// created one after another get increasing timestamps.
pub struct SteppingClock {
    start: DateTime<Utc>,
    ticks: AtomicI64,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let n = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.start + Duration::minutes(n)
    }
}

/// Memory store whose ids are `tx-1`, `tx-2`, ... and whose creation
/// timestamps increase with every write.
pub fn memory_store(today: NaiveDate) -> MemoryStore {
    MemoryStore::with_clock_and_ids(
        Arc::new(SteppingClock::new(noon(today))),
        Arc::new(SequentialIdGenerator::new("tx")),
    )
}

pub fn fixed_clock(today: NaiveDate) -> FixedClock {
    FixedClock::new(noon(today))
}

pub fn test_config(data_dir: &Path) -> ResolvedConfig {
    ResolvedConfig {
        data_dir: data_dir.to_path_buf(),
        user_id: user(),
        default_currency: Currency::Ars,
        timezone: TimeZoneSpec::Named(chrono_tz::UTC),
        display: DisplayConfig::default(),
        recommendation: RecommendationConfig::default(),
        listing: ListingConfig::default(),
        dashboard: DashboardConfig::default(),
    }
}

pub fn expense(amount: i64, category: &str, subcategory: Option<&str>, on: NaiveDate) -> NewTransaction {
    NewTransaction {
        amount: Decimal::from(amount),
        currency: Currency::Ars,
        category: category.to_string(),
        subcategory: subcategory.map(str::to_string),
        icon: "category".to_string(),
        color: "#38e07b".to_string(),
        date: on,
        kind: TransactionKind::Expense,
        payment: PaymentMethod::Cash,
    }
}

pub fn income(amount: i64, category: &str, on: NaiveDate) -> NewTransaction {
    NewTransaction {
        kind: TransactionKind::Income,
        ..expense(amount, category, None, on)
    }
}

pub fn category(name: &str, color: &str, subcategories: &[&str]) -> NewCategory {
    NewCategory {
        name: name.to_string(),
        icon: "category".to_string(),
        color: color.to_string(),
        subcategories: subcategories.iter().map(|s| s.to_string()).collect(),
    }
}

/// Store that raises `cancel` while a page fetch is in flight, standing in
/// for a view closed before its data arrived.
pub struct CancellingStore {
    pub inner: MemoryStore,
    pub cancel: CancelFlag,
}

#[async_trait]
impl Store for CancellingStore {
    async fn query_transactions(
        &self,
        user: &Id,
        query: &TransactionQuery,
    ) -> Result<Vec<TransactionRecord>> {
        let records = self.inner.query_transactions(user, query).await?;
        self.cancel.cancel();
        Ok(records)
    }

    async fn subscribe_transactions(
        &self,
        user: &Id,
        query: TransactionQuery,
    ) -> Result<Subscription<TransactionRecord>> {
        self.inner.subscribe_transactions(user, query).await
    }

    async fn fetch_transaction_page(&self, user: &Id, request: &PageRequest) -> Result<Page> {
        let page = self.inner.fetch_transaction_page(user, request).await?;
        self.cancel.cancel();
        Ok(page)
    }

    async fn get_transaction(&self, user: &Id, id: &Id) -> Result<Option<TransactionRecord>> {
        self.inner.get_transaction(user, id).await
    }

    async fn create_transaction(&self, user: &Id, draft: &NewTransaction) -> Result<Id> {
        self.inner.create_transaction(user, draft).await
    }

    async fn update_transaction(
        &self,
        user: &Id,
        id: &Id,
        patch: &TransactionPatch,
    ) -> Result<()> {
        self.inner.update_transaction(user, id, patch).await
    }

    async fn delete_transaction(&self, user: &Id, id: &Id) -> Result<bool> {
        self.inner.delete_transaction(user, id).await
    }

    async fn list_categories(&self, user: &Id) -> Result<Vec<Category>> {
        self.inner.list_categories(user).await
    }

    async fn subscribe_categories(&self, user: &Id) -> Result<Subscription<Category>> {
        self.inner.subscribe_categories(user).await
    }

    async fn create_category(&self, user: &Id, draft: &NewCategory) -> Result<Id> {
        self.inner.create_category(user, draft).await
    }

    async fn update_category(&self, user: &Id, id: &Id, patch: &CategoryPatch) -> Result<()> {
        self.inner.update_category(user, id, patch).await
    }

    async fn delete_category(&self, user: &Id, id: &Id) -> Result<bool> {
        self.inner.delete_category(user, id).await
    }

    async fn list_cards(&self, user: &Id) -> Result<Vec<CreditCard>> {
        self.inner.list_cards(user).await
    }

    async fn create_card(&self, user: &Id, draft: &NewCreditCard) -> Result<Id> {
        self.inner.create_card(user, draft).await
    }

    async fn update_card(&self, user: &Id, id: &Id, patch: &CreditCardPatch) -> Result<()> {
        self.inner.update_card(user, id, patch).await
    }

    async fn delete_card(&self, user: &Id, id: &Id) -> Result<bool> {
        self.inner.delete_card(user, id).await
    }
}

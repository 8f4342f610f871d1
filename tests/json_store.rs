mod support;

use std::sync::Arc;

use anyhow::Result;
use expensebook::app::{
    self, CardInput, CategoryInput, PaymentInput, ReportRequest, TransactionInput,
};
use expensebook::listing::ListFilter;
use expensebook::models::{CardNetwork, SequentialIdGenerator};
use expensebook::report::ReportPeriod;
use expensebook::storage::{JsonFileStore, Store, TransactionQuery};
use tempfile::TempDir;

use support::{date, fixed_clock, noon, test_config, user, SteppingClock, USER};

fn store_at(dir: &TempDir) -> JsonFileStore {
    JsonFileStore::with_clock_and_ids(
        dir.path(),
        Arc::new(SteppingClock::new(noon(date(2024, 3, 10)))),
        Arc::new(SequentialIdGenerator::new("doc")),
    )
}

#[tokio::test]
async fn app_flow_persists_to_per_user_files() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(dir.path());
    let store = store_at(&dir);
    let clock = fixed_clock(date(2024, 3, 10));

    app::add_category(
        &store,
        &config,
        &CategoryInput {
            name: "Comida".to_string(),
            subcategories: vec!["Super".to_string()],
            ..Default::default()
        },
    )
    .await?;
    app::add_card(
        &store,
        &config,
        &CardInput {
            name: "Galicia".to_string(),
            last4: "4242".to_string(),
            network: CardNetwork::Mastercard,
            bg_image: None,
        },
    )
    .await?;
    app::add_transaction(
        &store,
        &config,
        &clock,
        &TransactionInput {
            amount: "99.90".to_string(),
            category: "Comida".to_string(),
            payment: PaymentInput::Card {
                card: "Galicia".to_string(),
                card_amount: None,
                payment_date: Some("2024-04-10".to_string()),
            },
            ..Default::default()
        },
    )
    .await?;

    let user_dir = dir.path().join("users").join(USER);
    assert!(user_dir.join("transactions.json").exists());
    assert!(user_dir.join("categories.json").exists());
    assert!(user_dir.join("cards.json").exists());

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(user_dir.join("transactions.json"))?)?;
    let doc = &raw[0];
    assert_eq!(doc["type"], "expense");
    assert_eq!(doc["paymentMethod"], "card");
    assert_eq!(doc["cardName"], "Galicia");
    assert_eq!(doc["paymentDate"], "2024-04-10");
    assert_eq!(doc["subcategory"], "Super");

    // A fresh instance reads the same data back.
    let reopened = JsonFileStore::new(dir.path());
    let list =
        app::list_transactions(&reopened, &config, &clock, &ListFilter::default()).await?;
    assert_eq!(list.count, 1);
    assert_eq!(list.groups[0].label, "Today");
    assert_eq!(list.groups[0].transactions[0].amount, "99.9");

    let cards = app::list_cards(&reopened, &config).await?;
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].bg_image, "cards/mastercard.png");
    Ok(())
}

#[tokio::test]
async fn hand_written_legacy_documents_are_tolerated() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(dir.path());
    let user_dir = dir.path().join("users").join(USER);
    std::fs::create_dir_all(&user_dir)?;
    std::fs::write(
        user_dir.join("transactions.json"),
        r#"[
  {"id": "a", "userId": "user-1", "amount": "120", "category": "Comida", "date": "2024-03-09"},
  {"id": "b", "userId": "user-1", "amount": 30, "category": "Comida", "date": "not a date"},
  {"id": "c", "userId": "user-1", "amount": 500, "category": "Sueldo", "date": "2024-03-10", "type": "income"}
]"#,
    )?;

    let store = JsonFileStore::new(dir.path());
    let list = app::list_transactions(
        &store,
        &config,
        &fixed_clock(date(2024, 3, 10)),
        &ListFilter::default(),
    )
    .await?;
    assert_eq!(list.count, 2);
    assert_eq!(list.groups[0].transactions[0].kind, "income");
    assert_eq!(list.groups[1].transactions[0].kind, "expense");
    assert_eq!(list.groups[1].transactions[0].amount, "120");
    Ok(())
}

#[tokio::test]
async fn subscriptions_follow_file_writes() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(dir.path());
    let store = store_at(&dir);

    let mut feed = store
        .subscribe_transactions(&user(), TransactionQuery::recent(10))
        .await?;
    assert_eq!(feed.current().items().map(<[_]>::len), Some(0));

    app::add_category(
        &store,
        &config,
        &CategoryInput {
            name: "Comida".to_string(),
            ..Default::default()
        },
    )
    .await?;
    app::add_transaction(
        &store,
        &config,
        &fixed_clock(date(2024, 3, 10)),
        &TransactionInput {
            amount: "10".to_string(),
            category: "Comida".to_string(),
            ..Default::default()
        },
    )
    .await?;

    let snapshot = feed.changed().await?;
    assert_eq!(snapshot.items().map(<[_]>::len), Some(1));

    drop(feed);
    assert_eq!(store.listener_count(), 0);
    Ok(())
}

#[tokio::test]
async fn unreadable_documents_are_skipped_and_kept_on_rewrite() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(dir.path());
    let clock = fixed_clock(date(2024, 3, 10));
    let user_dir = dir.path().join("users").join(USER);
    std::fs::create_dir_all(&user_dir)?;
    std::fs::write(
        user_dir.join("transactions.json"),
        r#"[
  {"id": "good", "userId": "user-1", "amount": 100, "category": "Comida", "date": "2024-03-05"},
  {"id": "euro", "userId": "user-1", "amount": 40, "currency": "EUR", "category": "Comida", "date": "2024-03-06"},
  {"id": "numeric-date", "userId": "user-1", "amount": 5, "category": "Comida", "date": 20240307}
]"#,
    )?;
    std::fs::write(
        user_dir.join("categories.json"),
        r##"[
  {"id": "c1", "userId": "user-1", "name": "Comida", "icon": "restaurant", "color": "#e0a038", "subcategories": []},
  {"id": "c2", "userId": "user-1", "name": 7}
]"##,
    )?;

    let store = store_at(&dir);
    let report = app::report(
        &store,
        &config,
        &clock,
        &ReportRequest {
            period: ReportPeriod::Monthly,
            anchor: Some(date(2024, 3, 10)),
            currency: None,
        },
    )
    .await?;
    assert_eq!(report.total_expenses, "100");
    assert_eq!(report.category_breakdown[0].color, "#e0a038");

    let categories = app::list_categories(&store, &config).await?;
    assert_eq!(categories.len(), 1);

    app::add_transaction(
        &store,
        &config,
        &clock,
        &TransactionInput {
            amount: "10".to_string(),
            category: "Comida".to_string(),
            ..Default::default()
        },
    )
    .await?;

    let raw: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(user_dir.join("transactions.json"))?)?;
    let ids: Vec<&str> = raw.iter().filter_map(|d| d["id"].as_str()).collect();
    assert_eq!(ids.len(), 4);
    assert!(ids.contains(&"euro"));
    assert!(ids.contains(&"numeric-date"));

    let list = app::list_transactions(&store, &config, &clock, &ListFilter::default()).await?;
    assert_eq!(list.count, 2);
    Ok(())
}

#[tokio::test]
async fn corrupt_file_is_an_error_not_an_empty_list() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(dir.path());
    let user_dir = dir.path().join("users").join(USER);
    std::fs::create_dir_all(&user_dir)?;
    std::fs::write(user_dir.join("categories.json"), "{ not json")?;

    let store = JsonFileStore::new(dir.path());
    assert!(app::list_categories(&store, &config).await.is_err());
    Ok(())
}

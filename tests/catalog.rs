mod support;

use anyhow::Result;
use expensebook::app::{self, CardEdit, CardInput, CategoryEdit, CategoryInput, ValidationError};
use expensebook::models::CardNetwork;
use expensebook::storage::Store;
use tempfile::TempDir;

use support::{date, memory_store, test_config, user};

fn validation_error(err: &anyhow::Error) -> Option<&ValidationError> {
    err.downcast_ref::<ValidationError>()
}

fn category_input(name: &str, subcategories: &[&str]) -> CategoryInput {
    CategoryInput {
        name: name.to_string(),
        subcategories: subcategories.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn category_names_are_unique_ignoring_case() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(dir.path());
    let store = memory_store(date(2024, 3, 10));

    let created = app::add_category(&store, &config, &category_input("Comida", &[])).await?;
    assert_eq!(created["category"]["icon"], "category");
    assert_eq!(created["category"]["color"], "#38e07b");

    let err = app::add_category(&store, &config, &category_input(" comida ", &[]))
        .await
        .unwrap_err();
    assert_eq!(
        validation_error(&err),
        Some(&ValidationError::DuplicateCategory("Comida".to_string()))
    );

    let err = app::add_category(&store, &config, &category_input("  ", &[]))
        .await
        .unwrap_err();
    assert_eq!(validation_error(&err), Some(&ValidationError::MissingCategory));
    Ok(())
}

#[tokio::test]
async fn renaming_a_category_to_its_own_name_is_allowed() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(dir.path());
    let store = memory_store(date(2024, 3, 10));
    let created = app::add_category(&store, &config, &category_input("Comida", &[])).await?;
    app::add_category(&store, &config, &category_input("Ocio", &[])).await?;
    let id = created["category"]["id"].as_str().unwrap().to_string();

    let edit = CategoryEdit {
        name: Some("COMIDA".to_string()),
        color: Some("#e0a038".to_string()),
        ..Default::default()
    };
    let updated = app::update_category(&store, &config, &id, &edit).await?;
    assert_eq!(updated["category"]["name"], "COMIDA");
    assert_eq!(updated["category"]["color"], "#e0a038");

    let clash = CategoryEdit {
        name: Some("ocio".to_string()),
        ..Default::default()
    };
    let err = app::update_category(&store, &config, &id, &clash)
        .await
        .unwrap_err();
    assert!(matches!(
        validation_error(&err),
        Some(ValidationError::DuplicateCategory(_))
    ));
    Ok(())
}

#[tokio::test]
async fn subcategories_are_edited_by_index() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(dir.path());
    let store = memory_store(date(2024, 3, 10));
    let created = app::add_category(
        &store,
        &config,
        &category_input("Comida", &["Super", " ", "Super", "Delivery"]),
    )
    .await?;
    let id = created["category"]["id"].as_str().unwrap().to_string();

    let stored = store.list_categories(&user()).await?;
    assert_eq!(stored[0].subcategories, vec!["Super", "Delivery"]);

    app::add_subcategory(&store, &config, &id, "Almacén").await?;
    app::rename_subcategory(&store, &config, &id, 0, "Supermercado").await?;
    let out = app::remove_subcategory(&store, &config, &id, 1).await?;

    // Output is sorted for display; storage keeps insertion order.
    assert_eq!(
        out["category"]["subcategories"],
        serde_json::json!(["Almacén", "Supermercado"])
    );
    let stored = store.list_categories(&user()).await?;
    assert_eq!(stored[0].subcategories, vec!["Supermercado", "Almacén"]);

    let err = app::add_subcategory(&store, &config, &id, "Almacén")
        .await
        .unwrap_err();
    assert_eq!(
        validation_error(&err),
        Some(&ValidationError::DuplicateSubcategory("Almacén".to_string()))
    );

    let err = app::rename_subcategory(&store, &config, &id, 5, "X")
        .await
        .unwrap_err();
    assert_eq!(
        validation_error(&err),
        Some(&ValidationError::SubcategoryIndex { index: 5, len: 2 })
    );

    let err = app::add_subcategory(&store, &config, &id, "   ")
        .await
        .unwrap_err();
    assert_eq!(validation_error(&err), Some(&ValidationError::MissingSubcategory));
    Ok(())
}

#[tokio::test]
async fn unknown_category_id_reports_not_found() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(dir.path());
    let store = memory_store(date(2024, 3, 10));

    let out = app::add_subcategory(&store, &config, "missing", "Super").await?;
    assert_eq!(out["success"], false);
    let out = app::delete_category(&store, &config, "missing").await?;
    assert_eq!(out["success"], false);
    Ok(())
}

#[tokio::test]
async fn cards_require_a_name_and_four_digits() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(dir.path());
    let store = memory_store(date(2024, 3, 10));

    let input = |name: &str, last4: &str| CardInput {
        name: name.to_string(),
        last4: last4.to_string(),
        network: CardNetwork::Visa,
        bg_image: None,
    };

    let err = app::add_card(&store, &config, &input("Galicia", "123"))
        .await
        .unwrap_err();
    assert_eq!(
        validation_error(&err),
        Some(&ValidationError::InvalidLast4("123".to_string()))
    );
    let err = app::add_card(&store, &config, &input(" ", "1234"))
        .await
        .unwrap_err();
    assert_eq!(validation_error(&err), Some(&ValidationError::MissingCardName));

    let created = app::add_card(&store, &config, &input("Galicia", "1234")).await?;
    assert_eq!(created["card"]["network"], "Visa");
    assert_eq!(created["card"]["bg_image"], "cards/visa.png");
    let id = created["card"]["id"].as_str().unwrap().to_string();

    let edit = CardEdit {
        network: Some(CardNetwork::AmericanExpress),
        last4: Some("9876".to_string()),
        ..Default::default()
    };
    let updated = app::update_card(&store, &config, &id, &edit).await?;
    assert_eq!(updated["card"]["network"], "American Express");
    assert_eq!(updated["card"]["bg_image"], "cards/amex.png");
    assert_eq!(updated["card"]["last4"], "9876");

    let bad = CardEdit {
        last4: Some("98a6".to_string()),
        ..Default::default()
    };
    assert!(app::update_card(&store, &config, &id, &bad).await.is_err());

    let deleted = app::delete_card(&store, &config, &id).await?;
    assert_eq!(deleted["success"], true);
    assert!(store.list_cards(&user()).await?.is_empty());
    Ok(())
}

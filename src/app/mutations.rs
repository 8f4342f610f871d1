use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::clock::Clock;
use crate::config::ResolvedConfig;
use crate::models::{
    is_valid_last4, parse_iso_date, CardNetwork, CardPayment, Category, CategoryPatch,
    CreditCard, CreditCardPatch, Currency, Id, NewCategory, NewCreditCard, NewTransaction,
    PaymentMethod, Transaction, TransactionKind, TransactionPatch, DEFAULT_CATEGORY_COLOR,
    DEFAULT_CATEGORY_ICON, DEFAULT_SUBCATEGORY, MAX_AMOUNT,
};
use crate::storage::{find_card, find_category_by_name, StoreError, Store};

use super::types::{CardOutput, CategoryOutput, TransactionOutput};

/// Input rejected before anything reaches the store.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Amount is required")]
    MissingAmount,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Amount {0} is larger than allowed")]
    AmountTooLarge(String),
    #[error("Invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("Category is required")]
    MissingCategory,
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error("Category already exists: {0}")]
    DuplicateCategory(String),
    #[error("Subcategory '{subcategory}' does not belong to {category}")]
    UnknownSubcategory {
        category: String,
        subcategory: String,
    },
    #[error("Subcategory name is required")]
    MissingSubcategory,
    #[error("Subcategory already exists: {0}")]
    DuplicateSubcategory(String),
    #[error("Subcategory index {index} out of range ({len} subcategories)")]
    SubcategoryIndex { index: usize, len: usize },
    #[error("Card name is required")]
    MissingCardName,
    #[error("Card digits must be exactly 4 numbers, got {0:?}")]
    InvalidLast4(String),
    #[error("Unknown card: {0}")]
    UnknownCard(String),
}

fn parse_positive_amount(raw: &str) -> Result<Decimal, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingAmount);
    }
    let amount = Decimal::from_str(trimmed)
        .map_err(|_| ValidationError::InvalidAmount(trimmed.to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }
    if amount > Decimal::from(MAX_AMOUNT) {
        return Err(ValidationError::AmountTooLarge(trimmed.to_string()));
    }
    Ok(amount)
}

fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    parse_iso_date(raw).ok_or_else(|| ValidationError::InvalidDate(raw.to_string()))
}

fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    raw.map(parse_date).transpose()
}

fn not_found(kind: &str, id: &str) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "error": format!("{kind} not found"),
        "id": id
    })
}

/// How a transaction was paid, as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PaymentInput {
    #[default]
    Cash,
    Card {
        /// Card id or name.
        card: String,
        /// Amount charged on the card. Defaults to the transaction amount.
        card_amount: Option<String>,
        /// Day the card charge is due. Defaults to the transaction date.
        payment_date: Option<String>,
    },
}

async fn resolve_payment(
    store: &dyn Store,
    user: &Id,
    input: &PaymentInput,
    amount: Decimal,
    date: NaiveDate,
) -> Result<PaymentMethod> {
    match input {
        PaymentInput::Cash => Ok(PaymentMethod::Cash),
        PaymentInput::Card {
            card,
            card_amount,
            payment_date,
        } => {
            let found = find_card(store, user, card.trim())
                .await?
                .ok_or_else(|| ValidationError::UnknownCard(card.trim().to_string()))?;
            let card_amount = match card_amount {
                Some(raw) => parse_positive_amount(raw)?,
                None => amount,
            };
            let payment_date = parse_optional_date(payment_date.as_deref())?.unwrap_or(date);
            Ok(PaymentMethod::Card(CardPayment {
                card_id: found.id,
                card_name: found.name,
                card_amount,
                payment_date,
            }))
        }
    }
}

/// Subcategory stored for `category`. Only the category's own entries are
/// accepted, plus the generic fallback.
fn resolve_subcategory(
    category: &Category,
    requested: Option<&str>,
) -> Result<String, ValidationError> {
    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(category
            .subcategories
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_SUBCATEGORY.to_string())),
        Some(sub) if sub == DEFAULT_SUBCATEGORY || category.has_subcategory(sub) => {
            Ok(sub.to_string())
        }
        Some(sub) => Err(ValidationError::UnknownSubcategory {
            category: category.name.clone(),
            subcategory: sub.to_string(),
        }),
    }
}

async fn require_category(store: &dyn Store, user: &Id, name: &str) -> Result<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingCategory.into());
    }
    let category = find_category_by_name(store, user, name)
        .await?
        .ok_or_else(|| ValidationError::UnknownCategory(name.to_string()))?;
    Ok(category)
}

async fn transaction_output(
    store: &dyn Store,
    config: &ResolvedConfig,
    id: &Id,
) -> Result<TransactionOutput> {
    let record = store
        .get_transaction(&config.user_id, id)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            kind: "Transaction",
            id: id.clone(),
        })?;
    let tx = Transaction::from_record(&record)?;
    Ok(TransactionOutput::new(&tx, config))
}

/// A new transaction as entered in the add form.
#[derive(Debug, Clone, Default)]
pub struct TransactionInput {
    pub amount: String,
    /// Defaults to the configured currency.
    pub currency: Option<Currency>,
    /// Category name.
    pub category: String,
    pub subcategory: Option<String>,
    /// `YYYY-MM-DD`. Defaults to today.
    pub date: Option<String>,
    pub kind: TransactionKind,
    pub payment: PaymentInput,
}

pub async fn add_transaction(
    store: &dyn Store,
    config: &ResolvedConfig,
    clock: &dyn Clock,
    input: &TransactionInput,
) -> Result<serde_json::Value> {
    let user = &config.user_id;
    let amount = parse_positive_amount(&input.amount)?;
    let category = require_category(store, user, &input.category).await?;
    let subcategory = resolve_subcategory(&category, input.subcategory.as_deref())?;
    let date = parse_optional_date(input.date.as_deref())?.unwrap_or_else(|| clock.today());
    let payment = resolve_payment(store, user, &input.payment, amount, date).await?;

    let draft = NewTransaction {
        amount,
        currency: input.currency.unwrap_or(config.default_currency),
        category: category.name.clone(),
        subcategory: Some(subcategory),
        icon: category.transaction_icon(),
        color: category.transaction_color(),
        date,
        kind: input.kind,
        payment,
    };
    let id = store
        .create_transaction(user, &draft)
        .await
        .context("Failed to save transaction")?;
    tracing::info!(id = %id, category = %draft.category, "Added transaction");

    Ok(serde_json::json!({
        "success": true,
        "transaction": transaction_output(store, config, &id).await?
    }))
}

/// Fields to change on an existing transaction. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct TransactionEdit {
    pub amount: Option<String>,
    pub currency: Option<Currency>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub date: Option<String>,
    pub payment: Option<PaymentInput>,
}

pub async fn update_transaction(
    store: &dyn Store,
    config: &ResolvedConfig,
    id_str: &str,
    edit: &TransactionEdit,
) -> Result<serde_json::Value> {
    let user = &config.user_id;
    let id = Id::from_string_checked(id_str)
        .with_context(|| format!("Invalid transaction id: {id_str}"))?;

    let Some(record) = store.get_transaction(user, &id).await? else {
        return Ok(not_found("Transaction", id_str));
    };
    let existing = Transaction::from_record(&record)?;

    let mut patch = TransactionPatch {
        amount: edit.amount.as_deref().map(parse_positive_amount).transpose()?,
        currency: edit.currency,
        date: parse_optional_date(edit.date.as_deref())?,
        ..Default::default()
    };

    match &edit.category {
        Some(name) => {
            // A new category brings its own style; the subcategory is
            // re-validated against it.
            let category = require_category(store, user, name).await?;
            patch.subcategory = Some(resolve_subcategory(
                &category,
                edit.subcategory.as_deref(),
            )?);
            patch.icon = Some(category.transaction_icon());
            patch.color = Some(category.transaction_color());
            patch.category = Some(category.name);
        }
        None => {
            if let Some(sub) = &edit.subcategory {
                patch.subcategory = Some(
                    match find_category_by_name(store, user, &existing.category).await? {
                        Some(category) => resolve_subcategory(&category, Some(sub))?,
                        None => sub.trim().to_string(),
                    },
                );
            }
        }
    }

    if let Some(payment) = &edit.payment {
        let amount = patch.amount.unwrap_or(existing.amount);
        let date = patch.date.unwrap_or(existing.date);
        patch.payment = Some(resolve_payment(store, user, payment, amount, date).await?);
    }

    store
        .update_transaction(user, &id, &patch)
        .await
        .context("Failed to update transaction")?;
    tracing::info!(id = %id, "Updated transaction");

    Ok(serde_json::json!({
        "success": true,
        "transaction": transaction_output(store, config, &id).await?
    }))
}

pub async fn delete_transaction(
    store: &dyn Store,
    config: &ResolvedConfig,
    id_str: &str,
) -> Result<serde_json::Value> {
    let id = Id::from_string_checked(id_str)
        .with_context(|| format!("Invalid transaction id: {id_str}"))?;
    if !store.delete_transaction(&config.user_id, &id).await? {
        return Ok(not_found("Transaction", id_str));
    }
    tracing::info!(id = %id, "Deleted transaction");
    Ok(serde_json::json!({ "success": true, "id": id_str }))
}

#[derive(Debug, Clone, Default)]
pub struct CategoryInput {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub subcategories: Vec<String>,
}

async fn ensure_unique_category_name(
    store: &dyn Store,
    user: &Id,
    name: &str,
    except: Option<&Id>,
) -> Result<()> {
    if let Some(existing) = find_category_by_name(store, user, name).await? {
        if except != Some(&existing.id) {
            return Err(ValidationError::DuplicateCategory(existing.name).into());
        }
    }
    Ok(())
}

async fn category_by_id(store: &dyn Store, user: &Id, id: &Id) -> Result<Option<Category>> {
    let categories = store.list_categories(user).await?;
    Ok(categories.into_iter().find(|c| &c.id == id))
}

fn category_json(category: &Category) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "category": CategoryOutput::from(category)
    })
}

pub async fn add_category(
    store: &dyn Store,
    config: &ResolvedConfig,
    input: &CategoryInput,
) -> Result<serde_json::Value> {
    let user = &config.user_id;
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingCategory.into());
    }
    ensure_unique_category_name(store, user, name, None).await?;

    let mut subcategories: Vec<String> = Vec::new();
    for sub in &input.subcategories {
        let sub = sub.trim();
        if sub.is_empty() || subcategories.iter().any(|s| s == sub) {
            continue;
        }
        subcategories.push(sub.to_string());
    }

    let draft = NewCategory {
        name: name.to_string(),
        icon: input
            .icon
            .clone()
            .unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
        color: input
            .color
            .clone()
            .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
        subcategories,
    };
    let id = store
        .create_category(user, &draft)
        .await
        .context("Failed to save category")?;
    tracing::info!(id = %id, name = %draft.name, "Added category");

    Ok(category_json(&Category::new(id, user.clone(), &draft)))
}

#[derive(Debug, Clone, Default)]
pub struct CategoryEdit {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

pub async fn update_category(
    store: &dyn Store,
    config: &ResolvedConfig,
    id_str: &str,
    edit: &CategoryEdit,
) -> Result<serde_json::Value> {
    let user = &config.user_id;
    let id = Id::from_string_checked(id_str)
        .with_context(|| format!("Invalid category id: {id_str}"))?;
    let Some(mut category) = category_by_id(store, user, &id).await? else {
        return Ok(not_found("Category", id_str));
    };

    let name = match edit.name.as_deref().map(str::trim) {
        Some("") => return Err(ValidationError::MissingCategory.into()),
        Some(name) => {
            ensure_unique_category_name(store, user, name, Some(&id)).await?;
            Some(name.to_string())
        }
        None => None,
    };

    let patch = CategoryPatch {
        name,
        icon: edit.icon.clone(),
        color: edit.color.clone(),
        subcategories: None,
    };
    store
        .update_category(user, &id, &patch)
        .await
        .context("Failed to update category")?;
    category.apply_patch(&patch);
    Ok(category_json(&category))
}

pub async fn delete_category(
    store: &dyn Store,
    config: &ResolvedConfig,
    id_str: &str,
) -> Result<serde_json::Value> {
    let id = Id::from_string_checked(id_str)
        .with_context(|| format!("Invalid category id: {id_str}"))?;
    if !store.delete_category(&config.user_id, &id).await? {
        return Ok(not_found("Category", id_str));
    }
    tracing::info!(id = %id, "Deleted category");
    Ok(serde_json::json!({ "success": true, "id": id_str }))
}

/// Load a category, let `edit` rewrite its subcategory list, and save it.
async fn edit_subcategories(
    store: &dyn Store,
    config: &ResolvedConfig,
    category_id: &str,
    edit: impl FnOnce(&mut Vec<String>) -> Result<(), ValidationError>,
) -> Result<serde_json::Value> {
    let user = &config.user_id;
    let id = Id::from_string_checked(category_id)
        .with_context(|| format!("Invalid category id: {category_id}"))?;
    let Some(mut category) = category_by_id(store, user, &id).await? else {
        return Ok(not_found("Category", category_id));
    };

    let mut subcategories = category.subcategories.clone();
    edit(&mut subcategories)?;

    let patch = CategoryPatch {
        subcategories: Some(subcategories),
        ..Default::default()
    };
    store
        .update_category(user, &id, &patch)
        .await
        .context("Failed to update subcategories")?;
    category.apply_patch(&patch);
    Ok(category_json(&category))
}

fn subcategory_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingSubcategory);
    }
    Ok(name.to_string())
}

fn check_index(index: usize, subcategories: &[String]) -> Result<(), ValidationError> {
    if index >= subcategories.len() {
        return Err(ValidationError::SubcategoryIndex {
            index,
            len: subcategories.len(),
        });
    }
    Ok(())
}

pub async fn add_subcategory(
    store: &dyn Store,
    config: &ResolvedConfig,
    category_id: &str,
    name: &str,
) -> Result<serde_json::Value> {
    let name = subcategory_name(name)?;
    edit_subcategories(store, config, category_id, |subs| {
        if subs.contains(&name) {
            return Err(ValidationError::DuplicateSubcategory(name));
        }
        subs.push(name);
        Ok(())
    })
    .await
}

pub async fn rename_subcategory(
    store: &dyn Store,
    config: &ResolvedConfig,
    category_id: &str,
    index: usize,
    name: &str,
) -> Result<serde_json::Value> {
    let name = subcategory_name(name)?;
    edit_subcategories(store, config, category_id, |subs| {
        check_index(index, subs)?;
        if subs
            .iter()
            .enumerate()
            .any(|(i, s)| i != index && *s == name)
        {
            return Err(ValidationError::DuplicateSubcategory(name));
        }
        subs[index] = name;
        Ok(())
    })
    .await
}

pub async fn remove_subcategory(
    store: &dyn Store,
    config: &ResolvedConfig,
    category_id: &str,
    index: usize,
) -> Result<serde_json::Value> {
    edit_subcategories(store, config, category_id, |subs| {
        check_index(index, subs)?;
        subs.remove(index);
        Ok(())
    })
    .await
}

#[derive(Debug, Clone)]
pub struct CardInput {
    pub name: String,
    pub last4: String,
    pub network: CardNetwork,
    pub bg_image: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CardEdit {
    pub name: Option<String>,
    pub last4: Option<String>,
    pub network: Option<CardNetwork>,
    pub bg_image: Option<String>,
}

fn card_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingCardName);
    }
    Ok(name.to_string())
}

fn card_last4(last4: &str) -> Result<String, ValidationError> {
    let last4 = last4.trim();
    if !is_valid_last4(last4) {
        return Err(ValidationError::InvalidLast4(last4.to_string()));
    }
    Ok(last4.to_string())
}

fn card_json(card: &CreditCard) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "card": CardOutput::from(card)
    })
}

pub async fn add_card(
    store: &dyn Store,
    config: &ResolvedConfig,
    input: &CardInput,
) -> Result<serde_json::Value> {
    let user = &config.user_id;
    let draft = NewCreditCard {
        name: card_name(&input.name)?,
        last4: card_last4(&input.last4)?,
        network: input.network,
        bg_image: input.bg_image.clone(),
    };
    let id = store
        .create_card(user, &draft)
        .await
        .context("Failed to save card")?;
    tracing::info!(id = %id, name = %draft.name, "Added card");
    Ok(card_json(&CreditCard::new(id, user.clone(), &draft)))
}

pub async fn update_card(
    store: &dyn Store,
    config: &ResolvedConfig,
    id_str: &str,
    edit: &CardEdit,
) -> Result<serde_json::Value> {
    let user = &config.user_id;
    let id =
        Id::from_string_checked(id_str).with_context(|| format!("Invalid card id: {id_str}"))?;
    let cards = store.list_cards(user).await?;
    let Some(mut card) = cards.into_iter().find(|c| c.id == id) else {
        return Ok(not_found("Card", id_str));
    };

    let patch = CreditCardPatch {
        name: edit.name.as_deref().map(card_name).transpose()?,
        last4: edit.last4.as_deref().map(card_last4).transpose()?,
        network: edit.network,
        bg_image: edit.bg_image.clone(),
    };
    store
        .update_card(user, &id, &patch)
        .await
        .context("Failed to update card")?;
    card.apply_patch(&patch);
    Ok(card_json(&card))
}

pub async fn delete_card(
    store: &dyn Store,
    config: &ResolvedConfig,
    id_str: &str,
) -> Result<serde_json::Value> {
    let id =
        Id::from_string_checked(id_str).with_context(|| format!("Invalid card id: {id_str}"))?;
    if !store.delete_card(&config.user_id, &id).await? {
        return Ok(not_found("Card", id_str));
    }
    tracing::info!(id = %id, "Deleted card");
    Ok(serde_json::json!({ "success": true, "id": id_str }))
}

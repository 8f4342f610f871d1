use anyhow::{Context, Result};

use crate::clock::Clock;
use crate::config::ResolvedConfig;
use crate::listing::{group_by_date, ListFilter, Paginator};
use crate::models::{normalize_records, sort_categories_for_display, Transaction};
use crate::storage::{Store, TransactionQuery};

use super::types::{CardOutput, CategoryOutput, DateGroupOutput, ListOutput};

fn grouped_output(
    transactions: &[Transaction],
    config: &ResolvedConfig,
    clock: &dyn Clock,
) -> Vec<DateGroupOutput> {
    group_by_date(transactions, clock.today(), config.display.locale)
        .iter()
        .map(|g| DateGroupOutput::new(g, config))
        .collect()
}

/// List every transaction of the configured user, newest date first, in
/// display groups.
pub async fn list_transactions(
    store: &dyn Store,
    config: &ResolvedConfig,
    clock: &dyn Clock,
    filter: &ListFilter,
) -> Result<ListOutput> {
    let records = store
        .query_transactions(&config.user_id, &TransactionQuery::default())
        .await
        .context("Failed to load transactions")?;
    let transactions = filter.apply(&normalize_records(&records));

    Ok(ListOutput {
        count: transactions.len(),
        groups: grouped_output(&transactions, config, clock),
        page: None,
        has_more: None,
    })
}

/// Fetch one page (1-based) of the transaction list.
///
/// Pages are walked from the start because cursors are not persisted
/// between invocations.
pub async fn list_page(
    store: &dyn Store,
    config: &ResolvedConfig,
    clock: &dyn Clock,
    page: usize,
) -> Result<ListOutput> {
    let page = page.max(1);
    let mut paginator = Paginator::new(config.user_id.clone(), config.listing.page_size);

    let mut result = paginator.fetch_next_page(store).await?;
    for _ in 1..page {
        if !result.has_more {
            result.transactions.clear();
            break;
        }
        result = paginator.fetch_next_page(store).await?;
    }

    Ok(ListOutput {
        count: result.transactions.len(),
        groups: grouped_output(&result.transactions, config, clock),
        page: Some(page),
        has_more: Some(result.has_more),
    })
}

pub async fn list_categories(
    store: &dyn Store,
    config: &ResolvedConfig,
) -> Result<Vec<CategoryOutput>> {
    let mut categories = store
        .list_categories(&config.user_id)
        .await
        .context("Failed to load categories")?;
    sort_categories_for_display(&mut categories);
    Ok(categories.iter().map(CategoryOutput::from).collect())
}

pub async fn list_cards(store: &dyn Store, config: &ResolvedConfig) -> Result<Vec<CardOutput>> {
    let mut cards = store
        .list_cards(&config.user_id)
        .await
        .context("Failed to load cards")?;
    cards.sort_by_key(|c| c.name.to_lowercase());
    Ok(cards.iter().map(CardOutput::from).collect())
}

use anyhow::{Context, Result};

use crate::cancel::CancelFlag;
use crate::config::ResolvedConfig;
use crate::models::{normalize_records, Id};
use crate::recommend::{recommend, DefaultSelection, Recommendation};
use crate::storage::{Store, TransactionQuery};

use super::types::RecommendationOutput;

/// Load the user's recent history and pick the category they use most.
///
/// Fails open: a store error yields an empty recommendation so the form
/// still opens. Returns `None` when `cancel` was set before the history
/// arrived; the caller has gone away and nothing should be applied.
pub async fn load_recommendation(
    store: &dyn Store,
    user: &Id,
    history_limit: usize,
    cancel: &CancelFlag,
) -> Option<Recommendation> {
    let result = store
        .query_transactions(user, &TransactionQuery::recent(history_limit))
        .await;

    if cancel.is_cancelled() {
        tracing::debug!(user = %user, "Dropping recommendation for closed form");
        return None;
    }

    match result {
        Ok(records) => Some(recommend(&normalize_records(&records))),
        Err(e) => {
            tracing::warn!(user = %user, error = %e, "Failed to load history for recommendation");
            Some(Recommendation::none())
        }
    }
}

/// Resolve what the add-expense form preselects for the configured user.
pub async fn recommend_defaults(
    store: &dyn Store,
    config: &ResolvedConfig,
) -> Result<RecommendationOutput> {
    let user = &config.user_id;
    let history_limit = config.recommendation.history_limit;
    let cancel = CancelFlag::new();

    let (categories, recommended) = tokio::join!(
        store.list_categories(user),
        load_recommendation(store, user, history_limit, &cancel),
    );
    let categories = categories.context("Failed to load categories")?;
    let recommended = recommended.unwrap_or_default();

    let mut selection = DefaultSelection::new();
    selection.on_categories_loaded(categories);
    selection.set_recommendation(recommended.clone());

    Ok(RecommendationOutput {
        recommended,
        selected_category: selection.selected_category().map(|c| c.name.clone()),
        selected_subcategory: selection.selected_subcategory().map(str::to_string),
        history_limit,
    })
}

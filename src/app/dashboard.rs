use anyhow::{Context, Result};

use crate::config::ResolvedConfig;
use crate::models::normalize_records;
use crate::report::dashboard_summary;
use crate::storage::{Snapshot, Store, Subscription, TransactionQuery};

use super::types::{
    amount_display, amount_string, DashboardOutput, DashboardSliceOutput, TransactionOutput,
};

/// Wait until a live query has delivered its first result set.
async fn first_snapshot<T: Clone>(subscription: &mut Subscription<T>) -> Result<Snapshot<T>> {
    let mut snapshot = subscription.current();
    while snapshot.is_pending() {
        snapshot = subscription.changed().await?;
    }
    Ok(snapshot)
}

/// Summarize the live feed the home screen shows: total spent, share per
/// category and the most recent items.
pub async fn dashboard(store: &dyn Store, config: &ResolvedConfig) -> Result<DashboardOutput> {
    let user = &config.user_id;

    let mut feed = store
        .subscribe_transactions(user, TransactionQuery::recent(config.dashboard.live_feed_limit))
        .await
        .context("Failed to subscribe to transactions")?;
    let mut categories = store
        .subscribe_categories(user)
        .await
        .context("Failed to subscribe to categories")?;

    let records = match first_snapshot(&mut feed).await? {
        Snapshot::Ready(records) => records,
        Snapshot::Failed(message) => anyhow::bail!("Transaction feed failed: {message}"),
        Snapshot::Pending => Vec::new(),
    };
    let categories_list = match first_snapshot(&mut categories).await? {
        Snapshot::Ready(categories) => categories,
        Snapshot::Failed(message) => {
            tracing::warn!(error = %message, "Category feed failed; using transaction colors");
            Vec::new()
        }
        Snapshot::Pending => Vec::new(),
    };

    feed.unsubscribe();
    categories.unsubscribe();

    let transactions = normalize_records(&records);
    let summary = dashboard_summary(&transactions, &categories_list);

    Ok(DashboardOutput {
        total_expenses: amount_string(summary.total_expenses, config),
        total_expenses_display: amount_display(summary.total_expenses, config),
        feed_size: transactions.len(),
        distribution: summary
            .distribution
            .iter()
            .map(|s| DashboardSliceOutput::new(s, config))
            .collect(),
        recent: summary
            .recent
            .iter()
            .map(|t| TransactionOutput::new(t, config))
            .collect(),
    })
}

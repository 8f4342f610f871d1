use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::clock::Clock;
use crate::config::ResolvedConfig;
use crate::models::{normalize_records, Currency};
use crate::report::{compute_report, ReportOptions, ReportPeriod};
use crate::storage::{Store, TransactionQuery};

use super::types::ReportOutput;

#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub period: ReportPeriod,
    /// Any day inside the wanted window. Defaults to today.
    pub anchor: Option<NaiveDate>,
    pub currency: Option<Currency>,
}

pub async fn report(
    store: &dyn Store,
    config: &ResolvedConfig,
    clock: &dyn Clock,
    request: &ReportRequest,
) -> Result<ReportOutput> {
    let user = &config.user_id;
    let anchor = request.anchor.unwrap_or_else(|| clock.today());
    let window = request.period.window(anchor);

    let records = store
        .query_transactions(user, &TransactionQuery::between(window.start, window.end))
        .await
        .context("Failed to load transactions for report")?;
    let transactions = normalize_records(&records);

    // Categories only style the breakdown.
    let categories = match store.list_categories(user).await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories; using transaction colors");
            Vec::new()
        }
    };

    let report = compute_report(
        &transactions,
        &categories,
        &ReportOptions {
            period: request.period,
            anchor,
            currency: request.currency,
            locale: config.display.locale,
        },
    );
    Ok(ReportOutput::new(&report, config))
}

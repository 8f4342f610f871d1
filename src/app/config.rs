use std::path::Path;

use crate::config::ResolvedConfig;

pub fn config_output(config_path: &Path, config: &ResolvedConfig) -> serde_json::Value {
    serde_json::json!({
        "config_file": config_path.display().to_string(),
        "data_directory": config.data_dir.display().to_string(),
        "user_id": config.user_id.to_string(),
        "default_currency": config.default_currency.to_string(),
        "timezone": config.timezone.label(),
        "display": {
            "locale": config.display.locale,
            "currency_decimals": config.display.currency_decimals,
            "currency_grouping": config.display.currency_grouping,
            "currency_symbol": config.display.currency_symbol
        },
        "recommendation": {
            "history_limit": config.recommendation.history_limit
        },
        "listing": {
            "page_size": config.listing.page_size
        },
        "dashboard": {
            "live_feed_limit": config.dashboard.live_feed_limit
        }
    })
}

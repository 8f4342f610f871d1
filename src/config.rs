use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::clock::TimeZoneSpec;
use crate::format::Locale;
use crate::listing::DEFAULT_PAGE_SIZE;
use crate::models::{Currency, Id};
use crate::recommend::DEFAULT_HISTORY_LIMIT;

/// User whose data the CLI reads when none is configured.
fn default_user_id() -> String {
    "default".to_string()
}

/// Display/output formatting configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Language of group labels, trend labels and long dates.
    pub locale: Locale,

    /// If set, amounts are rounded to this many decimal places before being
    /// rendered as strings. Purely presentational.
    pub currency_decimals: Option<u32>,

    /// When true, `*_display` fields use thousands separators.
    pub currency_grouping: bool,

    /// Optional currency symbol (e.g. "$") for `*_display` fields.
    pub currency_symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// How many of the most recently created transactions are considered.
    pub history_limit: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Size of the capped live feed the dashboard summarizes.
    pub live_feed_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            live_feed_limit: 50,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to data directory. If relative, resolved from config file location.
    /// If not specified, defaults to the config file's directory.
    pub data_dir: Option<PathBuf>,

    /// Owner of every record the CLI reads and writes.
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Currency of new transactions when none is given.
    pub default_currency: Currency,

    /// Zone "today" is read in: `local`, `utc`, or an IANA name.
    pub timezone: Option<String>,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub recommendation: RecommendationConfig,

    #[serde(default)]
    pub listing: ListingConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            user_id: default_user_id(),
            default_currency: Currency::default(),
            timezone: None,
            display: DisplayConfig::default(),
            recommendation: RecommendationConfig::default(),
            listing: ListingConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the data directory path.
    ///
    /// If `data_dir` is set and relative, it's resolved relative to `config_dir`.
    /// If `data_dir` is not set, returns `config_dir`.
    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }
}

/// Loaded configuration with resolved paths and validated values.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The resolved data directory path.
    pub data_dir: PathBuf,
    pub user_id: Id,
    pub default_currency: Currency,
    pub timezone: TimeZoneSpec,
    pub display: DisplayConfig,
    pub recommendation: RecommendationConfig,
    pub listing: ListingConfig,
    pub dashboard: DashboardConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./expensebook.toml` if it exists in current directory
/// 2. `~/.local/share/expensebook/expensebook.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("expensebook.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("expensebook").join("expensebook.toml");
    }

    local_config
}

impl ResolvedConfig {
    fn from_config(config: Config, config_dir: &Path) -> Result<Self> {
        let data_dir = config.resolve_data_dir(config_dir);
        let user_id = Id::from_string_checked(config.user_id.trim())
            .context("Invalid user_id in config")?;
        let timezone = TimeZoneSpec::parse(config.timezone.as_deref())?;

        Ok(Self {
            data_dir,
            user_id,
            default_currency: config.default_currency,
            timezone,
            display: config.display,
            recommendation: config.recommendation,
            listing: config.listing,
            dashboard: config.dashboard,
        })
    }

    /// Load and resolve config from a file path.
    ///
    /// The data directory is resolved relative to the config file's parent directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        let config = Config::load(&config_path)?;
        Self::from_config(config, config_dir)
    }

    /// Load config, falling back to defaults if the file doesn't exist.
    ///
    /// If the config file doesn't exist, uses the config file's intended
    /// parent directory as the data directory.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        let config_path = if config_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(config_path)
        } else {
            config_path.to_path_buf()
        };

        let config_dir = config_path
            .parent()
            .context("Config path has no parent directory")?;

        Self::from_config(Config::default(), config_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_data_dir_is_config_dir() {
        let config = Config::default();
        let config_dir = Path::new("/home/user/expenses");
        assert_eq!(
            config.resolve_data_dir(config_dir),
            PathBuf::from("/home/user/expenses")
        );
    }

    #[test]
    fn test_relative_data_dir() {
        let config = Config {
            data_dir: Some(PathBuf::from("data")),
            ..Default::default()
        };
        let config_dir = Path::new("/home/user/expenses");
        assert_eq!(
            config.resolve_data_dir(config_dir),
            PathBuf::from("/home/user/expenses/data")
        );
    }

    #[test]
    fn test_load_empty_config_uses_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("expensebook.toml");
        std::fs::File::create(&config_path)?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.data_dir, None);
        assert_eq!(config.user_id, "default");
        assert_eq!(config.default_currency, Currency::Ars);
        assert_eq!(config.recommendation.history_limit, 20);
        assert_eq!(config.listing.page_size, 20);
        assert_eq!(config.dashboard.live_feed_limit, 50);
        Ok(())
    }

    #[test]
    fn test_load_sections() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("expensebook.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "user_id = \"ana\"")?;
        writeln!(file, "default_currency = \"USD\"")?;
        writeln!(file, "timezone = \"America/Argentina/Buenos_Aires\"")?;
        writeln!(file, "[display]")?;
        writeln!(file, "locale = \"es\"")?;
        writeln!(file, "currency_symbol = \"$\"")?;
        writeln!(file, "[listing]")?;
        writeln!(file, "page_size = 5")?;

        let resolved = ResolvedConfig::load(&config_path)?;
        assert_eq!(resolved.user_id.as_str(), "ana");
        assert_eq!(resolved.default_currency, Currency::Usd);
        assert_eq!(resolved.timezone.label(), "America/Argentina/Buenos_Aires");
        assert_eq!(resolved.display.locale, Locale::Es);
        assert_eq!(resolved.display.currency_symbol.as_deref(), Some("$"));
        assert_eq!(resolved.listing.page_size, 5);
        assert_eq!(resolved.recommendation.history_limit, 20);
        Ok(())
    }

    #[test]
    fn test_invalid_timezone_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("expensebook.toml");
        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "timezone = \"Mars/Olympus\"")?;

        assert!(ResolvedConfig::load(&config_path).is_err());
        Ok(())
    }

    #[test]
    fn test_path_unsafe_user_id_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("expensebook.toml");
        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "user_id = \"../other\"")?;

        let err = ResolvedConfig::load(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid user_id"));
        Ok(())
    }

    #[test]
    fn test_resolved_config_load_or_default_missing_file() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("expensebook.toml");

        let resolved = ResolvedConfig::load_or_default(&config_path)?;
        assert_eq!(resolved.data_dir, dir.path());
        assert_eq!(resolved.timezone, TimeZoneSpec::Local);
        Ok(())
    }
}

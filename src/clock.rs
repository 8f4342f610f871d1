use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Which calendar "today" is read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimeZoneSpec {
    #[default]
    Local,
    Named(Tz),
}

impl TimeZoneSpec {
    /// Accepts `local`, `utc`, or an IANA zone name. Empty means local.
    pub fn parse(s: Option<&str>) -> Result<Self> {
        let Some(s) = s else {
            return Ok(TimeZoneSpec::Local);
        };
        let trimmed = s.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("local")
            || trimmed.eq_ignore_ascii_case("current")
        {
            return Ok(TimeZoneSpec::Local);
        }
        if trimmed.eq_ignore_ascii_case("utc") {
            return Ok(TimeZoneSpec::Named(chrono_tz::UTC));
        }
        let tz: Tz = trimmed.parse().map_err(|e| anyhow::anyhow!("{e}")).with_context(|| {
            format!(
                "Invalid timezone '{trimmed}' (expected IANA name, e.g. America/Argentina/Buenos_Aires)"
            )
        })?;
        Ok(TimeZoneSpec::Named(tz))
    }

    pub fn label(&self) -> String {
        match self {
            TimeZoneSpec::Local => "local".to_string(),
            TimeZoneSpec::Named(tz) => tz.name().to_string(),
        }
    }

    pub fn date_of(&self, ts: DateTime<Utc>) -> NaiveDate {
        match self {
            TimeZoneSpec::Local => ts.with_timezone(&chrono::Local).date_naive(),
            TimeZoneSpec::Named(tz) => ts.with_timezone(tz).date_naive(),
        }
    }
}

/// Abstraction over "current time" to make behavior deterministic in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// The current calendar date, used for Today/Yesterday grouping and as
    /// the default report anchor.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock {
    zone: TimeZoneSpec,
}

impl SystemClock {
    pub fn in_zone(zone: TimeZoneSpec) -> Self {
        Self { zone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        self.zone.date_of(self.now())
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

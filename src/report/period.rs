use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl ReportPeriod {
    pub fn label(&self) -> &'static str {
        match self {
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
            ReportPeriod::Yearly => "yearly",
        }
    }

    /// The closed day range of this period that contains `anchor`.
    pub fn window(&self, anchor: NaiveDate) -> ReportWindow {
        match self {
            ReportPeriod::Weekly => {
                let offset = anchor.weekday().num_days_from_sunday() as i64;
                let start = anchor - Duration::days(offset);
                ReportWindow {
                    start,
                    end: start + Duration::days(6),
                }
            }
            ReportPeriod::Monthly => ReportWindow {
                start: first_day_of_month(anchor.year(), anchor.month()),
                end: last_day_of_month(anchor.year(), anchor.month()),
            },
            ReportPeriod::Yearly => ReportWindow {
                start: first_day_of_month(anchor.year(), 1),
                end: last_day_of_month(anchor.year(), 12),
            },
        }
    }

    /// Fixed day count the daily average divides by. Deliberately not the
    /// window length: February still divides by 30.
    pub fn average_divisor(&self) -> Decimal {
        match self {
            ReportPeriod::Weekly => Decimal::from(7),
            ReportPeriod::Monthly => Decimal::from(30),
            ReportPeriod::Yearly => Decimal::from(365),
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReportPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weekly" | "week" | "semanal" => Ok(ReportPeriod::Weekly),
            "monthly" | "month" | "mensual" => Ok(ReportPeriod::Monthly),
            "yearly" | "year" | "anual" => Ok(ReportPeriod::Yearly),
            _ => anyhow::bail!("Invalid period: {s}. Use: weekly, monthly, yearly"),
        }
    }
}

/// Closed range of calendar days, `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

pub(crate) fn first_day_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("valid date")
}

pub(crate) fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    first_day_of_month(next_year, next_month) - Duration::days(1)
}

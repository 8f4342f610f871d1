use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Format an amount for the JSON outputs.
///
/// - When `currency_decimals` is set, the value is rounded (half away from zero)
///   to that many decimal places before formatting.
/// - Trailing zeros are stripped (`Decimal::normalize()`).
pub fn format_amount(value: Decimal, currency_decimals: Option<u32>) -> String {
    let rounded = match currency_decimals {
        Some(dp) => value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        None => value,
    };
    rounded.normalize().to_string()
}

fn group_int_digits(int_part: &str) -> String {
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let remaining = len.saturating_sub(i + 1);
        if remaining > 0 && remaining % 3 == 0 {
            out.push(',');
        }
    }
    out
}

/// Format an amount for people: always two decimals, optional thousands
/// separators and symbol prefix, e.g. `-$1,234.50`.
pub fn format_amount_display(value: Decimal, grouping: bool, symbol: Option<&str>) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let s = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = s.split_once('.').unwrap_or((&s, "00"));
    let int_part = if grouping {
        group_int_digits(int_part)
    } else {
        int_part.to_string()
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if let Some(sym) = symbol {
        out.push_str(sym);
    }
    out.push_str(&int_part);
    out.push('.');
    out.push_str(frac_part);
    out
}

/// Language used for the human-readable labels the engines produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "es" | "spanish" | "español" => Ok(Locale::Es),
            _ => anyhow::bail!("Invalid locale: {s}. Use: en, es"),
        }
    }
}

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
const MONTHS_ES: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
    "octubre", "noviembre", "diciembre",
];
const MONTHS_SHORT_EN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MONTHS_SHORT_ES: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];

impl Locale {
    pub fn today(&self) -> &'static str {
        match self {
            Locale::En => "Today",
            Locale::Es => "Hoy",
        }
    }

    pub fn yesterday(&self) -> &'static str {
        match self {
            Locale::En => "Yesterday",
            Locale::Es => "Ayer",
        }
    }

    pub fn week_label(&self, n: usize) -> String {
        match self {
            Locale::En => format!("Week {n}"),
            Locale::Es => format!("Sem {n}"),
        }
    }

    pub fn other_category(&self) -> &'static str {
        match self {
            Locale::En => "Other",
            Locale::Es => "Otros",
        }
    }

    pub fn weekday_short(&self, day: Weekday) -> &'static str {
        match (self, day) {
            (Locale::En, Weekday::Sun) => "Sun",
            (Locale::En, Weekday::Mon) => "Mon",
            (Locale::En, Weekday::Tue) => "Tue",
            (Locale::En, Weekday::Wed) => "Wed",
            (Locale::En, Weekday::Thu) => "Thu",
            (Locale::En, Weekday::Fri) => "Fri",
            (Locale::En, Weekday::Sat) => "Sat",
            (Locale::Es, Weekday::Sun) => "dom",
            (Locale::Es, Weekday::Mon) => "lun",
            (Locale::Es, Weekday::Tue) => "mar",
            (Locale::Es, Weekday::Wed) => "mié",
            (Locale::Es, Weekday::Thu) => "jue",
            (Locale::Es, Weekday::Fri) => "vie",
            (Locale::Es, Weekday::Sat) => "sáb",
        }
    }

    /// `month` is 1-based.
    pub fn month_short(&self, month: u32) -> &'static str {
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            Locale::En => MONTHS_SHORT_EN[idx],
            Locale::Es => MONTHS_SHORT_ES[idx],
        }
    }

    /// "October 24, 2023" / "24 de octubre de 2023".
    pub fn long_date(&self, date: NaiveDate) -> String {
        let idx = date.month0() as usize;
        match self {
            Locale::En => format!("{} {}, {}", MONTHS_EN[idx], date.day(), date.year()),
            Locale::Es => format!("{} de {} de {}", date.day(), MONTHS_ES[idx], date.year()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_amount_strips_trailing_zeros() {
        let d = Decimal::from_str("1234.500").unwrap();
        assert_eq!(format_amount(d, None), "1234.5");
        assert_eq!(format_amount(Decimal::from_str("2.345").unwrap(), Some(2)), "2.35");
    }

    #[test]
    fn format_amount_display_groups_and_symbols() {
        let d = Decimal::from_str("1234567.5").unwrap();
        assert_eq!(format_amount_display(d, true, Some("$")), "$1,234,567.50");
        assert_eq!(format_amount_display(d, false, None), "1234567.50");
    }

    #[test]
    fn format_amount_display_negative_sign_precedes_symbol() {
        let d = Decimal::from_str("-1234.5").unwrap();
        assert_eq!(format_amount_display(d, true, Some("$")), "-$1,234.50");
    }

    #[test]
    fn long_dates_follow_locale() {
        let date = NaiveDate::from_ymd_opt(2023, 10, 24).unwrap();
        assert_eq!(Locale::En.long_date(date), "October 24, 2023");
        assert_eq!(Locale::Es.long_date(date), "24 de octubre de 2023");
    }
}

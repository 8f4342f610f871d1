use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Id;

/// Label shown for transactions saved without a subcategory.
pub const DEFAULT_SUBCATEGORY: &str = "General";

/// Largest amount, in whole currency units, a single transaction may carry.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    #[default]
    Ars,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Ars => "ARS",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "ARS" => Ok(Currency::Ars),
            _ => anyhow::bail!("Invalid currency: {s}. Use: USD, ARS"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    #[default]
    Expense,
    Income,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Cash,
    Card,
}

/// Card details attached to a card-paid transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardPayment {
    pub card_id: Id,
    pub card_name: String,
    pub card_amount: Decimal,
    pub payment_date: NaiveDate,
}

/// How a transaction was paid. The card fields only exist together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card(CardPayment),
}

/// A transaction document as it sits in the store.
///
/// Older documents may lack `type`, and hand-edited ones may carry a
/// non-numeric `amount`; both are tolerated here and resolved once by
/// [`Transaction::from_record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: Id,
    pub user_id: Id,
    #[serde(default)]
    pub amount: serde_json::Value,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    /// Expense date, `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    /// Assigned by the store when the document is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
}

/// Fields supplied by the caller when creating a transaction. The store
/// fills in `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub currency: Currency,
    pub category: String,
    pub subcategory: Option<String>,
    pub icon: String,
    pub color: String,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub payment: PaymentMethod,
}

/// Partial update of a stored transaction. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub date: Option<NaiveDate>,
    pub payment: Option<PaymentMethod>,
}

impl TransactionRecord {
    pub fn new(id: Id, user_id: Id, timestamp: DateTime<Utc>, draft: &NewTransaction) -> Self {
        let mut record = Self {
            id,
            user_id,
            amount: amount_value(draft.amount),
            currency: Some(draft.currency),
            category: draft.category.clone(),
            subcategory: draft.subcategory.clone(),
            icon: draft.icon.clone(),
            color: draft.color.clone(),
            date: format_iso_date(draft.date),
            timestamp: Some(timestamp),
            kind: Some(draft.kind),
            payment_method: None,
            card_id: None,
            card_name: None,
            card_amount: None,
            payment_date: None,
        };
        record.set_payment(&draft.payment);
        record
    }

    /// Replace the payment fields. Switching to cash clears every card field.
    pub fn set_payment(&mut self, payment: &PaymentMethod) {
        match payment {
            PaymentMethod::Cash => {
                self.payment_method = Some(PaymentKind::Cash);
                self.card_id = None;
                self.card_name = None;
                self.card_amount = None;
                self.payment_date = None;
            }
            PaymentMethod::Card(card) => {
                self.payment_method = Some(PaymentKind::Card);
                self.card_id = Some(card.card_id.clone());
                self.card_name = Some(card.card_name.clone());
                self.card_amount = Some(card.card_amount);
                self.payment_date = Some(format_iso_date(card.payment_date));
            }
        }
    }

    pub fn apply_patch(&mut self, patch: &TransactionPatch) {
        if let Some(amount) = patch.amount {
            self.amount = amount_value(amount);
        }
        if let Some(currency) = patch.currency {
            self.currency = Some(currency);
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(subcategory) = &patch.subcategory {
            self.subcategory = Some(subcategory.clone());
        }
        if let Some(icon) = &patch.icon {
            self.icon = icon.clone();
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(date) = patch.date {
            self.date = format_iso_date(date);
        }
        if let Some(payment) = &patch.payment {
            self.set_payment(payment);
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("Transaction {id} has an invalid date {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { id: Id, value: String },
}

/// A transaction after normalization. This is what every engine consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: Id,
    pub user_id: Id,
    pub amount: Decimal,
    pub currency: Currency,
    pub category: String,
    pub subcategory: Option<String>,
    pub icon: String,
    pub color: String,
    pub date: NaiveDate,
    pub timestamp: Option<DateTime<Utc>>,
    pub kind: TransactionKind,
    pub payment: PaymentMethod,
}

impl Transaction {
    /// Normalize a stored document.
    ///
    /// - a missing `type` means expense
    /// - an amount that is not a non-negative number up to [`MAX_AMOUNT`]
    ///   becomes zero
    /// - a missing or malformed date is an error; callers skip the record
    pub fn from_record(record: &TransactionRecord) -> Result<Self, RecordError> {
        let date = parse_iso_date(&record.date).ok_or_else(|| RecordError::InvalidDate {
            id: record.id.clone(),
            value: record.date.clone(),
        })?;

        let amount = parse_amount(&record.amount).unwrap_or_else(|| {
            tracing::warn!(
                transaction = %record.id,
                amount = %record.amount,
                "Unusable transaction amount, counting it as zero"
            );
            Decimal::ZERO
        });

        let payment = match (record.payment_method, &record.card_id) {
            (Some(PaymentKind::Card), Some(card_id)) => PaymentMethod::Card(CardPayment {
                card_id: card_id.clone(),
                card_name: record.card_name.clone().unwrap_or_default(),
                card_amount: record.card_amount.unwrap_or(amount),
                payment_date: record
                    .payment_date
                    .as_deref()
                    .and_then(parse_iso_date)
                    .unwrap_or(date),
            }),
            _ => PaymentMethod::Cash,
        };

        Ok(Self {
            id: record.id.clone(),
            user_id: record.user_id.clone(),
            amount,
            currency: record.currency.unwrap_or_default(),
            category: record.category.clone(),
            subcategory: record
                .subcategory
                .as_ref()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            icon: record.icon.clone(),
            color: record.color.clone(),
            date,
            timestamp: record.timestamp,
            kind: record.kind.unwrap_or_default(),
            payment,
        })
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    pub fn subcategory_label(&self) -> &str {
        self.subcategory.as_deref().unwrap_or(DEFAULT_SUBCATEGORY)
    }
}

/// Normalize a batch of stored documents, dropping the ones that cannot be
/// placed on a calendar.
pub fn normalize_records<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
) -> Vec<Transaction> {
    records
        .into_iter()
        .filter_map(|record| match Transaction::from_record(record) {
            Ok(tx) => Some(tx),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping transaction record");
                None
            }
        })
        .collect()
}

/// Parse `YYYY-MM-DD` component by component into a calendar date.
///
/// Only the zero-padded form is accepted. Stores filter and order on the raw
/// string, so anything else would sort away from the date it names.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    let year: i32 = value[0..4].parse().ok()?;
    let month: u32 = value[5..7].parse().ok()?;
    let day: u32 = value[8..10].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Interpret a stored amount. Accepts JSON numbers and numeric strings
/// between zero and [`MAX_AMOUNT`].
pub fn parse_amount(value: &serde_json::Value) -> Option<Decimal> {
    let parsed = match value {
        serde_json::Value::Number(n) => {
            let s = n.to_string();
            Decimal::from_str(&s)
                .or_else(|_| Decimal::from_scientific(&s))
                .ok()
        }
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }?;
    if parsed.is_sign_negative() && !parsed.is_zero() {
        return None;
    }
    if parsed > Decimal::from(MAX_AMOUNT) {
        return None;
    }
    Some(parsed)
}

fn amount_value(amount: Decimal) -> serde_json::Value {
    serde_json::Value::String(amount.normalize().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(value: serde_json::Value) -> TransactionRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_type_is_treated_as_expense() {
        let rec = record(json!({
            "id": "tx-1",
            "userId": "user-1",
            "amount": 450.5,
            "category": "Comida",
            "date": "2023-10-24"
        }));
        let tx = Transaction::from_record(&rec).unwrap();
        assert_eq!(tx.kind, TransactionKind::Expense);
        assert_eq!(tx.amount, Decimal::from_str("450.5").unwrap());
        assert_eq!(tx.subcategory_label(), "General");
        assert_eq!(tx.currency, Currency::Ars);
    }

    #[test]
    fn malformed_amount_is_coerced_to_zero() {
        let rec = record(json!({
            "id": "tx-1",
            "userId": "user-1",
            "amount": "twelve",
            "date": "2023-10-24",
            "type": "expense"
        }));
        let tx = Transaction::from_record(&rec).unwrap();
        assert_eq!(tx.amount, Decimal::ZERO);
    }

    #[test]
    fn negative_amount_is_coerced_to_zero() {
        assert_eq!(parse_amount(&json!(-3)), None);
        assert_eq!(parse_amount(&json!("12.50")), Some(Decimal::new(1250, 2)));
    }

    #[test]
    fn oversized_amount_is_coerced_to_zero() {
        assert_eq!(parse_amount(&json!("79228162514264337593543950335")), None);
        assert_eq!(parse_amount(&json!(1e20)), None);
        assert_eq!(
            parse_amount(&json!("1000000000000000")),
            Some(Decimal::from(MAX_AMOUNT))
        );
        let rec = record(json!({
            "id": "tx-1",
            "userId": "u",
            "amount": "79228162514264337593543950335",
            "date": "2024-03-01"
        }));
        assert_eq!(Transaction::from_record(&rec).unwrap().amount, Decimal::ZERO);
    }

    #[test]
    fn invalid_date_is_rejected_and_skipped() {
        let bad = record(json!({"id": "tx-1", "userId": "u", "amount": 1, "date": "24/10/2023"}));
        let good = record(json!({"id": "tx-2", "userId": "u", "amount": 1, "date": "2023-10-24"}));
        assert!(matches!(
            Transaction::from_record(&bad),
            Err(RecordError::InvalidDate { .. })
        ));
        let normalized = normalize_records([&bad, &good]);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].id.as_str(), "tx-2");
    }

    #[test]
    fn parse_iso_date_reads_components() {
        assert_eq!(
            parse_iso_date("2024-02-29"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(parse_iso_date("2023-02-29"), None);
        assert_eq!(parse_iso_date("2024-02"), None);
        assert_eq!(parse_iso_date("2024-02-01-03"), None);
    }

    #[test]
    fn unpadded_dates_are_rejected() {
        assert_eq!(parse_iso_date("2024-3-5"), None);
        assert_eq!(parse_iso_date("2024-03-5"), None);
        assert_eq!(parse_iso_date(" 2024-03-05"), None);
        assert_eq!(parse_iso_date("+024-03-05"), None);
        assert_eq!(
            parse_iso_date("2024-03-05"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
    }

    #[test]
    fn card_fields_fall_back_to_transaction_values() {
        let rec = record(json!({
            "id": "tx-1",
            "userId": "u",
            "amount": 100,
            "date": "2024-03-01",
            "paymentMethod": "card",
            "cardId": "card-1",
            "cardName": "Banco Principal"
        }));
        let tx = Transaction::from_record(&rec).unwrap();
        let PaymentMethod::Card(card) = tx.payment else {
            panic!("expected card payment");
        };
        assert_eq!(card.card_amount, Decimal::from(100));
        assert_eq!(card.payment_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn switching_to_cash_clears_all_card_fields() {
        let draft = NewTransaction {
            amount: Decimal::from(20),
            currency: Currency::Usd,
            category: "Ocio".to_string(),
            subcategory: Some("Cine".to_string()),
            icon: "celebration".to_string(),
            color: "#e0a038".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            kind: TransactionKind::Expense,
            payment: PaymentMethod::Card(CardPayment {
                card_id: Id::from_string("card-1"),
                card_name: "Viajes".to_string(),
                card_amount: Decimal::from(20),
                payment_date: NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(),
            }),
        };
        let mut rec = TransactionRecord::new(
            Id::from_string("tx-1"),
            Id::from_string("u"),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            &draft,
        );
        assert_eq!(rec.payment_method, Some(PaymentKind::Card));

        rec.apply_patch(&TransactionPatch {
            payment: Some(PaymentMethod::Cash),
            ..Default::default()
        });
        assert_eq!(rec.payment_method, Some(PaymentKind::Cash));
        assert!(rec.card_id.is_none());
        assert!(rec.card_name.is_none());
        assert!(rec.card_amount.is_none());
        assert!(rec.payment_date.is_none());
    }

    #[test]
    fn stored_amount_round_trips_through_normalization() {
        let draft = NewTransaction {
            amount: Decimal::new(1550, 2),
            currency: Currency::Usd,
            category: "Comida".to_string(),
            subcategory: None,
            icon: "restaurant".to_string(),
            color: "#38e07b".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 10, 24).unwrap(),
            kind: TransactionKind::Expense,
            payment: PaymentMethod::Cash,
        };
        let rec = TransactionRecord::new(
            Id::from_string("tx-1"),
            Id::from_string("u"),
            Utc.with_ymd_and_hms(2023, 10, 24, 9, 0, 0).unwrap(),
            &draft,
        );
        let tx = Transaction::from_record(&rec).unwrap();
        assert_eq!(tx.amount, Decimal::new(1550, 2));
        assert_eq!(tx.date, draft.date);
    }
}

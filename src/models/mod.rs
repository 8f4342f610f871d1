mod card;
mod category;
mod id;
mod id_generator;
mod transaction;

pub use card::{is_valid_last4, CardNetwork, CreditCard, CreditCardPatch, NewCreditCard};
pub use category::{
    sort_categories_for_display, Category, CategoryPatch, NewCategory, DEFAULT_CATEGORY_COLOR,
    DEFAULT_CATEGORY_ICON,
};
pub use id::{Id, IdError};
pub use id_generator::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use transaction::{
    format_iso_date, normalize_records, parse_amount, parse_iso_date, CardPayment, Currency,
    NewTransaction, PaymentKind, PaymentMethod, RecordError, Transaction, TransactionKind,
    TransactionPatch, TransactionRecord, DEFAULT_SUBCATEGORY, MAX_AMOUNT,
};

mod config;
mod dashboard;
mod list;
mod mutations;
mod recommend;
mod report;
mod types;

pub use config::config_output;
pub use dashboard::dashboard;
pub use list::{list_cards, list_categories, list_page, list_transactions};
pub use mutations::{
    add_card, add_category, add_subcategory, add_transaction, delete_card, delete_category,
    delete_transaction, remove_subcategory, rename_subcategory, update_card, update_category,
    update_transaction, CardEdit, CardInput, CategoryEdit, CategoryInput, PaymentInput,
    TransactionEdit, TransactionInput, ValidationError,
};
pub use recommend::{load_recommendation, recommend_defaults};
pub use report::{report, ReportRequest};
pub use types::{
    BreakdownOutput, CardOutput, CardPaymentOutput, CategoryOutput, DashboardOutput,
    DashboardSliceOutput, DateGroupOutput, ListOutput, RecommendationOutput, ReportOutput,
    TransactionOutput, TrendOutput,
};

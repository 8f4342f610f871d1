//! Display grouping, list filters and cursor pagination for the
//! transaction list.

mod filter;
mod grouping;
mod paginator;

pub use filter::{distinct_categories, subcategories_for, ListFilter};
pub use grouping::{group_by_date, DateGroup, GroupKind};
pub use paginator::{PageResult, Paginator, DEFAULT_PAGE_SIZE};

//! Dashboard module
//!
//! Provides the page where users record transactions and see how their
//! spending and savings compare to the budget.

mod aggregation;
mod charts;
mod handlers;
mod summary;
mod tables;

pub use handlers::get_dashboard_page;
pub use summary::{Summary, summarize};

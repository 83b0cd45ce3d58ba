//! The account page, where users see their email and manage their phone number.

mod page;
mod phone_endpoint;

pub use page::get_account_page;
pub use phone_endpoint::update_phone_endpoint;

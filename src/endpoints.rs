//! The API endpoints URIs.

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for viewing the user's account details.
pub const ACCOUNT_VIEW: &str = "/account";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to set or clear the phone number of the current user.
pub const ACCOUNT_PHONE: &str = "/api/account/phone";
/// The route to record an expense.
pub const EXPENSES_API: &str = "/api/expenses";
/// The route to record a savings deposit or withdrawal.
pub const SAVINGS_API: &str = "/api/savings";

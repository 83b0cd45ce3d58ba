//! User accounts, passwords and cookie based sessions.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register;
mod token;
mod user;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::{get_register_page, register_user};
use token::Token;
pub use user::{
    Email, PhoneNumber, User, UserID, authenticate, count_users, create_user_table,
    find_log_in_user, get_user_by_email, get_user_by_id, get_user_by_phone, register,
    set_user_phone, update_password, verify_log_in,
};

#[cfg(test)]
pub use cookie::{COOKIE_TOKEN, set_auth_cookie};

#[cfg(test)]
pub use middleware::AuthState;

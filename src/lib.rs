//! Salvadanaio is a web app for keeping track of household expenses and savings.
//!
//! Users record expenses and savings movements, and the dashboard shows how
//! much of the monthly expense ceiling has been spent and how close the
//! savings are to the goal.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use rust_decimal::Decimal;
use time::Date;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod auth;
mod config;
mod dashboard;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    Email, PasswordHash, PhoneNumber, User, UserID, ValidatedPassword, authenticate, count_users,
    find_log_in_user, get_user_by_email, get_user_by_id, get_user_by_phone, register,
    set_user_phone, update_password, verify_log_in,
};
pub use config::BudgetConfig;
pub use dashboard::{Summary, summarize};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;
pub use timezone::get_local_date;
pub use transaction::{
    AMOUNT_LIMIT, NewTransaction, StoredAmount, Transaction, TransactionId, TransactionKind,
    append_transaction, count_transactions, get_transaction, get_transactions_for_user,
    is_amount_in_range, parse_amount,
};

use crate::{
    alert::Alert,
    internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email address is already registered to another user.
    ///
    /// The client should log in instead, or register with a different email.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The phone number is already associated with another user.
    #[error("the phone number is already in use")]
    DuplicatePhone,

    /// The email and password combination did not match a registered user.
    ///
    /// This error is deliberately the same whether the email is unknown or
    /// the password is wrong.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The string is not a valid email address.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// The string is not a valid phone number.
    #[error("{0} is not a valid phone number")]
    InvalidPhone(String),

    /// The string could not be parsed as a monetary amount.
    #[error("{0} is not a valid amount")]
    InvalidAmount(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The user ID used to create a transaction did not match a registered user.
    #[error("the user ID {0} does not refer to a registered user")]
    InvalidUser(UserID),

    /// An expense was recorded with a negative amount.
    ///
    /// Expenses are always positive quantities, only savings use the sign to
    /// tell deposits and withdrawals apart.
    #[error("expenses cannot be negative, got {0}")]
    NegativeExpense(Decimal),

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The database could not complete the request.
    ///
    /// The request is not retried, the client should try again later.
    #[error("the database is unavailable: {0}")]
    StorageUnavailable(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The body of a request or response could not be read.
    #[error("could not read body: {0}")]
    BodyReadError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),
}

/// SQLite extended error code for a failed UNIQUE constraint.
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.phone") =>
            {
                Error::DuplicatePhone
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::StorageUnavailable(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::StorageUnavailable(_) | Error::DatabaseLockError => InternalServerError {
                description: "Database Unavailable",
                fix: "The database could not be reached. Please try again in a moment.",
            }
            .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub(crate) fn into_alert_response(self) -> Response {
        let (status_code, message, details) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid Timezone Settings",
                format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            ),
            Error::FutureDate(date) => (
                StatusCode::BAD_REQUEST,
                "Invalid transaction date",
                format!("{date} is a date in the future, which is not allowed."),
            ),
            Error::NegativeExpense(amount) => (
                StatusCode::BAD_REQUEST,
                "Invalid expense amount",
                format!("Expenses must be positive, got {amount}."),
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                "Invalid amount",
                format!(
                    "\"{amount}\" is not a valid amount. Enter an amount below 100.000.000, \
                    such as 12,50."
                ),
            ),
            Error::InvalidPhone(phone) => (
                StatusCode::BAD_REQUEST,
                "Invalid phone number",
                format!("\"{phone}\" is not a phone number. Enter 6 to 15 digits, e.g. +39 333 1234567."),
            ),
            Error::DuplicatePhone => (
                StatusCode::BAD_REQUEST,
                "Phone number already in use",
                "Another account is already using this phone number.".to_owned(),
            ),
            Error::InvalidUser(_) | Error::NotFound => (
                StatusCode::BAD_REQUEST,
                "Unknown user",
                "Your account could not be found. Try logging out and in again.".to_owned(),
            ),
            Error::StorageUnavailable(_) | Error::DatabaseLockError => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database unavailable",
                "Your changes could not be saved. Please try again in a moment.".to_owned(),
            ),
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                )
            }
        };

        let alert = Alert::Error {
            message: message.to_owned(),
            details,
        };

        (status_code, alert.into_html()).into_response()
    }
}

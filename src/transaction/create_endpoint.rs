//! Defines the endpoints for recording expenses and savings movements.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    timezone::get_local_date,
    transaction::{NewTransaction, TransactionKind, append_transaction, is_amount_in_range},
};

/// The state needed to record a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Rome".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for recording an expense.
#[derive(Debug, Deserialize)]
pub struct ExpenseForm {
    /// The date when the money was spent.
    pub date: Date,
    /// The amount as typed by the user, e.g. "1.200,50".
    pub amount: String,
    /// An optional label such as "Groceries".
    pub category: Option<String>,
}

/// Whether money goes into or comes out of savings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingDirection {
    /// Money put into savings.
    Deposit,
    /// Money taken out of savings.
    Withdrawal,
}

impl SavingDirection {
    fn category(self) -> &'static str {
        match self {
            SavingDirection::Deposit => "Deposit",
            SavingDirection::Withdrawal => "Withdrawal",
        }
    }
}

/// The form data for depositing into or withdrawing from savings.
#[derive(Debug, Deserialize)]
pub struct SavingForm {
    /// The date of the movement.
    pub date: Date,
    /// Deposit or withdrawal.
    pub direction: SavingDirection,
    /// The amount as typed by the user. Always positive, the direction gives the sign.
    pub amount: String,
}

/// Parse an amount typed into a form.
///
/// Accepts both "1200.50" and the Italian "1.200,50". When the text contains a
/// comma, dots are treated as thousands separators and the comma as the
/// decimal separator. A euro sign and whitespace are ignored.
///
/// # Errors
/// Returns [Error::InvalidAmount] if the text is not a number or is too large
/// to record, see [crate::transaction::AMOUNT_LIMIT].
pub fn parse_amount(raw_amount: &str) -> Result<Decimal, Error> {
    let cleaned: String = raw_amount
        .chars()
        .filter(|c| *c != '€' && !c.is_whitespace())
        .collect();

    let normalised = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    Decimal::from_str(&normalised)
        .ok()
        .filter(|amount| is_amount_in_range(*amount))
        .ok_or_else(|| Error::InvalidAmount(raw_amount.to_owned()))
}

/// Parse the amount and date shared by both forms, rejecting zero, negative
/// and future-dated entries.
fn validate_entry(raw_amount: &str, date: Date, local_timezone: &str) -> Result<Decimal, Error> {
    let amount = parse_amount(raw_amount)?;

    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(raw_amount.to_owned()));
    }

    let today = get_local_date(local_timezone)?;

    if date > today {
        return Err(Error::FutureDate(date));
    }

    Ok(amount)
}

fn record(new_transaction: NewTransaction, state: &CreateTransactionState) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match append_transaction(new_transaction, &connection) {
        Ok(transaction) => {
            tracing::debug!(
                "recorded {} {} for user {}",
                transaction.kind,
                transaction.id,
                transaction.user_id
            );

            (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                (),
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for recording an expense, redirects to the dashboard on success.
pub async fn create_expense_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let amount = match validate_entry(&form.amount, form.date, &state.local_timezone) {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    let new_transaction = NewTransaction {
        user_id,
        kind: TransactionKind::Expense,
        date: form.date,
        amount,
        category: form.category,
    };

    record(new_transaction, &state)
}

/// A route handler for recording a deposit or withdrawal, redirects to the
/// dashboard on success.
///
/// Withdrawals are stored as negative amounts.
pub async fn create_saving_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<SavingForm>,
) -> Response {
    let amount = match validate_entry(&form.amount, form.date, &state.local_timezone) {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    let amount = match form.direction {
        SavingDirection::Deposit => amount,
        SavingDirection::Withdrawal => -amount,
    };

    let new_transaction = NewTransaction {
        user_id,
        kind: TransactionKind::Saving,
        date: form.date,
        amount,
        category: Some(form.direction.category().to_owned()),
    };

    record(new_transaction, &state)
}

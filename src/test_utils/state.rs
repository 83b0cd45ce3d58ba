use rusqlite::Connection;

use crate::{
    AppState, BudgetConfig, Email, NewTransaction, PasswordHash, Transaction, User,
    ValidatedPassword, append_transaction, register,
};

/// Build an [AppState] backed by an in-memory database with the default budget.
pub(crate) fn get_test_app_state() -> AppState {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");

    AppState::new(connection, "foobar", "Etc/UTC", BudgetConfig::default())
        .expect("could not create app state")
}

/// Register a user directly in the database of `state`.
///
/// Uses the minimum bcrypt cost so that tests stay fast. The password is not
/// checked for strength.
pub(crate) fn insert_test_user(state: &AppState, email: &str, password: &str) -> User {
    insert_test_user_with_cost(state, email, password, 4)
}

/// Register a user whose password is hashed with the bcrypt `cost`.
pub(crate) fn insert_test_user_with_cost(
    state: &AppState,
    email: &str,
    password: &str,
    cost: u32,
) -> User {
    let password_hash =
        PasswordHash::new(ValidatedPassword::new_unchecked(password), cost).unwrap();
    let email = Email::new(email).unwrap();
    let connection = state.db_connection.lock().unwrap();

    register(&email, password_hash, None, &connection).unwrap()
}

/// Append a transaction directly to the database of `state`.
pub(crate) fn insert_test_transaction(
    state: &AppState,
    new_transaction: NewTransaction,
) -> Transaction {
    let connection = state.db_connection.lock().unwrap();

    append_transaction(new_transaction, &connection).unwrap()
}

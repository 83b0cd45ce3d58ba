//! The ledger of expenses and savings movements.
//!
//! This module contains:
//! - The `Transaction` model and the database functions for appending and listing transactions
//! - The forms for recording expenses, deposits and withdrawals
//! - The endpoints that receive those forms

mod core;
mod create_endpoint;
mod form;

pub use core::{
    AMOUNT_LIMIT, NewTransaction, StoredAmount, Transaction, TransactionId, TransactionKind,
    append_transaction, count_transactions, create_transaction_table, get_transaction,
    get_transactions_for_user, is_amount_in_range,
};
pub use create_endpoint::{create_expense_endpoint, create_saving_endpoint, parse_amount};
pub use form::{expense_form, saving_form};

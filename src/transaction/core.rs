//! The ledger: the expenses and savings movements recorded by each user.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, auth::UserID};

// ============================================================================
// MODELS
// ============================================================================

/// The database ID of a transaction.
pub type TransactionId = i64;

/// Whether money was spent or put aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Money that was spent. Never negative.
    Expense,
    /// Money moved into (positive) or out of (negative) savings.
    Saving,
}

impl TransactionKind {
    fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "Expense",
            TransactionKind::Saving => "Saving",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "Expense" => Ok(TransactionKind::Expense),
            "Saving" => Ok(TransactionKind::Saving),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// Amounts must be strictly smaller than this in absolute value, which
/// leaves eight digits for the euros and keeps any sum of amounts far from
/// the limits of [Decimal].
pub const AMOUNT_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Whether `amount` is small enough to be recorded, see [AMOUNT_LIMIT].
pub fn is_amount_in_range(amount: Decimal) -> bool {
    amount.abs() < AMOUNT_LIMIT
}

/// An amount as read back from the database.
///
/// Rows written by this crate always hold a decimal, but rows edited by hand
/// may hold anything. Those are kept as the raw text so that one bad row does
/// not stop the rest of the ledger from loading.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredAmount {
    /// A well formed decimal amount.
    Valid(Decimal),
    /// Whatever was stored instead of a decimal.
    Malformed(String),
}

impl StoredAmount {
    /// The amount, or `None` if the stored value is malformed.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            StoredAmount::Valid(amount) => Some(*amount),
            StoredAmount::Malformed(_) => None,
        }
    }
}

impl FromSql for StoredAmount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let amount = match value {
            ValueRef::Text(bytes) => {
                let text = String::from_utf8_lossy(bytes);

                match Decimal::from_str(text.trim()) {
                    Ok(amount) => StoredAmount::Valid(amount),
                    Err(_) => StoredAmount::Malformed(text.into_owned()),
                }
            }
            ValueRef::Integer(amount) => StoredAmount::Valid(Decimal::from(amount)),
            ValueRef::Real(amount) => match Decimal::try_from(amount) {
                Ok(amount) => StoredAmount::Valid(amount),
                Err(_) => StoredAmount::Malformed(amount.to_string()),
            },
            ValueRef::Null => StoredAmount::Malformed("NULL".to_owned()),
            ValueRef::Blob(_) => StoredAmount::Malformed("<blob>".to_owned()),
        };

        Ok(amount)
    }
}

/// A recorded expense or savings movement ("movimento").
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// Whether this is an expense or a savings movement.
    pub kind: TransactionKind,
    /// When the transaction happened.
    pub date: Date,
    /// How much money was spent, deposited or withdrawn.
    pub amount: StoredAmount,
    /// A free text label such as "Groceries".
    pub category: Option<String>,
}

/// The data for recording a new transaction, see [append_transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The user recording the transaction.
    pub user_id: UserID,
    /// Whether this is an expense or a savings movement.
    pub kind: TransactionKind,
    /// When the transaction happened.
    pub date: Date,
    /// Expenses must not be negative. For savings, a negative amount is a
    /// withdrawal and a positive amount a deposit.
    pub amount: Decimal,
    /// A free text label. Blank labels are stored as no label.
    pub category: Option<String>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                kind TEXT NOT NULL CHECK(kind IN ('Expense', 'Saving')),
                date TEXT NOT NULL,
                amount TEXT NOT NULL,
                category TEXT NULL
                )",
        (),
    )?;

    // Every ledger query is per user and sorted by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Record a new transaction.
///
/// The amount is stored exactly as given. Existing rows are never changed.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not within [AMOUNT_LIMIT],
/// - [Error::NegativeExpense] if an expense has a negative amount,
/// - [Error::InvalidUser] if `user_id` does not refer to a registered user,
/// - or [Error::StorageUnavailable] if there is some other SQL error.
pub fn append_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let NewTransaction {
        user_id,
        kind,
        date,
        amount,
        category,
    } = new_transaction;

    if !is_amount_in_range(amount) {
        return Err(Error::InvalidAmount(amount.to_string()));
    }

    if kind == TransactionKind::Expense && amount < Decimal::ZERO {
        return Err(Error::NegativeExpense(amount));
    }

    let category = category
        .map(|category| category.trim().to_owned())
        .filter(|category| !category.is_empty());

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, kind, date, amount, category)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, user_id, kind, date, amount, category",
        )?
        .query_row(
            (user_id.as_i64(), kind, date, amount.to_string(), category),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidUser(user_id),
            error => error.into(),
        })?;

    tracing::debug!(
        "User {user_id} recorded {kind} {} of {amount} on {date}",
        transaction.id
    );

    Ok(transaction)
}

/// Get all transactions of a user, most recent first.
///
/// Transactions on the same date are returned in the order they were recorded.
///
/// # Errors
/// This function will return a [Error::StorageUnavailable] if there is an SQL error.
pub fn get_transactions_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, kind, date, amount, category FROM \"transaction\"
             WHERE user_id = :user_id
             ORDER BY date DESC, id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::StorageUnavailable] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, kind, date, amount, category FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get the number of transactions recorded by a user.
///
/// # Errors
/// This function will return a [Error::StorageUnavailable] there is some SQL error.
pub fn count_transactions(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1;",
            [user_id.as_i64()],
            |row| row.get::<_, i64>(0).map(|count| count as usize),
        )
        .map_err(|error| error.into())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let kind = row.get(2)?;
    let date = row.get(3)?;
    let amount = row.get(4)?;
    let category = row.get(5)?;

    Ok(Transaction {
        id,
        user_id,
        kind,
        date,
        amount,
        category,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod stored_amount_tests {
    use std::str::FromStr;

    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use super::StoredAmount;

    fn read(sql_value: &str) -> StoredAmount {
        let connection = Connection::open_in_memory().unwrap();

        connection
            .query_row(&format!("SELECT {sql_value}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn reads_decimal_text() {
        assert_eq!(
            read("'1200.50'"),
            StoredAmount::Valid(Decimal::from_str("1200.50").unwrap())
        );
        assert_eq!(
            read("' -45.5 '"),
            StoredAmount::Valid(Decimal::from_str("-45.5").unwrap())
        );
    }

    #[test]
    fn reads_numbers() {
        assert_eq!(read("300"), StoredAmount::Valid(Decimal::from(300)));
        assert_eq!(
            read("12.5"),
            StoredAmount::Valid(Decimal::from_str("12.5").unwrap())
        );
    }

    #[test]
    fn keeps_malformed_text() {
        let amount = read("'12,50 €'");

        assert_eq!(amount, StoredAmount::Malformed("12,50 €".to_owned()));
        assert_eq!(amount.value(), None);
    }

    #[test]
    fn null_is_malformed() {
        assert_eq!(read("NULL").value(), None);
    }
}

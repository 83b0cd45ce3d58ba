//! The account store: creating users and looking them up.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A syntactically valid email address.
///
/// Surrounding whitespace is dropped, otherwise the address is kept as
/// typed. Two addresses that differ only in case are different users.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    /// Parse an email address.
    ///
    /// # Errors
    /// Returns [Error::InvalidEmail] if `raw_email` is not an email address.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let email = raw_email.trim();

        if EmailAddress::is_valid(email) {
            Ok(Self(email.to_owned()))
        } else {
            Err(Error::InvalidEmail(raw_email.to_owned()))
        }
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A phone number in normalised form, e.g. "+393331234567".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const MIN_DIGITS: usize = 6;
    const MAX_DIGITS: usize = 15;

    /// Parse and normalise a phone number.
    ///
    /// Spaces, dashes, dots and parentheses are removed. What remains must be
    /// an optional leading '+' followed by 6 to 15 digits.
    ///
    /// # Errors
    /// Returns [Error::InvalidPhone] if `raw_phone` is not a phone number.
    pub fn new(raw_phone: &str) -> Result<Self, Error> {
        let normalised: String = raw_phone
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
            .collect();

        let digits = normalised.strip_prefix('+').unwrap_or(&normalised);
        let is_valid = (Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len())
            && digits.chars().all(|c| c.is_ascii_digit());

        if is_valid {
            Ok(Self(normalised))
        } else {
            Err(Error::InvalidPhone(raw_phone.to_owned()))
        }
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The address the user logs in with.
    pub email: Email,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The phone number the user has linked to their account, if any.
    pub phone: Option<PhoneNumber>,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                phone TEXT UNIQUE NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    let id = UserID::new(row.get(0)?);
    let raw_email: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;
    let raw_phone: Option<String> = row.get(3)?;

    Ok(User {
        id,
        // Only values that passed validation are written, so these are trusted.
        email: Email(raw_email),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        phone: raw_phone.map(PhoneNumber),
    })
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateEmail] if `email` is already registered,
/// - [Error::DuplicatePhone] if `phone` belongs to another user,
/// - [Error::StorageUnavailable] if an SQL related error occurred.
pub fn register(
    email: &Email,
    password_hash: PasswordHash,
    phone: Option<&PhoneNumber>,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, password, phone) VALUES (?1, ?2, ?3)",
        (
            &email.0,
            password_hash.as_ref(),
            phone.map(|phone| &phone.0),
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());
    tracing::info!("Registered user {id}");

    Ok(User {
        id,
        email: email.clone(),
        password_hash,
        phone: phone.cloned(),
    })
}

/// Check an email and password against the registered users.
///
/// An unknown email and a wrong password give the same error, and take
/// about the same time to check.
///
/// This is [find_log_in_user] followed by [verify_log_in]. Callers sharing
/// the connection should call those two separately and release the
/// connection in between, since checking the password is slow.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the email is not registered or the
/// password does not match, or [Error::StorageUnavailable] if the database
/// could not be queried.
pub fn authenticate(email: &str, password: &str, connection: &Connection) -> Result<User, Error> {
    let user = find_log_in_user(email, connection)?;

    verify_log_in(user, password)
}

/// Look up the user trying to log in with `email`.
///
/// Returns `None` if the text is not a registered email address.
///
/// # Errors
///
/// Returns [Error::StorageUnavailable] if the database could not be queried.
pub fn find_log_in_user(email: &str, connection: &Connection) -> Result<Option<User>, Error> {
    match Email::new(email).and_then(|email| get_user_by_email(&email, connection)) {
        Ok(user) => Ok(Some(user)),
        Err(Error::InvalidEmail(_) | Error::NotFound) => Ok(None),
        Err(error) => Err(error),
    }
}

/// Check `password` against the user found by [find_log_in_user].
///
/// Without a user the password is checked against a dummy hash, so that
/// both failures take about the same time.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if there is no user or the password
/// does not match, or [Error::HashingError] if the stored hash is unusable.
pub fn verify_log_in(user: Option<User>, password: &str) -> Result<User, Error> {
    let Some(user) = user else {
        PasswordHash::verify_dummy(password);
        return Err(Error::InvalidCredentials);
    };

    match user.password_hash.verify(password) {
        Ok(true) => Ok(user),
        Ok(false) => Err(Error::InvalidCredentials),
        Err(error) => {
            tracing::error!("Could not verify the password of user {}: {error}", user.id);
            Err(Error::HashingError(error.to_string()))
        }
    }
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password, phone FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_row_to_user)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has that email.
pub fn get_user_by_email(email: &Email, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password, phone FROM user WHERE email = :email")?
        .query_row(&[(":email", &email.0)], map_row_to_user)
        .map_err(|error| error.into())
}

/// Get the user that linked `phone` to their account.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has that phone number.
pub fn get_user_by_phone(phone: &PhoneNumber, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password, phone FROM user WHERE phone = :phone")?
        .query_row(&[(":phone", &phone.0)], map_row_to_user)
        .map_err(|error| error.into())
}

/// Set the phone number of a user, or remove it with `None`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` is not a registered user, or
/// [Error::DuplicatePhone] if another user has the phone number.
pub fn set_user_phone(
    user_id: UserID,
    phone: Option<&PhoneNumber>,
    connection: &Connection,
) -> Result<User, Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET phone = ?1 WHERE id = ?2",
        (phone.map(|phone| &phone.0), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_user_by_id(user_id, connection)
}

/// Replace the password hash of a user.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` is not a registered user.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    tracing::info!("Updated the password of user {user_id}");

    Ok(())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::StorageUnavailable] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| {
            row.get::<_, i64>(0).map(|count| count as usize)
        })
        .map_err(|error| error.into())
}


#[cfg(test)]
mod phone_number_tests {
    use crate::{Error, auth::PhoneNumber};

    #[test]
    fn removes_formatting() {
        let phone = PhoneNumber::new("+39 (333) 123-45.67").unwrap();

        assert_eq!(phone.as_ref(), "+393331234567");
    }

    #[test]
    fn plus_is_optional() {
        let phone = PhoneNumber::new("333 1234567").unwrap();

        assert_eq!(phone.as_ref(), "3331234567");
    }

    #[test]
    fn digit_count_limits() {
        assert!(PhoneNumber::new("12345").is_err());
        assert!(PhoneNumber::new("123456").is_ok());
        assert!(PhoneNumber::new("123456789012345").is_ok());
        assert!(PhoneNumber::new("1234567890123456").is_err());
    }

    #[test]
    fn rejects_letters_and_inner_plus() {
        assert_eq!(
            PhoneNumber::new("333-CALL-ME"),
            Err(Error::InvalidPhone("333-CALL-ME".to_owned()))
        );
        assert!(PhoneNumber::new("39+3331234567").is_err());
        assert!(PhoneNumber::new("+").is_err());
    }
}

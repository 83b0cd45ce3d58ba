use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use salvadanaio::{
    Email, NewTransaction, PasswordHash, PhoneNumber, TransactionKind, ValidatedPassword,
    append_transaction, initialize_db, register,
};

/// A utility for creating a test database for the salvadanaio web server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const TEST_EMAIL: &str = "test@example.com";
const TEST_PASSWORD: &str = "test";
const TEST_PHONE: &str = "+39 333 123 4567";

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user {TEST_EMAIL} with the password \"{TEST_PASSWORD}\"...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = register(
        &Email::new(TEST_EMAIL)?,
        password_hash,
        Some(&PhoneNumber::new(TEST_PHONE)?),
        &conn,
    )?;

    println!("Recording transactions...");

    let today = OffsetDateTime::now_utc().date();
    // (days ago, kind, amount in cents, category)
    let transactions = [
        (95, TransactionKind::Expense, 1800_00, Some("affitto")),
        (90, TransactionKind::Expense, 212_35, Some("cibo")),
        (88, TransactionKind::Saving, 500_00, None),
        (65, TransactionKind::Expense, 1800_00, Some("affitto")),
        (60, TransactionKind::Expense, 187_10, Some("cibo")),
        (58, TransactionKind::Expense, 45_00, None),
        (55, TransactionKind::Saving, 300_00, None),
        (35, TransactionKind::Expense, 1800_00, Some("affitto")),
        (30, TransactionKind::Expense, 240_80, Some("cibo")),
        (25, TransactionKind::Saving, -150_00, None),
        (5, TransactionKind::Expense, 1800_00, Some("affitto")),
        (3, TransactionKind::Expense, 96_40, Some("cibo")),
        (1, TransactionKind::Saving, 400_00, None),
    ];

    for (days_ago, kind, cents, category) in transactions {
        let amount = Decimal::new(cents, 2);
        let category = match (kind, category) {
            (TransactionKind::Saving, _) if amount.is_sign_negative() => Some("Withdrawal"),
            (TransactionKind::Saving, _) => Some("Deposit"),
            (TransactionKind::Expense, category) => category,
        };

        append_transaction(
            NewTransaction {
                user_id: user.id,
                kind,
                date: today - Duration::days(days_ago),
                amount,
                category: category.map(ToOwned::to_owned),
            },
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}

use std::{error::Error, path::Path, process::exit};

use clap::{Parser, ValueEnum};
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, macros::format_description};

use salvadanaio::{
    NewTransaction, PhoneNumber, TransactionKind, append_transaction, count_transactions,
    get_local_date, get_user_by_phone, parse_amount,
};

/// Record an expense or savings movement for the user with the given phone number.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    db_path: String,

    /// The phone number linked to the user's account, in any format.
    #[arg(long)]
    phone: String,

    /// What kind of movement to record.
    #[arg(long, value_enum)]
    kind: MovementKind,

    /// How much money was spent, deposited or withdrawn, e.g. "12,50". Always positive.
    #[arg(long, value_parser = parse_cli_amount)]
    amount: Decimal,

    /// When the movement happened, as YYYY-MM-DD. Defaults to today.
    #[arg(long, value_parser = parse_date)]
    date: Option<Date>,

    /// An optional label such as "cibo". Ignored for savings movements.
    #[arg(long)]
    category: Option<String>,

    /// The canonical name of the local timezone, used to determine today's date.
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MovementKind {
    Expense,
    Deposit,
    Withdrawal,
}

fn parse_date(text: &str) -> Result<Date, time::error::Parse> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
}

fn parse_cli_amount(text: &str) -> Result<Decimal, String> {
    parse_amount(text).map_err(|error| error.to_string())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if args.amount <= Decimal::ZERO {
        eprintln!("The amount must be greater than zero, got {}.", args.amount);
        exit(1);
    }

    let db_path = Path::new(&args.db_path);
    if !db_path.is_file() {
        eprintln!("File does not exist at {db_path:#?}!");
        exit(1);
    }

    let phone = match PhoneNumber::new(&args.phone) {
        Ok(phone) => phone,
        Err(error) => {
            eprintln!("{error}");
            exit(1);
        }
    };

    let connection = Connection::open(db_path)?;
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let user = match get_user_by_phone(&phone, &connection) {
        Ok(user) => user,
        Err(error) => {
            eprintln!("Could not find a user with the phone number {phone}: {error}");
            exit(1);
        }
    };

    let today = get_local_date(&args.timezone)?;
    let date = args.date.unwrap_or(today);
    if date > today {
        eprintln!("{date} is in the future.");
        exit(1);
    }

    let (kind, amount, category) = match args.kind {
        MovementKind::Expense => (TransactionKind::Expense, args.amount, args.category),
        MovementKind::Deposit => (
            TransactionKind::Saving,
            args.amount,
            Some("Deposit".to_owned()),
        ),
        MovementKind::Withdrawal => (
            TransactionKind::Saving,
            -args.amount,
            Some("Withdrawal".to_owned()),
        ),
    };

    let transaction = append_transaction(
        NewTransaction {
            user_id: user.id,
            kind,
            date,
            amount,
            category,
        },
        &connection,
    )?;

    let transaction_count = count_transactions(user.id, &connection)?;

    println!(
        "Recorded {} of {} on {} for {}, who now has {transaction_count} movements.",
        transaction.kind, amount, transaction.date, user.email
    );

    Ok(())
}


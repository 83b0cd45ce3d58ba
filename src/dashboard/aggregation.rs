//! Transaction data aggregation for the dashboard charts.
//!
//! Provides functions to total expenses by month and by category, and to
//! compute the savings balance at the end of each month.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use time::{Date, Month};

use crate::{
    dashboard::summary::{add_amount, expense_amount, valid_amount},
    transaction::Transaction,
};

/// The label used for expenses recorded without a category.
pub(super) const UNCATEGORISED_LABEL: &str = "Uncategorised";

/// The first day of the month `date` falls in.
fn month_of(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

/// Sums the amounts `amount_of` picks out of `transactions` per month, in
/// chronological order.
///
/// Months without transactions are left out.
fn sum_by_month(
    transactions: &[Transaction],
    amount_of: fn(&Transaction) -> Option<Decimal>,
) -> BTreeMap<Date, Decimal> {
    let mut totals = BTreeMap::new();

    for transaction in transactions {
        if let Some(amount) = amount_of(transaction) {
            let total = totals
                .entry(month_of(transaction.date))
                .or_insert(Decimal::ZERO);
            *total = add_amount(*total, amount, transaction);
        }
    }

    totals
}

/// Total expenses per month, oldest month first.
///
/// Negative and malformed expenses are left out, as in the summary.
pub(super) fn monthly_expense_totals(expenses: &[Transaction]) -> Vec<(Date, Decimal)> {
    sum_by_month(expenses, expense_amount).into_iter().collect()
}

/// The savings balance at the end of each month with a movement, oldest month first.
pub(super) fn running_savings_by_month(savings: &[Transaction]) -> Vec<(Date, Decimal)> {
    let mut balance = Decimal::ZERO;

    sum_by_month(savings, valid_amount)
        .into_iter()
        .map(|(month, total)| {
            balance = balance.checked_add(total).unwrap_or_else(|| {
                tracing::warn!("the savings balance overflows in {month}, ignoring that month");
                balance
            });
            (month, balance)
        })
        .collect()
}

/// Total expenses per category, largest first.
///
/// Expenses without a category are grouped under [UNCATEGORISED_LABEL].
/// Negative and malformed expenses are left out, as in the summary.
/// Categories with equal totals are sorted by name.
pub(super) fn expenses_by_category(expenses: &[Transaction]) -> Vec<(String, Decimal)> {
    let mut totals: HashMap<&str, Decimal> = HashMap::new();

    for transaction in expenses {
        let Some(amount) = expense_amount(transaction) else {
            continue;
        };

        let category = transaction
            .category
            .as_deref()
            .unwrap_or(UNCATEGORISED_LABEL);

        let total = totals.entry(category).or_insert(Decimal::ZERO);
        *total = add_amount(*total, amount, transaction);
    }

    let mut totals: Vec<(String, Decimal)> = totals
        .into_iter()
        .map(|(category, total)| (category.to_owned(), total))
        .collect();
    totals.sort_by(|(a_name, a_total), (b_name, b_total)| {
        b_total.cmp(a_total).then_with(|| a_name.cmp(b_name))
    });

    totals
}

/// Formats months as a three-letter abbreviation and year, e.g. "Mar 2025".
pub(super) fn format_month_labels(months: &[Date]) -> Vec<String> {
    let month_to_str = |date: &Date| {
        let month = match date.month() {
            Month::January => "Jan",
            Month::February => "Feb",
            Month::March => "Mar",
            Month::April => "Apr",
            Month::May => "May",
            Month::June => "Jun",
            Month::July => "Jul",
            Month::August => "Aug",
            Month::September => "Sep",
            Month::October => "Oct",
            Month::November => "Nov",
            Month::December => "Dec",
        };

        format!("{month} {}", date.year())
    };

    months.iter().map(month_to_str).collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use time::{Date, macros::date};

    use crate::{
        BudgetConfig, UserID,
        dashboard::summarize,
        transaction::{StoredAmount, Transaction, TransactionKind},
    };

    use super::{
        UNCATEGORISED_LABEL, expenses_by_category, format_month_labels, monthly_expense_totals,
        running_savings_by_month,
    };

    fn dec(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    fn transaction(
        kind: TransactionKind,
        date: Date,
        amount: &str,
        category: Option<&str>,
    ) -> Transaction {
        Transaction {
            id: 0,
            user_id: UserID::new(1),
            kind,
            date,
            amount: StoredAmount::Valid(dec(amount)),
            category: category.map(ToOwned::to_owned),
        }
    }

    fn expense(date: Date, amount: &str, category: Option<&str>) -> Transaction {
        transaction(TransactionKind::Expense, date, amount, category)
    }

    fn saving(date: Date, amount: &str) -> Transaction {
        transaction(TransactionKind::Saving, date, amount, None)
    }

    #[test]
    fn monthly_totals_are_chronological() {
        let expenses = [
            expense(date!(2025 - 03 - 15), "10", None),
            expense(date!(2025 - 01 - 31), "5.50", None),
            expense(date!(2025 - 03 - 01), "2.25", None),
            expense(date!(2024 - 12 - 24), "100", None),
        ];

        let totals = monthly_expense_totals(&expenses);

        assert_eq!(
            totals,
            vec![
                (date!(2024 - 12 - 01), dec("100")),
                (date!(2025 - 01 - 01), dec("5.50")),
                (date!(2025 - 03 - 01), dec("12.25")),
            ]
        );
    }

    #[test]
    fn monthly_totals_skip_malformed_amounts() {
        let mut broken = expense(date!(2025 - 01 - 02), "0", None);
        broken.amount = StoredAmount::Malformed("abc".to_owned());

        let totals = monthly_expense_totals(&[broken, expense(date!(2025 - 01 - 03), "4", None)]);

        assert_eq!(totals, vec![(date!(2025 - 01 - 01), dec("4"))]);
    }

    #[test]
    fn negative_expenses_are_left_out_like_in_the_summary() {
        let expenses = [
            expense(date!(2025 - 01 - 02), "100", Some("cibo")),
            expense(date!(2025 - 01 - 03), "-40", Some("cibo")),
            expense(date!(2025 - 02 - 03), "-5", None),
        ];
        let summary = summarize(&expenses, &BudgetConfig::default());

        let monthly = monthly_expense_totals(&expenses);
        let by_category = expenses_by_category(&expenses);

        assert_eq!(monthly, vec![(date!(2025 - 01 - 01), dec("100"))]);
        assert_eq!(by_category, vec![("cibo".to_owned(), dec("100"))]);
        let monthly_sum: Decimal = monthly.iter().map(|(_, total)| *total).sum();
        assert_eq!(monthly_sum, summary.total_expenses);
    }

    #[test]
    fn totals_that_would_overflow_skip_the_extra_amount() {
        let huge = "79228162514264337593543950335";
        let expenses = [
            expense(date!(2025 - 01 - 02), huge, Some("cibo")),
            expense(date!(2025 - 01 - 03), huge, Some("cibo")),
        ];
        let savings = [
            saving(date!(2025 - 01 - 02), huge),
            saving(date!(2025 - 02 - 02), huge),
        ];

        assert_eq!(
            monthly_expense_totals(&expenses),
            vec![(date!(2025 - 01 - 01), Decimal::MAX)]
        );
        assert_eq!(
            expenses_by_category(&expenses),
            vec![("cibo".to_owned(), Decimal::MAX)]
        );
        assert_eq!(
            running_savings_by_month(&savings),
            vec![
                (date!(2025 - 01 - 01), Decimal::MAX),
                (date!(2025 - 02 - 01), Decimal::MAX),
            ]
        );
    }

    #[test]
    fn savings_balance_accumulates() {
        let savings = [
            saving(date!(2025 - 02 - 10), "-200"),
            saving(date!(2025 - 01 - 05), "500"),
            saving(date!(2025 - 02 - 20), "50"),
            saving(date!(2025 - 04 - 01), "1000"),
        ];

        let balances = running_savings_by_month(&savings);

        assert_eq!(
            balances,
            vec![
                (date!(2025 - 01 - 01), dec("500")),
                (date!(2025 - 02 - 01), dec("350")),
                (date!(2025 - 04 - 01), dec("1350")),
            ]
        );
    }

    #[test]
    fn categories_are_sorted_largest_first() {
        let expenses = [
            expense(date!(2025 - 01 - 01), "30", Some("cibo")),
            expense(date!(2025 - 01 - 02), "1800", Some("affitto")),
            expense(date!(2025 - 01 - 03), "20", Some("cibo")),
            expense(date!(2025 - 01 - 04), "15", None),
        ];

        let totals = expenses_by_category(&expenses);

        assert_eq!(
            totals,
            vec![
                ("affitto".to_owned(), dec("1800")),
                ("cibo".to_owned(), dec("50")),
                (UNCATEGORISED_LABEL.to_owned(), dec("15")),
            ]
        );
    }

    #[test]
    fn categories_with_equal_totals_are_sorted_by_name() {
        let expenses = [
            expense(date!(2025 - 01 - 01), "10", Some("b")),
            expense(date!(2025 - 01 - 01), "10", Some("a")),
        ];

        let names: Vec<_> = expenses_by_category(&expenses)
            .into_iter()
            .map(|(name, _)| name)
            .collect();

        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn month_labels_include_year() {
        let labels = format_month_labels(&[date!(2024 - 12 - 01), date!(2025 - 01 - 01)]);

        assert_eq!(labels, vec!["Dec 2024", "Jan 2025"]);
    }
}

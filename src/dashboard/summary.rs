//! Derives the budget overview shown on the dashboard from a user's transactions.

use rust_decimal::Decimal;

use crate::{
    BudgetConfig,
    transaction::{StoredAmount, Transaction, TransactionKind},
};

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// The aggregate view of one user's ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// The user's expenses, in the order they were given.
    pub expenses: Vec<Transaction>,
    /// The user's deposits and withdrawals, in the order they were given.
    pub savings: Vec<Transaction>,
    /// The sum of all expenses. Never negative.
    pub total_expenses: Decimal,
    /// The signed sum of all savings movements.
    pub total_savings: Decimal,
    /// The total expenses, limited to the expense ceiling.
    pub capped_expenses: Decimal,
    /// How much can still be spent before reaching the expense ceiling.
    pub remaining_budget: Decimal,
    /// The share of the expense ceiling that has been spent, from 0 to 100.
    pub percent_spent: Decimal,
    /// `100 - percent_spent`.
    pub percent_available: Decimal,
    /// The savings as a share of the savings goal. May exceed 100 or be negative.
    pub percent_goal_reached: Decimal,
}

/// Summarise `transactions` against the thresholds in `config`.
///
/// Amounts that could not be read back from the database contribute nothing
/// to the totals, and neither do negative expenses or amounts that would
/// overflow a total. These are logged as warnings so that the rows can be
/// fixed by hand.
pub fn summarize(transactions: &[Transaction], config: &BudgetConfig) -> Summary {
    let (expenses, savings): (Vec<Transaction>, Vec<Transaction>) = transactions
        .iter()
        .cloned()
        .partition(|transaction| transaction.kind == TransactionKind::Expense);

    let total_expenses = expenses
        .iter()
        .filter_map(|transaction| expense_amount(transaction).map(|amount| (transaction, amount)))
        .fold(Decimal::ZERO, |total, (transaction, amount)| {
            add_amount(total, amount, transaction)
        });

    let total_savings = savings
        .iter()
        .filter_map(|transaction| valid_amount(transaction).map(|amount| (transaction, amount)))
        .fold(Decimal::ZERO, |total, (transaction, amount)| {
            add_amount(total, amount, transaction)
        });

    let ceiling = config.expense_ceiling;
    let capped_expenses = total_expenses.min(ceiling);
    let remaining_budget = ceiling - capped_expenses;

    let percent_spent = if ceiling > Decimal::ZERO {
        percentage(capped_expenses, ceiling)
    } else {
        Decimal::ZERO
    };

    let percent_goal_reached = if config.savings_goal > Decimal::ZERO {
        percentage(total_savings, config.savings_goal)
    } else {
        Decimal::ZERO
    };

    Summary {
        expenses,
        savings,
        total_expenses,
        total_savings,
        capped_expenses,
        remaining_budget,
        percent_spent,
        percent_available: ONE_HUNDRED - percent_spent,
        percent_goal_reached,
    }
}

/// The amount of `transaction`, or `None` if it is malformed.
pub(super) fn valid_amount(transaction: &Transaction) -> Option<Decimal> {
    match &transaction.amount {
        StoredAmount::Valid(amount) => Some(*amount),
        StoredAmount::Malformed(raw) => {
            tracing::warn!(
                "transaction {} has a malformed amount {raw:?}, it will be treated as zero",
                transaction.id
            );
            None
        }
    }
}

/// The amount of an expense, or `None` if it is malformed or negative.
pub(super) fn expense_amount(transaction: &Transaction) -> Option<Decimal> {
    valid_amount(transaction).filter(|amount| {
        if amount.is_sign_negative() {
            tracing::warn!(
                "transaction {} is an expense with the negative amount {amount}, it will be ignored",
                transaction.id
            );
            false
        } else {
            true
        }
    })
}

/// `total + amount`, or `total` if the sum is too large for a [Decimal].
pub(super) fn add_amount(total: Decimal, amount: Decimal, transaction: &Transaction) -> Decimal {
    total.checked_add(amount).unwrap_or_else(|| {
        tracing::warn!(
            "adding the amount {amount} of transaction {} to {total} overflows, it will be ignored",
            transaction.id
        );
        total
    })
}

/// `part / whole * 100`, where `whole` must be positive.
fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(ONE_HUNDRED))
        .unwrap_or_else(|| {
            tracing::warn!("could not compute {part} as a percentage of {whole}");
            Decimal::ZERO
        })
}

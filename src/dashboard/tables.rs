//! Table views for dashboard data display.
//!
//! Provides the budget overview table and the lists of expenses and savings
//! movements.

use maud::{Markup, html};

use crate::{
    BudgetConfig,
    dashboard::Summary,
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency, format_percentage},
    transaction::{StoredAmount, Transaction},
};

const TABLE_STYLE: &str = "w-full text-sm text-left text-gray-500 dark:text-gray-400";
const TABLE_STICKY_CELL_STYLE: &str =
    "px-3 py-4 font-medium text-gray-900 dark:text-white text-left";
const TABLE_AMOUNT_CELL_STYLE: &str = "text-right whitespace-nowrap";
const TABLE_CELL_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const TABLE_CELL_RED_STYLE: &str = "text-red-600 dark:text-red-400";
const TABLE_CELL_WARNING_STYLE: &str = "text-yellow-600 dark:text-yellow-400 italic";

/// Renders the budget overview: totals, the expense ceiling and the savings goal.
pub(super) fn summary_table(summary: &Summary, config: &BudgetConfig) -> Markup {
    let rows = [
        ("Total expenses", format_currency(summary.total_expenses)),
        ("Expense ceiling", format_currency(config.expense_ceiling)),
        ("Remaining budget", format_currency(summary.remaining_budget)),
        ("Budget used", format_percentage(summary.percent_spent)),
        ("Budget available", format_percentage(summary.percent_available)),
        ("Total savings", format_currency(summary.total_savings)),
        ("Savings goal", format_currency(config.savings_goal)),
        ("Goal reached", format_percentage(summary.percent_goal_reached)),
    ];

    html! {
        div id="summary-table" {
            h3 class="text-xl font-semibold mb-4" { "Summary" }

            div class="overflow-x-auto rounded-lg shadow" {
                table class=(TABLE_STYLE) {
                    tbody {
                        @for (label, value) in rows {
                            tr class=(TABLE_ROW_STYLE) {
                                th scope="row" class=(TABLE_STICKY_CELL_STYLE) { (label) }
                                td class={(TABLE_CELL_STYLE) " " (TABLE_AMOUNT_CELL_STYLE)} {
                                    (value)
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn amount_cell(amount: &StoredAmount, signed_colours: bool) -> Markup {
    match amount {
        StoredAmount::Valid(amount) => {
            let colour = if !signed_colours {
                ""
            } else if amount.is_sign_negative() {
                TABLE_CELL_RED_STYLE
            } else {
                TABLE_CELL_GREEN_STYLE
            };

            html! {
                td class={(TABLE_CELL_STYLE) " " (TABLE_AMOUNT_CELL_STYLE) " " (colour)} {
                    (format_currency(*amount))
                }
            }
        }
        StoredAmount::Malformed(raw) => html! {
            td
                class={(TABLE_CELL_STYLE) " " (TABLE_AMOUNT_CELL_STYLE) " " (TABLE_CELL_WARNING_STYLE)}
                title="This amount could not be read and is not counted in the totals."
            {
                (raw)
            }
        },
    }
}

fn transactions_table(
    id: &str,
    title: &str,
    transactions: &[Transaction],
    signed_colours: bool,
) -> Markup {
    html! {
        div id=(id) {
            h3 class="text-xl font-semibold mb-4" { (title) }

            @if transactions.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "No entries yet." }
            } @else {
                div class="overflow-x-auto rounded-lg shadow" {
                    table class=(TABLE_STYLE) {
                        thead class=(TABLE_HEADER_STYLE) {
                            tr {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Amount" }
                            }
                        }
                        tbody {
                            @for transaction in transactions {
                                tr class=(TABLE_ROW_STYLE) {
                                    td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                    td class=(TABLE_CELL_STYLE) {
                                        (transaction.category.as_deref().unwrap_or("-"))
                                    }
                                    (amount_cell(&transaction.amount, signed_colours))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Renders the user's expenses, newest first.
pub(super) fn expenses_table(summary: &Summary) -> Markup {
    transactions_table("expenses-table", "Expenses", &summary.expenses, false)
}

/// Renders the user's deposits and withdrawals, newest first.
///
/// Deposits are shown in green and withdrawals in red.
pub(super) fn savings_table(summary: &Summary) -> Markup {
    transactions_table("savings-table", "Savings", &summary.savings, true)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        BudgetConfig, UserID,
        dashboard::summarize,
        transaction::{StoredAmount, Transaction, TransactionKind},
    };

    use super::{expenses_table, savings_table, summary_table};

    fn transaction(id: i64, kind: TransactionKind, amount: StoredAmount) -> Transaction {
        Transaction {
            id,
            user_id: UserID::new(1),
            kind,
            date: date!(2024 - 01 - 05),
            amount,
            category: Some("affitto".to_owned()),
        }
    }

    fn valid(text: &str) -> StoredAmount {
        StoredAmount::Valid(Decimal::from_str(text).unwrap())
    }

    fn cell_texts(html: &Html, selector: &str) -> Vec<String> {
        html.select(&Selector::parse(selector).unwrap())
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect()
    }

    #[test]
    fn summary_table_formats_values() {
        let transactions = [
            transaction(1, TransactionKind::Expense, valid("1800")),
            transaction(2, TransactionKind::Expense, valid("400")),
        ];
        let config = BudgetConfig::default();
        let summary = summarize(&transactions, &config);

        let html = Html::parse_fragment(&summary_table(&summary, &config).into_string());

        let values = cell_texts(&html, "td");
        assert_eq!(
            values,
            vec![
                "2.200,00 €",
                "2.500,00 €",
                "300,00 €",
                "88,0%",
                "12,0%",
                "0,00 €",
                "30.000,00 €",
                "0,0%",
            ]
        );
    }

    #[test]
    fn malformed_amounts_are_shown_as_stored() {
        let transactions = [
            transaction(1, TransactionKind::Expense, valid("12.5")),
            transaction(
                2,
                TransactionKind::Expense,
                StoredAmount::Malformed("dodici".to_owned()),
            ),
        ];
        let summary = summarize(&transactions, &BudgetConfig::default());

        let html = Html::parse_fragment(&expenses_table(&summary).into_string());

        let amounts = cell_texts(&html, "td.text-right");
        assert_eq!(amounts, vec!["12,50 €", "dodici"]);
    }

    #[test]
    fn withdrawals_are_shown_in_red() {
        let transactions = [
            transaction(1, TransactionKind::Saving, valid("500")),
            transaction(2, TransactionKind::Saving, valid("-200")),
        ];
        let summary = summarize(&transactions, &BudgetConfig::default());

        let html = Html::parse_fragment(&savings_table(&summary).into_string());

        assert_eq!(cell_texts(&html, "td.text-green-600"), vec!["500,00 €"]);
        assert_eq!(cell_texts(&html, "td.text-red-600"), vec!["-200,00 €"]);
    }

    #[test]
    fn empty_partition_shows_message() {
        let summary = summarize(&[], &BudgetConfig::default());

        let html = Html::parse_fragment(&expenses_table(&summary).into_string());

        assert!(cell_texts(&html, "table").is_empty());
        assert_eq!(cell_texts(&html, "p"), vec!["No entries yet."]);
    }
}

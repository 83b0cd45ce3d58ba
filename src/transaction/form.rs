//! The forms for recording expenses and savings movements.

use maud::{Markup, html};
use time::Date;

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, loading_spinner,
    },
};

fn date_input(id: &str, today: Date) -> Markup {
    html! {
        div
        {
            label for=(id) class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id=(id)
                type="date"
                max=(today)
                value=(today)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

/// Amounts are free text so that "1.200,50" can be typed as well as "1200.50".
fn amount_input(id: &str) -> Markup {
    html! {
        div
        {
            label for=(id) class=(FORM_LABEL_STYLE) { "Amount" }

            // w-full needed to ensure input takes the full width when prefilled with a value
            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id=(id)
                    type="text"
                    inputmode="decimal"
                    placeholder="0,00"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

fn submit_button(indicator_id: &str, text: &str) -> Markup {
    html! {
        button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
        {
            span class="inline htmx-indicator" id=(indicator_id)
            {
                (loading_spinner())
            }
            (text)
        }
    }
}

/// The form for recording an expense. `today` is the latest selectable date.
pub fn expense_form(today: Date) -> Markup {
    html! {
        form
            id="expense-form"
            hx-post=(endpoints::EXPENSES_API)
            hx-target-error="#alert-container"
            hx-indicator="#expense-indicator"
            class="w-full space-y-4"
        {
            h2 class="text-xl font-bold" { "New Expense" }

            (date_input("expense-date", today))

            div
            {
                label for="expense-category" class=(FORM_LABEL_STYLE) { "Category" }

                input
                    name="category"
                    id="expense-category"
                    type="text"
                    placeholder="e.g. Groceries"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (amount_input("expense-amount"))
            (submit_button("expense-indicator", "Add Expense"))
        }
    }
}

/// The form for depositing into or withdrawing from savings.
pub fn saving_form(today: Date) -> Markup {
    html! {
        form
            id="saving-form"
            hx-post=(endpoints::SAVINGS_API)
            hx-target-error="#alert-container"
            hx-indicator="#saving-indicator"
            class="w-full space-y-4"
        {
            h2 class="text-xl font-bold" { "Savings" }

            (date_input("saving-date", today))

            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Direction" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    div class="flex items-center gap-3"
                    {
                        input
                            name="direction"
                            id="saving-direction-deposit"
                            type="radio"
                            value="deposit"
                            checked
                            required
                            tabindex="0"
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for="saving-direction-deposit" class=(FORM_RADIO_LABEL_STYLE)
                        {
                            "Deposit"
                        }
                    }

                    div class="flex items-center gap-3"
                    {
                        input
                            name="direction"
                            id="saving-direction-withdrawal"
                            type="radio"
                            value="withdrawal"
                            required
                            tabindex="0"
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for="saving-direction-withdrawal" class=(FORM_RADIO_LABEL_STYLE)
                        {
                            "Withdrawal"
                        }
                    }
                }
            }

            (amount_input("saving-amount"))
            (submit_button("saving-indicator", "Save"))
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_input_with_value, assert_form_submit_button,
            assert_hx_endpoint, assert_valid_html, must_get_form,
        },
    };

    use super::{expense_form, saving_form};

    #[test]
    fn expense_form_has_fields() {
        let html = Html::parse_fragment(&expense_form(date!(2025 - 03 - 10)).into_string());
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::EXPENSES_API, "hx-post");
        assert_form_input_with_value(&form, "date", "date", "2025-03-10");
        assert_form_input(&form, "amount", "text");
        assert_form_submit_button(&form);

        let category = form
            .select(&Selector::parse("input[name=category]").unwrap())
            .next()
            .expect("No category input found");
        assert!(category.value().attr("required").is_none());
    }

    #[test]
    fn date_cannot_be_in_the_future() {
        let html = Html::parse_fragment(&expense_form(date!(2025 - 03 - 10)).into_string());

        let date_input = html
            .select(&Selector::parse("input[name=date]").unwrap())
            .next()
            .unwrap();
        assert_eq!(date_input.value().attr("max"), Some("2025-03-10"));
    }

    #[test]
    fn saving_form_defaults_to_deposit() {
        let html = Html::parse_fragment(&saving_form(date!(2025 - 03 - 10)).into_string());
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::SAVINGS_API, "hx-post");
        assert_form_input(&form, "amount", "text");

        let checked = form
            .select(&Selector::parse("input[name=direction][checked]").unwrap())
            .map(|input| input.value().attr("value").unwrap_or_default().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(checked, vec!["deposit"]);
    }
}

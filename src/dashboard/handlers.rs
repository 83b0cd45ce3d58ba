//! Dashboard HTTP handler and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, BudgetConfig, Error,
    auth::{Email, UserID, get_user_by_id},
    dashboard::{
        Summary,
        charts::{build_dashboard_charts, charts_scripts, charts_view},
        summarize,
        tables::{expenses_table, savings_table, summary_table},
    },
    endpoints,
    html::{FORM_CONTAINER_STYLE, PAGE_CONTAINER_STYLE, base, euro_input_styles},
    navigation::NavBar,
    timezone::get_local_date,
    transaction::{expense_form, get_transactions_for_user, saving_form},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Rome".
    pub local_timezone: String,
    /// The expense ceiling and savings goal to summarise against.
    pub budget_config: BudgetConfig,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            budget_config: state.budget_config,
        }
    }
}

/// Display the forms for recording transactions and an overview of the user's ledger.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone)?;

    let (user, transactions) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let user = get_user_by_id(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get user {user_id}: {error}"))?;
        let transactions = get_transactions_for_user(user_id, &connection).inspect_err(
            |error| tracing::error!("could not get transactions for user {user_id}: {error}"),
        )?;

        (user, transactions)
    };

    let summary = summarize(&transactions, &state.budget_config);

    Ok(dashboard_view(&user.email, today, &summary, &state.budget_config).into_response())
}

fn forms_view(today: Date) -> Markup {
    html! {
        section id="forms" class="w-full grid grid-cols-1 md:grid-cols-2 gap-4"
        {
            div class=(FORM_CONTAINER_STYLE) { (expense_form(today)) }
            div class=(FORM_CONTAINER_STYLE) { (saving_form(today)) }
        }
    }
}

fn no_data_view() -> Markup {
    html! {
        div id="no-data" class="flex flex-col items-center text-center"
        {
            h2 class="text-xl font-bold" { "Nothing here yet..." }

            p
            {
                "Your budget summary and charts will show up here once you record
                an expense or put some money aside using the forms above."
            }
        }
    }
}

fn dashboard_view(email: &Email, today: Date, summary: &Summary, config: &BudgetConfig) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let has_data = !summary.expenses.is_empty() || !summary.savings.is_empty();
    let charts = build_dashboard_charts(summary);

    let content = html!(
        (nav_bar)

        main id="dashboard-content" class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold self-start" { "Welcome, " (email) }

            (forms_view(today))

            @if has_data {
                div class="w-full grid grid-cols-1 xl:grid-cols-2 gap-4"
                {
                    (summary_table(summary, config))
                }

                (charts_view(&charts))

                div class="w-full grid grid-cols-1 xl:grid-cols-2 gap-4"
                {
                    (expenses_table(summary))
                    (savings_table(summary))
                }
            } @else {
                (no_data_view())
            }
        }
    );

    let mut head_elements = vec![euro_input_styles()];

    if has_data {
        head_elements.extend(charts_scripts(&charts));
    }

    base("Dashboard", &head_elements, &content)
}

//! Displays the user's account details.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{User, UserID, get_user_by_id},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, PAGE_CONTAINER_STYLE, base, loading_spinner,
        phone_input,
    },
    navigation::NavBar,
};

/// The state needed for the account page and the phone number endpoint.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The database connection for reading and updating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form for setting or clearing the phone number.
///
/// Submitting an empty field removes the phone number.
pub(super) fn phone_form(phone: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            id="phone-form"
            hx-put=(endpoints::ACCOUNT_PHONE)
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#phone-indicator"
            class="w-full space-y-4"
        {
            (phone_input(phone, error_message))

            button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="phone-indicator"
                {
                    (loading_spinner())
                }
                "Save Phone Number"
            }
        }
    }
}

fn account_view(user: &User) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNT_VIEW).into_html();
    let phone = user
        .phone
        .as_ref()
        .map(|phone| phone.to_string())
        .unwrap_or_default();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class={(FORM_CONTAINER_STYLE) " max-w-md space-y-4"}
            {
                h1 class="text-xl font-bold" { "Account" }

                dl
                {
                    dt class="text-sm text-gray-500 dark:text-gray-400" { "Email" }
                    dd id="account-email" class="font-medium" { (user.email) }
                }

                (phone_form(&phone, None))
            }
        }
    );

    base("Account", &[], &content)
}

/// Display the account page of the logged in user.
pub async fn get_account_page(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_by_id(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get user {user_id}: {error}"))?
    };

    Ok(account_view(&user).into_response())
}

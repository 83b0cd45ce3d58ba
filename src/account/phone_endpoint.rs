//! Defines the endpoint for setting or clearing the user's phone number.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use maud::{PreEscaped, html};
use serde::Deserialize;

use crate::{
    Error,
    account::page::{AccountState, phone_form},
    alert::Alert,
    auth::{PhoneNumber, UserID, set_user_phone},
};

const DUPLICATE_PHONE_ERROR_MSG: &str = "This phone number is already linked to another account.";

/// The form data for updating the phone number.
#[derive(Debug, Deserialize)]
pub struct PhoneForm {
    /// The new phone number, or nothing to remove it.
    pub phone: Option<String>,
}

/// Set, change or clear the phone number of the logged in user.
///
/// Responds with the updated form and a success alert. Invalid or taken
/// numbers are shown as an error under the input.
pub async fn update_phone_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<PhoneForm>,
) -> Response {
    let raw_phone = form.phone.as_deref().map(str::trim).unwrap_or_default();

    let phone = if raw_phone.is_empty() {
        None
    } else {
        match PhoneNumber::new(raw_phone) {
            Ok(phone) => Some(phone),
            Err(error) => {
                let message = format!("Invalid phone number: {error}.");
                return phone_form(raw_phone, Some(&message)).into_response();
            }
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let user = match set_user_phone(user_id, phone.as_ref(), &connection) {
        Ok(user) => user,
        Err(Error::DuplicatePhone) => {
            return phone_form(raw_phone, Some(DUPLICATE_PHONE_ERROR_MSG)).into_response();
        }
        Err(error) => {
            tracing::error!("could not update the phone number of user {user_id}: {error}");
            return error.into_alert_response();
        }
    };

    let saved_phone = user
        .phone
        .as_ref()
        .map(|phone| phone.to_string())
        .unwrap_or_default();
    let details = match &user.phone {
        Some(phone) => format!("Your phone number is now {phone}."),
        None => "Your phone number has been removed.".to_owned(),
    };
    let alert = Alert::Success {
        message: "Phone number saved".to_owned(),
        details,
    };

    html! {
        (phone_form(&saved_phone, None))
        (PreEscaped(alert.into_html().0))
    }
    .into_response()
}

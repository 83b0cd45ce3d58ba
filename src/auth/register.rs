//! The registration page and the endpoint that creates new accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        Email, PasswordHash, PhoneNumber, ValidatedPassword, cookie::set_auth_cookie, register,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base, email_input, loading_spinner, log_in_register, password_input,
        phone_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    timezone::get_local_offset,
};

/// Client-side hint only, the server checks password strength with zxcvbn.
const PASSWORD_INPUT_MIN_LENGTH: u8 = 12;

const DUPLICATE_EMAIL_ERROR_MSG: &str =
    "An account with this email already exists, log in instead.";
const DUPLICATE_PHONE_ERROR_MSG: &str = "This phone number is already linked to another account.";
const PASSWORD_MISMATCH_ERROR_MSG: &str = "Passwords do not match";

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }
        }
    }
}

/// Error messages to show next to each field of the registration form.
#[derive(Debug, Default)]
struct RegistrationErrors {
    email: Option<String>,
    phone: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
}

fn registration_form(form: &RegisterForm, errors: &RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #phone, #password, #confirm-password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (email_input(&form.email, errors.email.as_deref()))
            (phone_input(form.phone.as_deref().unwrap_or_default(), errors.phone.as_deref()))
            (password_input(&form.password, PASSWORD_INPUT_MIN_LENGTH, errors.password.as_deref()))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password.as_deref()))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form(&RegisterForm::default(), &Default::default());
    let content = log_in_register("Create Account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Rome".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    /// Empty when the user leaves the field blank.
    pub phone: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

/// The validated contents of a [RegisterForm].
struct NewAccount {
    email: Email,
    phone: Option<PhoneNumber>,
    password: ValidatedPassword,
}

fn validate(form: &RegisterForm) -> Result<NewAccount, RegistrationErrors> {
    let mut errors = RegistrationErrors::default();

    let email = Email::new(&form.email)
        .inspect_err(|error| errors.email = Some(format!("{}.", capitalise(&error.to_string()))))
        .ok();

    let phone = match form.phone.as_deref().map(str::trim) {
        None | Some("") => Some(None),
        Some(raw_phone) => PhoneNumber::new(raw_phone)
            .inspect_err(|error| {
                errors.phone = Some(format!("{}.", capitalise(&error.to_string())));
            })
            .ok()
            .map(Some),
    };

    let password = ValidatedPassword::new(&form.password)
        .inspect_err(|error| errors.password = Some(capitalise(&error.to_string())))
        .ok();

    if form.password != form.confirm_password {
        errors.confirm_password = Some(PASSWORD_MISMATCH_ERROR_MSG.to_owned());
    }

    match (email, phone, password) {
        (Some(email), Some(phone), Some(password)) if errors.confirm_password.is_none() => {
            Ok(NewAccount {
                email,
                phone,
                password,
            })
        }
        _ => Err(errors),
    }
}

fn capitalise(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Create a new account and log the user in.
///
/// Validation problems are shown next to the offending field. On success
/// the client is sent to the dashboard.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let new_account = match validate(&form) {
        Ok(new_account) => new_account,
        Err(errors) => return registration_form(&form, &errors).into_response(),
    };

    let password_hash = match PasswordHash::new(new_account.password, PasswordHash::DEFAULT_COST)
    {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");

            return get_internal_server_error_redirect();
        }
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let registration_result = match state.db_connection.lock() {
        Ok(connection) => register(
            &new_account.email,
            password_hash,
            new_account.phone.as_ref(),
            &connection,
        ),
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    let user = match registration_result {
        Ok(user) => user,
        Err(Error::DuplicateEmail) => {
            let errors = RegistrationErrors {
                email: Some(DUPLICATE_EMAIL_ERROR_MSG.to_owned()),
                ..Default::default()
            };
            return registration_form(&form, &errors).into_response();
        }
        Err(Error::DuplicatePhone) => {
            let errors = RegistrationErrors {
                phone: Some(DUPLICATE_PHONE_ERROR_MSG.to_owned()),
                ..Default::default()
            };
            return registration_form(&form, &errors).into_response();
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");

            return get_internal_server_error_redirect();
        }
    };

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_offset) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");

            get_internal_server_error_redirect()
        }
    }
}


#[cfg(test)]
mod register_user_tests {
    use axum::{
        Form,
        body::Body,
        extract::{FromRef, State},
        http::{Response, StatusCode},
    };
    use axum_extra::extract::PrivateCookieJar;
    use scraper::{ElementRef, Html, Selector};

    use crate::{
        AppState, Email, PhoneNumber, count_users, endpoints, get_user_by_email,
        test_utils::{
            assert_hx_redirect, get_test_app_state, insert_test_user, parse_html_fragment,
        },
    };

    use super::{
        DUPLICATE_EMAIL_ERROR_MSG, PASSWORD_MISMATCH_ERROR_MSG, RegisterForm, RegistrationState,
        register_user,
    };

    const STRONG_PASSWORD: &str = "salvadanaio-di-terracotta-1987";

    fn form(email: &str, phone: &str, password: &str, confirm_password: &str) -> RegisterForm {
        RegisterForm {
            email: email.to_owned(),
            phone: Some(phone.to_owned()),
            password: password.to_owned(),
            confirm_password: confirm_password.to_owned(),
        }
    }

    async fn post_register(state: &AppState, form: RegisterForm) -> Response<Body> {
        let state = RegistrationState::from_ref(state);
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        register_user(State(state), jar, Form(form)).await
    }

    #[track_caller]
    fn error_messages(fragment: &Html) -> Vec<(String, String)> {
        fragment
            .select(&Selector::parse("p.text-red-500").unwrap())
            .map(|error| {
                let field = error
                    .parent()
                    .and_then(ElementRef::wrap)
                    .expect("error without a parent element");
                let input = field
                    .select(&Selector::parse("input").unwrap())
                    .next()
                    .expect("error without an input");
                let message = error.text().collect::<String>();

                (
                    input.value().attr("name").unwrap_or_default().to_owned(),
                    message.trim().to_owned(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn register_succeeds_and_logs_in() {
        let state = get_test_app_state();

        let response = post_register(
            &state,
            form("alice@example.com", "", STRONG_PASSWORD, STRONG_PASSWORD),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
        assert!(response.headers().contains_key("set-cookie"));

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_email(&Email::new("alice@example.com").unwrap(), &connection)
            .expect("user should be registered");
        assert_eq!(user.phone, None);
        assert!(user.password_hash.verify(STRONG_PASSWORD).unwrap());
    }

    #[tokio::test]
    async fn register_stores_normalised_phone() {
        let state = get_test_app_state();

        post_register(
            &state,
            form(
                "alice@example.com",
                "+39 333 123-4567",
                STRONG_PASSWORD,
                STRONG_PASSWORD,
            ),
        )
        .await;

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_email(&Email::new("alice@example.com").unwrap(), &connection)
            .expect("user should be registered");
        assert_eq!(user.phone, Some(PhoneNumber::new("+393331234567").unwrap()));
    }

    #[tokio::test]
    async fn register_fails_with_existing_email() {
        let state = get_test_app_state();
        insert_test_user(&state, "alice@example.com", "pw123");

        let response = post_register(
            &state,
            form("alice@example.com", "", STRONG_PASSWORD, STRONG_PASSWORD),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let fragment = parse_html_fragment(response).await;
        assert_eq!(
            error_messages(&fragment),
            vec![("email".to_owned(), DUPLICATE_EMAIL_ERROR_MSG.to_owned())]
        );
        assert_eq!(count_users(&state.db_connection.lock().unwrap()), Ok(1));
    }

    #[tokio::test]
    async fn register_fails_with_invalid_email_and_phone() {
        let state = get_test_app_state();

        let response = post_register(
            &state,
            form("alice", "call me", STRONG_PASSWORD, STRONG_PASSWORD),
        )
        .await;

        let fragment = parse_html_fragment(response).await;
        let fields = error_messages(&fragment)
            .into_iter()
            .map(|(field, _)| field)
            .collect::<Vec<_>>();
        assert_eq!(fields, vec!["email", "phone"]);
        assert_eq!(count_users(&state.db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn register_fails_when_password_is_weak() {
        let state = get_test_app_state();

        let response = post_register(&state, form("alice@example.com", "", "foo", "foo")).await;

        let fragment = parse_html_fragment(response).await;
        let errors = error_messages(&fragment);
        assert_eq!(errors.len(), 1, "want 1 error, got {errors:?}");
        assert_eq!(errors[0].0, "password");
        assert!(
            errors[0].1.to_lowercase().contains("password is too weak"),
            "'{}' does not contain the text 'password is too weak'",
            errors[0].1
        );
    }

    #[tokio::test]
    async fn register_fails_when_passwords_do_not_match() {
        let state = get_test_app_state();

        let response = post_register(
            &state,
            form(
                "alice@example.com",
                "",
                STRONG_PASSWORD,
                "thisisadifferentpassword",
            ),
        )
        .await;

        let fragment = parse_html_fragment(response).await;
        assert_eq!(
            error_messages(&fragment),
            vec![(
                "confirm_password".to_owned(),
                PASSWORD_MISMATCH_ERROR_MSG.to_owned()
            )]
        );
    }
}

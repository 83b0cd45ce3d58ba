//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};

use crate::{
    AppState,
    account::{get_account_page, update_phone_endpoint},
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{create_expense_endpoint, create_saving_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::ACCOUNT_VIEW, get(get_account_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::EXPENSES_API, post(create_expense_endpoint))
            .route(endpoints::SAVINGS_API, post(create_saving_endpoint))
            .route(endpoints::ACCOUNT_PHONE, put(update_phone_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}


#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_htmx::HX_REDIRECT;
    use axum_test::TestServer;

    use crate::{
        build_router, endpoints, get_transactions_for_user,
        test_utils::{get_test_app_state, insert_test_user},
    };

    fn get_server() -> (TestServer, crate::AppState) {
        let state = get_test_app_state();
        let server =
            TestServer::try_new(build_router(state.clone())).expect("could not create test server");

        (server, state)
    }

    #[tokio::test]
    async fn protected_pages_redirect_to_log_in() {
        let (server, _) = get_server();

        for page in [endpoints::ROOT, endpoints::DASHBOARD_VIEW, endpoints::ACCOUNT_VIEW] {
            let response = server.get(page).await;

            response.assert_status(StatusCode::SEE_OTHER);
            let location = response.header("location");
            let location = location.to_str().unwrap();
            assert!(
                location.starts_with(endpoints::LOG_IN_VIEW),
                "{page} redirected to {location}"
            );
        }
    }

    #[tokio::test]
    async fn protected_api_responds_with_hx_redirect() {
        let (server, _) = get_server();

        let response = server
            .post(endpoints::EXPENSES_API)
            .form(&[("date", "2025-01-01"), ("amount", "10")])
            .await;

        let location = response.header(HX_REDIRECT);
        assert!(location.to_str().unwrap().starts_with(endpoints::LOG_IN_VIEW));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (server, _) = get_server();

        server
            .get("/does/not/exist")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn log_in_then_record_expense() {
        let (server, state) = get_server();
        let user = insert_test_user(&state, "alice@example.com", "pw123");

        let log_in_response = server
            .post(endpoints::LOG_IN_API)
            .form(&[("email", "alice@example.com"), ("password", "pw123")])
            .await;
        log_in_response.assert_status(StatusCode::SEE_OTHER);
        let cookies = log_in_response.cookies();

        server
            .post(endpoints::EXPENSES_API)
            .add_cookies(cookies.clone())
            .form(&[
                ("date", "2025-01-01"),
                ("amount", "12,50"),
                ("category", "cibo"),
            ])
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let dashboard = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookies(cookies)
            .await;
        dashboard.assert_status_ok();
        assert!(dashboard.text().contains("12,50 €"));

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_transactions_for_user(user.id, &connection).unwrap().len(), 1);
    }
}

//! Alert fragments for showing success and error messages after htmx requests.
//!
//! Alerts are swapped into the `#alert-container` element that [crate::html::base]
//! places at the bottom of every page.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// A message shown to the user in a dismissable box.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The request succeeded.
    Success {
        /// The headline of the alert.
        message: String,
        /// Extra details shown below the headline.
        details: String,
    },
    /// The request failed.
    Error {
        /// The headline of the alert.
        message: String,
        /// Extra details shown below the headline, e.g. how to fix the problem.
        details: String,
    },
}

impl Alert {
    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }

    fn into_markup(self) -> Markup {
        let (message, details, container_style, title) = match self {
            Alert::Success { message, details } => (
                message,
                details,
                "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
                dark:bg-gray-800 dark:text-green-400 border border-green-300 \
                dark:border-green-800",
                "Success",
            ),
            Alert::Error { message, details } => (
                message,
                details,
                "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
                dark:bg-gray-800 dark:text-red-400 border border-red-300 \
                dark:border-red-800",
                "Error",
            ),
        };

        // Adapted from https://flowbite.com/docs/components/alerts/
        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(container_style) role="alert"
                {
                    div class="flex items-center justify-between"
                    {
                        span class="sr-only" { (title) }
                        p class="font-medium" { (message) }

                        button
                            type="button"
                            class="ms-4 font-bold"
                            aria-label="Close"
                            onclick="this.closest('#alert-container').classList.add('hidden')"
                        {
                            "×"
                        }
                    }

                    @if !details.is_empty() {
                        p class="mt-1" { (details) }
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

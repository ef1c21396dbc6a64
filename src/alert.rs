//! Alert fragments for displaying success and error messages to users.

use maud::{Markup, html};

/// A success or error message rendered into the page's alert container.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// An operation completed, with optional extra details.
    Success {
        /// The headline of the alert.
        message: String,
        /// Extra context shown below the headline.
        details: String,
    },
    /// An operation failed, with extra details.
    Error {
        /// The headline of the alert.
        message: String,
        /// Extra context shown below the headline.
        details: String,
    },
}

impl Alert {
    /// Create a new success alert.
    pub fn success(message: &str, details: &str) -> Self {
        Self::Success {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new error alert.
    pub fn error(message: &str, details: &str) -> Self {
        Self::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new error alert without details.
    pub fn error_simple(message: &str) -> Self {
        Self::error(message, "")
    }

    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::Success { message, details } => (
                "p-4 mb-4 rounded-lg bg-green-50 text-green-800 \
                 dark:bg-gray-800 dark:text-green-400",
                message,
                details,
            ),
            Alert::Error { message, details } => (
                "p-4 mb-4 rounded-lg bg-red-50 text-red-800 \
                 dark:bg-gray-800 dark:text-red-400",
                message,
                details,
            ),
        };

        html! {
            div class=(container_style) role="alert"
            {
                p class="text-sm font-medium" { (message) }

                @if !details.is_empty()
                {
                    p class="mt-1 text-sm opacity-80" { (details) }
                }
            }
        }
    }
}

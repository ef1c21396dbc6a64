//! The API endpoint URIs.

/// The ledger page, the landing page for logged in users.
pub const ROOT: &str = "/";
/// The page showing the monthly bar and pie chart summary.
pub const SUMMARY_VIEW: &str = "/summary";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for logging out and returning to the log in page.
pub const LOG_OUT_VIEW: &str = "/log_out";

/// The form endpoint for creating (POST) and resetting (DELETE) the ledger's
/// transactions.
pub const LEDGER_TRANSACTIONS: &str = "/ledger/transactions";
/// The endpoint for downloading the ledger as a JSON file.
pub const LEDGER_EXPORT: &str = "/ledger/export";
/// The endpoint for uploading a JSON file into the ledger.
pub const LEDGER_IMPORT: &str = "/ledger/import";

/// The route for creating an account.
pub const SIGNUP_API: &str = "/api/auth/signup";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/auth/login";
/// The route for the client to log out the current user.
pub const LOG_OUT_API: &str = "/api/auth/logout";
/// The route for checking who is logged in.
pub const ME_API: &str = "/api/auth/me";
/// The route to list, create and bulk delete transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";

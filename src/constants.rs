//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Default base URL of the SnackHub REST API
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "SNACKHUB_API_URL";

/// Interval between two payment status checks
pub const PAYMENT_POLL_INTERVAL_MS: u64 = 3_000;

/// Per-request timeout
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Directory (under the home dir) holding session and config files
pub const APP_DIR: &str = ".snackhub";

pub const SESSION_FILE: &str = "session.yaml";

pub const CONFIG_FILE: &str = "config.yaml";

pub const LOG_FILE: &str = "snackhub.log";

/// Number of cells in the password-reset OTP input
pub const OTP_LENGTH: usize = 6;

/// Page size used by search screens
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Application name
pub const APP_NAME: &str = "SnackHub";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

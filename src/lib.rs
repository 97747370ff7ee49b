//! # SnackHub client
//!
//! Client for the SnackHub snack-place discovery and merchant API.
//!
//! ## Features
//! - Sign in, registration and OTP password reset
//! - Merchant onboarding: snack places, dishes and catalogs
//! - Premium packages paid by QR code, with payment confirmation polling
//! - Reviews and replies
//! - Food assistant questions and logo generation
//!
//! ## Architecture
//! Actor-based with channels:
//! - Front end (stdin line commands)
//! - App Layer (State machine)
//! - Network Layer (Tokio runtime)

pub mod api;
pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod messages;
pub mod models;
pub mod network;
pub mod otp;
pub mod storage;
pub mod ui;
pub mod validation;

// Re-export commonly used types
pub use api::{dispatch, ApiCall, ApiReply};
pub use app::{AppActor, AppState, PaymentFlow, PaymentPhase};
pub use config::Config;
pub use error::ApiError;
pub use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
pub use network::{ApiClient, NetworkActor, Notice, NoticeLevel, NotifyPolicy};
pub use storage::{Session, Storage};
pub use validation::ValidationError;

//! Network layer - API call execution and payment polling
//!
//! The Network actor receives call/poll commands and sends back responses.

pub mod actor;
pub mod client;
pub mod poller;

pub use actor::NetworkActor;
pub use client::{ApiClient, Notice, NoticeLevel, NotifyPolicy};

//! Per-resource API functions. Each issues exactly one HTTP call
//! (the onboarding catalog issues four in parallel) and returns a typed DTO.

pub mod assistant;
pub mod calls;
pub mod catalog;
pub mod dishes;
pub mod merchants;
pub mod packages;
pub mod payments;
pub mod reviews;
pub mod snack_places;
pub mod users;

pub use calls::{dispatch, ApiCall, ApiReply};

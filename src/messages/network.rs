//! Network messages - communication between App and Network layers

use crate::api::{ApiCall, ApiReply};
use crate::models::PaymentStatus;
use crate::network::client::Notice;

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Run one API call
    Execute { id: u64, call: ApiCall },
    /// Replace the bearer token used by every subsequent call
    SetToken(Option<String>),
    /// Start polling a payment's status
    StartPaymentPoll { id: u64, payment_id: String },
    /// Stop a running poll (screen unmounted)
    StopPaymentPoll(u64),
    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    /// An API call finished
    Completed {
        id: u64,
        reply: ApiReply,
        time_ms: u64,
    },
    /// An API call failed; the message is what the user sees
    Failed {
        id: u64,
        message: String,
        unauthorized: bool,
        time_ms: u64,
    },
    /// One status check of a running poll
    PaymentStatus {
        id: u64,
        status: PaymentStatus,
        attempt: u32,
    },
    /// A poll stopped on a failed check
    PollFailed { id: u64, message: String },
    /// Toast-style message raised by the client layer
    Notice(Notice),
}

impl NetworkResponse {
    /// Get the request ID from the response
    pub fn id(&self) -> Option<u64> {
        match self {
            NetworkResponse::Completed { id, .. }
            | NetworkResponse::Failed { id, .. }
            | NetworkResponse::PaymentStatus { id, .. }
            | NetworkResponse::PollFailed { id, .. } => Some(*id),
            NetworkResponse::Notice(_) => None,
        }
    }

    /// Check if this is a terminal response (no more messages expected for this id)
    pub fn is_terminal(&self) -> bool {
        match self {
            NetworkResponse::Completed { .. }
            | NetworkResponse::Failed { .. }
            | NetworkResponse::PollFailed { .. } => true,
            NetworkResponse::PaymentStatus { status, .. } => status.paid,
            NetworkResponse::Notice(_) => false,
        }
    }
}

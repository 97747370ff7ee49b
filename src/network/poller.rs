//! Payment confirmation polling
//!
//! One status check right away, then one per interval, until the server
//! reports `paid = true` or a check fails. There is no retry: a failed check
//! ends the poll and the screen has to mount again to start a new one.

use std::time::Duration;

use futures_util::stream::{self, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::api::payments;
use crate::error::ApiError;
use crate::messages::NetworkResponse;
use crate::models::PaymentStatus;
use crate::network::client::ApiClient;

struct PollState {
    client: ApiClient,
    payment_id: String,
    ticker: Interval,
    finished: bool,
}

/// Stream of status checks for one payment.
///
/// Yields every check result and ends right after the first `paid = true`
/// or the first error.
pub fn payment_status_stream(
    client: ApiClient,
    payment_id: String,
    every: Duration,
) -> impl Stream<Item = Result<PaymentStatus, ApiError>> {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let state = PollState {
        client: client.silent(),
        payment_id,
        ticker,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        // The first tick completes immediately.
        state.ticker.tick().await;
        let result = payments::check_status(&state.client, &state.payment_id).await;
        state.finished = match &result {
            Ok(status) => status.paid,
            Err(_) => true,
        };
        Some((result, state))
    })
}

/// Drive a poll for the network actor, reporting each check on `response_tx`.
/// Stops early when `cancel_rx` fires (the payment screen unmounted).
pub async fn run_payment_poll(
    client: ApiClient,
    id: u64,
    payment_id: String,
    every: Duration,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let checks = payment_status_stream(client, payment_id.clone(), every);
    tokio::pin!(checks);
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;

            _ = &mut cancel_rx => {
                tracing::info!(id, payment_id = %payment_id, "Payment poll cancelled");
                return;
            }
            next = checks.next() => {
                match next {
                    Some(Ok(status)) => {
                        attempt += 1;
                        tracing::info!(id, payment_id = %payment_id, attempt, paid = status.paid, "Payment status checked");
                        let _ = response_tx.send(NetworkResponse::PaymentStatus {
                            id,
                            status,
                            attempt,
                        });
                    }
                    Some(Err(e)) => {
                        tracing::warn!(id, payment_id = %payment_id, error = %e, "Payment poll stopped");
                        let _ = response_tx.send(NetworkResponse::PollFailed {
                            id,
                            message: e.user_message(),
                        });
                        return;
                    }
                    None => return,
                }
            }
        }
    }
}

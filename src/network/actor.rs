//! Network actor - runs API calls and payment polls in the Tokio runtime

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::api::dispatch;
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::network::client::{ApiClient, Notice};
use crate::network::poller::run_payment_poll;

/// Tracks a running payment poll for cancellation
struct ActivePoll {
    cancel_tx: oneshot::Sender<()>,
}

/// Network actor that processes API call and polling commands
pub struct NetworkActor {
    client: ApiClient,
    poll_interval: Duration,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    notice_rx: mpsc::UnboundedReceiver<Notice>,
    active_tasks: JoinSet<()>,
    polls: HashMap<u64, ActivePoll>,
}

impl NetworkActor {
    pub fn new(
        client: ApiClient,
        poll_interval: Duration,
        response_tx: mpsc::UnboundedSender<NetworkResponse>,
    ) -> Self {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        NetworkActor {
            client: client.with_notices(notice_tx),
            poll_interval,
            response_tx,
            notice_rx,
            active_tasks: JoinSet::new(),
            polls: HashMap::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                // Handle incoming commands
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::Execute { id, call }) => {
                            let response_tx = self.response_tx.clone();
                            let client = self.client.clone();

                            self.active_tasks.spawn(async move {
                                let name = call.name();
                                tracing::info!(id, call = name, "Executing call");
                                let start = Instant::now();
                                let result = dispatch(&client, call).await;
                                let time_ms = start.elapsed().as_millis() as u64;

                                let response = match result {
                                    Ok(reply) => NetworkResponse::Completed { id, reply, time_ms },
                                    Err(e) => {
                                        tracing::warn!(id, call = name, error = %e, "Call failed");
                                        NetworkResponse::Failed {
                                            id,
                                            message: e.user_message(),
                                            unauthorized: e.is_unauthorized(),
                                            time_ms,
                                        }
                                    }
                                };
                                let _ = response_tx.send(response);
                            });
                        }

                        Some(NetworkCommand::SetToken(token)) => {
                            tracing::info!(signed_in = token.is_some(), "Session token updated");
                            self.client.set_token(token);
                        }

                        Some(NetworkCommand::StartPaymentPoll { id, payment_id }) => {
                            let (cancel_tx, cancel_rx) = oneshot::channel();
                            if let Some(previous) = self.polls.insert(id, ActivePoll { cancel_tx }) {
                                let _ = previous.cancel_tx.send(());
                            }

                            tracing::info!(id, payment_id = %payment_id, "Starting payment poll");
                            self.active_tasks.spawn(run_payment_poll(
                                self.client.clone(),
                                id,
                                payment_id,
                                self.poll_interval,
                                self.response_tx.clone(),
                                cancel_rx,
                            ));
                        }

                        Some(NetworkCommand::StopPaymentPoll(id)) => {
                            if let Some(poll) = self.polls.remove(&id) {
                                tracing::info!(id, "Stopping payment poll");
                                let _ = poll.cancel_tx.send(());
                            }
                        }

                        Some(NetworkCommand::Shutdown) => {
                            for (_, poll) in self.polls.drain() {
                                let _ = poll.cancel_tx.send(());
                            }
                            break;
                        }

                        None => break,
                    }
                }

                // Forward client notices
                Some(notice) = self.notice_rx.recv() => {
                    let _ = self.response_tx.send(NetworkResponse::Notice(notice));
                }

                // Clean up completed tasks
                Some(_result) = self.active_tasks.join_next() => {
                    // Finished polls leave a closed cancel channel behind
                    self.polls.retain(|_, poll| !poll.cancel_tx.is_closed());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiCall, ApiReply};
    use crate::config::Config;
    use httpmock::prelude::*;
    use serde_json::json;

    fn spawn_actor(server: &MockServer) -> (
        mpsc::UnboundedSender<NetworkCommand>,
        mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        let client = ApiClient::new(&Config {
            api_base_url: server.base_url(),
            ..Config::default()
        });
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();
        let actor = NetworkActor::new(client, Duration::from_millis(10), resp_tx);
        tokio::spawn(actor.run(cmd_rx));
        (cmd_tx, resp_rx)
    }

    #[tokio::test]
    async fn test_execute_uses_token_and_reports_reply() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/payments/history")
                .header("authorization", "Bearer tok-9");
            then.status(200).json_body(json!({"status": 200, "data": []}));
        });

        let (cmd_tx, mut resp_rx) = spawn_actor(&server);
        cmd_tx.send(NetworkCommand::SetToken(Some("tok-9".into()))).unwrap();
        cmd_tx
            .send(NetworkCommand::Execute { id: 3, call: ApiCall::PaymentHistory })
            .unwrap();

        match resp_rx.recv().await.unwrap() {
            NetworkResponse::Completed { id, reply: ApiReply::Payments(list), .. } => {
                assert_eq!(id, 3);
                assert!(list.is_empty());
            }
            other => panic!("unexpected response: {:?}", other),
        }
        mock.assert();
        cmd_tx.send(NetworkCommand::Shutdown).unwrap();
    }

    #[tokio::test]
    async fn test_failures_forward_notice_and_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/premium-packages/nope");
            then.status(404)
                .json_body(json!({"status": 404, "message": "Package not found"}));
        });

        let (cmd_tx, mut resp_rx) = spawn_actor(&server);
        cmd_tx
            .send(NetworkCommand::Execute { id: 1, call: ApiCall::GetPackage("nope".into()) })
            .unwrap();

        let mut saw_notice = false;
        let mut saw_failure = false;
        while !(saw_notice && saw_failure) {
            match resp_rx.recv().await.unwrap() {
                NetworkResponse::Notice(notice) => {
                    assert_eq!(notice, Notice::error("Package not found"));
                    saw_notice = true;
                }
                NetworkResponse::Failed { id, message, unauthorized, .. } => {
                    assert_eq!(id, 1);
                    assert_eq!(message, "Package not found");
                    assert!(!unauthorized);
                    saw_failure = true;
                }
                other => panic!("unexpected response: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_stop_poll_cancels() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/payments/pay-1/status");
            then.status(200)
                .json_body(json!({"status": 200, "data": {"paid": false}}));
        });

        let (cmd_tx, mut resp_rx) = spawn_actor(&server);
        cmd_tx
            .send(NetworkCommand::StartPaymentPoll { id: 5, payment_id: "pay-1".into() })
            .unwrap();

        assert!(matches!(
            resp_rx.recv().await.unwrap(),
            NetworkResponse::PaymentStatus { id: 5, .. }
        ));
        cmd_tx.send(NetworkCommand::StopPaymentPoll(5)).unwrap();
        cmd_tx.send(NetworkCommand::Shutdown).unwrap();

        // Drain whatever was in flight; the channel closes once the actor and poll are gone.
        while let Some(resp) = resp_rx.recv().await {
            assert!(matches!(resp, NetworkResponse::PaymentStatus { id: 5, .. }));
        }
    }
}

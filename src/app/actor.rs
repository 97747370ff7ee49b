//! App actor - message loop processing UI events and network responses

use tokio::sync::mpsc;

use crate::app::state::AppState;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        state: AppState,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state,
            network_tx,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        let startup = self.state.on_start();
        self.send(startup);
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = net_rx.recv() => {
                    let cmds = self.state.handle_response(response);
                    self.send(cmds);
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                else => break,
            }
        }
    }

    fn send(&self, cmds: Vec<NetworkCommand>) {
        for cmd in cmds {
            if self.network_tx.send(cmd).is_err() {
                tracing::warn!("Network actor is gone, dropping command");
                return;
            }
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        let state = &mut self.state;
        let cmds = match event {
            // Navigation
            UiEvent::Open(screen) => state.navigate(screen),
            UiEvent::Back => state.back(),

            // Account
            UiEvent::Login { email, password } => state.login(email, password, false),
            UiEvent::MerchantLogin { email, password } => state.login(email, password, true),
            UiEvent::Register {
                username,
                email,
                password,
                confirmation,
            } => state.register(username, email, password, confirmation),
            UiEvent::ForgotPassword { email } => state.forgot_password(email),
            UiEvent::OtpKey(key) => {
                state.otp_key(key);
                Vec::new()
            }
            UiEvent::OtpBackspace => {
                state.otp_backspace();
                Vec::new()
            }
            UiEvent::SubmitOtp => state.submit_otp(),
            UiEvent::ResetPassword {
                password,
                confirmation,
            } => state.reset_password(password, confirmation),
            UiEvent::Logout => state.logout(),
            UiEvent::RefreshSession => state.refresh_session(),

            // Profile
            UiEvent::ShowProfile => state.show_profile(),
            UiEvent::UpdateProfile(request) => state.update_profile(request),
            UiEvent::ChangePassword {
                old_password,
                new_password,
                confirmation,
            } => state.change_password(old_password, new_password, confirmation),

            // Merchant
            UiEvent::StartOnboarding => state.start_onboarding(),
            UiEvent::CreatePlace(request) => state.create_place(request),
            UiEvent::UpdatePlace(request) => state.update_place(request),
            UiEvent::ShowPlace(id) => state.show_place(id),
            UiEvent::AddDish {
                name,
                price,
                description,
            } => state.add_dish(name, price, description),
            UiEvent::UpdateDish { id, request } => state.update_dish(id, request),
            UiEvent::ListDishes => state.list_dishes(),
            UiEvent::SearchCatalog { kind, name } => state.search_catalog(kind, name),

            // Premium
            UiEvent::ShowPackages { name } => state.show_packages(name),
            UiEvent::ShowPackage(id) => state.show_package(id),
            UiEvent::BuyPackage(id) => state.buy_package(id),
            UiEvent::ResumePayment => state.resume_payment(),
            UiEvent::FinishPayment => state.finish_payment(),
            UiEvent::PaymentHistory => state.payment_history(),

            // Reviews
            UiEvent::ShowReviews(place_id) => state.show_reviews(place_id),
            UiEvent::AddReview {
                snack_place_id,
                rating,
                comment,
            } => state.add_review(snack_place_id, rating, comment),
            UiEvent::ShowReplies(review_id) => state.show_replies(review_id),
            UiEvent::AddReply { review_id, comment } => state.add_reply(review_id, comment),

            // Assistant
            UiEvent::Ask(question) => state.ask(question),
            UiEvent::GenerateLogo { prompt } => state.generate_logo(prompt),

            // Help is printed by the front end
            UiEvent::Help => Vec::new(),
            UiEvent::Quit => return true,
        };

        self.send(cmds);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ui_events::Screen;
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_quit_shuts_down_network() {
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (_net_tx, net_rx) = mpsc::unbounded_channel();
        let (network_tx, mut network_rx) = mpsc::unbounded_channel();
        let (render_tx, mut render_rx) = mpsc::unbounded_channel();

        let actor = AppActor::new(AppState::new(Storage::in_memory()), network_tx, render_tx);
        let handle = tokio::spawn(actor.run(ui_rx, net_rx));

        let first = render_rx.recv().await.unwrap();
        assert_eq!(first.screen, Screen::Welcome);

        ui_tx
            .send(UiEvent::Login {
                email: "linh@example.com".into(),
                password: "banhmi2024".into(),
            })
            .unwrap();
        let render = render_rx.recv().await.unwrap();
        assert!(render.is_loading);
        assert!(matches!(
            network_rx.recv().await,
            Some(NetworkCommand::Execute { .. })
        ));

        ui_tx.send(UiEvent::Quit).unwrap();
        handle.await.unwrap();
        assert!(matches!(network_rx.recv().await, Some(NetworkCommand::Shutdown)));
    }
}

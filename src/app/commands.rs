//! Command handlers - business logic for processing UI events and network responses

use chrono::Utc;

use crate::api::{ApiCall, ApiReply};
use crate::app::payment::{PaymentFlow, PaymentPhase};
use crate::app::state::ResetState;
use crate::app::AppState;
use crate::messages::ui_events::Screen;
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::*;
use crate::validation::{self, ValidationError};

impl AppState {
    // ========================
    // Startup
    // ========================

    /// Commands to run once at launch: restore the token, refresh it when
    /// expired, and reload the user.
    pub fn on_start(&mut self) -> Vec<NetworkCommand> {
        let session = self.storage.session().clone();
        let Some(token) = session.access_token else {
            return Vec::new();
        };

        let mut cmds = vec![NetworkCommand::SetToken(Some(token))];
        match session.refresh_token {
            Some(refresh) if self.storage.access_token_expired(Utc::now()) => {
                self.refresh_attempted = true;
                cmds.push(self.call(ApiCall::RefreshToken(refresh)));
            }
            _ => cmds.push(self.call(ApiCall::CurrentUser)),
        }
        if session.pending_payment_id.is_some() {
            self.info = Some("You have an unfinished payment, type 'resume-payment'".into());
        }
        cmds
    }

    // ========================
    // Requests
    // ========================

    /// Register a call as in flight and wrap it in a command
    pub fn call(&mut self, call: ApiCall) -> NetworkCommand {
        let id = self.next_id();
        self.in_flight.insert(id, call.name());
        NetworkCommand::Execute { id, call }
    }

    fn invalid(&mut self, err: ValidationError) -> Vec<NetworkCommand> {
        self.error = Some(err.to_string());
        Vec::new()
    }

    fn refuse(&mut self, message: &str) -> Vec<NetworkCommand> {
        self.error = Some(message.to_string());
        Vec::new()
    }

    pub fn clear_feedback(&mut self) {
        self.error = None;
        self.info = None;
    }

    // ========================
    // Navigation
    // ========================

    /// Move to another screen, unmounting the current one
    pub fn navigate(&mut self, screen: Screen) -> Vec<NetworkCommand> {
        if !screen.is_public() && !self.signed_in() {
            self.error = Some("Please sign in first".into());
            return self.navigate(Screen::Login);
        }
        if screen == self.screen {
            return Vec::new();
        }

        let mut cmds = self.unmount_current();
        self.history.push(self.screen);
        self.screen = screen;
        cmds.extend(self.start_poll());
        cmds
    }

    /// Replace the whole stack, e.g. after login or logout
    fn reset_to(&mut self, screen: Screen) -> Vec<NetworkCommand> {
        let cmds = self.unmount_current();
        self.history.clear();
        self.screen = screen;
        cmds
    }

    pub fn back(&mut self) -> Vec<NetworkCommand> {
        match self.history.pop() {
            Some(previous) => {
                let mut cmds = self.unmount_current();
                self.screen = previous;
                cmds.extend(self.start_poll());
                cmds
            }
            None => Vec::new(),
        }
    }

    fn unmount_current(&mut self) -> Vec<NetworkCommand> {
        if self.screen != Screen::Payment {
            return Vec::new();
        }
        let poll = self.payment.as_mut().and_then(PaymentFlow::unmount);
        if self
            .payment
            .as_ref()
            .map(|flow| flow.phase == PaymentPhase::Done)
            .unwrap_or(false)
        {
            self.payment = None;
        }
        poll.map(NetworkCommand::StopPaymentPoll).into_iter().collect()
    }

    // ========================
    // Account
    // ========================

    pub fn login(&mut self, email: String, password: String, merchant: bool) -> Vec<NetworkCommand> {
        self.clear_feedback();
        if let Err(e) = validation::validate_login(&email, &password) {
            return self.invalid(e);
        }
        let request = LoginRequest {
            email: email.trim().to_string(),
            password,
        };
        let call = if merchant {
            ApiCall::MerchantLogin(request)
        } else {
            ApiCall::Login(request)
        };
        vec![self.call(call)]
    }

    pub fn register(
        &mut self,
        username: String,
        email: String,
        password: String,
        confirmation: String,
    ) -> Vec<NetworkCommand> {
        self.clear_feedback();
        if let Err(e) = validation::validate_registration(&username, &email, &password, &confirmation) {
            return self.invalid(e);
        }
        vec![self.call(ApiCall::CreateUser(CreateUserRequest {
            username,
            email: email.trim().to_string(),
            password,
            full_name: None,
        }))]
    }

    pub fn forgot_password(&mut self, email: String) -> Vec<NetworkCommand> {
        self.clear_feedback();
        if let Err(e) = validation::validate_email(&email) {
            return self.invalid(e);
        }
        let email = email.trim().to_string();
        self.reset = ResetState {
            email: Some(email.clone()),
            ..Default::default()
        };
        let mut cmds = self.navigate(Screen::ForgotPassword);
        cmds.push(self.call(ApiCall::ForgotPassword { email }));
        cmds
    }

    /// Non-digit keys are dropped by the OTP input
    pub fn otp_key(&mut self, key: char) {
        if !self.reset.otp.input(key) {
            tracing::debug!(key = %key, "Ignoring non-digit OTP key");
        }
    }

    pub fn otp_backspace(&mut self) {
        self.reset.otp.backspace();
    }

    pub fn submit_otp(&mut self) -> Vec<NetworkCommand> {
        self.clear_feedback();
        let Some(email) = self.reset.email.clone() else {
            return self.refuse("Request a code with 'forgot <email>' first");
        };
        match self.reset.otp.code() {
            Ok(otp) => vec![self.call(ApiCall::VerifyOtp { email, otp })],
            Err(e) => self.invalid(e),
        }
    }

    pub fn reset_password(&mut self, password: String, confirmation: String) -> Vec<NetworkCommand> {
        self.clear_feedback();
        let (Some(email), true) = (self.reset.email.clone(), self.reset.otp_verified) else {
            return self.refuse("Verify the code from your email first");
        };
        if let Err(e) = validation::validate_password_confirmation(&password, &confirmation) {
            return self.invalid(e);
        }
        let otp = match self.reset.otp.code() {
            Ok(otp) => otp,
            Err(e) => return self.invalid(e),
        };
        vec![self.call(ApiCall::ResetPassword(ResetPasswordRequest {
            email,
            otp,
            new_password: password,
        }))]
    }

    /// Drop every session key and return to the welcome screen
    pub fn logout(&mut self) -> Vec<NetworkCommand> {
        let mut cmds = self.reset_to(Screen::Welcome);
        if let Some(poll) = self.payment.as_mut().and_then(PaymentFlow::unmount) {
            cmds.push(NetworkCommand::StopPaymentPoll(poll));
        }
        if let Err(e) = self.storage.logout() {
            tracing::warn!(error = %e, "Failed to remove session file");
        }
        cmds.push(NetworkCommand::SetToken(None));

        self.clear_feedback();
        self.user = None;
        self.reset = ResetState::default();
        self.place = None;
        self.dishes.clear();
        self.catalog = OnboardingCatalog::default();
        self.catalog_search = None;
        self.package = None;
        self.payment = None;
        self.payments.clear();
        self.reviews_place_id = None;
        self.reviews.clear();
        self.replies = None;
        self.answer = None;
        self.logo_url = None;
        self.refresh_attempted = false;
        self.info = Some("Signed out".into());
        cmds
    }

    pub fn refresh_session(&mut self) -> Vec<NetworkCommand> {
        match self.storage.session().refresh_token.clone() {
            Some(token) => vec![self.call(ApiCall::RefreshToken(token))],
            None => self.refuse("Not signed in"),
        }
    }

    // ========================
    // Profile
    // ========================

    pub fn show_profile(&mut self) -> Vec<NetworkCommand> {
        let mut cmds = self.navigate(Screen::Profile);
        if self.screen == Screen::Profile {
            cmds.push(self.call(ApiCall::CurrentUser));
        }
        cmds
    }

    pub fn update_profile(&mut self, request: UpdateUserRequest) -> Vec<NetworkCommand> {
        self.clear_feedback();
        let Some(id) = self.storage.session().user_id.clone() else {
            return self.refuse("Please sign in first");
        };
        if let Some(phone) = &request.phone {
            if let Err(e) = validation::validate_phone(phone) {
                return self.invalid(e);
            }
        }
        vec![self.call(ApiCall::UpdateUser { id, request })]
    }

    pub fn change_password(
        &mut self,
        old_password: String,
        new_password: String,
        confirmation: String,
    ) -> Vec<NetworkCommand> {
        self.clear_feedback();
        if let Err(e) = validation::require("Current password", &old_password)
            .and_then(|_| validation::validate_password_confirmation(&new_password, &confirmation))
        {
            return self.invalid(e);
        }
        vec![self.call(ApiCall::ChangePassword(ChangePasswordRequest {
            old_password,
            new_password,
        }))]
    }

    // ========================
    // Merchant
    // ========================

    pub fn start_onboarding(&mut self) -> Vec<NetworkCommand> {
        let mut cmds = self.navigate(Screen::Onboarding);
        if self.screen == Screen::Onboarding {
            cmds.push(self.call(ApiCall::LoadOnboardingCatalog));
        }
        cmds
    }

    pub fn create_place(&mut self, request: CreateSnackPlaceRequest) -> Vec<NetworkCommand> {
        self.clear_feedback();
        vec![self.call(ApiCall::CreateSnackPlace(request))]
    }

    pub fn update_place(&mut self, request: UpdateSnackPlaceRequest) -> Vec<NetworkCommand> {
        self.clear_feedback();
        let Some(id) = self.place.as_ref().map(|p| p.id.clone()) else {
            return self.refuse("Load your snack place first with 'place'");
        };
        vec![self.call(ApiCall::UpdateSnackPlace { id, request })]
    }

    pub fn show_place(&mut self, id: Option<String>) -> Vec<NetworkCommand> {
        let mut cmds = self.navigate(Screen::MyPlace);
        if self.screen == Screen::MyPlace {
            let call = match id {
                Some(id) => ApiCall::GetSnackPlace(id),
                None => ApiCall::MySnackPlace,
            };
            cmds.push(self.call(call));
        }
        cmds
    }

    pub fn add_dish(&mut self, name: String, price: f64, description: Option<String>) -> Vec<NetworkCommand> {
        self.clear_feedback();
        let Some(snack_place_id) = self.place.as_ref().map(|p| p.id.clone()) else {
            return self.refuse("Load your snack place first with 'place'");
        };
        if let Err(e) = validation::require("Dish name", &name).and_then(|_| validation::validate_price(price)) {
            return self.invalid(e);
        }
        vec![self.call(ApiCall::CreateDish(CreateDishRequest {
            snack_place_id,
            name,
            description,
            price,
            image: None,
        }))]
    }

    pub fn update_dish(&mut self, id: String, request: UpdateDishRequest) -> Vec<NetworkCommand> {
        self.clear_feedback();
        vec![self.call(ApiCall::UpdateDish { id, request })]
    }

    pub fn list_dishes(&mut self) -> Vec<NetworkCommand> {
        let Some(snack_place_id) = self.place.as_ref().map(|p| p.id.clone()) else {
            return self.refuse("Load your snack place first with 'place'");
        };
        let mut cmds = self.navigate(Screen::Dishes);
        if self.screen == Screen::Dishes {
            cmds.push(self.call(ApiCall::ListDishes { snack_place_id }));
        }
        cmds
    }

    pub fn search_catalog(&mut self, kind: CatalogKind, name: Option<String>) -> Vec<NetworkCommand> {
        let query = SearchQuery {
            name,
            ..Default::default()
        };
        vec![self.call(ApiCall::SearchCatalog { kind, query })]
    }

    // ========================
    // Premium & payment
    // ========================

    pub fn show_packages(&mut self, name: Option<String>) -> Vec<NetworkCommand> {
        let mut cmds = self.navigate(Screen::Packages);
        if self.screen == Screen::Packages {
            let query = SearchQuery {
                name,
                ..Default::default()
            };
            cmds.push(self.call(ApiCall::SearchPackages(query)));
        }
        cmds
    }

    pub fn show_package(&mut self, id: String) -> Vec<NetworkCommand> {
        let mut cmds = self.navigate(Screen::PackageDetail);
        if self.screen == Screen::PackageDetail {
            cmds.push(self.call(ApiCall::GetPackage(id)));
        }
        cmds
    }

    fn known_package(&self, id: &str) -> Option<PremiumPackage> {
        self.package
            .iter()
            .chain(self.packages.iter())
            .find(|p| p.id == id)
            .cloned()
    }

    /// Mount the payment screen for a package and create the payment
    pub fn buy_package(&mut self, package_id: String) -> Vec<NetworkCommand> {
        self.clear_feedback();
        let Some(package) = self.known_package(&package_id) else {
            return self.refuse("Unknown package, list them with 'packages' first");
        };
        let busy = self
            .payment
            .as_ref()
            .filter(|f| f.package_id() == Some(package_id.as_str()))
            .map(|f| !f.can_create() && f.phase != PaymentPhase::Done)
            .unwrap_or(false);
        if busy {
            return self.refuse("A payment for this package is already open, type 'resume-payment'");
        }

        // A new purchase replaces whatever payment was open, mounted or not
        let mut cmds: Vec<NetworkCommand> = self
            .payment
            .take()
            .and_then(|mut previous| {
                tracing::info!(payment_id = ?previous.payment_id(), "Replacing open payment");
                previous.unmount()
            })
            .map(NetworkCommand::StopPaymentPoll)
            .into_iter()
            .collect();
        cmds.extend(self.navigate(Screen::Payment));
        if self.screen != Screen::Payment {
            return cmds;
        }
        let mut flow = PaymentFlow::for_package(package);
        let id = self.next_id();
        flow.begin_create(id);
        self.in_flight.insert(id, "create_payment");
        self.payment = Some(flow);
        cmds.push(NetworkCommand::Execute {
            id,
            call: ApiCall::CreatePayment { package_id },
        });
        cmds
    }

    /// Remount the payment screen for the stored pending payment and poll again
    pub fn resume_payment(&mut self) -> Vec<NetworkCommand> {
        self.clear_feedback();
        let pending = self.storage.session().pending_payment_id.clone();
        let active = self
            .payment
            .as_mut()
            .filter(|f| f.payment_id().is_some() && f.phase != PaymentPhase::Done);

        match (active, pending) {
            (Some(flow), _) => flow.remount(),
            (None, Some(pending)) => self.payment = Some(PaymentFlow::resume(pending)),
            (None, None) => return self.refuse("No payment waiting for confirmation"),
        }

        let mut cmds = self.navigate(Screen::Payment);
        cmds.extend(self.start_poll());
        cmds
    }

    fn start_poll(&mut self) -> Option<NetworkCommand> {
        if self.screen != Screen::Payment {
            return None;
        }
        let needs = self
            .payment
            .as_ref()
            .map(|f| f.needs_polling() && f.poll_id.is_none())
            .unwrap_or(false);
        if !needs {
            return None;
        }

        let id = self.next_id();
        let flow = self.payment.as_mut()?;
        flow.begin_polling(id);
        let payment_id = flow.payment_id()?.to_string();
        Some(NetworkCommand::StartPaymentPoll { id, payment_id })
    }

    pub fn finish_payment(&mut self) -> Vec<NetworkCommand> {
        self.clear_feedback();
        let finished = self
            .payment
            .as_mut()
            .map(PaymentFlow::finish)
            .unwrap_or(false);
        if !finished {
            return self.refuse("Payment is not confirmed yet");
        }
        self.info = Some("Premium activated, enjoy!".into());
        self.reset_to(Screen::Home)
    }

    pub fn payment_history(&mut self) -> Vec<NetworkCommand> {
        let mut cmds = self.navigate(Screen::PaymentHistory);
        if self.screen == Screen::PaymentHistory {
            cmds.push(self.call(ApiCall::PaymentHistory));
        }
        cmds
    }

    // ========================
    // Reviews
    // ========================

    pub fn show_reviews(&mut self, place_id: Option<String>) -> Vec<NetworkCommand> {
        let Some(snack_place_id) = place_id.or_else(|| self.place.as_ref().map(|p| p.id.clone())) else {
            return self.refuse("usage: reviews <snack-place-id>");
        };
        let mut cmds = self.navigate(Screen::Reviews);
        if self.screen == Screen::Reviews {
            self.reviews_place_id = Some(snack_place_id.clone());
            self.replies = None;
            cmds.push(self.call(ApiCall::ListReviews { snack_place_id }));
        }
        cmds
    }

    pub fn add_review(&mut self, place_id: Option<String>, rating: u8, comment: String) -> Vec<NetworkCommand> {
        self.clear_feedback();
        let Some(snack_place_id) = place_id.or_else(|| self.reviews_place_id.clone()) else {
            return self.refuse("Open a snack place's reviews first");
        };
        if let Err(e) = validation::validate_rating(rating).and_then(|_| validation::require("Comment", &comment)) {
            return self.invalid(e);
        }
        vec![self.call(ApiCall::CreateReview(CreateReviewRequest {
            snack_place_id,
            rating,
            comment,
        }))]
    }

    pub fn show_replies(&mut self, review_id: String) -> Vec<NetworkCommand> {
        vec![self.call(ApiCall::ListReplies { review_id })]
    }

    pub fn add_reply(&mut self, review_id: String, comment: String) -> Vec<NetworkCommand> {
        self.clear_feedback();
        if let Err(e) = validation::require("Reply", &comment) {
            return self.invalid(e);
        }
        vec![self.call(ApiCall::CreateReply {
            review_id,
            request: CreateReplyRequest { comment },
        })]
    }

    // ========================
    // Assistant
    // ========================

    pub fn ask(&mut self, question: String) -> Vec<NetworkCommand> {
        self.clear_feedback();
        if let Err(e) = validation::require("Question", &question) {
            return self.invalid(e);
        }
        let mut cmds = self.navigate(Screen::Assistant);
        if self.screen == Screen::Assistant {
            self.answer = None;
            cmds.push(self.call(ApiCall::Ask(question)));
        }
        cmds
    }

    pub fn generate_logo(&mut self, prompt: String) -> Vec<NetworkCommand> {
        self.clear_feedback();
        let Some(snack_place_id) = self.place.as_ref().map(|p| p.id.clone()) else {
            return self.refuse("Load your snack place first with 'place'");
        };
        if let Err(e) = validation::require("Prompt", &prompt) {
            return self.invalid(e);
        }
        vec![self.call(ApiCall::GenerateLogo(LogoRequest {
            snack_place_id,
            prompt,
        }))]
    }

    // ========================
    // Network responses
    // ========================

    pub fn handle_response(&mut self, response: NetworkResponse) -> Vec<NetworkCommand> {
        match response {
            NetworkResponse::Completed { id, reply, time_ms } => {
                let name = self.in_flight.remove(&id).unwrap_or("unknown");
                tracing::debug!(id, call = name, time_ms, "Reply received");
                // Any reply but a refresh proves the current token works
                if !matches!(reply, ApiReply::Refreshed(_)) {
                    self.refresh_attempted = false;
                }
                self.apply_reply(id, reply)
            }
            NetworkResponse::Failed {
                id,
                message,
                unauthorized,
                ..
            } => {
                let name = self.in_flight.remove(&id).unwrap_or("unknown");
                self.apply_failure(id, name, message, unauthorized)
            }
            NetworkResponse::PaymentStatus { id, status, .. } => {
                let confirmed = self
                    .payment
                    .as_mut()
                    .map(|flow| flow.on_status(id, &status))
                    .unwrap_or(false);
                if !confirmed {
                    return Vec::new();
                }
                self.set_pending_payment(None);
                self.info = Some("Payment confirmed".into());
                vec![self.call(ApiCall::CurrentUser)]
            }
            NetworkResponse::PollFailed { id, message } => {
                if let Some(flow) = self.payment.as_mut() {
                    if flow.poll_id == Some(id) {
                        flow.on_poll_failed(id, message.clone());
                        self.error = Some(message);
                    }
                }
                Vec::new()
            }
            NetworkResponse::Notice(notice) => {
                self.notices.push(notice);
                Vec::new()
            }
        }
    }

    fn apply_reply(&mut self, id: u64, reply: ApiReply) -> Vec<NetworkCommand> {
        match reply {
            ApiReply::Registered(user) => {
                self.info = Some(format!("Account created for {}, please sign in", user.display_name()));
                return self.navigate(Screen::Login);
            }
            ApiReply::LoggedIn { login, merchant } => {
                if let Err(e) = self.storage.save_login(&login) {
                    tracing::warn!(error = %e, "Failed to persist session");
                }
                tracing::info!(user_id = %login.user.id, merchant, "Signed in");
                let mut cmds = self.reset_to(Screen::Home);
                cmds.push(NetworkCommand::SetToken(Some(login.tokens.access_token.clone())));
                self.user = Some(login.user);
                if self.storage.session().pending_payment_id.is_some() {
                    self.info = Some("You have an unfinished payment, type 'resume-payment'".into());
                }
                return cmds;
            }
            ApiReply::Refreshed(tokens) => {
                if let Err(e) = self.storage.save_tokens(&tokens) {
                    tracing::warn!(error = %e, "Failed to persist refreshed tokens");
                }
                return vec![
                    NetworkCommand::SetToken(Some(tokens.access_token)),
                    self.call(ApiCall::CurrentUser),
                ];
            }
            ApiReply::User(user) => {
                if let Err(e) = self.storage.save_user(&user) {
                    tracing::warn!(error = %e, "Failed to persist user");
                }
                if let Some(flow) = self.payment.as_mut() {
                    if matches!(flow.phase, PaymentPhase::Confirmed | PaymentPhase::Done) {
                        flow.entitlement_refreshed = true;
                    }
                }
                self.user = Some(user);
            }
            ApiReply::Message(message) => {
                self.info = Some(message.unwrap_or_else(|| "Saved".into()));
            }
            ApiReply::OtpSent(message) => {
                self.info = Some(message.unwrap_or_else(|| "Code sent, check your email".into()));
            }
            ApiReply::OtpVerified(_) => {
                self.reset.otp_verified = true;
                self.info = Some("Code verified, choose a new password with 'reset'".into());
            }
            ApiReply::PasswordReset(_) => {
                self.reset = ResetState::default();
                self.info = Some("Password updated, please sign in".into());
                return self.navigate(Screen::Login);
            }
            ApiReply::SnackPlace(place) => {
                self.place = Some(place);
                if self.screen == Screen::Onboarding {
                    return self.navigate(Screen::MyPlace);
                }
            }
            ApiReply::Dish(dish) => match self.dishes.iter_mut().find(|d| d.id == dish.id) {
                Some(existing) => *existing = dish,
                None => self.dishes.push(dish),
            },
            ApiReply::Dishes(dishes) => self.dishes = dishes,
            ApiReply::Catalog { kind, items } => self.catalog_search = Some((kind, items.items)),
            ApiReply::OnboardingCatalog(catalog) => self.catalog = catalog,
            ApiReply::Packages(page) => self.packages = page.items,
            ApiReply::Package(package) => self.package = Some(package),
            ApiReply::Payment(payment) => return self.payment_created(id, payment),
            ApiReply::Payments(payments) => self.payments = payments,
            ApiReply::Reviews(reviews) => self.reviews = reviews,
            ApiReply::Review(review) => self.reviews.insert(0, review),
            ApiReply::Replies { review_id, replies } => self.replies = Some((review_id, replies)),
            ApiReply::Reply(reply) => {
                if let Some(review) = self.reviews.iter_mut().find(|r| r.id == reply.review_id) {
                    review.replies.push(reply.clone());
                }
                if let Some((review_id, replies)) = self.replies.as_mut() {
                    if *review_id == reply.review_id {
                        replies.push(reply);
                    }
                }
            }
            ApiReply::Answer(answer) => self.answer = Some(answer.answer),
            ApiReply::Logo(logo) => self.logo_url = Some(logo.image_url),
        }
        Vec::new()
    }

    fn payment_created(&mut self, id: u64, payment: Payment) -> Vec<NetworkCommand> {
        let Some(flow) = self.payment.as_mut().filter(|f| f.create_id == Some(id)) else {
            tracing::debug!(id, "Payment created for an unmounted screen");
            return Vec::new();
        };
        let paid = payment.paid;
        let payment_id = payment.id.clone();
        flow.on_created(payment);

        if paid {
            self.set_pending_payment(None);
            return vec![self.call(ApiCall::CurrentUser)];
        }
        self.set_pending_payment(Some(payment_id));
        self.start_poll().into_iter().collect()
    }

    fn apply_failure(&mut self, id: u64, name: &str, message: String, unauthorized: bool) -> Vec<NetworkCommand> {
        if let Some(flow) = self.payment.as_mut() {
            if flow.on_create_failed(id, message.clone()) {
                self.error = Some(message);
                return Vec::new();
            }
        }

        if unauthorized && self.signed_in() {
            let refresh = self.storage.session().refresh_token.clone();
            return match refresh {
                Some(token) if name != "refresh_token" && !self.refresh_attempted => {
                    tracing::info!(call = name, "Access token rejected, refreshing");
                    self.refresh_attempted = true;
                    vec![self.call(ApiCall::RefreshToken(token))]
                }
                _ => {
                    let cmds = self.logout();
                    self.info = None;
                    self.error = Some("Session expired, please sign in again".into());
                    cmds
                }
            };
        }

        if name == "verify_otp" {
            self.reset.otp.clear();
        }
        self.error = Some(message);
        Vec::new()
    }

    fn set_pending_payment(&mut self, payment_id: Option<String>) {
        if let Err(e) = self.storage.set_pending_payment(payment_id) {
            tracing::warn!(error = %e, "Failed to persist pending payment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::client::Notice;
    use crate::storage::Storage;

    fn package() -> PremiumPackage {
        PremiumPackage {
            id: "gold".into(),
            name: "Gold".into(),
            description: None,
            price: 99000.0,
            duration_days: 30,
            features: vec!["Featured listing".into()],
        }
    }

    fn login_reply(role: &str) -> ApiReply {
        ApiReply::LoggedIn {
            login: serde_json::from_value(serde_json::json!({
                "user": {"id": "u1", "username": "linh", "email": "linh@example.com", "role": role},
                "accessToken": "tok",
                "refreshToken": "ref"
            }))
            .unwrap(),
            merchant: role == "merchant",
        }
    }

    fn signed_in() -> AppState {
        let mut state = AppState::new(Storage::in_memory());
        state.handle_response(NetworkResponse::Completed {
            id: 0,
            reply: login_reply("user"),
            time_ms: 1,
        });
        state
    }

    fn execute_id(cmd: &NetworkCommand) -> u64 {
        match cmd {
            NetworkCommand::Execute { id, .. } => *id,
            other => panic!("expected execute, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_login_sends_nothing() {
        let mut state = AppState::new(Storage::in_memory());
        let cmds = state.login("not-an-email".into(), "pw".into(), false);
        assert!(cmds.is_empty());
        assert_eq!(state.error.as_deref(), Some("Email address is not valid"));
    }

    #[test]
    fn test_login_stores_session_and_goes_home() {
        let mut state = AppState::new(Storage::in_memory());
        let cmds = state.login("linh@example.com".into(), "banhmi2024".into(), true);
        assert!(matches!(
            &cmds[..],
            [NetworkCommand::Execute { call: ApiCall::MerchantLogin(_), .. }]
        ));
        assert!(state.is_loading());

        let id = execute_id(&cmds[0]);
        let cmds = state.handle_response(NetworkResponse::Completed {
            id,
            reply: login_reply("merchant"),
            time_ms: 5,
        });

        assert!(!state.is_loading());
        assert_eq!(state.screen, Screen::Home);
        assert!(state.storage.session().is_merchant());
        assert!(cmds
            .iter()
            .any(|c| matches!(c, NetworkCommand::SetToken(Some(t)) if t == "tok")));
    }

    #[test]
    fn test_protected_screen_redirects_to_login() {
        let mut state = AppState::new(Storage::in_memory());
        let cmds = state.show_packages(None);
        assert!(cmds.is_empty());
        assert_eq!(state.screen, Screen::Login);
        assert_eq!(state.error.as_deref(), Some("Please sign in first"));
    }

    #[test]
    fn test_payment_confirmed_only_after_paid_status() {
        let mut state = signed_in();
        state.packages = vec![package()];

        let cmds = state.buy_package("gold".into());
        assert_eq!(state.screen, Screen::Payment);
        let create_id = execute_id(cmds.last().unwrap());

        let cmds = state.handle_response(NetworkResponse::Completed {
            id: create_id,
            reply: ApiReply::Payment(Payment {
                id: "pay-1".into(),
                user_id: None,
                package_id: "gold".into(),
                amount: 99000.0,
                qr_code: Some("qr-data".into()),
                paid: false,
                created_at: None,
            }),
            time_ms: 3,
        });
        let poll_id = match &cmds[..] {
            [NetworkCommand::StartPaymentPoll { id, payment_id }] => {
                assert_eq!(payment_id, "pay-1");
                *id
            }
            other => panic!("expected poll start, got {:?}", other),
        };
        assert_eq!(state.storage.session().pending_payment_id.as_deref(), Some("pay-1"));

        let pending = PaymentStatus { id: Some("pay-1".into()), paid: false };
        assert!(state
            .handle_response(NetworkResponse::PaymentStatus { id: poll_id, status: pending, attempt: 1 })
            .is_empty());
        assert!(!state.to_render_state().payment.unwrap().can_finish);
        assert!(state.finish_payment().is_empty());
        assert_eq!(state.screen, Screen::Payment);

        let paid = PaymentStatus { id: Some("pay-1".into()), paid: true };
        let cmds = state.handle_response(NetworkResponse::PaymentStatus { id: poll_id, status: paid, attempt: 2 });
        assert!(matches!(
            &cmds[..],
            [NetworkCommand::Execute { call: ApiCall::CurrentUser, .. }]
        ));
        assert_eq!(state.storage.session().pending_payment_id, None);

        let view = state.to_render_state().payment.unwrap();
        assert_eq!(view.phase, PaymentPhase::Confirmed);
        assert!(view.can_finish);

        state.finish_payment();
        assert_eq!(state.screen, Screen::Home);
    }

    #[test]
    fn test_leaving_payment_stops_poll() {
        let mut state = signed_in();
        state.storage.set_pending_payment(Some("pay-7".into())).unwrap();

        let cmds = state.resume_payment();
        let poll_id = match cmds.last() {
            Some(NetworkCommand::StartPaymentPoll { id, .. }) => *id,
            other => panic!("expected poll start, got {:?}", other),
        };

        let cmds = state.back();
        assert!(matches!(&cmds[..], [NetworkCommand::StopPaymentPoll(id)] if *id == poll_id));
        assert_eq!(state.screen, Screen::Home);
    }

    #[test]
    fn test_poll_failure_stops_until_remount() {
        let mut state = signed_in();
        state.storage.set_pending_payment(Some("pay-8".into())).unwrap();
        let cmds = state.resume_payment();
        let poll_id = match cmds.last() {
            Some(NetworkCommand::StartPaymentPoll { id, .. }) => *id,
            other => panic!("expected poll start, got {:?}", other),
        };

        state.handle_response(NetworkResponse::PollFailed {
            id: poll_id,
            message: "Network error, please try again".into(),
        });
        let view = state.to_render_state().payment.unwrap();
        assert!(matches!(view.phase, PaymentPhase::Failed(_)));

        let cmds = state.resume_payment();
        assert!(matches!(
            cmds.last(),
            Some(NetworkCommand::StartPaymentPoll { id, .. }) if *id != poll_id
        ));
    }

    #[test]
    fn test_logout_clears_session() {
        let mut state = signed_in();
        state.storage.set_pending_payment(Some("pay-1".into())).unwrap();
        let cmds = state.logout();

        assert_eq!(state.screen, Screen::Welcome);
        assert_eq!(state.storage.session(), &crate::storage::Session::default());
        assert!(cmds.iter().any(|c| matches!(c, NetworkCommand::SetToken(None))));
    }

    #[test]
    fn test_unauthorized_triggers_one_refresh_then_logout() {
        let mut state = signed_in();
        let cmds = state.payment_history();
        let id = execute_id(cmds.last().unwrap());

        let cmds = state.handle_response(NetworkResponse::Failed {
            id,
            message: "Please sign in again".into(),
            unauthorized: true,
            time_ms: 1,
        });
        let refresh_id = match &cmds[..] {
            [NetworkCommand::Execute { id, call: ApiCall::RefreshToken(token) }] => {
                assert_eq!(token, "ref");
                *id
            }
            other => panic!("expected refresh, got {:?}", other),
        };

        state.handle_response(NetworkResponse::Failed {
            id: refresh_id,
            message: "expired".into(),
            unauthorized: true,
            time_ms: 1,
        });
        assert!(!state.signed_in());
        assert_eq!(state.screen, Screen::Welcome);
        assert_eq!(state.error.as_deref(), Some("Session expired, please sign in again"));
    }

    #[test]
    fn test_otp_flow() {
        let mut state = AppState::new(Storage::in_memory());
        state.forgot_password("linh@example.com".into());
        assert_eq!(state.screen, Screen::ForgotPassword);

        for key in "12x3".chars() {
            state.otp_key(key);
        }
        assert!(state.submit_otp().is_empty());
        assert_eq!(state.error.as_deref(), Some("Enter every digit of the code"));

        for key in "456".chars() {
            state.otp_key(key);
        }
        let cmds = state.submit_otp();
        assert!(matches!(
            &cmds[..],
            [NetworkCommand::Execute { call: ApiCall::VerifyOtp { otp, .. }, .. }] if otp == "123456"
        ));

        assert!(state.reset_password("banhmi2024".into(), "banhmi2024".into()).is_empty());
        state.handle_response(NetworkResponse::Completed {
            id: execute_id(&cmds[0]),
            reply: ApiReply::OtpVerified(None),
            time_ms: 1,
        });
        let cmds = state.reset_password("banhmi2024".into(), "banhmi2024".into());
        assert!(matches!(
            &cmds[..],
            [NetworkCommand::Execute { call: ApiCall::ResetPassword(req), .. }] if req.otp == "123456"
        ));
    }

    fn silver() -> PremiumPackage {
        PremiumPackage {
            id: "silver".into(),
            name: "Silver".into(),
            price: 49000.0,
            ..package()
        }
    }

    fn unpaid(id: &str, package_id: &str) -> Payment {
        Payment {
            id: id.into(),
            user_id: None,
            package_id: package_id.into(),
            amount: 99000.0,
            qr_code: Some("qr-data".into()),
            paid: false,
            created_at: None,
        }
    }

    fn poll_started(cmds: &[NetworkCommand]) -> u64 {
        cmds.iter()
            .find_map(|c| match c {
                NetworkCommand::StartPaymentPoll { id, .. } => Some(*id),
                _ => None,
            })
            .unwrap_or_else(|| panic!("expected poll start in {:?}", cmds))
    }

    fn unauthorized(state: &mut AppState, cmd: &NetworkCommand) -> Vec<NetworkCommand> {
        state.handle_response(NetworkResponse::Failed {
            id: execute_id(cmd),
            message: "Please sign in again".into(),
            unauthorized: true,
            time_ms: 1,
        })
    }

    #[test]
    fn test_returning_to_payment_restarts_poll() {
        let mut state = signed_in();
        state.set_pending_payment(Some("pay-3".into()));
        let first = poll_started(&state.resume_payment());

        let cmds = state.payment_history();
        assert!(cmds
            .iter()
            .any(|c| matches!(c, NetworkCommand::StopPaymentPoll(id) if *id == first)));

        let cmds = state.back();
        assert_eq!(state.screen, Screen::Payment);
        let second = poll_started(&cmds);
        assert_ne!(second, first);
        assert_eq!(state.payment.as_ref().unwrap().poll_id, Some(second));

        state.navigate(Screen::Home);
        let cmds = state.navigate(Screen::Payment);
        assert!(matches!(
            &cmds[..],
            [NetworkCommand::StartPaymentPoll { payment_id, .. }] if payment_id == "pay-3"
        ));
    }

    #[test]
    fn test_buying_another_package_stops_old_poll() {
        let mut state = signed_in();
        state.packages = vec![package(), silver()];

        let cmds = state.buy_package("gold".into());
        let create_id = execute_id(cmds.last().unwrap());
        let cmds = state.handle_response(NetworkResponse::Completed {
            id: create_id,
            reply: ApiReply::Payment(unpaid("pay-1", "gold")),
            time_ms: 2,
        });
        let old_poll = poll_started(&cmds);

        let cmds = state.buy_package("silver".into());
        assert!(matches!(
            &cmds[..],
            [
                NetworkCommand::StopPaymentPoll(stopped),
                NetworkCommand::Execute { call: ApiCall::CreatePayment { package_id }, .. },
            ] if *stopped == old_poll && package_id == "silver"
        ));

        // A late check from the replaced poll changes nothing
        let paid = PaymentStatus { id: Some("pay-1".into()), paid: true };
        assert!(state
            .handle_response(NetworkResponse::PaymentStatus { id: old_poll, status: paid, attempt: 3 })
            .is_empty());
        assert_eq!(state.payment.as_ref().unwrap().phase, PaymentPhase::Creating);
    }

    #[test]
    fn test_second_rejection_after_refresh_logs_out() {
        let mut state = signed_in();
        let cmds = state.show_profile();
        let cmds = unauthorized(&mut state, cmds.last().unwrap());
        let refresh = match &cmds[..] {
            [cmd @ NetworkCommand::Execute { call: ApiCall::RefreshToken(_), .. }] => execute_id(cmd),
            other => panic!("expected refresh, got {:?}", other),
        };

        let cmds = state.handle_response(NetworkResponse::Completed {
            id: refresh,
            reply: ApiReply::Refreshed(AuthTokens {
                access_token: "tok-2".into(),
                refresh_token: "ref-2".into(),
            }),
            time_ms: 1,
        });
        let reload = cmds
            .iter()
            .find(|c| matches!(c, NetworkCommand::Execute { call: ApiCall::CurrentUser, .. }))
            .unwrap();

        let cmds = unauthorized(&mut state, reload);
        assert!(!cmds
            .iter()
            .any(|c| matches!(c, NetworkCommand::Execute { call: ApiCall::RefreshToken(_), .. })));
        assert!(!state.signed_in());
        assert_eq!(state.error.as_deref(), Some("Session expired, please sign in again"));
    }

    #[test]
    fn test_refresh_allowed_again_after_a_good_reply() {
        let mut state = signed_in();
        let cmds = state.payment_history();
        let cmds = unauthorized(&mut state, cmds.last().unwrap());
        let refresh = execute_id(&cmds[0]);
        let cmds = state.handle_response(NetworkResponse::Completed {
            id: refresh,
            reply: ApiReply::Refreshed(AuthTokens {
                access_token: "tok-2".into(),
                refresh_token: "ref-2".into(),
            }),
            time_ms: 1,
        });
        state.handle_response(NetworkResponse::Completed {
            id: execute_id(cmds.last().unwrap()),
            reply: ApiReply::User(
                serde_json::from_value(serde_json::json!({
                    "id": "u1", "username": "linh", "email": "linh@example.com", "role": "user"
                }))
                .unwrap(),
            ),
            time_ms: 1,
        });
        assert!(!state.refresh_attempted);

        let cmds = state.payment_history();
        let cmds = unauthorized(&mut state, cmds.last().unwrap());
        assert!(matches!(
            &cmds[..],
            [NetworkCommand::Execute { call: ApiCall::RefreshToken(token), .. }] if token == "ref-2"
        ));
    }

    #[test]
    fn test_rejected_code_clears_otp_cells() {
        let mut state = AppState::new(Storage::in_memory());
        state.forgot_password("linh@example.com".into());
        for key in "123456".chars() {
            state.otp_key(key);
        }
        let cmds = state.submit_otp();
        state.handle_response(NetworkResponse::Failed {
            id: execute_id(&cmds[0]),
            message: "Invalid code".into(),
            unauthorized: false,
            time_ms: 1,
        });
        assert_eq!(state.error.as_deref(), Some("Invalid code"));
        assert_eq!(state.to_render_state().otp_display, "_ _ _ _ _ _");
    }

    #[test]
    fn test_notices_drained_on_render() {
        let mut state = AppState::new(Storage::in_memory());
        state.handle_response(NetworkResponse::Notice(Notice::success("Saved")));
        assert_eq!(state.to_render_state().notices.len(), 1);
        assert!(state.to_render_state().notices.is_empty());
    }
}

//! App state - pure data structure with no I/O logic

use std::collections::HashMap;

use crate::app::payment::PaymentFlow;
use crate::messages::render::PaymentView;
use crate::messages::ui_events::Screen;
use crate::messages::RenderState;
use crate::models::{
    CatalogItem, CatalogKind, Dish, OnboardingCatalog, Payment, PremiumPackage, Reply, Review,
    SnackPlace, User,
};
use crate::network::client::Notice;
use crate::otp::OtpInput;
use crate::storage::Storage;

/// Password-reset flow progress
#[derive(Clone, Debug, Default)]
pub struct ResetState {
    pub email: Option<String>,
    pub otp: OtpInput,
    pub otp_verified: bool,
}

/// Main application state - pure data, no I/O
pub struct AppState {
    // Navigation
    pub screen: Screen,
    pub history: Vec<Screen>,

    // Requests
    pub next_request_id: u64,
    /// Request id to call name, for every call still waiting on a reply
    pub in_flight: HashMap<u64, &'static str>,

    // Feedback
    pub error: Option<String>,
    pub info: Option<String>,
    pub notices: Vec<Notice>,

    // Session (persisted data)
    pub storage: Storage,
    pub user: Option<User>,
    /// A refresh was issued for a rejected token and no other reply has
    /// succeeded since; a further 401 ends the session
    pub refresh_attempted: bool,

    // Password reset
    pub reset: ResetState,

    // Merchant
    pub place: Option<SnackPlace>,
    pub dishes: Vec<Dish>,
    pub catalog: OnboardingCatalog,
    pub catalog_search: Option<(CatalogKind, Vec<CatalogItem>)>,

    // Premium
    pub packages: Vec<PremiumPackage>,
    pub package: Option<PremiumPackage>,
    pub payment: Option<PaymentFlow>,
    pub payments: Vec<Payment>,

    // Reviews
    pub reviews_place_id: Option<String>,
    pub reviews: Vec<Review>,
    pub replies: Option<(String, Vec<Reply>)>,

    // Assistant
    pub answer: Option<String>,
    pub logo_url: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Storage::new())
    }
}

impl AppState {
    pub fn new(storage: Storage) -> Self {
        let screen = if storage.session().is_signed_in() {
            Screen::Home
        } else {
            Screen::Welcome
        };

        AppState {
            screen,
            history: Vec::new(),
            next_request_id: 1,
            in_flight: HashMap::new(),
            error: None,
            info: None,
            notices: Vec::new(),
            storage,
            user: None,
            refresh_attempted: false,
            reset: ResetState::default(),
            place: None,
            dishes: Vec::new(),
            catalog: OnboardingCatalog::default(),
            catalog_search: None,
            packages: Vec::new(),
            package: None,
            payment: None,
            payments: Vec::new(),
            reviews_place_id: None,
            reviews: Vec::new(),
            replies: None,
            answer: None,
            logo_url: None,
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn signed_in(&self) -> bool {
        self.storage.session().is_signed_in()
    }

    /// Convert state to RenderState for the front end; drains pending notices
    pub fn to_render_state(&mut self) -> RenderState {
        let session = self.storage.session();
        RenderState {
            screen: self.screen,
            display_name: session.display_name.clone(),
            signed_in: session.is_signed_in(),
            is_merchant: session.is_merchant(),
            is_loading: self.is_loading(),
            error: self.error.clone(),
            info: self.info.clone(),
            notices: std::mem::take(&mut self.notices),
            user: self.user.clone(),
            otp_display: self.reset.otp.display(),
            otp_focus: self.reset.otp.focus(),
            otp_verified: self.reset.otp_verified,
            place: self.place.clone(),
            dishes: self.dishes.clone(),
            catalog: self.catalog.clone(),
            catalog_search: self.catalog_search.clone(),
            packages: self.packages.clone(),
            package: self.package.clone(),
            payment: self.payment.as_ref().map(|flow| PaymentView {
                package_name: flow.package.as_ref().map(|p| p.name.clone()),
                amount: flow
                    .payment
                    .as_ref()
                    .map(|p| p.amount)
                    .or_else(|| flow.package.as_ref().map(|p| p.price)),
                qr_code: flow.qr_code().map(String::from),
                phase: flow.phase.clone(),
                checks: flow.checks,
                can_finish: flow.can_finish(),
            }),
            payments: self.payments.clone(),
            reviews: self.reviews.clone(),
            replies: self.replies.clone(),
            answer: self.answer.clone(),
            logo_url: self.logo_url.clone(),
        }
    }
}

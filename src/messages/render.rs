//! Render state - data structure sent from App layer to the front end

use crate::app::payment::PaymentPhase;
use crate::messages::ui_events::Screen;
use crate::models::{
    CatalogItem, CatalogKind, Dish, OnboardingCatalog, Payment, PremiumPackage, Reply, Review,
    SnackPlace, User,
};
use crate::network::client::Notice;

/// What the payment screen shows
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentView {
    pub package_name: Option<String>,
    pub amount: Option<f64>,
    pub qr_code: Option<String>,
    pub phase: PaymentPhase,
    pub checks: u32,
    pub can_finish: bool,
}

/// Complete state needed by the front end to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub screen: Screen,
    pub display_name: Option<String>,
    pub signed_in: bool,
    pub is_merchant: bool,
    pub is_loading: bool,

    /// Inline error under the current form
    pub error: Option<String>,
    /// Inline informational line (e.g. "Code sent to ...")
    pub info: Option<String>,
    /// Toasts raised since the previous render
    pub notices: Vec<Notice>,

    // Account
    pub user: Option<User>,
    pub otp_display: String,
    pub otp_focus: usize,
    pub otp_verified: bool,

    // Merchant
    pub place: Option<SnackPlace>,
    pub dishes: Vec<Dish>,
    pub catalog: OnboardingCatalog,
    pub catalog_search: Option<(CatalogKind, Vec<CatalogItem>)>,

    // Premium
    pub packages: Vec<PremiumPackage>,
    pub package: Option<PremiumPackage>,
    pub payment: Option<PaymentView>,
    pub payments: Vec<Payment>,

    // Reviews
    pub reviews: Vec<Review>,
    pub replies: Option<(String, Vec<Reply>)>,

    // Assistant
    pub answer: Option<String>,
    pub logo_url: Option<String>,
}

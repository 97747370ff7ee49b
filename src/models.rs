//! Wire DTOs mirrored from backend responses and request payloads.
//!
//! Every type here is a flat record; the server owns all of them and the
//! client only holds short-lived copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response envelope shared by every endpoint: `{status, message?, data?}`
#[derive(Clone, Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: EnvelopeStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// The backend reports `status` either as an HTTP-like code or as a word
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EnvelopeStatus {
    Code(u16),
    Text(String),
}

impl EnvelopeStatus {
    pub fn is_success(&self) -> bool {
        match self {
            EnvelopeStatus::Code(code) => (200..300).contains(code),
            EnvelopeStatus::Text(text) => {
                text.eq_ignore_ascii_case("success") || text.eq_ignore_ascii_case("ok")
            }
        }
    }
}

/// Paged result returned by the `*/search` endpoints
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

fn first_page() -> u32 {
    1
}

// ============================================================================
// Users & auth
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Merchant,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Merchant => "merchant",
            Role::Admin => "admin",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub premium_expired_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name shown in greetings: full name when set, username otherwise
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    #[serde(flatten)]
    pub tokens: AuthTokens,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

// ============================================================================
// Snack places & dishes
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnackPlace {
    pub id: String,
    pub user_id: String,
    pub place_name: String,
    pub owner_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub opening_time: Option<String>,
    #[serde(default)]
    pub closing_time: Option<String>,
    #[serde(default)]
    pub main_dish: Option<String>,
    #[serde(default)]
    pub business_model_id: Option<String>,
    #[serde(default)]
    pub taste_ids: Vec<String>,
    #[serde(default)]
    pub diet_ids: Vec<String>,
    #[serde(default)]
    pub food_type_ids: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnackPlaceRequest {
    pub place_name: String,
    pub owner_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_dish: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_model_id: Option<String>,
    pub taste_ids: Vec<String>,
    pub diet_ids: Vec<String>,
    pub food_type_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Partial update; absent fields are left untouched server-side
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSnackPlaceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_dish: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub id: String,
    pub snack_place_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDishRequest {
    pub snack_place_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDishRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// ============================================================================
// Catalog lookups
// ============================================================================

/// Shared shape of the lookup entities used while onboarding a snack place
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub type BusinessModel = CatalogItem;
pub type Taste = CatalogItem;
pub type Diet = CatalogItem;
pub type FoodType = CatalogItem;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    BusinessModel,
    Taste,
    Diet,
    FoodType,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 4] = [
        CatalogKind::BusinessModel,
        CatalogKind::Taste,
        CatalogKind::Diet,
        CatalogKind::FoodType,
    ];

    pub fn resource(&self) -> &'static str {
        match self {
            CatalogKind::BusinessModel => "business-models",
            CatalogKind::Taste => "tastes",
            CatalogKind::Diet => "diets",
            CatalogKind::FoodType => "food-types",
        }
    }

    pub fn parse(s: &str) -> Option<CatalogKind> {
        match s.to_lowercase().as_str() {
            "business-model" | "business-models" | "models" => Some(CatalogKind::BusinessModel),
            "taste" | "tastes" => Some(CatalogKind::Taste),
            "diet" | "diets" => Some(CatalogKind::Diet),
            "food-type" | "food-types" | "types" => Some(CatalogKind::FoodType),
            _ => None,
        }
    }
}

/// The four option lists the onboarding form needs, loaded together
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OnboardingCatalog {
    pub business_models: Vec<BusinessModel>,
    pub tastes: Vec<Taste>,
    pub diets: Vec<Diet>,
    pub food_types: Vec<FoodType>,
}

/// Query parameters accepted by every search endpoint
#[derive(Clone, Debug, PartialEq)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        use crate::constants::DEFAULT_PAGE_SIZE;
        SearchQuery {
            name: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchQuery {
    pub fn named(name: impl Into<String>) -> Self {
        SearchQuery {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(3);
        if let Some(name) = self.name.as_ref().filter(|n| !n.is_empty()) {
            params.push(("name", name.clone()));
        }
        params.push(("page", self.page.to_string()));
        params.push(("pageSize", self.page_size.to_string()));
        params
    }
}

// ============================================================================
// Premium packages & payments
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumPackage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub duration_days: u32,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub package_id: String,
    pub amount: f64,
    /// Payload to encode into the QR code shown to the payer
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub package_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatus {
    #[serde(default)]
    pub id: Option<String>,
    pub paid: bool,
}

// ============================================================================
// Reviews
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub review_id: String,
    pub user_id: String,
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub snack_place_id: String,
    pub user_id: String,
    pub rating: u8,
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub snack_place_id: String,
    pub rating: u8,
    pub comment: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CreateReplyRequest {
    pub comment: String,
}

// ============================================================================
// AI assistant
// ============================================================================

#[derive(Clone, Debug, Serialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoRequest {
    pub snack_place_id: String,
    pub prompt: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLogo {
    pub image_url: String,
}

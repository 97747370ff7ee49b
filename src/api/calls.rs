//! Message form of every API operation, so the app layer can request calls
//! without holding the client

use crate::error::ApiError;
use crate::models::*;
use crate::network::client::{ApiClient, NotifyPolicy};

use super::{assistant, catalog, dishes, merchants, packages, payments, reviews, snack_places, users};

#[derive(Debug, Clone)]
pub enum ApiCall {
    // Account
    CreateUser(CreateUserRequest),
    Login(LoginRequest),
    MerchantLogin(LoginRequest),
    RefreshToken(String),
    CurrentUser,
    UpdateUser { id: String, request: UpdateUserRequest },
    ChangePassword(ChangePasswordRequest),
    ForgotPassword { email: String },
    VerifyOtp { email: String, otp: String },
    ResetPassword(ResetPasswordRequest),

    // Merchant storefront
    CreateSnackPlace(CreateSnackPlaceRequest),
    UpdateSnackPlace { id: String, request: UpdateSnackPlaceRequest },
    GetSnackPlace(String),
    MySnackPlace,
    CreateDish(CreateDishRequest),
    UpdateDish { id: String, request: UpdateDishRequest },
    ListDishes { snack_place_id: String },
    SearchCatalog { kind: CatalogKind, query: SearchQuery },
    LoadOnboardingCatalog,

    // Premium
    SearchPackages(SearchQuery),
    GetPackage(String),
    CreatePayment { package_id: String },
    PaymentHistory,

    // Reviews
    ListReviews { snack_place_id: String },
    CreateReview(CreateReviewRequest),
    ListReplies { review_id: String },
    CreateReply { review_id: String, request: CreateReplyRequest },

    // Assistant
    Ask(String),
    GenerateLogo(LogoRequest),
}

impl ApiCall {
    /// Which client instance runs the call: mutations report success and
    /// failure, reads report failure only, background checks stay quiet.
    pub fn notify_policy(&self) -> NotifyPolicy {
        match self {
            ApiCall::RefreshToken(_) | ApiCall::CurrentUser => {
                NotifyPolicy::Silent
            }
            ApiCall::CreateUser(_)
            | ApiCall::UpdateUser { .. }
            | ApiCall::ChangePassword(_)
            | ApiCall::ForgotPassword { .. }
            | ApiCall::VerifyOtp { .. }
            | ApiCall::ResetPassword(_)
            | ApiCall::CreateSnackPlace(_)
            | ApiCall::UpdateSnackPlace { .. }
            | ApiCall::CreateDish(_)
            | ApiCall::UpdateDish { .. }
            | ApiCall::CreateReview(_)
            | ApiCall::CreateReply { .. } => NotifyPolicy::Verbose,
            _ => NotifyPolicy::Errors,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApiCall::CreateUser(_) => "create_user",
            ApiCall::Login(_) => "login",
            ApiCall::MerchantLogin(_) => "merchant_login",
            ApiCall::RefreshToken(_) => "refresh_token",
            ApiCall::CurrentUser => "current_user",
            ApiCall::UpdateUser { .. } => "update_user",
            ApiCall::ChangePassword(_) => "change_password",
            ApiCall::ForgotPassword { .. } => "forgot_password",
            ApiCall::VerifyOtp { .. } => "verify_otp",
            ApiCall::ResetPassword(_) => "reset_password",
            ApiCall::CreateSnackPlace(_) => "create_snack_place",
            ApiCall::UpdateSnackPlace { .. } => "update_snack_place",
            ApiCall::GetSnackPlace(_) => "get_snack_place",
            ApiCall::MySnackPlace => "my_snack_place",
            ApiCall::CreateDish(_) => "create_dish",
            ApiCall::UpdateDish { .. } => "update_dish",
            ApiCall::ListDishes { .. } => "list_dishes",
            ApiCall::SearchCatalog { .. } => "search_catalog",
            ApiCall::LoadOnboardingCatalog => "load_onboarding_catalog",
            ApiCall::SearchPackages(_) => "search_packages",
            ApiCall::GetPackage(_) => "get_package",
            ApiCall::CreatePayment { .. } => "create_payment",
            ApiCall::PaymentHistory => "payment_history",
            ApiCall::ListReviews { .. } => "list_reviews",
            ApiCall::CreateReview(_) => "create_review",
            ApiCall::ListReplies { .. } => "list_replies",
            ApiCall::CreateReply { .. } => "create_reply",
            ApiCall::Ask(_) => "ask",
            ApiCall::GenerateLogo(_) => "generate_logo",
        }
    }
}

/// Typed result of an [`ApiCall`]
#[derive(Debug, Clone)]
pub enum ApiReply {
    Registered(User),
    LoggedIn { login: LoginResponse, merchant: bool },
    Refreshed(AuthTokens),
    User(User),
    /// Endpoints that only answer with a message
    Message(Option<String>),
    OtpSent(Option<String>),
    OtpVerified(Option<String>),
    PasswordReset(Option<String>),
    SnackPlace(SnackPlace),
    Dish(Dish),
    Dishes(Vec<Dish>),
    Catalog { kind: CatalogKind, items: Paged<CatalogItem> },
    OnboardingCatalog(OnboardingCatalog),
    Packages(Paged<PremiumPackage>),
    Package(PremiumPackage),
    Payment(Payment),
    Payments(Vec<Payment>),
    Reviews(Vec<Review>),
    Review(Review),
    Replies { review_id: String, replies: Vec<Reply> },
    Reply(Reply),
    Answer(ChatAnswer),
    Logo(GeneratedLogo),
}

/// Run one call against the client instance its notify policy selects
pub async fn dispatch(client: &ApiClient, call: ApiCall) -> Result<ApiReply, ApiError> {
    let client = &client.with_policy(call.notify_policy());
    let reply = match call {
        ApiCall::CreateUser(req) => ApiReply::Registered(users::create_user(client, &req).await?),
        ApiCall::Login(req) => ApiReply::LoggedIn {
            login: users::login(client, &req).await?,
            merchant: false,
        },
        ApiCall::MerchantLogin(req) => ApiReply::LoggedIn {
            login: merchants::login(client, &req).await?,
            merchant: true,
        },
        ApiCall::RefreshToken(token) => ApiReply::Refreshed(users::refresh_token(client, &token).await?),
        ApiCall::CurrentUser => ApiReply::User(users::current_user(client).await?),
        ApiCall::UpdateUser { id, request } => {
            ApiReply::User(users::update_user(client, &id, &request).await?)
        }
        ApiCall::ChangePassword(req) => ApiReply::Message(users::change_password(client, &req).await?),
        ApiCall::ForgotPassword { email } => {
            ApiReply::OtpSent(users::forgot_password(client, &email).await?)
        }
        ApiCall::VerifyOtp { email, otp } => {
            ApiReply::OtpVerified(users::verify_otp(client, &email, &otp).await?)
        }
        ApiCall::ResetPassword(req) => {
            ApiReply::PasswordReset(users::reset_password(client, &req).await?)
        }
        ApiCall::CreateSnackPlace(req) => {
            ApiReply::SnackPlace(snack_places::create(client, &req).await?)
        }
        ApiCall::UpdateSnackPlace { id, request } => {
            ApiReply::SnackPlace(snack_places::update(client, &id, &request).await?)
        }
        ApiCall::GetSnackPlace(id) => ApiReply::SnackPlace(snack_places::get(client, &id).await?),
        ApiCall::MySnackPlace => ApiReply::SnackPlace(snack_places::mine(client).await?),
        ApiCall::CreateDish(req) => ApiReply::Dish(dishes::create(client, &req).await?),
        ApiCall::UpdateDish { id, request } => {
            ApiReply::Dish(dishes::update(client, &id, &request).await?)
        }
        ApiCall::ListDishes { snack_place_id } => {
            ApiReply::Dishes(dishes::list(client, &snack_place_id).await?)
        }
        ApiCall::SearchCatalog { kind, query } => ApiReply::Catalog {
            kind,
            items: catalog::search(client, kind, &query).await?,
        },
        ApiCall::LoadOnboardingCatalog => {
            ApiReply::OnboardingCatalog(catalog::load_onboarding(client).await?)
        }
        ApiCall::SearchPackages(query) => ApiReply::Packages(packages::search(client, &query).await?),
        ApiCall::GetPackage(id) => ApiReply::Package(packages::get(client, &id).await?),
        ApiCall::CreatePayment { package_id } => {
            ApiReply::Payment(payments::create(client, &package_id).await?)
        }
        ApiCall::PaymentHistory => ApiReply::Payments(payments::history(client).await?),
        ApiCall::ListReviews { snack_place_id } => {
            ApiReply::Reviews(reviews::list(client, &snack_place_id).await?)
        }
        ApiCall::CreateReview(req) => ApiReply::Review(reviews::create(client, &req).await?),
        ApiCall::ListReplies { review_id } => {
            let replies = reviews::list_replies(client, &review_id).await?;
            ApiReply::Replies { review_id, replies }
        }
        ApiCall::CreateReply { review_id, request } => {
            ApiReply::Reply(reviews::create_reply(client, &review_id, &request).await?)
        }
        ApiCall::Ask(question) => ApiReply::Answer(assistant::ask(client, &question).await?),
        ApiCall::GenerateLogo(req) => ApiReply::Logo(assistant::generate_logo(client, &req).await?),
    };
    Ok(reply)
}

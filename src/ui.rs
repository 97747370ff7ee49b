//! Plain-text rendering of `RenderState` for the line-oriented front end

use crate::app::PaymentPhase;
use crate::messages::render::PaymentView;
use crate::messages::ui_events::Screen;
use crate::messages::RenderState;
use crate::network::client::{Notice, NoticeLevel};

pub const HELP_TEXT: &str = r#"
 SNACKHUB - Commands

 ACCOUNT
   login <email> <password>              Sign in
   merchant-login <email> <password>     Sign in as a merchant
   register <user> <email> <pw> <pw>     Create an account
   forgot <email>                        Email a 6-digit reset code
   otp <digits>                          Type the code and verify it
   otp-back                              Erase the last code digit
   reset <password> <confirm>            Set a new password
   refresh                               Refresh the session token
   logout                                Sign out and forget the session

 PROFILE
   me                                    Show your profile
   update-profile <name> | <phone> | <avatar>
   passwd <old> <new> <confirm>          Change password

 MERCHANT
   onboard                               Load catalogs for a new place
   create-place <name> | <owner> | <email> | <phone> | <address> [| <desc>]
   update-place <name> | <phone> | <address> | <desc>
   place [id]                            Show your (or any) snack place
   dishes                                List dishes of the loaded place
   add-dish <name> | <price> [| <desc>]
   price <dish-id> <price>               Change a dish price
   hide-dish / show-dish <dish-id>
   catalog <tastes|diets|food-types|business-models> [name]

 PREMIUM
   packages [name]                       Search premium packages
   package <id>                          Show one package
   buy <package-id>                      Pay with a QR code
   resume-payment                        Keep waiting for an open payment
   done                                  Leave a confirmed payment
   payments                              Payment history

 REVIEWS
   reviews [place-id]                    List reviews
   review <1-5> <comment>                Review the open place
   replies <review-id>                   List replies
   reply <review-id> <comment>

 ASSISTANT
   ask <question>                        Ask the food assistant
   logo <prompt>                         Generate a logo for your place

 GENERAL
   back / home / help / quit
"#;

/// Format a price in VND with dot thousands separators: `99.000 đ`
pub fn format_price(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let sign = if rounded < 0 { "-" } else { "" };
    format!("{}{} đ", sign, grouped)
}

pub fn notice_line(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Success => format!("[ok] {}", notice.message),
        NoticeLevel::Error => format!("[!!] {}", notice.message),
    }
}

fn phase_label(phase: &PaymentPhase) -> String {
    match phase {
        PaymentPhase::Idle => "Ready".into(),
        PaymentPhase::Creating => "Creating payment...".into(),
        PaymentPhase::AwaitingPayment => "Waiting for payment".into(),
        PaymentPhase::Confirmed => "Paid! Type 'done' to continue".into(),
        PaymentPhase::Done => "Done".into(),
        PaymentPhase::Failed(message) => format!("Stopped: {} (type 'resume-payment' to retry)", message),
    }
}

fn payment_lines(view: &PaymentView, out: &mut Vec<String>) {
    if let Some(name) = &view.package_name {
        out.push(format!("Package: {}", name));
    }
    if let Some(amount) = view.amount {
        out.push(format!("Amount:  {}", format_price(amount)));
    }
    if let Some(qr) = &view.qr_code {
        out.push(format!("Scan to pay: {}", qr));
    }
    out.push(format!("Status:  {}", phase_label(&view.phase)));
    if view.phase == PaymentPhase::AwaitingPayment && view.checks > 0 {
        out.push(format!("Checked {} time(s)", view.checks));
    }
}

/// Lines for the current screen
pub fn render(state: &RenderState) -> Vec<String> {
    let mut out = Vec::new();

    let who = match (&state.display_name, state.is_merchant) {
        (Some(name), true) => format!(" [{} - merchant]", name),
        (Some(name), false) => format!(" [{}]", name),
        (None, _) => String::new(),
    };
    let loading = if state.is_loading { " ..." } else { "" };
    out.push(format!("== {}{}{} ==", state.screen.title(), who, loading));

    match state.screen {
        Screen::Welcome => {
            out.push("Find snacks near you, or run your own snack place.".into());
            out.push("Type 'login', 'register' or 'help'.".into());
        }
        Screen::Login | Screen::Register => {}
        Screen::ForgotPassword => {
            out.push(format!("Code: {}", state.otp_display));
            if state.otp_verified {
                out.push("Code verified.".into());
            }
        }
        Screen::Home => {
            if state.is_merchant {
                out.push("Manage your place with 'place', 'dishes' or 'onboard'.".into());
            }
            out.push("Browse 'packages', read 'reviews' or 'ask' the assistant.".into());
        }
        Screen::Profile => {
            if let Some(user) = &state.user {
                out.push(format!("Name:  {}", user.display_name()));
                out.push(format!("Email: {}", user.email));
                if let Some(phone) = &user.phone {
                    out.push(format!("Phone: {}", phone));
                }
                out.push(format!("Role:  {}", user.role.as_str()));
                if user.is_premium {
                    let until = user
                        .premium_expired_at
                        .map(|t| format!(" until {}", t.format("%Y-%m-%d")))
                        .unwrap_or_default();
                    out.push(format!("Premium{}", until));
                }
            }
        }
        Screen::Onboarding => {
            let c = &state.catalog;
            out.push(format!(
                "{} business models, {} tastes, {} diets, {} food types",
                c.business_models.len(),
                c.tastes.len(),
                c.diets.len(),
                c.food_types.len()
            ));
        }
        Screen::MyPlace => {
            if let Some(place) = &state.place {
                out.push(format!("{} ({})", place.place_name, place.id));
                out.push(format!("{}  {}", place.address, place.phone));
                if let (Some(open), Some(close)) = (&place.opening_time, &place.closing_time) {
                    out.push(format!("Open {} - {}", open, close));
                }
                if let Some(description) = &place.description {
                    out.push(description.clone());
                }
                if !place.is_active {
                    out.push("(inactive)".into());
                }
            }
        }
        Screen::Dishes => {
            if state.dishes.is_empty() {
                out.push("No dishes yet.".into());
            }
            for dish in &state.dishes {
                let hidden = if dish.is_active { "" } else { " (hidden)" };
                out.push(format!("{}  {}  {}{}", dish.id, dish.name, format_price(dish.price), hidden));
            }
        }
        Screen::Packages => {
            for package in &state.packages {
                out.push(format!(
                    "{}  {}  {} / {} days",
                    package.id,
                    package.name,
                    format_price(package.price),
                    package.duration_days
                ));
            }
        }
        Screen::PackageDetail => {
            if let Some(package) = &state.package {
                out.push(format!("{} - {}", package.name, format_price(package.price)));
                if let Some(description) = &package.description {
                    out.push(description.clone());
                }
                out.extend(package.features.iter().map(|f| format!("  * {}", f)));
                out.push(format!("Type 'buy {}' to upgrade.", package.id));
            }
        }
        Screen::Payment => {
            if let Some(view) = &state.payment {
                payment_lines(view, &mut out);
            }
        }
        Screen::PaymentHistory => {
            for payment in &state.payments {
                let when = payment
                    .created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                let status = if payment.paid { "paid" } else { "pending" };
                out.push(format!("{}  {}  {}  {}", when, payment.package_id, format_price(payment.amount), status));
            }
        }
        Screen::Reviews => {
            for review in &state.reviews {
                out.push(format!(
                    "{}  {}{}  {}",
                    review.id,
                    "*".repeat(review.rating as usize),
                    " ".repeat(5usize.saturating_sub(review.rating as usize)),
                    review.comment
                ));
            }
            if let Some((review_id, replies)) = &state.replies {
                out.push(format!("Replies to {}:", review_id));
                out.extend(replies.iter().map(|r| format!("  > {}", r.comment)));
            }
        }
        Screen::Assistant => {
            if let Some(answer) = &state.answer {
                out.push(answer.clone());
            }
        }
    }

    if let Some((kind, items)) = &state.catalog_search {
        out.push(format!("{}:", kind.resource()));
        out.extend(items.iter().map(|i| format!("  {}  {}", i.id, i.name)));
    }
    if let Some(url) = &state.logo_url {
        out.push(format!("Logo: {}", url));
    }
    if let Some(info) = &state.info {
        out.push(info.clone());
    }
    if let Some(error) = &state.error {
        out.push(format!("Error: {}", error));
    }
    out.extend(state.notices.iter().map(notice_line));
    out
}

//! UI events - messages from the front end to the App layer

use crate::models::{
    CatalogKind, CreateSnackPlaceRequest, UpdateDishRequest, UpdateSnackPlaceRequest,
    UpdateUserRequest,
};

/// Screens the app can show
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Screen {
    #[default]
    Welcome,
    Login,
    Register,
    ForgotPassword,
    Home,
    Profile,
    Onboarding,
    MyPlace,
    Dishes,
    Packages,
    PackageDetail,
    Payment,
    PaymentHistory,
    Reviews,
    Assistant,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Welcome => "Welcome",
            Screen::Login => "Sign in",
            Screen::Register => "Create account",
            Screen::ForgotPassword => "Reset password",
            Screen::Home => "Home",
            Screen::Profile => "Profile",
            Screen::Onboarding => "Open your snack place",
            Screen::MyPlace => "My snack place",
            Screen::Dishes => "Dishes",
            Screen::Packages => "Premium packages",
            Screen::PackageDetail => "Package",
            Screen::Payment => "Payment",
            Screen::PaymentHistory => "Payment history",
            Screen::Reviews => "Reviews",
            Screen::Assistant => "Assistant",
        }
    }

    /// Screens reachable without a session
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Screen::Welcome | Screen::Login | Screen::Register | Screen::ForgotPassword
        )
    }
}

/// Events generated from user input in the front end
#[derive(Debug, Clone)]
pub enum UiEvent {
    // Navigation
    Open(Screen),
    Back,

    // Account
    Login { email: String, password: String },
    MerchantLogin { email: String, password: String },
    Register {
        username: String,
        email: String,
        password: String,
        confirmation: String,
    },
    ForgotPassword { email: String },
    OtpKey(char),
    OtpBackspace,
    SubmitOtp,
    ResetPassword { password: String, confirmation: String },
    Logout,
    RefreshSession,

    // Profile
    ShowProfile,
    UpdateProfile(UpdateUserRequest),
    ChangePassword {
        old_password: String,
        new_password: String,
        confirmation: String,
    },

    // Merchant
    StartOnboarding,
    CreatePlace(CreateSnackPlaceRequest),
    UpdatePlace(UpdateSnackPlaceRequest),
    ShowPlace(Option<String>),
    AddDish {
        name: String,
        price: f64,
        description: Option<String>,
    },
    UpdateDish { id: String, request: UpdateDishRequest },
    ListDishes,
    SearchCatalog { kind: CatalogKind, name: Option<String> },

    // Premium
    ShowPackages { name: Option<String> },
    ShowPackage(String),
    BuyPackage(String),
    ResumePayment,
    FinishPayment,
    PaymentHistory,

    // Reviews
    ShowReviews(Option<String>),
    AddReview {
        snack_place_id: Option<String>,
        rating: u8,
        comment: String,
    },
    ShowReplies(String),
    AddReply { review_id: String, comment: String },

    // Assistant
    Ask(String),
    GenerateLogo { prompt: String },

    // System
    Help,
    Quit,
}

/// Parse one line typed at the prompt into events.
///
/// Most commands yield a single event; `otp 123456` yields one key event per digit.
pub fn parse_command(line: &str) -> Result<Vec<UiEvent>, String> {
    let line = line.trim();
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let event = match cmd.to_lowercase().as_str() {
        "" => return Ok(Vec::new()),
        "help" | "?" => UiEvent::Help,
        "quit" | "exit" | "q" => UiEvent::Quit,
        "back" => UiEvent::Back,
        "home" => UiEvent::Open(Screen::Home),

        "login" => {
            let [email, password] = exact::<2>(&args, "login <email> <password>")?;
            UiEvent::Login { email, password }
        }
        "merchant-login" => {
            let [email, password] = exact::<2>(&args, "merchant-login <email> <password>")?;
            UiEvent::MerchantLogin { email, password }
        }
        "register" => {
            let [username, email, password, confirmation] =
                exact::<4>(&args, "register <username> <email> <password> <confirm>")?;
            UiEvent::Register {
                username,
                email,
                password,
                confirmation,
            }
        }
        "forgot" => {
            let [email] = exact::<1>(&args, "forgot <email>")?;
            UiEvent::ForgotPassword { email }
        }
        "otp" => {
            if rest.is_empty() {
                return Err("usage: otp <digits>".into());
            }
            // Every key is forwarded; the OTP input decides what it accepts.
            let mut events: Vec<UiEvent> = rest
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(UiEvent::OtpKey)
                .collect();
            events.push(UiEvent::SubmitOtp);
            return Ok(events);
        }
        "otp-back" => UiEvent::OtpBackspace,
        "reset" => {
            let [password, confirmation] = exact::<2>(&args, "reset <password> <confirm>")?;
            UiEvent::ResetPassword {
                password,
                confirmation,
            }
        }
        "logout" => UiEvent::Logout,
        "refresh" => UiEvent::RefreshSession,

        "me" | "profile" => UiEvent::ShowProfile,
        "update-profile" => {
            let fields = pipe_fields(rest);
            UiEvent::UpdateProfile(UpdateUserRequest {
                full_name: fields.first().cloned().flatten(),
                phone: fields.get(1).cloned().flatten(),
                avatar: fields.get(2).cloned().flatten(),
            })
        }
        "passwd" => {
            let [old_password, new_password, confirmation] =
                exact::<3>(&args, "passwd <old> <new> <confirm>")?;
            UiEvent::ChangePassword {
                old_password,
                new_password,
                confirmation,
            }
        }

        "onboard" => UiEvent::StartOnboarding,
        "create-place" => {
            let fields = pipe_fields(rest);
            if fields.len() < 5 {
                return Err(
                    "usage: create-place <name> | <owner> | <email> | <phone> | <address> [| <description>]"
                        .into(),
                );
            }
            let field = |i: usize| fields.get(i).cloned().flatten().unwrap_or_default();
            UiEvent::CreatePlace(CreateSnackPlaceRequest {
                place_name: field(0),
                owner_name: field(1),
                email: field(2),
                phone: field(3),
                address: field(4),
                description: fields.get(5).cloned().flatten(),
                ..Default::default()
            })
        }
        "update-place" => {
            let fields = pipe_fields(rest);
            UiEvent::UpdatePlace(UpdateSnackPlaceRequest {
                place_name: fields.first().cloned().flatten(),
                phone: fields.get(1).cloned().flatten(),
                address: fields.get(2).cloned().flatten(),
                description: fields.get(3).cloned().flatten(),
                ..Default::default()
            })
        }
        "place" => UiEvent::ShowPlace(args.first().map(|s| s.to_string())),
        "dishes" => UiEvent::ListDishes,
        "add-dish" => {
            let fields = pipe_fields(rest);
            let name = fields.first().cloned().flatten();
            let price = fields
                .get(1)
                .cloned()
                .flatten()
                .and_then(|p| p.parse::<f64>().ok());
            match (name, price) {
                (Some(name), Some(price)) => UiEvent::AddDish {
                    name,
                    price,
                    description: fields.get(2).cloned().flatten(),
                },
                _ => return Err("usage: add-dish <name> | <price> [| <description>]".into()),
            }
        }
        "price" => {
            let [id, price] = exact::<2>(&args, "price <dish-id> <price>")?;
            let price = price
                .parse::<f64>()
                .map_err(|_| format!("not a price: {}", price))?;
            UiEvent::UpdateDish {
                id,
                request: UpdateDishRequest {
                    price: Some(price),
                    ..Default::default()
                },
            }
        }
        "hide-dish" | "show-dish" => {
            let [id] = exact::<1>(&args, "hide-dish <dish-id>")?;
            UiEvent::UpdateDish {
                id,
                request: UpdateDishRequest {
                    is_active: Some(cmd.eq_ignore_ascii_case("show-dish")),
                    ..Default::default()
                },
            }
        }
        "catalog" => {
            let kind = args
                .first()
                .and_then(|k| CatalogKind::parse(k))
                .ok_or("usage: catalog <tastes|diets|food-types|business-models> [name]")?;
            UiEvent::SearchCatalog {
                kind,
                name: args.get(1).map(|s| s.to_string()),
            }
        }

        "packages" => UiEvent::ShowPackages {
            name: non_empty(rest),
        },
        "package" => {
            let [id] = exact::<1>(&args, "package <id>")?;
            UiEvent::ShowPackage(id)
        }
        "buy" => {
            let [id] = exact::<1>(&args, "buy <package-id>")?;
            UiEvent::BuyPackage(id)
        }
        "resume-payment" => UiEvent::ResumePayment,
        "done" => UiEvent::FinishPayment,
        "payments" => UiEvent::PaymentHistory,

        "reviews" => UiEvent::ShowReviews(args.first().map(|s| s.to_string())),
        "review" => {
            let rating = args
                .first()
                .and_then(|r| r.parse::<u8>().ok())
                .ok_or("usage: review <rating 1-5> <comment>")?;
            let comment = rest
                .split_once(char::is_whitespace)
                .map(|(_, c)| c.trim().to_string())
                .unwrap_or_default();
            UiEvent::AddReview {
                snack_place_id: None,
                rating,
                comment,
            }
        }
        "replies" => {
            let [id] = exact::<1>(&args, "replies <review-id>")?;
            UiEvent::ShowReplies(id)
        }
        "reply" => {
            let (review_id, comment) = rest
                .split_once(char::is_whitespace)
                .ok_or("usage: reply <review-id> <comment>")?;
            UiEvent::AddReply {
                review_id: review_id.to_string(),
                comment: comment.trim().to_string(),
            }
        }

        "ask" => UiEvent::Ask(rest.to_string()),
        "logo" => UiEvent::GenerateLogo {
            prompt: rest.to_string(),
        },

        other => return Err(format!("unknown command '{}', type 'help'", other)),
    };

    Ok(vec![event])
}

fn exact<const N: usize>(args: &[&str], usage: &str) -> Result<[String; N], String> {
    if args.len() != N {
        return Err(format!("usage: {}", usage));
    }
    Ok(std::array::from_fn(|i| args[i].to_string()))
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// `a | | c` -> `[Some(a), None, Some(c)]`
fn pipe_fields(rest: &str) -> Vec<Option<String>> {
    if rest.trim().is_empty() {
        return Vec::new();
    }
    rest.split('|').map(non_empty).collect()
}

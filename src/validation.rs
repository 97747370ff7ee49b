//! Submit-time form checks run before any request leaves the client

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,20}$").expect("valid username regex"));

// The regex crate has no look-around, so letter/digit presence is checked separately.
static PASSWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z\d@$!%*#?&]{8,}$").expect("valid password regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0|\+84)\d{9,10}$").expect("valid phone regex"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Email address is not valid")]
    InvalidEmail,

    #[error("Username must be 3-20 letters, digits or underscores")]
    InvalidUsername,

    #[error("Password must be at least 8 characters and contain a letter and a digit")]
    WeakPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Phone number is not valid")]
    InvalidPhone,

    #[error("Enter every digit of the code")]
    IncompleteOtp,

    #[error("{0}")]
    Invalid(String),
}

pub type ValidationResult = Result<(), ValidationError>;

pub fn require(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

pub fn validate_email(email: &str) -> ValidationResult {
    require("Email", email)?;
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

pub fn validate_username(username: &str) -> ValidationResult {
    require("Username", username)?;
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUsername)
    }
}

pub fn validate_password(password: &str) -> ValidationResult {
    require("Password", password)?;
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if PASSWORD_RE.is_match(password) && has_letter && has_digit {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword)
    }
}

pub fn validate_phone(phone: &str) -> ValidationResult {
    require("Phone", phone)?;
    if PHONE_RE.is_match(phone.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

pub fn validate_password_confirmation(password: &str, confirmation: &str) -> ValidationResult {
    validate_password(password)?;
    if password == confirmation {
        Ok(())
    } else {
        Err(ValidationError::PasswordMismatch)
    }
}

/// Login only checks presence and email shape; strength rules apply on register
pub fn validate_login(email: &str, password: &str) -> ValidationResult {
    validate_email(email)?;
    require("Password", password)
}

pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirmation: &str,
) -> ValidationResult {
    validate_username(username)?;
    validate_email(email)?;
    validate_password_confirmation(password, confirmation)
}

pub fn validate_price(price: f64) -> ValidationResult {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::Invalid("Price must be greater than zero".into()))
    }
}

pub fn validate_rating(rating: u8) -> ValidationResult {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ValidationError::Invalid("Rating must be between 1 and 5".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_rules() {
        assert!(validate_email("an.nguyen+food@example.com.vn").is_ok());
        assert_eq!(validate_email(""), Err(ValidationError::Required("Email")));
        assert_eq!(validate_email("no-at-sign.com"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("a@b.c"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("a b@example.com"), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("snack_king_99").is_ok());
        assert_eq!(validate_username("ab"), Err(ValidationError::InvalidUsername));
        assert_eq!(validate_username("has space"), Err(ValidationError::InvalidUsername));
        assert_eq!(
            validate_username("a_very_long_username_indeed"),
            Err(ValidationError::InvalidUsername)
        );
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("banhmi2024").is_ok());
        assert!(validate_password("P@ssw0rd!").is_ok());
        assert_eq!(validate_password("short1"), Err(ValidationError::WeakPassword));
        assert_eq!(validate_password("onlyletters"), Err(ValidationError::WeakPassword));
        assert_eq!(validate_password("12345678"), Err(ValidationError::WeakPassword));
        assert_eq!(validate_password("spaces not1"), Err(ValidationError::WeakPassword));
    }

    #[test]
    fn test_password_confirmation() {
        assert_eq!(
            validate_password_confirmation("banhmi2024", "banhmi2025"),
            Err(ValidationError::PasswordMismatch)
        );
        assert!(validate_registration("linh", "linh@example.com", "banhmi2024", "banhmi2024").is_ok());
    }

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone("0901234567").is_ok());
        assert!(validate_phone("+84901234567").is_ok());
        assert_eq!(validate_phone("12345"), Err(ValidationError::InvalidPhone));
    }

    #[test]
    fn test_login_does_not_check_strength() {
        assert!(validate_login("linh@example.com", "x").is_ok());
        assert_eq!(
            validate_login("linh@example.com", "  "),
            Err(ValidationError::Required("Password"))
        );
    }
}

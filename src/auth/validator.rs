//! Format rules for registration and login fields.

use regex::Regex;
use secrecy::ExposeSecret;
use std::sync::LazyLock;

use super::models::{LoginAttempt, Registration};

// `\d` is Unicode-aware in `regex`, digits are spelled out as ASCII ranges.
static USERNAME: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,15}$"));
static ID_NUMBER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[0-9]{13}$"));
static ACCOUNT_NUMBER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10,16}$"));

// No look-around in `regex`: the alphabet and each required class are separate patterns.
static PASSWORD_ALPHABET: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9@$!%*?&]{8,}$"));
static PASSWORD_CLASSES: LazyLock<Vec<Result<Regex, regex::Error>>> = LazyLock::new(|| {
    ["[a-z]", "[A-Z]", "[0-9]", "[@$!%*?&]"]
        .into_iter()
        .map(Regex::new)
        .collect()
});

/// First failing rule of a registration or login request.
///
/// The display strings are returned to the client verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Please provide both username and password")]
    MissingCredentials,
    #[error("Invalid username format. Use 3-15 characters, letters, numbers, or underscores.")]
    Username,
    #[error("ID Number must be 13 digits")]
    IdNumber,
    #[error("Account Number must be between 10 and 16 digits")]
    AccountNumber,
    #[error(
        "Password must be at least 8 characters long and contain at least one uppercase letter, one lowercase letter, one number, and one special character."
    )]
    Password,
}

fn pattern_matches(pattern: &Result<Regex, regex::Error>, value: &str) -> bool {
    pattern.as_ref().is_ok_and(|regex| regex.is_match(value))
}

#[must_use]
pub fn is_valid_username(username: &str) -> bool {
    pattern_matches(&USERNAME, username)
}

#[must_use]
pub fn is_valid_id_number(id_number: &str) -> bool {
    pattern_matches(&ID_NUMBER, id_number)
}

#[must_use]
pub fn is_valid_account_number(account_number: &str) -> bool {
    pattern_matches(&ACCOUNT_NUMBER, account_number)
}

/// Lowercase, uppercase, digit and one of `@$!%*?&`, at least 8 characters,
/// nothing outside those classes.
#[must_use]
pub fn is_valid_password(password: &str) -> bool {
    pattern_matches(&PASSWORD_ALPHABET, password)
        && PASSWORD_CLASSES
            .iter()
            .all(|class| class.as_ref().is_ok_and(|regex| regex.is_match(password)))
}

/// Check a registration in order: presence, username, ID number, account
/// number, password. Stops at the first failure.
///
/// # Errors
/// Returns the first failing rule.
pub fn validate_registration(registration: &Registration) -> Result<(), ValidationError> {
    let password = registration.password.expose_secret();

    if registration.username.is_empty()
        || password.is_empty()
        || registration.id_number.is_empty()
        || registration.account_number.is_empty()
    {
        return Err(ValidationError::MissingFields);
    }

    if !is_valid_username(&registration.username) {
        return Err(ValidationError::Username);
    }

    if !is_valid_id_number(&registration.id_number) {
        return Err(ValidationError::IdNumber);
    }

    if !is_valid_account_number(&registration.account_number) {
        return Err(ValidationError::AccountNumber);
    }

    if !is_valid_password(password) {
        return Err(ValidationError::Password);
    }

    Ok(())
}

/// Login only requires both fields to be present; formats are not checked so
/// validation messages never reveal which accounts exist.
///
/// # Errors
/// Returns `MissingCredentials` when either field is empty.
pub fn validate_login(attempt: &LoginAttempt) -> Result<(), ValidationError> {
    if attempt.username.is_empty() || attempt.password.expose_secret().is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(())
}

//! Account input validation

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;
const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 8..=128;

/// Why a username or password was refused; the message goes to the caller
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be between {min} and {max} characters long")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("Username can only contain letters, numbers, dots, dashes and underscores")]
    UsernameCharacters,

    #[error("Password must contain at least one {0}")]
    PasswordMissing(&'static str),
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::Missing("Username"));
    }

    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(ValidationError::Length {
            field: "Username",
            min: *USERNAME_LEN.start(),
            max: *USERNAME_LEN.end(),
        });
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err(ValidationError::UsernameCharacters);
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Missing("Password"));
    }

    if !PASSWORD_LEN.contains(&password.chars().count()) {
        return Err(ValidationError::Length {
            field: "Password",
            min: *PASSWORD_LEN.start(),
            max: *PASSWORD_LEN.end(),
        });
    }

    let classes: [(&'static str, fn(&char) -> bool); 4] = [
        ("uppercase letter", char::is_ascii_uppercase),
        ("lowercase letter", char::is_ascii_lowercase),
        ("digit", char::is_ascii_digit),
        ("special character", |c| !c.is_alphanumeric()),
    ];

    for (class, matches) in classes {
        if !password.chars().any(|c| matches(&c)) {
            return Err(ValidationError::PasswordMissing(class));
        }
    }

    Ok(())
}

//! Form validation and translation of backend error codes into user-facing text.

use lazy_static::lazy_static;
use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 6;

const DEFAULT_ERROR: &str = "An error occurred";

pub fn validate_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Length is counted in characters, not bytes.
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Maps a backend error code to the message shown to the user.
///
/// Unknown codes fall back to `raw_message` when one is supplied and non-empty.
pub fn map_backend_error(code: &str, raw_message: Option<&str>) -> String {
    let known = match code {
        "auth/email-already-in-use" => Some("Email is already registered"),
        "auth/invalid-email" => Some("Invalid email format"),
        "auth/user-disabled" => Some("This account has been disabled"),
        "auth/user-not-found" => Some("No account found with this email"),
        "auth/wrong-password" => Some("Incorrect password"),
        "auth/too-many-requests" => Some("Too many failed attempts. Please try again later"),
        "auth/weak-password" => Some("Password should be at least 6 characters"),
        _ => None,
    };

    match (known, raw_message) {
        (Some(msg), _) => msg.to_string(),
        (None, Some(raw)) if !raw.is_empty() => raw.to_string(),
        _ => DEFAULT_ERROR.to_string(),
    }
}

/// Returns an empty string when `value` is acceptable for `field`.
pub fn field_error_message(field: &str, value: &str) -> String {
    let msg = match field {
        "email" if value.is_empty() => "Email is required",
        "email" if !validate_email(value) => "Invalid email format",
        "password" if value.is_empty() => "Password is required",
        "password" if !validate_password(value) => "Password must be at least 6 characters",
        _ => "",
    };
    msg.to_string()
}

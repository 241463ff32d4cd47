//! Username validation.
//!
//! Usernames are 1 to 39 characters of ASCII letters, digits and single
//! hyphens, and may not start or end with a hyphen.

pub const MAX_USERNAME_LEN: usize = 39;

pub const LENGTH_MESSAGE: &str = "Usernames are between 1 and 39 characters";
pub const CHARSET_MESSAGE: &str = "Usernames can only contain alphanumerics and single hyphens";

/// Check `username`, returning every rule it breaks.
pub fn validate_username(username: &str) -> Result<(), Vec<String>> {
    let mut violations = Vec::new();

    let len = username.chars().count();
    if len == 0 || len > MAX_USERNAME_LEN {
        violations.push(LENGTH_MESSAGE.to_string());
    }
    if !has_valid_charset(username) {
        violations.push(CHARSET_MESSAGE.to_string());
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn has_valid_charset(username: &str) -> bool {
    username
        .split('-')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()))
}

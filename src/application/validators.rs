use validator::ValidateEmail;

pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;
pub const MAX_LOCATION_NAME_LEN: usize = 120;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Validates a phone number in a loose international format.
/// Rules:
/// - optional leading '+'
/// - digits, spaces, hyphens, dots and parentheses only
/// - between 7 and 15 digits
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    let body = phone.strip_prefix('+').unwrap_or(phone);
    if body.is_empty() {
        return false;
    }

    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')'))
    {
        return false;
    }

    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();
    (7..=15).contains(&digits)
}

/// Validates a caller-supplied idempotency token.
/// Rules:
/// - 1-128 characters
/// - ASCII alphanumerics, hyphens and underscores only
pub fn is_valid_idempotency_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_IDEMPOTENCY_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

use std::sync::OnceLock;

use regex::Regex;

const EMAIL_SHAPE: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(EMAIL_SHAPE).expect("valid email pattern"))
}

/// Shape check only; deliverability is the provider's concern.
pub fn is_valid_email(candidate: &str) -> bool {
    email_pattern().is_match(candidate)
}

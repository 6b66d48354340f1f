/// Format checks for semantic string subtypes. A violation yields an extra
/// diagnostic message; it never replaces the pattern/length checks on the
/// same node.
use crate::ast::Format;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid literal regex"))
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid literal regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+$").expect("valid literal regex"))
}

/// Check `value` against `format`. Returns the violation message, or `None`
/// when the value conforms.
pub fn check(format: Format, value: &str) -> Option<String> {
    match format {
        Format::Date => {
            if !date_re().is_match(value) {
                return Some("Invalid date format. Expected YYYY-MM-DD".to_string());
            }
            // Shape alone is not enough: 2024-02-30 must be rejected.
            if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
                return Some(format!("Invalid date: {value}"));
            }
            None
        }
        Format::Time => (!time_re().is_match(value))
            .then(|| "Invalid time format. Expected HH:MM (24-hour)".to_string()),
        // date-time fields carry their own pattern in the schema.
        Format::DateTime => None,
        Format::Email => (!email_re().is_match(value)).then(|| "Invalid email format".to_string()),
        Format::Uri => url::Url::parse(value)
            .is_err()
            .then(|| "Invalid URI format".to_string()),
    }
}

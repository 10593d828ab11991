// ── Field validation rules ──
//
// Each editable field declares a static rule slice. A field with no
// rules is always valid. Rules see the stored value, never a candidate.

use crate::model::FieldValue;

/// One validation rule attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Non-empty after trimming.
    Required,
    /// At most `n` characters.
    MaxLength(usize),
    /// `local@domain.tld` shape when present.
    Email,
    /// Optional leading `+`, then digits, spaces, dashes or parentheses.
    PhoneNumber,
    /// Rejects one specific value (case-insensitive).
    Forbidden {
        value: &'static str,
        message: &'static str,
    },
}

impl Rule {
    /// Validate `value`, returning the error message on failure.
    pub fn check(&self, field: &str, value: &FieldValue) -> Option<String> {
        match *self {
            Self::Required => value.is_blank().then(|| format!("{field} is required")),
            Self::MaxLength(max) => {
                let len = value.as_text().map_or(0, |s| s.chars().count());
                (len > max).then(|| format!("{field} must be at most {max} characters"))
            }
            Self::Email => present_text(value)
                .filter(|s| !looks_like_email(s))
                .map(|_| format!("{field} is not a valid email address")),
            Self::PhoneNumber => present_text(value)
                .filter(|s| !looks_like_phone_number(s))
                .map(|_| format!("{field} is not a valid phone number")),
            Self::Forbidden {
                value: forbidden,
                message,
            } => value
                .as_text()
                .filter(|s| s.trim().eq_ignore_ascii_case(forbidden))
                .map(|_| message.to_owned()),
        }
    }
}

/// Run every rule and collect the failures in rule order.
pub fn check_all(rules: &[Rule], field: &str, value: &FieldValue) -> Vec<String> {
    rules
        .iter()
        .filter_map(|rule| rule.check(field, value))
        .collect()
}

fn present_text(value: &FieldValue) -> Option<&str> {
    value.as_text().map(str::trim).filter(|s| !s.is_empty())
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

fn looks_like_phone_number(s: &str) -> bool {
    let body = s.strip_prefix('+').unwrap_or(s);
    body.chars().any(|c| c.is_ascii_digit())
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
}

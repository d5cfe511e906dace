//! Field validation rules.

use serde_json::Value;

/// A single constraint on a form field.
///
/// Every rule except [`Rule::Required`] and [`Rule::NonEmptyList`] treats an
/// empty value as valid, so optional fields only get checked once filled in.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    /// Absolute http(s) URL
    Url,
    NumberRange { min: f64, max: f64 },
    /// At least one element (tags)
    NonEmptyList,
    OneOf(&'static [&'static str]),
}

impl Rule {
    /// Check `value` against this rule, returning the violation message.
    pub fn check(&self, label: &str, value: Option<&Value>) -> Option<String> {
        let empty = is_empty(value);

        match self {
            Rule::Required => empty.then(|| format!("{} is required", label)),
            Rule::NonEmptyList => {
                let count = match value {
                    Some(Value::Array(items)) => items.iter().filter(|v| !is_blank(v)).count(),
                    Some(Value::String(s)) => s.split(',').filter(|t| !t.trim().is_empty()).count(),
                    _ => 0,
                };
                (count == 0).then(|| format!("Add at least one {}", label.to_lowercase()))
            }
            _ if empty => None,
            Rule::MinLength(min) => {
                let len = text_len(value?)?;
                (len < *min).then(|| format!("{} must be at least {} characters", label, min))
            }
            Rule::MaxLength(max) => {
                let len = text_len(value?)?;
                (len > *max).then(|| format!("{} must be at most {} characters", label, max))
            }
            Rule::Url => {
                let raw = value?.as_str().unwrap_or_default().trim();
                let valid = reqwest::Url::parse(raw)
                    .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
                    .unwrap_or(false);
                (!valid).then(|| format!("{} must be a valid URL", label))
            }
            Rule::NumberRange { min, max } => match as_number(value?) {
                Some(n) if n >= *min && n <= *max => None,
                Some(_) => Some(format!("{} must be between {} and {}", label, min, max)),
                None => Some(format!("{} must be a number", label)),
            },
            Rule::OneOf(allowed) => {
                let raw = value?.as_str().unwrap_or_default();
                (!allowed.contains(&raw))
                    .then(|| format!("{} must be one of: {}", label, allowed.join(", ")))
            }
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn is_empty(value: Option<&Value>) -> bool {
    value.map(is_blank).unwrap_or(true)
}

fn text_len(value: &Value) -> Option<usize> {
    value.as_str().map(|s| s.trim().chars().count())
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

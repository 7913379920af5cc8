use serde::Serialize;
use std::collections::BTreeMap;

/// Field-keyed validation messages accumulated across a whole request body
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Converts the accumulated errors into a result
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn require(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field is required.");
        }
    }

    pub fn length(&mut self, field: &'static str, value: &str, min: usize, max: Option<usize>) {
        let len = value.chars().count();
        if len < min {
            self.add(field, format!("Field must be at least {} characters long.", min));
        }
        if let Some(max) = max {
            if len > max {
                self.add(field, format!("Field cannot be longer than {} characters.", max));
            }
        }
    }

    pub fn url(&mut self, field: &'static str, value: &str) {
        if !is_http_url(value) {
            self.add(field, "Invalid URL.");
        }
    }

    pub fn email(&mut self, field: &'static str, value: &str) {
        let valid = value
            .split_once('@')
            .map(|(local, domain)| {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            })
            .unwrap_or(false);
        if !valid || value.chars().any(char::is_whitespace) {
            self.add(field, "Invalid email address.");
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.keys().copied().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// A request body that checks itself field by field
pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

/// True for absolute http(s) URLs with a host
pub fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

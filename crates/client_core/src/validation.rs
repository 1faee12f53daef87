//! Declarative per-field rules evaluated into a field -> message map.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::{Map, Value};

/// Field values collected by a form, keyed by field name.
pub type FormValues = Map<String, Value>;

/// First failing message per field. Empty means the values are valid.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    Email,
    MinLength(usize),
    MaxLength(usize),
    OneOf(Vec<String>),
    /// `YYYY-MM-DD`.
    Date,
    Digits,
    /// Must equal the value of the named field.
    Matches(String),
}

#[derive(Debug, Clone, PartialEq)]
struct FieldRule {
    rule: Rule,
    message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    name: String,
    rules: Vec<FieldRule>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule(mut self, rule: Rule, message: impl Into<String>) -> Self {
        self.rules.push(FieldRule {
            rule,
            message: message.into(),
        });
        self
    }

    pub fn required(self, message: impl Into<String>) -> Self {
        self.rule(Rule::Required, message)
    }

    fn check(&self, values: &FormValues) -> Option<&str> {
        let value = values.get(&self.name);
        let text = value.map(value_text).unwrap_or_default();

        for FieldRule { rule, message } in &self.rules {
            let ok = match rule {
                Rule::Required => !text.trim().is_empty(),
                // Remaining rules only judge values that were provided.
                _ if text.is_empty() => true,
                Rule::Email => is_email(&text),
                Rule::MinLength(min) => text.chars().count() >= *min,
                Rule::MaxLength(max) => text.chars().count() <= *max,
                Rule::OneOf(options) => options.iter().any(|option| *option == text),
                Rule::Date => NaiveDate::parse_from_str(&text, "%Y-%m-%d").is_ok(),
                Rule::Digits => text.chars().all(|c| c.is_ascii_digit()),
                Rule::Matches(other) => {
                    values.get(other).map(value_text).unwrap_or_default() == text
                }
            };
            if !ok {
                return Some(message.as_str());
            }
        }
        None
    }
}

/// Rules for one form or one wizard step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepSchema {
    fields: Vec<FieldSchema>,
}

impl StepSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Names of the fields this schema owns.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldSchema::name)
    }

    pub fn validate(&self, values: &FormValues) -> FieldErrors {
        self.fields
            .iter()
            .filter_map(|field| {
                field
                    .check(values)
                    .map(|message| (field.name.clone(), message.to_string()))
            })
            .collect()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_email(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
        && !text.chars().any(char::is_whitespace)
}

/// Builds a [`FormValues`] from string pairs.
pub fn form_values<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> FormValues {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::from(value)))
        .collect()
}

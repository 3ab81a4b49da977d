//! Typed front-matter schemes.
//!
//! A [`Scheme`] declares which front-matter fields a content file carries and
//! what type each one has. Parsing turns the raw front-matter block into a
//! [`Record`]: exactly the declared fields, in declared order, each coerced to
//! its declared type.
//!
//! ## Front-Matter Format
//!
//! ```text
//! # comments and blank lines are ignored
//! name: My First Post
//! date: 01-01-2024
//! draft: false
//! tagline: "quoted values lose one pair of quotes"
//! ```
//!
//! ## Parsing Rules
//!
//! - A required field missing from the block fails with
//!   [`SchemeError::MissingField`]. No partial record is ever returned.
//! - A value that cannot be coerced fails with [`SchemeError::TypeMismatch`].
//! - Keys the scheme does not declare are ignored, unless the scheme is
//!   strict, in which case they fail with [`SchemeError::UnknownField`].
//!
//! ## Dates
//!
//! Dates use one fixed format, [`DATE_FORMAT`] (`day-month-year`), for both
//! parsing and [`format_date`]. Parsing only accepts text that formats back
//! to itself, so `01-01-2024` is a date and `1-1-2024` is a type mismatch.

use chrono::NaiveDate;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// The one textual date format used for front matter and display.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemeError {
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Field '{field}' expects {expected}, got {raw:?}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        raw: String,
    },
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Line {line} is not a `key: value` pair: {text:?}")]
    MalformedLine { line: usize, text: String },
    #[error("Key appears more than once: {0}")]
    DuplicateKey(String),
    #[error("Scheme declares field '{0}' more than once")]
    DuplicateField(String),
}

/// Declared type of a scheme field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Date,
    Int,
    Float,
    Bool,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Date => "date (dd-mm-yyyy)",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemeField {
    pub name: String,
    pub ty: FieldType,
    pub required: bool,
}

/// An ordered set of uniquely named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheme {
    name: String,
    fields: Vec<SchemeField>,
    strict: bool,
}

impl Scheme {
    pub fn builder(name: impl Into<String>) -> SchemeBuilder {
        SchemeBuilder {
            name: name.into(),
            fields: Vec::new(),
            strict: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[SchemeField] {
        &self.fields
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Parse and validate a raw front-matter block.
    pub fn parse(&self, raw: &str) -> Result<Record, SchemeError> {
        let pairs = parse_pairs(raw)?;

        if self.strict {
            let unknown = pairs
                .iter()
                .find(|(key, _)| !self.fields.iter().any(|f| f.name == *key));
            if let Some((key, _)) = unknown {
                return Err(SchemeError::UnknownField(key.to_string()));
            }
        }

        let mut properties = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let raw_value = pairs
                .iter()
                .find(|(key, _)| *key == field.name)
                .map(|(_, value)| *value);
            let value = match raw_value {
                Some(raw) => Some(coerce(field, raw)?),
                None if field.required => {
                    return Err(SchemeError::MissingField(field.name.clone()));
                }
                None => None,
            };
            properties.push(Property {
                name: field.name.clone(),
                value,
            });
        }
        Ok(Record { properties })
    }
}

#[derive(Debug, Clone)]
pub struct SchemeBuilder {
    name: String,
    fields: Vec<SchemeField>,
    strict: bool,
}

impl SchemeBuilder {
    pub fn required(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.field(name, ty, true)
    }

    pub fn optional(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.field(name, ty, false)
    }

    /// Reject front-matter keys the scheme does not declare.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn build(self) -> Result<Scheme, SchemeError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemeError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Scheme {
            name: self.name,
            fields: self.fields,
            strict: self.strict,
        })
    }

    fn field(mut self, name: impl Into<String>, ty: FieldType, required: bool) -> Self {
        self.fields.push(SchemeField {
            name: name.into(),
            ty,
            required,
        });
        self
    }
}

/// Split a front-matter block into `(key, value)` pairs in file order.
fn parse_pairs(raw: &str) -> Result<Vec<(&str, &str)>, SchemeError> {
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (key, value) = trimmed
            .split_once(':')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| SchemeError::MalformedLine {
                line: idx + 1,
                text: line.to_string(),
            })?;
        let key = key.trim();
        if pairs.iter().any(|(k, _)| *k == key) {
            return Err(SchemeError::DuplicateKey(key.to_string()));
        }
        pairs.push((key, unquote(value.trim())));
    }
    Ok(pairs)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn coerce(field: &SchemeField, raw: &str) -> Result<Value, SchemeError> {
    let mismatch = || SchemeError::TypeMismatch {
        field: field.name.clone(),
        expected: field.ty,
        raw: raw.to_string(),
    };
    match field.ty {
        FieldType::String => Ok(Value::String(raw.to_string())),
        FieldType::Date => parse_date(raw).ok_or_else(mismatch).map(Value::Date),
        FieldType::Int => raw.parse().map(Value::Int).map_err(|_| mismatch()),
        FieldType::Float => raw.parse().map(Value::Float).map_err(|_| mismatch()),
        FieldType::Bool => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(mismatch()),
        },
    }
}

/// Parse a date in [`DATE_FORMAT`]. Only canonical (zero-padded) text is accepted.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .filter(|date| format_date(*date) == raw)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// A coerced front-matter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Date(NaiveDate),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Date(d) => f.write_str(&format_date(*d)),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(d) => serializer.serialize_str(&format_date(*d)),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Property {
    name: String,
    value: Option<Value>,
}

/// Parsed front matter: the scheme's fields in declared order.
///
/// Optional fields absent from the file hold `None`. A page registered
/// without a scheme gets an empty record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    properties: Vec<Property>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_ref())
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.get(name)? {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Field names with their values, in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.properties
            .iter()
            .map(|p| (p.name.as_str(), p.value.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len()))?;
        for property in &self.properties {
            map.serialize_entry(&property.name, &property.value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Scheme {
        Scheme::builder("post")
            .required("name", FieldType::String)
            .required("date", FieldType::Date)
            .optional("draft", FieldType::Bool)
            .build()
            .unwrap()
    }

    #[test]
    fn parses_declared_fields_in_order() {
        let record = post()
            .parse("date: 01-01-2024\nname: Test\ndraft: true\n")
            .unwrap();
        let names: Vec<&str> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["name", "date", "draft"]);
        assert_eq!(record.str("name"), Some("Test"));
        assert_eq!(record.date("date"), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(record.bool("draft"), Some(true));
    }

    #[test]
    fn optional_field_absent_is_none() {
        let record = post().parse("name: Test\ndate: 02-03-2024").unwrap();
        assert_eq!(record.len(), 3);
        assert_eq!(record.get("draft"), None);
    }

    #[test]
    fn missing_required_field() {
        let err = post().parse("name: Test").unwrap_err();
        assert_eq!(err, SchemeError::MissingField("date".into()));
    }

    #[test]
    fn missing_required_field_on_empty_block() {
        let err = post().parse("").unwrap_err();
        assert_eq!(err, SchemeError::MissingField("name".into()));
    }

    #[test]
    fn type_mismatch_reports_raw_value() {
        let err = post().parse("name: Test\ndate: tomorrow").unwrap_err();
        assert_eq!(
            err,
            SchemeError::TypeMismatch {
                field: "date".into(),
                expected: FieldType::Date,
                raw: "tomorrow".into(),
            }
        );
    }

    #[test]
    fn non_canonical_date_is_mismatch() {
        let err = post().parse("name: T\ndate: 1-1-2024").unwrap_err();
        assert!(matches!(err, SchemeError::TypeMismatch { .. }));
    }

    #[test]
    fn impossible_date_is_mismatch() {
        let err = post().parse("name: T\ndate: 31-02-2024").unwrap_err();
        assert!(matches!(err, SchemeError::TypeMismatch { .. }));
    }

    #[test]
    fn numeric_and_bool_coercion() {
        let scheme = Scheme::builder("stats")
            .required("count", FieldType::Int)
            .required("ratio", FieldType::Float)
            .required("public", FieldType::Bool)
            .build()
            .unwrap();
        let record = scheme.parse("count: -3\nratio: 0.5\npublic: false").unwrap();
        assert_eq!(record.int("count"), Some(-3));
        assert_eq!(record.float("ratio"), Some(0.5));
        assert_eq!(record.bool("public"), Some(false));

        let err = scheme.parse("count: 3\nratio: 1\npublic: yes").unwrap_err();
        assert!(matches!(err, SchemeError::TypeMismatch { ref field, .. } if field == "public"));
    }

    #[test]
    fn undeclared_keys_ignored_unless_strict() {
        let raw = "name: Test\ndate: 01-01-2024\nauthor: someone";
        let record = post().parse(raw).unwrap();
        assert_eq!(record.get("author"), None);

        let strict = Scheme::builder("post")
            .required("name", FieldType::String)
            .required("date", FieldType::Date)
            .strict()
            .build()
            .unwrap();
        assert_eq!(
            strict.parse(raw).unwrap_err(),
            SchemeError::UnknownField("author".into())
        );
    }

    #[test]
    fn comments_blank_lines_and_quotes() {
        let raw = "# heading\n\nname: \"Hello: world\"\n  date:  05-06-2023  \n";
        let record = post().parse(raw).unwrap();
        assert_eq!(record.str("name"), Some("Hello: world"));
        assert_eq!(record.date("date"), NaiveDate::from_ymd_opt(2023, 6, 5));
    }

    #[test]
    fn malformed_line_is_error() {
        let err = post().parse("name: Test\njust some text").unwrap_err();
        assert_eq!(
            err,
            SchemeError::MalformedLine {
                line: 2,
                text: "just some text".into()
            }
        );
    }

    #[test]
    fn duplicate_key_is_error() {
        let err = post().parse("name: a\nname: b").unwrap_err();
        assert_eq!(err, SchemeError::DuplicateKey("name".into()));
    }

    #[test]
    fn duplicate_field_declaration_is_error() {
        let err = Scheme::builder("bad")
            .required("name", FieldType::String)
            .optional("name", FieldType::Int)
            .build()
            .unwrap_err();
        assert_eq!(err, SchemeError::DuplicateField("name".into()));
    }

    #[test]
    fn date_round_trips_both_ways() {
        let mut date = NaiveDate::from_ymd_opt(1999, 12, 25).unwrap();
        for _ in 0..800 {
            let text = format_date(date);
            assert_eq!(parse_date(&text), Some(date));
            assert_eq!(format_date(parse_date(&text).unwrap()), text);
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn record_serializes_in_declared_order() {
        let record = post()
            .parse("draft: false\ndate: 01-01-2024\nname: Test")
            .unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"name":"Test","date":"01-01-2024","draft":false}"#
        );
    }
}

//! Column types and typed cell values
//!
//! Every data-sheet column declares one of the [`ColumnType`] tags in its
//! first header row. [`parse_value`] turns a raw cell string into a [`Value`]
//! of that type; a column without a tag keeps its raw strings untouched.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};

use crate::error::{Error, Result};

/// Calendar-date rendering used for `date` columns
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Declared type of a data-sheet column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    Int,
    Float,
    Bool,
    Datetime,
    Date,
    Unixtime,
    /// Placeholder; the real type is assigned by reference resolution
    Ref,
}

impl ColumnType {
    /// All tags, in declaration order
    pub const ALL: [ColumnType; 8] = [
        ColumnType::String,
        ColumnType::Int,
        ColumnType::Float,
        ColumnType::Bool,
        ColumnType::Datetime,
        ColumnType::Date,
        ColumnType::Unixtime,
        ColumnType::Ref,
    ];

    /// The tag as written in the type header row
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
            ColumnType::Datetime => "datetime",
            ColumnType::Date => "date",
            ColumnType::Unixtime => "unixtime",
            ColumnType::Ref => "ref",
        }
    }

    /// Parse a type header cell. An empty tag means "no type" and yields `None`.
    pub fn parse_tag(tag: &str) -> Result<Option<ColumnType>> {
        if tag.is_empty() {
            return Ok(None);
        }
        tag.parse().map(Some)
    }

    /// The value an empty cell of this type takes
    pub fn zero_value(&self) -> Value {
        match self {
            ColumnType::String | ColumnType::Ref => Value::String(String::new()),
            ColumnType::Int => Value::Int(0),
            ColumnType::Float => Value::Float(0.0),
            ColumnType::Bool => Value::Bool(false),
            ColumnType::Datetime => Value::Datetime(zero_datetime()),
            ColumnType::Date => Value::Date(zero_datetime().format(DATE_FORMAT).to_string()),
            ColumnType::Unixtime => Value::Unixtime(0),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ColumnType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::parse_failure(s, "", "unknown column type"))
    }
}

/// Render an optional column type the way it appears in a sheet header
pub fn type_name(column_type: Option<ColumnType>) -> &'static str {
    column_type.map_or("", |t| t.as_str())
}

/// A typed cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Datetime(DateTime<FixedOffset>),
    /// Calendar date kept in its rendered `YYYY-MM-DD` form
    Date(String),
    /// Seconds since the Unix epoch
    Unixtime(i64),
}

impl Value {
    /// Create a string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        Value::String(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Date(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) | Value::Unixtime(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) | Value::Date(s) => f.write_str(s),
            Value::Int(n) | Value::Unixtime(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Datetime(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::String(s) | Value::Date(s) => serializer.serialize_str(s),
            Value::Int(n) | Value::Unixtime(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Datetime(_) => serializer.collect_str(self),
        }
    }
}

/// Convert a raw cell string into a value of the declared column type.
///
/// A column without a type returns the raw string unchanged. An empty raw
/// string yields the type's zero value.
pub fn parse_value(column_type: Option<ColumnType>, raw: &str) -> Result<Value> {
    let Some(column_type) = column_type else {
        return Ok(Value::string(raw));
    };
    if raw.is_empty() {
        return Ok(column_type.zero_value());
    }

    let fail = |reason: &dyn fmt::Display| Error::parse_failure(column_type.as_str(), raw, reason);

    match column_type {
        ColumnType::String | ColumnType::Ref => Ok(Value::string(raw)),
        ColumnType::Int => raw.parse().map(Value::Int).map_err(|e| fail(&e)),
        ColumnType::Float => raw.parse().map(Value::Float).map_err(|e| fail(&e)),
        ColumnType::Bool => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| fail(&"invalid boolean literal")),
        ColumnType::Datetime => DateTime::parse_from_rfc3339(raw)
            .map(Value::Datetime)
            .map_err(|e| fail(&e)),
        ColumnType::Date => parse_date(raw)
            .map(|d| Value::Date(d.format(DATE_FORMAT).to_string()))
            .ok_or_else(|| fail(&"invalid date")),
        ColumnType::Unixtime => DateTime::parse_from_rfc3339(raw)
            .map(|t| Value::Unixtime(t.timestamp()))
            .map_err(|e| fail(&e)),
    }
}

/// `0001-01-01T00:00:00Z`, the zero timestamp
pub fn zero_datetime() -> DateTime<FixedOffset> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc().fixed_offset())
        .unwrap_or_default()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|t| t.date_naive()))
}

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::TdsHelperError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Values that can be stored in a result row or bound as a request parameter.
///
/// The same enum is used for cells coming back from SQL Server and for the values
/// callers hand to [`merge`](crate::params::merge):
/// ```rust
/// use tds_helper::prelude::*;
///
/// let values = vec![
///     RowValues::Int(1),
///     RowValues::from("alice"),
///     RowValues::Bool(true),
/// ];
/// # let _ = values;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            return parse_timestamp(s).ok();
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Render the value as JSON, the way rows are exposed by
    /// [`QueryOutput::into_json`](crate::results::QueryOutput::into_json).
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            RowValues::Int(i) => JsonValue::from(*i),
            RowValues::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(JsonValue::Null, JsonValue::Number),
            RowValues::Text(s) => JsonValue::String(s.clone()),
            RowValues::Bool(b) => JsonValue::Bool(*b),
            RowValues::Timestamp(dt) => JsonValue::String(dt.format(TIMESTAMP_FORMAT).to_string()),
            RowValues::Null => JsonValue::Null,
            RowValues::JSON(v) => v.clone(),
            RowValues::Blob(bytes) => JsonValue::from(bytes.clone()),
        }
    }
}

impl From<JsonValue> for RowValues {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => RowValues::Null,
            JsonValue::Bool(b) => RowValues::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => RowValues::Int(i),
                None => n.as_f64().map_or(RowValues::Null, RowValues::Float),
            },
            JsonValue::String(s) => RowValues::Text(s),
            other => RowValues::JSON(other),
        }
    }
}

impl From<RowValues> for JsonValue {
    fn from(value: RowValues) -> Self {
        value.to_json()
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_owned())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(value: Vec<u8>) -> Self {
        RowValues::Blob(value)
    }
}

/// Parse date text into a timestamp.
///
/// Accepts RFC 3339 (offsets are normalised to UTC), ISO-8601 without an offset
/// (`T` or space separated, optional fractional seconds) and bare `YYYY-MM-DD` dates.
///
/// # Errors
/// Returns `TdsHelperError::ParameterError` if none of the formats match.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, TdsHelperError> {
    let text = text.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_utc());
    }
    for fmt in [TIMESTAMP_FORMAT, "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }
    Err(TdsHelperError::ParameterError(format!(
        "invalid date value: {text}"
    )))
}

/// SQL Server parameter types.
///
/// Parsing is case-insensitive, so declarations loaded from configuration may say
/// `"nvarchar"` or `"NVarChar"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SqlType {
    Bit,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Real,
    Decimal,
    Numeric,
    Money,
    SmallMoney,
    Char,
    NChar,
    VarChar,
    NVarChar,
    Text,
    NText,
    Binary,
    VarBinary,
    Image,
    UniqueIdentifier,
    Date,
    Time,
    DateTime,
    DateTime2,
    DateTimeOffset,
    SmallDateTime,
    Xml,
}

const ALL_TYPES: [SqlType; 28] = [
    SqlType::Bit,
    SqlType::TinyInt,
    SqlType::SmallInt,
    SqlType::Int,
    SqlType::BigInt,
    SqlType::Float,
    SqlType::Real,
    SqlType::Decimal,
    SqlType::Numeric,
    SqlType::Money,
    SqlType::SmallMoney,
    SqlType::Char,
    SqlType::NChar,
    SqlType::VarChar,
    SqlType::NVarChar,
    SqlType::Text,
    SqlType::NText,
    SqlType::Binary,
    SqlType::VarBinary,
    SqlType::Image,
    SqlType::UniqueIdentifier,
    SqlType::Date,
    SqlType::Time,
    SqlType::DateTime,
    SqlType::DateTime2,
    SqlType::DateTimeOffset,
    SqlType::SmallDateTime,
    SqlType::Xml,
];

impl SqlType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SqlType::Bit => "Bit",
            SqlType::TinyInt => "TinyInt",
            SqlType::SmallInt => "SmallInt",
            SqlType::Int => "Int",
            SqlType::BigInt => "BigInt",
            SqlType::Float => "Float",
            SqlType::Real => "Real",
            SqlType::Decimal => "Decimal",
            SqlType::Numeric => "Numeric",
            SqlType::Money => "Money",
            SqlType::SmallMoney => "SmallMoney",
            SqlType::Char => "Char",
            SqlType::NChar => "NChar",
            SqlType::VarChar => "VarChar",
            SqlType::NVarChar => "NVarChar",
            SqlType::Text => "Text",
            SqlType::NText => "NText",
            SqlType::Binary => "Binary",
            SqlType::VarBinary => "VarBinary",
            SqlType::Image => "Image",
            SqlType::UniqueIdentifier => "UniqueIdentifier",
            SqlType::Date => "Date",
            SqlType::Time => "Time",
            SqlType::DateTime => "DateTime",
            SqlType::DateTime2 => "DateTime2",
            SqlType::DateTimeOffset => "DateTimeOffset",
            SqlType::SmallDateTime => "SmallDateTime",
            SqlType::Xml => "Xml",
        }
    }

    /// Types whose text values are parsed into timestamps before they are attached.
    #[must_use]
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            SqlType::Date
                | SqlType::DateTime
                | SqlType::DateTime2
                | SqlType::DateTimeOffset
                | SqlType::SmallDateTime
        )
    }

    /// T-SQL type used to declare a local variable of this type.
    ///
    /// `TEXT`, `NTEXT` and `IMAGE` cannot be local variables, so they map to their
    /// `MAX` replacements. Fixed-width types without an explicit length take the
    /// length of `value`.
    #[must_use]
    pub fn declaration(self, options: &ParamOptions, value: Option<&RowValues>) -> String {
        let varying = |base: &str| match options.length {
            Some(len) => format!("{base}({len})"),
            None => format!("{base}(MAX)"),
        };
        let fixed = |base: &str| {
            let inferred = match value {
                Some(RowValues::Text(s)) => s.chars().count(),
                Some(RowValues::Blob(b)) => b.len(),
                _ => 1,
            };
            let len = options
                .length
                .map_or(inferred.max(1), |l| l as usize);
            format!("{base}({len})")
        };
        let scaled = |base: &str| match options.scale {
            Some(scale) => format!("{base}({scale})"),
            None => base.to_owned(),
        };

        match self {
            SqlType::Bit => "BIT".to_owned(),
            SqlType::TinyInt => "TINYINT".to_owned(),
            SqlType::SmallInt => "SMALLINT".to_owned(),
            SqlType::Int => "INT".to_owned(),
            SqlType::BigInt => "BIGINT".to_owned(),
            SqlType::Float => "FLOAT".to_owned(),
            SqlType::Real => "REAL".to_owned(),
            SqlType::Decimal | SqlType::Numeric => format!(
                "{}({}, {})",
                if self == SqlType::Decimal { "DECIMAL" } else { "NUMERIC" },
                options.precision.unwrap_or(18),
                options.scale.unwrap_or(0)
            ),
            SqlType::Money => "MONEY".to_owned(),
            SqlType::SmallMoney => "SMALLMONEY".to_owned(),
            SqlType::Char => fixed("CHAR"),
            SqlType::NChar => fixed("NCHAR"),
            SqlType::Binary => fixed("BINARY"),
            SqlType::VarChar => varying("VARCHAR"),
            SqlType::NVarChar => varying("NVARCHAR"),
            SqlType::VarBinary => varying("VARBINARY"),
            SqlType::Text => "VARCHAR(MAX)".to_owned(),
            SqlType::NText => "NVARCHAR(MAX)".to_owned(),
            SqlType::Image => "VARBINARY(MAX)".to_owned(),
            SqlType::UniqueIdentifier => "UNIQUEIDENTIFIER".to_owned(),
            SqlType::Date => "DATE".to_owned(),
            SqlType::Time => scaled("TIME"),
            SqlType::DateTime => "DATETIME".to_owned(),
            SqlType::DateTime2 => scaled("DATETIME2"),
            SqlType::DateTimeOffset => scaled("DATETIMEOFFSET"),
            SqlType::SmallDateTime => "SMALLDATETIME".to_owned(),
            SqlType::Xml => "XML".to_owned(),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlType {
    type Err = TdsHelperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_TYPES
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TdsHelperError::ParameterError(format!("unknown SQL type: {s}")))
    }
}

impl TryFrom<String> for SqlType {
    type Error = TdsHelperError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SqlType> for String {
    fn from(value: SqlType) -> Self {
        value.name().to_owned()
    }
}

/// Driver-level options for a parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamOptions {
    /// Length for character and binary types; `None` means `MAX` for varying types.
    pub length: Option<u32>,
    /// Precision for `DECIMAL`/`NUMERIC`.
    pub precision: Option<u8>,
    /// Scale for `DECIMAL`/`NUMERIC` and fractional seconds for time types.
    pub scale: Option<u8>,
}

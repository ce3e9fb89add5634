//! Bound values.
//!
//! Values never appear in the SQL text; the visitors drain them into the
//! bindings and emit a placeholder instead.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// A value passed to the driver alongside the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Renders the value as a literal for [`to_raw_sql`] debug output.
    ///
    /// Drivers always receive the value through a placeholder.
    ///
    /// [`to_raw_sql`]: crate::CompiledQuery::to_raw_sql
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(true) => String::from("1"),
            Self::Bool(false) => String::from("0"),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Blob(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
                format!("x'{hex}'")
            }
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Reads an aggregate or generated key as an integer.
    ///
    /// Drivers disagree on the type of `COUNT(*)` and of returned ids, so
    /// whole floats, booleans and numeric text all convert.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null | Self::Float(_) | Self::Blob(_) => None,
        }
    }

    /// Reads a numeric value as a float.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null | Self::Bool(_) | Self::Blob(_) => None,
        }
    }
}

/// Conversion into a bound value.
///
/// Every builder method that takes a value is generic over this trait.
pub trait ToSqlValue {
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

macro_rules! bind_as {
    ($variant:ident($target:ty): $($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::$variant(<$target>::from(self))
                }
            }

            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    value.to_sql_value()
                }
            }
        )+
    };
}

bind_as!(Bool(bool): bool);
bind_as!(Int(i64): i8, i16, i32, i64, u8, u16, u32);
bind_as!(Float(f64): f32, f64);
bind_as!(Text(String): String, &str);
bind_as!(Blob(Vec<u8>): Vec<u8>, &[u8]);

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        self.map_or(SqlValue::Null, ToSqlValue::to_sql_value)
    }
}

// Dates and times bind as ISO text, which every grammar's date helpers
// compare against.

impl ToSqlValue for NaiveDate {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.format("%Y-%m-%d").to_string())
    }
}

impl ToSqlValue for NaiveTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.format("%H:%M:%S").to_string())
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

impl<Tz: TimeZone> ToSqlValue for DateTime<Tz>
where
    Tz::Offset: core::fmt::Display,
{
    fn to_sql_value(self) -> SqlValue {
        self.naive_local().to_sql_value()
    }
}

/// JSON documents bind as their encoded text.
impl ToSqlValue for serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.to_string())
    }
}

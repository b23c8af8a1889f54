//! Primitive kinds and scalar values.
//!
//! The seven primitive names are fixed: `int`, `float`, `string`, `bool`,
//! `uint`, `datetime` and `double`. Every external value handed to a record
//! is a [`Scalar`]; [`Primitive::coerce`] converts it to the declared kind.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A built-in field kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Int,
    Float,
    String,
    Bool,
    UInt,
    DateTime,
    Double,
}

impl Primitive {
    /// All primitives in registry seeding order.
    pub const ALL: [Primitive; 7] = [
        Primitive::Int,
        Primitive::Float,
        Primitive::String,
        Primitive::Bool,
        Primitive::UInt,
        Primitive::DateTime,
        Primitive::Double,
    ];

    /// The schema-level name of this primitive.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::String => "string",
            Primitive::Bool => "bool",
            Primitive::UInt => "uint",
            Primitive::DateTime => "datetime",
            Primitive::Double => "double",
        }
    }

    /// Look up a primitive by its schema-level name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Convert an external scalar to this kind.
    ///
    /// Returns `None` when the value cannot be represented: unparsable text,
    /// out-of-range numbers, or fractional numbers for integer kinds.
    pub fn coerce(self, value: &Scalar) -> Option<Scalar> {
        match self {
            Primitive::String => Some(match value {
                Scalar::String(s) => Scalar::String(s.clone()),
                other => Scalar::String(other.to_string()),
            }),
            Primitive::Int => as_i64(value)
                .and_then(|v| i32::try_from(v).ok())
                .map(Scalar::Int),
            Primitive::UInt => as_i64(value)
                .and_then(|v| u32::try_from(v).ok())
                .map(Scalar::UInt),
            Primitive::Float => as_f64(value).and_then(|v| {
                let narrowed = v as f32;
                (narrowed.is_finite() || !v.is_finite()).then_some(Scalar::Float(narrowed))
            }),
            Primitive::Double => as_f64(value).map(Scalar::Double),
            Primitive::Bool => match value {
                Scalar::Bool(b) => Some(Scalar::Bool(*b)),
                Scalar::String(s) => {
                    let s = s.trim();
                    if s.eq_ignore_ascii_case("true") {
                        Some(Scalar::Bool(true))
                    } else if s.eq_ignore_ascii_case("false") {
                        Some(Scalar::Bool(false))
                    } else {
                        None
                    }
                }
                _ => None,
            },
            Primitive::DateTime => match value {
                Scalar::DateTime(dt) => Some(Scalar::DateTime(*dt)),
                Scalar::String(s) => parse_datetime(s.trim()).map(Scalar::DateTime),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A primitive value, either stored in a record or handed in from outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i32),
    Float(f32),
    String(String),
    Bool(bool),
    UInt(u32),
    DateTime(NaiveDateTime),
    Double(f64),
}

impl Scalar {
    /// The primitive kind this scalar currently holds.
    pub fn primitive(&self) -> Primitive {
        match self {
            Scalar::Int(_) => Primitive::Int,
            Scalar::Float(_) => Primitive::Float,
            Scalar::String(_) => Primitive::String,
            Scalar::Bool(_) => Primitive::Bool,
            Scalar::UInt(_) => Primitive::UInt,
            Scalar::DateTime(_) => Primitive::DateTime,
            Scalar::Double(_) => Primitive::Double,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::String(v) => f.write_str(v),
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::UInt(v) => write!(f, "{v}"),
            Scalar::DateTime(v) => write!(f, "{}", v.format(DATETIME_FORMAT)),
            Scalar::Double(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<&String> for Scalar {
    fn from(value: &String) -> Self {
        Scalar::String(value.clone())
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value)
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::UInt(value)
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar::Float(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Double(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(value: NaiveDateTime) -> Self {
        Scalar::DateTime(value)
    }
}

impl From<&Scalar> for Scalar {
    fn from(value: &Scalar) -> Self {
        value.clone()
    }
}

/// Rendering format for `datetime` values.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_INPUT_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn as_i64(value: &Scalar) -> Option<i64> {
    match value {
        Scalar::Int(v) => Some(i64::from(*v)),
        Scalar::UInt(v) => Some(i64::from(*v)),
        Scalar::Float(v) => integral(f64::from(*v)),
        Scalar::Double(v) => integral(*v),
        Scalar::String(s) => s.trim().parse::<i64>().ok(),
        Scalar::Bool(_) | Scalar::DateTime(_) => None,
    }
}

fn integral(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64)
        .then_some(v as i64)
}

fn as_f64(value: &Scalar) -> Option<f64> {
    match value {
        Scalar::Int(v) => Some(f64::from(*v)),
        Scalar::UInt(v) => Some(f64::from(*v)),
        Scalar::Float(v) => Some(f64::from(*v)),
        Scalar::Double(v) => Some(*v),
        Scalar::String(s) => s.trim().parse::<f64>().ok(),
        Scalar::Bool(_) | Scalar::DateTime(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for p in Primitive::ALL {
            assert_eq!(Primitive::from_name(p.name()), Some(p));
        }
        assert_eq!(Primitive::from_name("object"), None);
        assert_eq!(Primitive::from_name("Int"), None);
    }

    #[test]
    fn int_from_text() {
        assert_eq!(Primitive::Int.coerce(&"10".into()), Some(Scalar::Int(10)));
        assert_eq!(Primitive::Int.coerce(&" -3 ".into()), Some(Scalar::Int(-3)));
        assert_eq!(Primitive::Int.coerce(&"ten".into()), None);
        assert_eq!(Primitive::Int.coerce(&"1.5".into()), None);
    }

    #[test]
    fn int_range_is_enforced() {
        assert_eq!(Primitive::Int.coerce(&"3000000000".into()), None);
        assert_eq!(
            Primitive::UInt.coerce(&"3000000000".into()),
            Some(Scalar::UInt(3_000_000_000))
        );
        assert_eq!(Primitive::UInt.coerce(&"-1".into()), None);
    }

    #[test]
    fn integral_floats_convert_to_int() {
        assert_eq!(Primitive::Int.coerce(&Scalar::Double(4.0)), Some(Scalar::Int(4)));
        assert_eq!(Primitive::Int.coerce(&Scalar::Double(4.5)), None);
    }

    #[test]
    fn float_and_double() {
        assert_eq!(Primitive::Float.coerce(&"1.5".into()), Some(Scalar::Float(1.5)));
        assert_eq!(Primitive::Double.coerce(&Scalar::Int(2)), Some(Scalar::Double(2.0)));
        assert_eq!(Primitive::Float.coerce(&"1e300".into()), None);
        assert_eq!(Primitive::Double.coerce(&Scalar::Bool(true)), None);
    }

    #[test]
    fn bool_is_case_insensitive() {
        assert_eq!(Primitive::Bool.coerce(&"True".into()), Some(Scalar::Bool(true)));
        assert_eq!(Primitive::Bool.coerce(&"false".into()), Some(Scalar::Bool(false)));
        assert_eq!(Primitive::Bool.coerce(&"1".into()), None);
    }

    #[test]
    fn string_accepts_anything() {
        assert_eq!(
            Primitive::String.coerce(&Scalar::Int(7)),
            Some(Scalar::String("7".into()))
        );
    }

    #[test]
    fn datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap();
        for text in [
            "2021-03-04 05:06:07",
            "2021-03-04T05:06:07",
            "2021-03-04T05:06:07Z",
        ] {
            assert_eq!(
                Primitive::DateTime.coerce(&text.into()),
                Some(Scalar::DateTime(expected)),
                "{text}"
            );
        }
        assert!(Primitive::DateTime.coerce(&"2021-03-04".into()).is_some());
        assert!(Primitive::DateTime.coerce(&"yesterday".into()).is_none());
    }

    #[test]
    fn display_is_natural_text() {
        assert_eq!(Scalar::Int(10).to_string(), "10");
        assert_eq!(Scalar::Float(10.0).to_string(), "10");
        assert_eq!(Scalar::Bool(true).to_string(), "true");
        assert_eq!(Scalar::from("fast").to_string(), "fast");
    }
}

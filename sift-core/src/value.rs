use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::cmp::Ordering;
use std::fmt;

/// A typed scalar used for field parameters and in-memory record values.
///
/// Equality and ordering are strict: values of different kinds never compare,
/// with the single exception of integers and floats, which compare
/// numerically. A bound `"0"` therefore never loosely matches an empty
/// string or `false`.
#[derive(Debug, Clone)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Substring test used by the `contains` comparison. Only strings
    /// participate; any other pairing is `false`.
    pub fn contains(&self, needle: &ScalarValue) -> bool {
        match (self, needle) {
            (ScalarValue::Str(haystack), ScalarValue::Str(needle)) => haystack.contains(needle),
            _ => false,
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScalarValue::Null, ScalarValue::Null) => true,
            (ScalarValue::Bool(a), ScalarValue::Bool(b)) => a == b,
            (ScalarValue::Int(a), ScalarValue::Int(b)) => a == b,
            (ScalarValue::Float(a), ScalarValue::Float(b)) => a == b,
            (ScalarValue::Int(a), ScalarValue::Float(b))
            | (ScalarValue::Float(b), ScalarValue::Int(a)) => (*a as f64) == *b,
            (ScalarValue::Str(a), ScalarValue::Str(b)) => a == b,
            (ScalarValue::Date(a), ScalarValue::Date(b)) => a == b,
            (ScalarValue::Time(a), ScalarValue::Time(b)) => a == b,
            (ScalarValue::DateTime(a), ScalarValue::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for ScalarValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (ScalarValue::Bool(a), ScalarValue::Bool(b)) => a.partial_cmp(b),
            (ScalarValue::Int(a), ScalarValue::Int(b)) => a.partial_cmp(b),
            (ScalarValue::Float(a), ScalarValue::Float(b)) => a.partial_cmp(b),
            (ScalarValue::Int(a), ScalarValue::Float(b)) => (*a as f64).partial_cmp(b),
            (ScalarValue::Float(a), ScalarValue::Int(b)) => a.partial_cmp(&(*b as f64)),
            (ScalarValue::Str(a), ScalarValue::Str(b)) => a.partial_cmp(b),
            (ScalarValue::Date(a), ScalarValue::Date(b)) => a.partial_cmp(b),
            (ScalarValue::Time(a), ScalarValue::Time(b)) => a.partial_cmp(b),
            (ScalarValue::DateTime(a), ScalarValue::DateTime(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => f.write_str("null"),
            ScalarValue::Bool(b) => write!(f, "{b}"),
            ScalarValue::Int(i) => write!(f, "{i}"),
            ScalarValue::Float(v) => write!(f, "{v}"),
            ScalarValue::Str(s) => f.write_str(s),
            ScalarValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            ScalarValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            ScalarValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Bool(v)
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int(v)
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        ScalarValue::Int(v as i64)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Float(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::Str(v.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        ScalarValue::Str(v)
    }
}

impl From<NaiveDate> for ScalarValue {
    fn from(v: NaiveDate) -> Self {
        ScalarValue::Date(v)
    }
}

impl From<NaiveTime> for ScalarValue {
    fn from(v: NaiveTime) -> Self {
        ScalarValue::Time(v)
    }
}

impl From<NaiveDateTime> for ScalarValue {
    fn from(v: NaiveDateTime) -> Self {
        ScalarValue::DateTime(v)
    }
}

/// A cleaned field parameter: a single scalar, a list, or an inclusive range.
///
/// Shape follows the field's comparison: `in`/`notIn` clean to `Multiple`,
/// `between` cleans to `Range`, everything else to `Single`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Single(ScalarValue),
    Multiple(Vec<ScalarValue>),
    Range {
        from: Option<ScalarValue>,
        to: Option<ScalarValue>,
    },
}

impl ParameterValue {
    pub fn single(&self) -> Option<&ScalarValue> {
        match self {
            ParameterValue::Single(v) => Some(v),
            _ => None,
        }
    }

    pub fn list(&self) -> Option<&[ScalarValue]> {
        match self {
            ParameterValue::Multiple(vs) => Some(vs),
            _ => None,
        }
    }
}

impl From<ScalarValue> for ParameterValue {
    fn from(v: ScalarValue) -> Self {
        ParameterValue::Single(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_and_floats_compare_numerically() {
        assert_eq!(ScalarValue::Int(3), ScalarValue::Float(3.0));
        assert_eq!(
            ScalarValue::Int(2).partial_cmp(&ScalarValue::Float(2.5)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn different_kinds_never_compare() {
        assert_ne!(ScalarValue::Int(0), ScalarValue::Str("0".into()));
        assert_ne!(ScalarValue::Bool(false), ScalarValue::Int(0));
        assert_ne!(ScalarValue::Null, ScalarValue::Str(String::new()));
        assert_eq!(
            ScalarValue::Int(1).partial_cmp(&ScalarValue::Str("1".into())),
            None
        );
    }

    #[test]
    fn strings_order_lexicographically() {
        assert_eq!(
            ScalarValue::Str("title12".into()).partial_cmp(&ScalarValue::Str("title2".into())),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn contains_only_matches_strings() {
        let haystack = ScalarValue::Str("author4@domain1.com".into());
        assert!(haystack.contains(&ScalarValue::Str("domain1.com".into())));
        assert!(!haystack.contains(&ScalarValue::Int(4)));
        assert!(!ScalarValue::Int(41).contains(&ScalarValue::Str("4".into())));
    }

    #[test]
    fn dates_order_chronologically() {
        let earlier = ScalarValue::Date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        let later = ScalarValue::Date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(earlier.partial_cmp(&later), Some(Ordering::Less));
    }
}

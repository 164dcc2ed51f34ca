use crate::comparison::{Comparison, Direction};
use crate::error::DataSourceError;
use crate::value::{ParameterValue, ScalarValue};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as Json;
use std::any::Any;
use std::fmt;

/// Raw token selecting the "is null" branch of an `isNull` field.
pub const NULL_TOKEN: &str = "null";
/// Raw token selecting the "is not null" branch of an `isNull` field.
pub const NOT_NULL_TOKEN: &str = "no_null";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The built-in field kinds shared by every backend.
///
/// A kind owns the parameter-cleaning rules: how a raw JSON value bound
/// against a field becomes a typed [`ParameterValue`]. Which comparisons a
/// kind supports is decided per backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Date,
    Time,
    DateTime,
}

impl FieldKind {
    pub fn type_name(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::DateTime => "datetime",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(FieldKind::Text),
            "number" => Some(FieldKind::Number),
            "boolean" => Some(FieldKind::Boolean),
            "date" => Some(FieldKind::Date),
            "time" => Some(FieldKind::Time),
            "datetime" => Some(FieldKind::DateTime),
            _ => None,
        }
    }

    /// Turn a raw bound value into a typed parameter.
    ///
    /// `Ok(None)` means the field stays inactive for the next build pass:
    /// the raw value was JSON null, an empty string, an empty list, or an
    /// empty range. Values that are present but malformed are errors, never
    /// silently coerced.
    pub fn clean_parameter(
        self,
        comparison: Comparison,
        raw: &Json,
    ) -> Result<Option<ParameterValue>, ParameterError> {
        if raw.is_null() {
            return Ok(None);
        }
        if comparison == Comparison::IsNull {
            return Ok(match raw.as_str() {
                Some(NULL_TOKEN) => {
                    Some(ParameterValue::Single(ScalarValue::Str(NULL_TOKEN.into())))
                }
                Some(NOT_NULL_TOKEN) => Some(ParameterValue::Single(ScalarValue::Str(
                    NOT_NULL_TOKEN.into(),
                ))),
                _ => None,
            });
        }
        if comparison.expects_list() {
            let items = raw.as_array().ok_or_else(|| {
                ParameterError::new(self, format!("comparison \"{comparison}\" expects a list"))
            })?;
            if items.is_empty() {
                return Ok(None);
            }
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                match self.clean_scalar(item)? {
                    Some(value) => values.push(value),
                    None => {
                        return Err(ParameterError::new(self, "list items must not be empty"))
                    }
                }
            }
            return Ok(Some(ParameterValue::Multiple(values)));
        }
        if comparison.expects_range() {
            let (from_raw, to_raw) = if let Some(object) = raw.as_object() {
                (object.get("from"), object.get("to"))
            } else if let Some(items) = raw.as_array() {
                if items.len() != 2 {
                    return Err(ParameterError::new(
                        self,
                        "range given as a list must have exactly two entries",
                    ));
                }
                (items.first(), items.get(1))
            } else {
                return Err(ParameterError::new(
                    self,
                    format!("comparison \"{comparison}\" expects a from/to range"),
                ));
            };
            let from = match from_raw {
                Some(v) => self.clean_scalar(v)?,
                None => None,
            };
            let to = match to_raw {
                Some(v) => self.clean_scalar(v)?,
                None => None,
            };
            if from.is_none() && to.is_none() {
                return Ok(None);
            }
            return Ok(Some(ParameterValue::Range { from, to }));
        }
        Ok(self.clean_scalar(raw)?.map(ParameterValue::Single))
    }

    /// Clean one raw scalar; `Ok(None)` when the value counts as "not given".
    fn clean_scalar(self, raw: &Json) -> Result<Option<ScalarValue>, ParameterError> {
        if raw.is_null() {
            return Ok(None);
        }
        match self {
            FieldKind::Text => match raw {
                Json::String(s) if s.is_empty() => Ok(None),
                Json::String(s) => Ok(Some(ScalarValue::Str(s.clone()))),
                _ => Err(ParameterError::new(self, "expected a string")),
            },
            FieldKind::Number => match raw {
                Json::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Ok(Some(ScalarValue::Int(i)))
                    } else if let Some(f) = n.as_f64() {
                        Ok(Some(ScalarValue::Float(f)))
                    } else {
                        Err(ParameterError::new(self, format!("number {n} out of range")))
                    }
                }
                Json::String(s) if s.is_empty() => Ok(None),
                Json::String(s) => {
                    if let Ok(i) = s.parse::<i64>() {
                        Ok(Some(ScalarValue::Int(i)))
                    } else if let Ok(f) = s.parse::<f64>() {
                        Ok(Some(ScalarValue::Float(f)))
                    } else {
                        Err(ParameterError::new(self, format!("\"{s}\" is not a number")))
                    }
                }
                _ => Err(ParameterError::new(self, "expected a number")),
            },
            FieldKind::Boolean => match raw {
                Json::Bool(b) => Ok(Some(ScalarValue::Bool(*b))),
                Json::Number(n) => match n.as_i64() {
                    Some(0) => Ok(Some(ScalarValue::Bool(false))),
                    Some(1) => Ok(Some(ScalarValue::Bool(true))),
                    _ => Err(ParameterError::new(self, format!("{n} is not a boolean"))),
                },
                Json::String(s) => match s.as_str() {
                    "" => Ok(None),
                    "0" | "false" => Ok(Some(ScalarValue::Bool(false))),
                    "1" | "true" => Ok(Some(ScalarValue::Bool(true))),
                    other => Err(ParameterError::new(
                        self,
                        format!("\"{other}\" is not a boolean"),
                    )),
                },
                _ => Err(ParameterError::new(self, "expected a boolean")),
            },
            FieldKind::Date => self.clean_temporal(raw, |s| {
                NaiveDate::parse_from_str(s, DATE_FORMAT).map(ScalarValue::Date)
            }),
            FieldKind::Time => self.clean_temporal(raw, |s| {
                NaiveTime::parse_from_str(s, TIME_FORMAT).map(ScalarValue::Time)
            }),
            FieldKind::DateTime => self.clean_temporal(raw, |s| {
                NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).map(ScalarValue::DateTime)
            }),
        }
    }

    fn clean_temporal(
        self,
        raw: &Json,
        parse: impl Fn(&str) -> Result<ScalarValue, chrono::ParseError>,
    ) -> Result<Option<ScalarValue>, ParameterError> {
        match raw {
            Json::String(s) if s.is_empty() => Ok(None),
            Json::String(s) => parse(s)
                .map(Some)
                .map_err(|e| ParameterError::new(self, format!("\"{s}\" does not parse: {e}"))),
            _ => Err(ParameterError::new(
                self,
                format!("expected a {} string", self.type_name()),
            )),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Error produced while cleaning a raw parameter against a field kind.
#[derive(Debug, Clone)]
pub struct ParameterError {
    kind: FieldKind,
    message: String,
}

impl ParameterError {
    pub fn new(kind: FieldKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Attach the field name and lift into the shared error type.
    pub fn for_field(self, field: &str) -> DataSourceError {
        DataSourceError::InvalidParameter {
            field: field.to_string(),
            message: self.to_string(),
        }
    }
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} parameter: {}", self.kind, self.message)
    }
}

impl std::error::Error for ParameterError {}

/// Construction options for a field.
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    /// Backend field or column the criterion targets. Defaults to the
    /// field's own name when unset.
    pub source: Option<String>,
}

impl FieldOptions {
    pub fn source(name: impl Into<String>) -> Self {
        Self {
            source: Some(name.into()),
        }
    }
}

/// Sort ordering carried by a field for the next build pass.
///
/// `priority` fixes the position among all ordered fields; lower runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOrdering {
    pub direction: Direction,
    pub priority: u32,
}

/// A configured filter criterion owned by a data source.
///
/// Fields are created through the driver's extensions and bound between
/// build passes; during a pass the driver reads them to restrict its query.
pub trait DataSourceField: Send + Sync {
    fn name(&self) -> &str;

    fn type_name(&self) -> &'static str;

    fn comparison(&self) -> Comparison;

    /// Backend field or column this criterion targets.
    fn source_field(&self) -> &str;

    /// Bind a raw parameter. JSON null clears any previous parameter and
    /// leaves the field inactive.
    fn bind_parameter(&mut self, raw: &Json) -> Result<(), DataSourceError>;

    fn parameter(&self) -> Option<&ParameterValue>;

    fn ordering(&self) -> Option<FieldOrdering>;

    fn set_ordering(&mut self, ordering: Option<FieldOrdering>);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison operator carried by a field.
///
/// Each backend publishes the subset it supports per field type; requesting
/// a comparison outside that subset is rejected when the field is created,
/// not when a result is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
    Contains,
    Between,
    IsNull,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Neq => "neq",
            Comparison::Lt => "lt",
            Comparison::Lte => "lte",
            Comparison::Gt => "gt",
            Comparison::Gte => "gte",
            Comparison::In => "in",
            Comparison::NotIn => "notIn",
            Comparison::Contains => "contains",
            Comparison::Between => "between",
            Comparison::IsNull => "isNull",
        }
    }

    /// Whether the comparison takes a list parameter.
    pub fn expects_list(self) -> bool {
        matches!(self, Comparison::In | Comparison::NotIn)
    }

    /// Whether the comparison takes a from/to range parameter.
    pub fn expects_range(self) -> bool {
        matches!(self, Comparison::Between)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown comparison token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownComparison(pub String);

impl fmt::Display for UnknownComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown comparison \"{}\"", self.0)
    }
}

impl std::error::Error for UnknownComparison {}

impl FromStr for Comparison {
    type Err = UnknownComparison;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Comparison::Eq),
            "neq" => Ok(Comparison::Neq),
            "lt" => Ok(Comparison::Lt),
            "lte" => Ok(Comparison::Lte),
            "gt" => Ok(Comparison::Gt),
            "gte" => Ok(Comparison::Gte),
            "in" => Ok(Comparison::In),
            "notIn" => Ok(Comparison::NotIn),
            "contains" => Ok(Comparison::Contains),
            "between" => Ok(Comparison::Between),
            "isNull" => Ok(Comparison::IsNull),
            other => Err(UnknownComparison(other.to_string())),
        }
    }
}

/// Sort direction for a field ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown sort direction token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDirection(pub String);

impl fmt::Display for UnknownDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown sort direction \"{}\" (expected \"asc\" or \"desc\")", self.0)
    }
}

impl std::error::Error for UnknownDirection {}

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Direction::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Direction::Desc)
        } else {
            Err(UnknownDirection(s.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_tokens() {
        assert_eq!("notIn".parse::<Comparison>().unwrap(), Comparison::NotIn);
        assert_eq!("isNull".parse::<Comparison>().unwrap(), Comparison::IsNull);
        assert_eq!("eq".parse::<Comparison>().unwrap(), Comparison::Eq);
        assert!("like".parse::<Comparison>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for c in [
            Comparison::Eq,
            Comparison::Neq,
            Comparison::Lt,
            Comparison::Lte,
            Comparison::Gt,
            Comparison::Gte,
            Comparison::In,
            Comparison::NotIn,
            Comparison::Contains,
            Comparison::Between,
            Comparison::IsNull,
        ] {
            assert_eq!(c.as_str().parse::<Comparison>().unwrap(), c);
        }
    }

    #[test]
    fn direction_parsing_is_case_insensitive() {
        assert_eq!("ASC".parse::<Direction>().unwrap(), Direction::Asc);
        assert_eq!("desc".parse::<Direction>().unwrap(), Direction::Desc);
        assert!("up".parse::<Direction>().is_err());
    }
}

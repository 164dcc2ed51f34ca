use sift_core::field::{NOT_NULL_TOKEN, NULL_TOKEN};
use sift_core::{Comparison, Direction, ParameterValue, ScalarValue};
use std::cmp::Ordering;

/// Read access to a record's fields by name.
///
/// The collection driver evaluates criteria against anything implementing
/// this. `None` stands for an absent or null field; value comparisons never
/// match it, only the `isNull` comparison does.
pub trait CollectionItem: Clone + Send + Sync + 'static {
    fn field_value(&self, field: &str) -> Option<ScalarValue>;
}

/// JSON objects work out of the box. Field names may use `.`-separated
/// paths into nested objects; arrays and objects have no scalar value.
impl CollectionItem for serde_json::Value {
    fn field_value(&self, field: &str) -> Option<ScalarValue> {
        let mut current = self;
        for segment in field.split('.') {
            current = current.get(segment)?;
        }
        match current {
            serde_json::Value::Bool(b) => Some(ScalarValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(ScalarValue::Int(i))
                } else {
                    n.as_f64().map(ScalarValue::Float)
                }
            }
            serde_json::Value::String(s) => Some(ScalarValue::Str(s.clone())),
            _ => None,
        }
    }
}

/// One accumulated restriction; all of a criteria's predicates must hold.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub field: String,
    pub comparison: Comparison,
    pub value: ParameterValue,
}

impl Predicate {
    pub fn matches<T: CollectionItem>(&self, item: &T) -> bool {
        let value = item.field_value(&self.field);
        match self.comparison {
            Comparison::IsNull => {
                let wants_null = matches!(
                    self.value.single().and_then(ScalarValue::as_str),
                    Some(NULL_TOKEN)
                );
                let wants_not_null = matches!(
                    self.value.single().and_then(ScalarValue::as_str),
                    Some(NOT_NULL_TOKEN)
                );
                let is_null = value.is_none() || matches!(value, Some(ScalarValue::Null));
                (wants_null && is_null) || (wants_not_null && !is_null)
            }
            Comparison::Eq => self.with_single(value.as_ref(), |v, p| v == p),
            Comparison::Neq => self.with_single(value.as_ref(), |v, p| v != p),
            Comparison::Lt => self.ordered(value.as_ref(), Ordering::is_lt),
            Comparison::Lte => self.ordered(value.as_ref(), Ordering::is_le),
            Comparison::Gt => self.ordered(value.as_ref(), Ordering::is_gt),
            Comparison::Gte => self.ordered(value.as_ref(), Ordering::is_ge),
            Comparison::Contains => self.with_single(value.as_ref(), |v, p| v.contains(p)),
            Comparison::In => match (&value, self.value.list()) {
                (Some(v), Some(list)) => list.iter().any(|p| v == p),
                _ => false,
            },
            Comparison::NotIn => match (&value, self.value.list()) {
                (Some(v), Some(list)) => !list.iter().any(|p| v == p),
                _ => false,
            },
            Comparison::Between => match (&value, &self.value) {
                (Some(v), ParameterValue::Range { from, to }) => {
                    let lower = from
                        .as_ref()
                        .map(|f| v.partial_cmp(f).is_some_and(Ordering::is_ge))
                        .unwrap_or(true);
                    let upper = to
                        .as_ref()
                        .map(|t| v.partial_cmp(t).is_some_and(Ordering::is_le))
                        .unwrap_or(true);
                    lower && upper
                }
                _ => false,
            },
        }
    }

    fn with_single(
        &self,
        value: Option<&ScalarValue>,
        test: impl Fn(&ScalarValue, &ScalarValue) -> bool,
    ) -> bool {
        match (value, self.value.single()) {
            (Some(v), Some(p)) => test(v, p),
            _ => false,
        }
    }

    fn ordered(&self, value: Option<&ScalarValue>, test: impl Fn(Ordering) -> bool) -> bool {
        match (value, self.value.single()) {
            (Some(v), Some(p)) => v.partial_cmp(p).is_some_and(test),
            _ => false,
        }
    }
}

/// In-memory counterpart of a select template: restrictions, sort keys and
/// pagination bounds accumulate here and are applied to the collection when
/// a result is built.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    predicates: Vec<Predicate>,
    orderings: Vec<(String, Direction)>,
    first_result: Option<u64>,
    max_results: Option<u64>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// AND-combine a restriction.
    pub fn and_where(
        &mut self,
        field: impl Into<String>,
        comparison: Comparison,
        value: impl Into<ParameterValue>,
    ) -> &mut Self {
        self.predicates.push(Predicate {
            field: field.into(),
            comparison,
            value: value.into(),
        });
        self
    }

    /// Append a sort key; earlier keys take precedence.
    pub fn order_by(&mut self, field: impl Into<String>, direction: Direction) -> &mut Self {
        self.orderings.push((field.into(), direction));
        self
    }

    pub fn set_first_result(&mut self, first: u64) -> &mut Self {
        self.first_result = Some(first);
        self
    }

    pub fn set_max_results(&mut self, max: u64) -> &mut Self {
        self.max_results = Some(max);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn orderings(&self) -> &[(String, Direction)] {
        &self.orderings
    }

    pub fn first_result(&self) -> Option<u64> {
        self.first_result
    }

    pub fn max_results(&self) -> Option<u64> {
        self.max_results
    }

    /// Whether the item satisfies every predicate.
    pub fn matches<T: CollectionItem>(&self, item: &T) -> bool {
        self.predicates.iter().all(|p| p.matches(item))
    }

    /// Relative order of two items under the sort keys. Absent values sort
    /// first ascending; kinds that do not compare keep their input order.
    pub fn compare<T: CollectionItem>(&self, a: &T, b: &T) -> Ordering {
        for (field, direction) in &self.orderings {
            let left = a.field_value(field);
            let right = b.field_value(field);
            let ord = match (&left, &right) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(l), Some(r)) => l.partial_cmp(r).unwrap_or(Ordering::Equal),
            };
            let ord = match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_items_expose_scalars_and_paths() {
        let item = json!({"id": 7, "title": "x", "meta": {"flag": true}, "gone": null});
        assert_eq!(item.field_value("id"), Some(ScalarValue::Int(7)));
        assert_eq!(item.field_value("meta.flag"), Some(ScalarValue::Bool(true)));
        assert_eq!(item.field_value("gone"), None);
        assert_eq!(item.field_value("missing"), None);
        assert_eq!(item.field_value("meta"), None);
    }

    #[test]
    fn predicates_and_combine() {
        let mut criteria = Criteria::new();
        criteria
            .and_where("id", Comparison::Gte, ScalarValue::Int(5))
            .and_where("title", Comparison::Contains, ScalarValue::Str("tit".into()));

        assert!(criteria.matches(&json!({"id": 5, "title": "title5"})));
        assert!(!criteria.matches(&json!({"id": 4, "title": "title4"})));
        assert!(!criteria.matches(&json!({"id": 9, "title": "other"})));
    }

    #[test]
    fn absent_values_only_match_is_null() {
        let mut eq = Criteria::new();
        eq.and_where("author", Comparison::Eq, ScalarValue::Str("a".into()));
        assert!(!eq.matches(&json!({"title": "no author"})));

        let mut null_check = Criteria::new();
        null_check.and_where(
            "author",
            Comparison::IsNull,
            ScalarValue::Str(NULL_TOKEN.into()),
        );
        assert!(null_check.matches(&json!({"title": "no author"})));
        assert!(null_check.matches(&json!({"author": null})));
        assert!(!null_check.matches(&json!({"author": "present"})));

        let mut not_null = Criteria::new();
        not_null.and_where(
            "author",
            Comparison::IsNull,
            ScalarValue::Str(NOT_NULL_TOKEN.into()),
        );
        assert!(not_null.matches(&json!({"author": "present"})));
        assert!(!not_null.matches(&json!({"author": null})));
    }

    #[test]
    fn between_honors_open_ends() {
        let mut both = Criteria::new();
        both.and_where(
            "id",
            Comparison::Between,
            ParameterValue::Range {
                from: Some(ScalarValue::Int(3)),
                to: Some(ScalarValue::Int(6)),
            },
        );
        assert!(both.matches(&json!({"id": 3})));
        assert!(both.matches(&json!({"id": 6})));
        assert!(!both.matches(&json!({"id": 7})));

        let mut from_only = Criteria::new();
        from_only.and_where(
            "id",
            Comparison::Between,
            ParameterValue::Range {
                from: Some(ScalarValue::Int(3)),
                to: None,
            },
        );
        assert!(from_only.matches(&json!({"id": 100})));
        assert!(!from_only.matches(&json!({"id": 2})));
    }

    #[test]
    fn multi_key_compare_orders_by_priority() {
        let mut criteria = Criteria::new();
        criteria
            .order_by("group", Direction::Asc)
            .order_by("title", Direction::Desc);

        let a = json!({"group": 1, "title": "b"});
        let b = json!({"group": 1, "title": "a"});
        let c = json!({"group": 2, "title": "z"});

        assert_eq!(criteria.compare(&a, &b), Ordering::Less);
        assert_eq!(criteria.compare(&b, &a), Ordering::Greater);
        assert_eq!(criteria.compare(&c, &a), Ordering::Greater);
        assert_eq!(criteria.compare(&a, &a), Ordering::Equal);
    }
}

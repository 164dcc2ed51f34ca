use crate::error::SqlxDriverError;
use crate::query::{CompareOp, QueryBuilder};
use serde_json::Value as Json;
use sift_core::field::{NOT_NULL_TOKEN, NULL_TOKEN};
use sift_core::{
    Comparison, DataSourceError, DataSourceField, FieldKind, FieldOptions, FieldOrdering,
    ParameterValue, ScalarValue,
};
use std::any::Any;

/// Capability that lets a field restrict the SQL driver's select template.
pub trait QueryFieldBuilder: DataSourceField {
    /// Apply the bound parameter to the template. Inactive fields must
    /// leave the template untouched.
    fn build_query(&self, query: &mut QueryBuilder) -> Result<(), SqlxDriverError>;
}

/// Comparisons the SQL driver supports per field kind.
pub fn allowed_comparisons(kind: FieldKind) -> &'static [Comparison] {
    use Comparison::*;
    match kind {
        FieldKind::Text => &[Eq, Neq, In, NotIn, Contains, IsNull],
        FieldKind::Boolean => &[Eq, IsNull],
        FieldKind::Number | FieldKind::Date | FieldKind::Time | FieldKind::DateTime => {
            &[Eq, Neq, Lt, Lte, Gt, Gte, In, NotIn, Between, IsNull]
        }
    }
}

fn compare_op(comparison: Comparison) -> Option<CompareOp> {
    match comparison {
        Comparison::Eq => Some(CompareOp::Eq),
        Comparison::Neq => Some(CompareOp::Neq),
        Comparison::Lt => Some(CompareOp::Lt),
        Comparison::Lte => Some(CompareOp::Lte),
        Comparison::Gt => Some(CompareOp::Gt),
        Comparison::Gte => Some(CompareOp::Gte),
        _ => None,
    }
}

/// Standard SQL field covering the built-in kinds.
#[derive(Debug)]
pub struct SqlField {
    name: String,
    kind: FieldKind,
    comparison: Comparison,
    source: Option<String>,
    ordering: Option<FieldOrdering>,
    parameter: Option<ParameterValue>,
}

impl SqlField {
    /// Create a field, rejecting comparisons the kind does not support.
    pub fn new(
        name: &str,
        kind: FieldKind,
        comparison: Comparison,
        options: &FieldOptions,
    ) -> Result<Self, DataSourceError> {
        let allowed = allowed_comparisons(kind);
        if !allowed.contains(&comparison) {
            return Err(DataSourceError::UnsupportedComparison {
                field: name.to_string(),
                type_name: kind.type_name(),
                comparison,
                allowed,
            });
        }
        Ok(Self {
            name: name.to_string(),
            kind,
            comparison,
            source: options.source.clone(),
            ordering: None,
            parameter: None,
        })
    }

    fn shape_error(&self, expected: &str) -> SqlxDriverError {
        SqlxDriverError::Build(format!(
            "field \"{}\" carries a parameter that is not {expected}",
            self.name
        ))
    }
}

impl DataSourceField for SqlField {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn comparison(&self) -> Comparison {
        self.comparison
    }

    fn source_field(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }

    fn bind_parameter(&mut self, raw: &Json) -> Result<(), DataSourceError> {
        self.parameter = self
            .kind
            .clean_parameter(self.comparison, raw)
            .map_err(|e| e.for_field(&self.name))?;
        Ok(())
    }

    fn parameter(&self) -> Option<&ParameterValue> {
        self.parameter.as_ref()
    }

    fn ordering(&self) -> Option<FieldOrdering> {
        self.ordering
    }

    fn set_ordering(&mut self, ordering: Option<FieldOrdering>) {
        self.ordering = ordering;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl QueryFieldBuilder for SqlField {
    fn build_query(&self, query: &mut QueryBuilder) -> Result<(), SqlxDriverError> {
        let Some(parameter) = &self.parameter else {
            return Ok(());
        };
        let column = self.source_field();

        if let Some(op) = compare_op(self.comparison) {
            let value = parameter
                .single()
                .ok_or_else(|| self.shape_error("a single value"))?;
            query.and_where(column, op, value.clone());
            return Ok(());
        }

        match self.comparison {
            Comparison::Contains => {
                let value = parameter
                    .single()
                    .ok_or_else(|| self.shape_error("a single value"))?;
                query.and_where_like(column, format!("%{value}%"));
            }
            Comparison::In => {
                let values = parameter
                    .list()
                    .ok_or_else(|| self.shape_error("a list"))?;
                query.and_where_in(column, values.to_vec());
            }
            Comparison::NotIn => {
                let values = parameter
                    .list()
                    .ok_or_else(|| self.shape_error("a list"))?;
                query.and_where_not_in(column, values.to_vec());
            }
            Comparison::Between => match parameter {
                ParameterValue::Range { from, to } => match (from, to) {
                    (Some(from), Some(to)) => {
                        query.and_where_between(column, from.clone(), to.clone());
                    }
                    (Some(from), None) => {
                        query.and_where(column, CompareOp::Gte, from.clone());
                    }
                    (None, Some(to)) => {
                        query.and_where(column, CompareOp::Lte, to.clone());
                    }
                    (None, None) => {}
                },
                _ => return Err(self.shape_error("a range")),
            },
            Comparison::IsNull => {
                match parameter.single().and_then(ScalarValue::as_str) {
                    Some(NULL_TOKEN) => query.and_where_null(column),
                    Some(NOT_NULL_TOKEN) => query.and_where_not_null(column),
                    _ => return Err(self.shape_error("a null/no_null token")),
                };
            }
            // handled above through compare_op
            Comparison::Eq
            | Comparison::Neq
            | Comparison::Lt
            | Comparison::Lte
            | Comparison::Gt
            | Comparison::Gte => {}
        }
        Ok(())
    }
}

/// Wrapper the SQL driver puts around every field it creates; the driver
/// downcasts to it during a build pass to recover the capability.
pub struct SqlFieldHandle {
    inner: Box<dyn QueryFieldBuilder>,
}

impl SqlFieldHandle {
    pub fn new(inner: Box<dyn QueryFieldBuilder>) -> Self {
        Self { inner }
    }

    pub(crate) fn builder(&self) -> &dyn QueryFieldBuilder {
        self.inner.as_ref()
    }
}

impl DataSourceField for SqlFieldHandle {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    fn comparison(&self) -> Comparison {
        self.inner.comparison()
    }

    fn source_field(&self) -> &str {
        self.inner.source_field()
    }

    fn bind_parameter(&mut self, raw: &Json) -> Result<(), DataSourceError> {
        self.inner.bind_parameter(raw)
    }

    fn parameter(&self) -> Option<&ParameterValue> {
        self.inner.parameter()
    }

    fn ordering(&self) -> Option<FieldOrdering> {
        self.inner.ordering()
    }

    fn set_ordering(&mut self, ordering: Option<FieldOrdering>) {
        self.inner.set_ordering(ordering)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Extension point of the SQL driver. Extensions contribute field types and
/// may hook into each build pass; the first extension claiming a type wins.
pub trait SqlxDriverExtension: Send + Sync {
    fn has_field_type(&self, type_name: &str) -> bool;

    fn create_field(
        &self,
        name: &str,
        type_name: &str,
        comparison: Comparison,
        options: &FieldOptions,
    ) -> Result<Box<dyn QueryFieldBuilder>, DataSourceError>;

    /// Adjust a freshly created field, whichever extension created it.
    fn decorate_field(&self, _field: &mut dyn QueryFieldBuilder) {}

    /// Hook run with the working query of the pass being built, before any
    /// field applies its parameter. This is the only window in which the
    /// driver's query accessor is populated.
    fn pre_build(&self, _query: &mut QueryBuilder) -> Result<(), SqlxDriverError> {
        Ok(())
    }
}

/// The built-in field types: text, number, boolean, date, time, datetime.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreExtension;

impl SqlxDriverExtension for CoreExtension {
    fn has_field_type(&self, type_name: &str) -> bool {
        FieldKind::from_type_name(type_name).is_some()
    }

    fn create_field(
        &self,
        name: &str,
        type_name: &str,
        comparison: Comparison,
        options: &FieldOptions,
    ) -> Result<Box<dyn QueryFieldBuilder>, DataSourceError> {
        let kind = FieldKind::from_type_name(type_name).ok_or_else(|| {
            DataSourceError::UnsupportedFieldType {
                type_name: type_name.to_string(),
                driver_type: crate::driver::SQLX_DRIVER_TYPE,
            }
        })?;
        Ok(Box::new(SqlField::new(name, kind, comparison, options)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn built_sql(field: &SqlField) -> String {
        let mut query = QueryBuilder::new("news", "e");
        field.build_query(&mut query).unwrap();
        query.build_select().unwrap().0
    }

    #[test]
    fn contains_wraps_the_value_in_wildcards() {
        let mut field = SqlField::new(
            "author",
            FieldKind::Text,
            Comparison::Contains,
            &FieldOptions::default(),
        )
        .unwrap();
        field.bind_parameter(&json!("domain1.com")).unwrap();

        let mut query = QueryBuilder::new("news", "e");
        field.build_query(&mut query).unwrap();
        let (sql, params) = query.build_select().unwrap();
        assert_eq!(sql, "SELECT e.* FROM news e WHERE e.author LIKE ?");
        assert_eq!(params, vec![ScalarValue::Str("%domain1.com%".into())]);
    }

    #[test]
    fn one_sided_ranges_become_plain_comparisons() {
        let mut field = SqlField::new(
            "created",
            FieldKind::DateTime,
            Comparison::Between,
            &FieldOptions::default(),
        )
        .unwrap();

        field
            .bind_parameter(&json!({"from": "2024-02-05 00:00:00"}))
            .unwrap();
        assert_eq!(
            built_sql(&field),
            "SELECT e.* FROM news e WHERE e.created >= ?"
        );

        field
            .bind_parameter(&json!({"to": "2024-02-05 00:00:00"}))
            .unwrap();
        assert_eq!(
            built_sql(&field),
            "SELECT e.* FROM news e WHERE e.created <= ?"
        );

        field
            .bind_parameter(&json!({"from": "2024-01-01 00:00:00", "to": "2024-02-05 00:00:00"}))
            .unwrap();
        assert_eq!(
            built_sql(&field),
            "SELECT e.* FROM news e WHERE e.created BETWEEN ? AND ?"
        );
    }

    #[test]
    fn inactive_fields_leave_the_template_untouched() {
        let field = SqlField::new(
            "title",
            FieldKind::Text,
            Comparison::Eq,
            &FieldOptions::default(),
        )
        .unwrap();
        assert_eq!(built_sql(&field), "SELECT e.* FROM news e");
    }

    #[test]
    fn unsupported_comparisons_fail_at_creation() {
        let err = SqlField::new(
            "active",
            FieldKind::Boolean,
            Comparison::Between,
            &FieldOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DataSourceError::UnsupportedComparison { type_name: "boolean", .. }
        ));
    }

    #[test]
    fn source_option_redirects_the_column() {
        let mut field = SqlField::new(
            "writer",
            FieldKind::Text,
            Comparison::Eq,
            &FieldOptions::source("author"),
        )
        .unwrap();
        field.bind_parameter(&json!("x")).unwrap();
        assert_eq!(built_sql(&field), "SELECT e.* FROM news e WHERE e.author = ?");
    }
}

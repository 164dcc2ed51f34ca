use crate::criteria::Criteria;
use crate::error::CollectionDriverError;
use serde_json::Value as Json;
use sift_core::{
    Comparison, DataSourceError, DataSourceField, FieldKind, FieldOptions, FieldOrdering,
    ParameterValue,
};
use std::any::Any;

/// Capability that lets a field restrict the collection driver's criteria.
///
/// Custom field types implement this on top of [`DataSourceField`]; the
/// driver only accepts fields wrapped in a [`CollectionFieldHandle`], which
/// is how the capability is recovered from the type-erased field list.
pub trait CollectionFieldBuilder: DataSourceField {
    /// Apply the bound parameter to the criteria. Inactive fields must
    /// leave the criteria untouched.
    fn build_criteria(&self, criteria: &mut Criteria) -> Result<(), CollectionDriverError>;
}

/// Comparisons the collection driver supports per field kind.
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

/// Standard collection field covering the built-in kinds.
#[derive(Debug)]
pub struct CollectionField {
    name: String,
    kind: FieldKind,
    comparison: Comparison,
    source: Option<String>,
    ordering: Option<FieldOrdering>,
    parameter: Option<ParameterValue>,
}

impl CollectionField {
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
}

impl DataSourceField for CollectionField {
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

impl CollectionFieldBuilder for CollectionField {
    fn build_criteria(&self, criteria: &mut Criteria) -> Result<(), CollectionDriverError> {
        let Some(parameter) = &self.parameter else {
            return Ok(());
        };
        criteria.and_where(self.source_field(), self.comparison, parameter.clone());
        Ok(())
    }
}

/// Wrapper the collection driver puts around every field it creates.
///
/// During a build pass the driver downcasts each field to this type; a
/// field that is not wrapped was created for another driver and the pass
/// fails with a capability error.
pub struct CollectionFieldHandle {
    inner: Box<dyn CollectionFieldBuilder>,
}

impl CollectionFieldHandle {
    pub fn new(inner: Box<dyn CollectionFieldBuilder>) -> Self {
        Self { inner }
    }

    pub(crate) fn builder(&self) -> &dyn CollectionFieldBuilder {
        self.inner.as_ref()
    }
}

impl DataSourceField for CollectionFieldHandle {
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

/// Extension point of the collection driver.
///
/// Extensions contribute field types and may hook into each build pass.
/// They are consulted in registration order; for field creation the first
/// extension claiming a type wins.
pub trait CollectionDriverExtension: Send + Sync {
    /// Field types this extension can instantiate.
    fn has_field_type(&self, type_name: &str) -> bool;

    /// Create a field of a claimed type. Only called for types for which
    /// [`has_field_type`](CollectionDriverExtension::has_field_type) is true.
    fn create_field(
        &self,
        name: &str,
        type_name: &str,
        comparison: Comparison,
        options: &FieldOptions,
    ) -> Result<Box<dyn CollectionFieldBuilder>, DataSourceError>;

    /// Adjust a freshly created field, whichever extension created it.
    fn decorate_field(&self, _field: &mut dyn CollectionFieldBuilder) {}

    /// Hook run with the working criteria of the pass being built, before
    /// any field applies its parameter. This is the only window in which
    /// the driver's criteria accessor is populated.
    fn pre_build(&self, _criteria: &mut Criteria) -> Result<(), CollectionDriverError> {
        Ok(())
    }
}

/// The built-in field types: text, number, boolean, date, time, datetime.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreExtension;

impl CollectionDriverExtension for CoreExtension {
    fn has_field_type(&self, type_name: &str) -> bool {
        FieldKind::from_type_name(type_name).is_some()
    }

    fn create_field(
        &self,
        name: &str,
        type_name: &str,
        comparison: Comparison,
        options: &FieldOptions,
    ) -> Result<Box<dyn CollectionFieldBuilder>, DataSourceError> {
        let kind = FieldKind::from_type_name(type_name).ok_or_else(|| {
            DataSourceError::UnsupportedFieldType {
                type_name: type_name.to_string(),
                driver_type: crate::driver::COLLECTION_DRIVER_TYPE,
            }
        })?;
        Ok(Box::new(CollectionField::new(name, kind, comparison, options)?))
    }
}

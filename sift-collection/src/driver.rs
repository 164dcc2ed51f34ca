use crate::criteria::{CollectionItem, Criteria};
use crate::error::CollectionDriverError;
use crate::fields::{CollectionDriverExtension, CollectionFieldHandle};
use crate::result::CollectionResult;
use async_trait::async_trait;
use sift_core::{
    Comparison, DataSourceError, DataSourceField, DataSourceResult, Driver, FieldOptions,
};
use std::sync::Arc;

/// Registry key of the collection driver.
pub const COLLECTION_DRIVER_TYPE: &str = "collection";

/// Driver evaluating fields against an in-memory collection.
///
/// The driver owns a template [`Criteria`]; each build pass works on a
/// fresh clone, so base restrictions configured up front apply to every
/// pass and passes never see each other's state.
pub struct CollectionDriver<T: CollectionItem> {
    extensions: Vec<Arc<dyn CollectionDriverExtension>>,
    collection: Arc<Vec<T>>,
    template: Criteria,
    current: Option<Criteria>,
}

impl<T: CollectionItem> CollectionDriver<T> {
    pub fn new(
        extensions: Vec<Arc<dyn CollectionDriverExtension>>,
        collection: impl Into<Arc<Vec<T>>>,
    ) -> Self {
        Self::with_criteria(extensions, collection, Criteria::new())
    }

    /// Driver with base restrictions every pass starts from.
    pub fn with_criteria(
        extensions: Vec<Arc<dyn CollectionDriverExtension>>,
        collection: impl Into<Arc<Vec<T>>>,
        criteria: Criteria,
    ) -> Self {
        Self {
            extensions,
            collection: collection.into(),
            template: criteria,
            current: None,
        }
    }

    /// Fresh working copy of the template for one pass.
    pub fn init_criteria(&self) -> Criteria {
        self.template.clone()
    }

    /// The working criteria of the pass being built.
    ///
    /// Populated only while the pre-build hooks run; any other access is a
    /// state error.
    pub fn current_criteria(&self) -> Result<&Criteria, CollectionDriverError> {
        self.current
            .as_ref()
            .ok_or(CollectionDriverError::CriteriaOutsideBuild)
    }

    fn run_pre_build(&mut self) -> Result<(), CollectionDriverError> {
        let criteria = self
            .current
            .as_mut()
            .ok_or(CollectionDriverError::CriteriaOutsideBuild)?;
        for extension in &self.extensions {
            extension.pre_build(criteria)?;
        }
        Ok(())
    }

    fn build(
        &mut self,
        fields: &[Box<dyn DataSourceField>],
        first: u64,
        max: Option<u64>,
    ) -> Result<CollectionResult<T>, CollectionDriverError> {
        // The hook window closes here; fields build against a criteria the
        // accessor no longer exposes.
        let mut criteria = self
            .current
            .take()
            .ok_or(CollectionDriverError::CriteriaOutsideBuild)?;

        for field in fields {
            let handle = field
                .as_any()
                .downcast_ref::<CollectionFieldHandle>()
                .ok_or_else(|| CollectionDriverError::MissingCapability {
                    field: field.name().to_string(),
                })?;
            handle.builder().build_criteria(&mut criteria)?;
        }

        let mut ordered: Vec<_> = fields
            .iter()
            .filter_map(|f| f.ordering().map(|o| (f, o)))
            .collect();
        ordered.sort_by_key(|(_, o)| o.priority);
        for (field, ordering) in ordered {
            criteria.order_by(field.source_field(), ordering.direction);
        }

        if let Some(max) = max {
            criteria.set_first_result(first).set_max_results(max);
        }

        Ok(CollectionResult::new(&self.collection, &criteria))
    }
}

#[async_trait]
impl<T: CollectionItem> Driver<T> for CollectionDriver<T> {
    fn driver_type(&self) -> &'static str {
        COLLECTION_DRIVER_TYPE
    }

    fn create_field(
        &self,
        name: &str,
        type_name: &str,
        comparison: Comparison,
        options: &FieldOptions,
    ) -> Result<Box<dyn DataSourceField>, DataSourceError> {
        let extension = self
            .extensions
            .iter()
            .find(|e| e.has_field_type(type_name))
            .ok_or_else(|| DataSourceError::UnsupportedFieldType {
                type_name: type_name.to_string(),
                driver_type: COLLECTION_DRIVER_TYPE,
            })?;
        let mut field = extension.create_field(name, type_name, comparison, options)?;
        for extension in &self.extensions {
            extension.decorate_field(field.as_mut());
        }
        Ok(Box::new(CollectionFieldHandle::new(field)))
    }

    async fn get_result(
        &mut self,
        fields: &[Box<dyn DataSourceField>],
        first: u64,
        max: Option<u64>,
    ) -> Result<Box<dyn DataSourceResult<T>>, DataSourceError> {
        tracing::debug!(
            driver = COLLECTION_DRIVER_TYPE,
            records = self.collection.len(),
            fields = fields.len(),
            first,
            max = ?max,
            "building collection result"
        );
        self.current = Some(self.init_criteria());
        let outcome = self
            .run_pre_build()
            .and_then(|()| self.build(fields, first, max));
        // Cleared on success and failure alike.
        self.current = None;
        Ok(Box::new(outcome?))
    }
}

use crate::criteria::{CollectionItem, Criteria};
use crate::driver::{CollectionDriver, COLLECTION_DRIVER_TYPE};
use crate::fields::{CollectionDriverExtension, CoreExtension};
use sift_core::{DataSourceError, Driver, DriverFactory};
use std::any::Any;
use std::sync::Arc;

/// Options consumed by [`CollectionFactory`].
pub struct CollectionDriverOptions<T> {
    pub collection: Arc<Vec<T>>,
    pub criteria: Option<Criteria>,
}

impl<T> CollectionDriverOptions<T> {
    pub fn new(collection: impl Into<Arc<Vec<T>>>) -> Self {
        Self {
            collection: collection.into(),
            criteria: None,
        }
    }

    /// Base restrictions every pass starts from.
    pub fn criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = Some(criteria);
        self
    }
}

/// Factory registering the collection driver under `"collection"`.
pub struct CollectionFactory {
    extensions: Vec<Arc<dyn CollectionDriverExtension>>,
}

impl CollectionFactory {
    pub fn new(extensions: Vec<Arc<dyn CollectionDriverExtension>>) -> Self {
        Self { extensions }
    }

    /// Factory with only the built-in field types.
    pub fn core() -> Self {
        Self::new(vec![Arc::new(CoreExtension)])
    }
}

impl<T: CollectionItem> DriverFactory<T> for CollectionFactory {
    fn driver_type(&self) -> &'static str {
        COLLECTION_DRIVER_TYPE
    }

    fn create_driver(
        &self,
        options: Box<dyn Any + Send>,
    ) -> Result<Box<dyn Driver<T>>, DataSourceError> {
        let options = options
            .downcast::<CollectionDriverOptions<T>>()
            .map_err(|_| {
                DataSourceError::Configuration(
                    "collection driver expects CollectionDriverOptions".to_string(),
                )
            })?;
        let CollectionDriverOptions {
            collection,
            criteria,
        } = *options;
        let driver = match criteria {
            Some(criteria) => {
                CollectionDriver::with_criteria(self.extensions.clone(), collection, criteria)
            }
            None => CollectionDriver::new(self.extensions.clone(), collection),
        };
        Ok(Box::new(driver))
    }
}

use crate::datasource::DataSource;
use crate::driver::Driver;
use crate::error::DataSourceError;
use std::any::Any;
use std::collections::HashMap;

/// Builds drivers of one declared type from backend-specific options.
///
/// Options travel as `Box<dyn Any>` because every backend wants a different
/// shape; a factory downcasts to its own options struct and reports a
/// configuration error when handed anything else.
pub trait DriverFactory<T>: Send + Sync {
    /// The driver type this factory builds, e.g. `"collection"`.
    fn driver_type(&self) -> &'static str;

    fn create_driver(
        &self,
        options: Box<dyn Any + Send>,
    ) -> Result<Box<dyn Driver<T>>, DataSourceError>;
}

/// Registry mapping driver-type strings to their factories.
///
/// Registering a second factory under an already-present type replaces the
/// first; the registry is meant to be assembled once at startup.
pub struct DriverFactoryManager<T> {
    factories: HashMap<String, Box<dyn DriverFactory<T>>>,
}

impl<T> DriverFactoryManager<T> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn with_factories(factories: Vec<Box<dyn DriverFactory<T>>>) -> Self {
        let mut manager = Self::new();
        for factory in factories {
            manager.add_factory(factory);
        }
        manager
    }

    pub fn add_factory(&mut self, factory: Box<dyn DriverFactory<T>>) {
        let driver_type = factory.driver_type().to_string();
        if self.factories.insert(driver_type.clone(), factory).is_some() {
            tracing::debug!(driver_type = %driver_type, "replacing driver factory");
        }
    }

    pub fn factory(&self, driver_type: &str) -> Option<&dyn DriverFactory<T>> {
        self.factories.get(driver_type).map(|f| f.as_ref())
    }

    pub fn has_factory(&self, driver_type: &str) -> bool {
        self.factories.contains_key(driver_type)
    }
}

impl<T> Default for DriverFactoryManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Front door for creating data sources from registered driver factories.
pub struct DataSourceFactory<T> {
    manager: DriverFactoryManager<T>,
}

impl<T> DataSourceFactory<T> {
    pub fn new(manager: DriverFactoryManager<T>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &DriverFactoryManager<T> {
        &self.manager
    }

    /// Create a named data source backed by a driver of the given type.
    pub fn create_data_source(
        &self,
        driver_type: &str,
        options: Box<dyn Any + Send>,
        name: &str,
    ) -> Result<DataSource<T>, DataSourceError> {
        let factory = self
            .manager
            .factory(driver_type)
            .ok_or_else(|| DataSourceError::UnknownDriverType(driver_type.to_string()))?;
        let driver = factory.create_driver(options)?;
        DataSource::new(name, driver)
    }
}

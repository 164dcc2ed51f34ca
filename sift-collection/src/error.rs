use sift_core::DataSourceError;

/// Errors specific to the in-memory collection driver.
#[derive(Debug)]
pub enum CollectionDriverError {
    /// A field handed to a build pass was not created for this driver and
    /// cannot restrict a collection criteria.
    MissingCapability { field: String },
    /// The working criteria was accessed outside the pre-build hook window.
    CriteriaOutsideBuild,
    /// A custom field or hook rejected the pass.
    Build(String),
}

impl std::fmt::Display for CollectionDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionDriverError::MissingCapability { field } => write!(
                f,
                "field \"{field}\" does not implement CollectionFieldBuilder and cannot be built by the collection driver"
            ),
            CollectionDriverError::CriteriaOutsideBuild => f.write_str(
                "the working criteria is accessible only during the pre-build hooks of a result pass",
            ),
            CollectionDriverError::Build(msg) => write!(f, "build failed: {msg}"),
        }
    }
}

impl std::error::Error for CollectionDriverError {}

impl From<CollectionDriverError> for DataSourceError {
    fn from(err: CollectionDriverError) -> Self {
        DataSourceError::driver(err)
    }
}

use crate::query::QueryError;
use sift_core::DataSourceError;

/// Errors specific to the SQLx driver.
#[derive(Debug)]
pub enum SqlxDriverError {
    /// A field handed to a build pass was not created for this driver and
    /// cannot contribute to the select template.
    MissingCapability { field: String },
    /// The working query was accessed outside the pre-build hook window.
    QueryOutsideBuild,
    /// The template rendered to invalid SQL (bad identifier).
    Query(QueryError),
    /// A custom field or hook rejected the pass.
    Build(String),
    /// Database failure while executing the pass.
    Execute(sqlx::Error),
}

impl std::fmt::Display for SqlxDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlxDriverError::MissingCapability { field } => write!(
                f,
                "field \"{field}\" does not implement QueryFieldBuilder and cannot be built by the sqlx driver"
            ),
            SqlxDriverError::QueryOutsideBuild => f.write_str(
                "the working query is accessible only during the pre-build hooks of a result pass",
            ),
            SqlxDriverError::Query(err) => write!(f, "query build failed: {err}"),
            SqlxDriverError::Build(msg) => write!(f, "build failed: {msg}"),
            SqlxDriverError::Execute(err) => write!(f, "query execution failed: {err}"),
        }
    }
}

impl std::error::Error for SqlxDriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SqlxDriverError::Query(err) => Some(err),
            SqlxDriverError::Execute(err) => Some(err),
            _ => None,
        }
    }
}

impl From<QueryError> for SqlxDriverError {
    fn from(err: QueryError) -> Self {
        SqlxDriverError::Query(err)
    }
}

impl From<SqlxDriverError> for DataSourceError {
    fn from(err: SqlxDriverError) -> Self {
        DataSourceError::driver(err)
    }
}

use crate::comparison::Comparison;

/// Errors that can occur while configuring a data source or building a result.
#[derive(Debug)]
pub enum DataSourceError {
    /// Invalid construction input: a bad name, a bad option shape, a missing piece
    /// of backend configuration.
    Configuration(String),
    /// No factory is registered under the requested driver type.
    UnknownDriverType(String),
    /// None of the driver's extensions claim the requested field type.
    UnsupportedFieldType {
        type_name: String,
        driver_type: &'static str,
    },
    /// The comparison is outside what the field type supports on this driver.
    UnsupportedComparison {
        field: String,
        type_name: &'static str,
        comparison: Comparison,
        allowed: &'static [Comparison],
    },
    /// A field with the same name already exists on the data source.
    DuplicateField(String),
    /// A bound raw value does not fit the field's kind or comparison shape.
    InvalidParameter { field: String, message: String },
    /// Backend failure during a build pass.
    Driver(Box<dyn std::error::Error + Send + Sync>),
}

impl DataSourceError {
    /// Construct a `Driver` variant from any error type.
    ///
    /// Used by backend crates to wrap driver-specific errors when a build
    /// pass fails.
    pub fn driver(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataSourceError::Driver(Box::new(err))
    }
}

impl std::fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSourceError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            DataSourceError::UnknownDriverType(driver_type) => {
                write!(f, "No driver factory registered for type \"{driver_type}\"")
            }
            DataSourceError::UnsupportedFieldType {
                type_name,
                driver_type,
            } => write!(
                f,
                "Field type \"{type_name}\" is not supported by the \"{driver_type}\" driver"
            ),
            DataSourceError::UnsupportedComparison {
                field,
                type_name,
                comparison,
                allowed,
            } => {
                write!(
                    f,
                    "Comparison \"{comparison}\" is not supported by field \"{field}\" of type \"{type_name}\"; allowed:"
                )?;
                for (i, c) in allowed.iter().enumerate() {
                    write!(f, "{}{c}", if i == 0 { " " } else { ", " })?;
                }
                Ok(())
            }
            DataSourceError::DuplicateField(name) => {
                write!(f, "Field \"{name}\" is already defined on this data source")
            }
            DataSourceError::InvalidParameter { field, message } => {
                write!(f, "Invalid parameter for field \"{field}\": {message}")
            }
            DataSourceError::Driver(err) => write!(f, "Driver error: {err}"),
        }
    }
}

impl std::error::Error for DataSourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataSourceError::Driver(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

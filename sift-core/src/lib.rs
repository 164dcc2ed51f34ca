pub mod comparison;
pub mod datasource;
pub mod driver;
pub mod error;
pub mod factory;
pub mod field;
pub mod result;
pub mod value;

pub use comparison::{Comparison, Direction};
pub use datasource::{DataSource, Parameters, SortSpec};
pub use driver::Driver;
pub use error::DataSourceError;
pub use factory::{DataSourceFactory, DriverFactory, DriverFactoryManager};
pub use field::{DataSourceField, FieldKind, FieldOptions, FieldOrdering, ParameterError};
pub use result::DataSourceResult;
pub use value::{ParameterValue, ScalarValue};

pub mod prelude {
    //! Re-exports of the most commonly used data source types.
    pub use crate::{
        Comparison, DataSource, DataSourceError, DataSourceFactory, DataSourceField,
        DataSourceResult, Direction, Driver, DriverFactory, DriverFactoryManager, FieldKind,
        FieldOptions, FieldOrdering, ParameterValue, Parameters, ScalarValue,
    };
}

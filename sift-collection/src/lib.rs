//! In-memory collection backend for sift.
//!
//! Fields declared on a [`sift_core::DataSource`] are evaluated against a
//! plain `Vec` of records through a [`Criteria`]: filter predicates, sort
//! keys and pagination bounds, applied when a result is built. Records are
//! anything implementing [`CollectionItem`]; `serde_json::Value` works out
//! of the box.

pub mod criteria;
pub mod driver;
pub mod error;
pub mod factory;
pub mod fields;
pub mod result;

pub use criteria::{CollectionItem, Criteria, Predicate};
pub use driver::{CollectionDriver, COLLECTION_DRIVER_TYPE};
pub use error::CollectionDriverError;
pub use factory::{CollectionDriverOptions, CollectionFactory};
pub use fields::{
    CollectionDriverExtension, CollectionField, CollectionFieldBuilder, CollectionFieldHandle,
    CoreExtension,
};
pub use result::CollectionResult;

pub mod prelude {
    //! Re-exports of the collection backend types.
    pub use crate::{
        CollectionDriver, CollectionDriverExtension, CollectionDriverOptions, CollectionFactory,
        CollectionField, CollectionFieldBuilder, CollectionItem, CollectionResult, Criteria,
    };
}

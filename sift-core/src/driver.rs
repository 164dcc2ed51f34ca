use crate::comparison::Comparison;
use crate::error::DataSourceError;
use crate::field::{DataSourceField, FieldOptions};
use crate::result::DataSourceResult;
use async_trait::async_trait;

/// Backend adapter that turns bound fields into an executed result.
///
/// A driver holds a backend-native template (a select builder, an in-memory
/// criteria) and clones it once per build pass. The cloned working copy is
/// exposed to pre-build hooks through a driver-specific accessor, which is
/// populated only while those hooks run; the template itself is never
/// mutated by a pass.
#[async_trait]
pub trait Driver<T>: Send {
    /// Registry key for this backend, e.g. `"collection"` or `"sqlx"`.
    fn driver_type(&self) -> &'static str;

    /// Create a field through this driver's extensions. Extensions are
    /// consulted in registration order and the first one claiming the type
    /// wins; an unclaimed type is an error.
    fn create_field(
        &self,
        name: &str,
        type_name: &str,
        comparison: Comparison,
        options: &FieldOptions,
    ) -> Result<Box<dyn DataSourceField>, DataSourceError>;

    /// Run one build pass over the given fields.
    ///
    /// `first` and `max` are the pagination bounds; `max = None` leaves the
    /// result unbounded and `first` is only applied together with `max`.
    async fn get_result(
        &mut self,
        fields: &[Box<dyn DataSourceField>],
        first: u64,
        max: Option<u64>,
    ) -> Result<Box<dyn DataSourceResult<T>>, DataSourceError>;
}

impl<T> std::fmt::Debug for dyn Driver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("driver_type", &self.driver_type())
            .finish_non_exhaustive()
    }
}

/// A built result: a fixed total count plus stable iteration over one page.
///
/// `count` is the number of records matching the field criteria with
/// pagination bounds ignored; it is computed when the result is built and
/// never re-executed. Iteration yields only the bounded page.
pub trait DataSourceResult<T>: Send + Sync {
    /// Total number of matching records, pagination bounds ignored.
    fn count(&self) -> u64;

    /// Number of records in this page.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the page in the backend's order.
    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = &'a T> + 'a>;

    /// Escape hatch for accessors only the concrete result type has.
    fn as_any(&self) -> &dyn std::any::Any;
}

impl<T> std::fmt::Debug for dyn DataSourceResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSourceResult")
            .field("count", &self.count())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

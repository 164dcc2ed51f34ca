use crate::criteria::{CollectionItem, Criteria};
use sift_core::DataSourceResult;

/// Result of one collection pass.
///
/// The total count is taken after filtering but before pagination bounds,
/// and stays fixed for the life of the result.
pub struct CollectionResult<T> {
    items: Vec<T>,
    count: u64,
}

impl<T: CollectionItem> CollectionResult<T> {
    pub fn new(collection: &[T], criteria: &Criteria) -> Self {
        let mut matched: Vec<T> = collection
            .iter()
            .filter(|item| criteria.matches(*item))
            .cloned()
            .collect();
        if !criteria.orderings().is_empty() {
            // sort_by is stable, so equal keys keep collection order
            matched.sort_by(|a, b| criteria.compare(a, b));
        }
        let count = matched.len() as u64;
        let items = match criteria.max_results() {
            Some(max) => {
                let first = criteria.first_result().unwrap_or(0) as usize;
                matched.into_iter().skip(first).take(max as usize).collect()
            }
            None => matched,
        };
        Self { items, count }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}

impl<T: CollectionItem> DataSourceResult<T> for CollectionResult<T> {
    fn count(&self) -> u64 {
        self.count
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = &'a T> + 'a> {
        Box::new(self.items.iter())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

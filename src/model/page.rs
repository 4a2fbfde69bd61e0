//! Fetched page of entities plus opaque facet metadata.

use std::collections::BTreeMap;

/// Server-computed aggregates returned alongside a page.
///
/// Facet name → bucket value → count. Passed through untouched by the navigation core.
pub type Facets = BTreeMap<String, BTreeMap<String, u64>>;

/// One page of results from a [`crate::source::PageFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct Page<E> {
    /// Rows of the requested page, in display order.
    pub data: Vec<E>,
    /// Size of the whole filtered collection.
    pub total: usize,
    /// Optional aggregate metadata.
    pub facets: Option<Facets>,
}

impl<E> Page<E> {
    /// Page without facets.
    pub fn new(data: Vec<E>, total: usize) -> Self {
        Self {
            data,
            total,
            facets: None,
        }
    }

    /// Attach facets.
    pub fn with_facets(mut self, facets: Facets) -> Self {
        self.facets = Some(facets);
        self
    }
}

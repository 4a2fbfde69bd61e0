//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod entity;
pub mod error;
pub mod filter;
pub mod page;

// Re-export for convenience
pub use entity::{display_value, Entity, EntityId, InvalidEntityId, InvalidRecord, Record};
pub use error::{AppError, FetchError, StorageError};
pub use filter::{
    page_size_of, FilterDefinition, FilterKind, FilterMap, FilterValue, PAGE_SIZE_FILTER_KEY,
    QUERY_FILTER_KEY, STATUS_FILTER_KEY,
};
pub use page::{Facets, Page};

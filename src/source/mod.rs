//! Page sources consumed by the navigation manager.
//!
//! The navigation core treats the fetcher as opaque: it hands over a page number,
//! the current filters and a cancellation token, and awaits a [`Page`].

pub mod file;

pub use file::JsonFileSource;

use crate::model::{FetchError, FilterMap, Page};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Asynchronous page fetch contract.
///
/// `cancel` fires when a newer request supersedes this one. Honouring it is
/// optional: late results are discarded by the caller either way.
#[async_trait]
pub trait PageFetcher<E>: Send + Sync {
    /// Fetch the 1-based `page` of the collection narrowed by `filters`.
    async fn fetch(
        &self,
        page: usize,
        filters: &FilterMap,
        cancel: CancellationToken,
    ) -> Result<Page<E>, FetchError>;
}

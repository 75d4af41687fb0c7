//! Movie catalog access: the [`CatalogClient`] seam and its TMDB backend.

mod error;
pub mod genres;
mod model;
pub mod retry;
mod tmdb;

use async_trait::async_trait;

pub use error::CatalogError;
pub use model::{CastMember, CatalogMovie, DiscoverSort, GenreRef, SearchQuery};
pub use retry::RetryPolicy;
pub use tmdb::TmdbClient;

/// Read-only movie catalog.
///
/// `search` runs a keyword search when `query.query` is non-blank and a
/// filter-only discovery otherwise.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CatalogMovie>, CatalogError>;
    async fn detail(&self, id: u64) -> Result<CatalogMovie, CatalogError>;
    async fn similar(&self, id: u64) -> Result<Vec<CatalogMovie>, CatalogError>;
}

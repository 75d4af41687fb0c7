pub mod cache;
pub mod schema;
pub mod store;

pub use cache::{Cache, TtlCache, cache_key};
pub use schema::{Filters, SortBy};
pub use store::{InMemorySessionStore, SessionStore};

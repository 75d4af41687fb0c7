//! Per-field precedence: directive, then inferred, then session memory.

use anyhow::Result;
use tracing::debug;

use cinebot_memory::{Filters, SessionStore};

use crate::directives::ParsedDirectives;

impl From<&ParsedDirectives> for Filters {
    fn from(d: &ParsedDirectives) -> Self {
        Filters {
            year: d.year(),
            genre: d.genre(),
            cast_female: d.cast_female(),
            sort_by: d.sort_by(),
        }
    }
}

pub fn merge(directives: &ParsedDirectives, inferred: &Filters, prior: &Filters) -> Filters {
    Filters::from(directives)
        .overlay(inferred)
        .overlay(prior)
}

/// Merge against the stored filters for `session_id` and write the result
/// back.  The write happens on every turn, whether or not anything changed.
pub async fn merge_into_session(
    store: &dyn SessionStore,
    session_id: &str,
    directives: &ParsedDirectives,
    inferred: &Filters,
) -> Result<Filters> {
    let prior = store.get(session_id).await?.unwrap_or_default();
    let merged = merge(directives, inferred, &prior);
    debug!(session_id, filters = ?merged, "session filters merged");
    store.put(session_id, merged.clone()).await?;
    Ok(merged)
}

//! Directly callable catalog tools exposed through the daemon.

mod catalog;

pub use catalog::{MovieDetailTool, SearchCatalogTool, SimilarMoviesTool};

use crate::{MovieTools, ToolRegistry};

/// Registry holding every built-in tool, all sharing one [`MovieTools`].
pub fn default_registry(tools: MovieTools) -> ToolRegistry {
    let mut registry = ToolRegistry::default();
    registry.register(Box::new(SearchCatalogTool {
        tools: tools.clone(),
    }));
    registry.register(Box::new(MovieDetailTool {
        tools: tools.clone(),
    }));
    registry.register(Box::new(SimilarMoviesTool { tools }));
    registry
}

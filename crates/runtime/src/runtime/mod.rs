//! Agent runtime: configuration, session memory and catalog tools wired
//! into the chat pipeline.

mod chat;

use std::sync::Arc;

use anyhow::Result;

use cinebot_catalog::{CatalogClient, TmdbClient};
use cinebot_config::AppConfig;
use cinebot_memory::{InMemorySessionStore, SessionStore, TtlCache};
use cinebot_tools::{MovieTools, ToolRegistry, ToolSettings, default_registry};

use crate::intent::IntentExtractor;
use crate::strategy::StrategySelector;

#[derive(Clone)]
pub struct AgentRuntime {
    pub config: AppConfig,
    store: Arc<dyn SessionStore>,
    tools: MovieTools,
    intent: Arc<IntentExtractor>,
    selector: Arc<StrategySelector>,
}

impl AgentRuntime {
    /// Runtime over the given session store and catalog.  Catalog results are
    /// cached in a fresh in-process TTL cache.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn SessionStore>,
        catalog: Arc<dyn CatalogClient>,
    ) -> Result<Self> {
        let tools = MovieTools::new(
            catalog,
            Arc::new(TtlCache::new()),
            ToolSettings::from_config(&config),
        );
        Ok(Self {
            intent: Arc::new(IntentExtractor::from_config(&config.intent)?),
            selector: Arc::new(StrategySelector::from_config(&config.agent)?),
            config,
            store,
            tools,
        })
    }

    /// Production wiring: TMDB catalog and in-memory sessions.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let catalog = TmdbClient::new(&config.catalog)?;
        Self::new(
            config,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(catalog),
        )
    }

    /// Registry for the direct search/detail/similar surface.
    pub fn tool_registry(&self) -> ToolRegistry {
        default_registry(self.tools.clone())
    }
}

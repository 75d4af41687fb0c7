//! Retrieval path selection.

use std::fmt;

use anyhow::{Context, Result};
use regex::Regex;

use cinebot_config::AgentConfig;

use crate::intent::alternation;

/// Retrieval paths, in the order they are considered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Trigger word plus a caller profile.
    Personalized,
    /// Similarity trigger; looks up the configured reference title.
    Similar,
    /// Keyword search, falling back to one discovery call on no results.
    Search { query: String },
    /// Filter-only discovery.
    Discover,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Personalized => f.write_str("personalized"),
            Self::Similar => f.write_str("similar"),
            Self::Search { .. } => f.write_str("search"),
            Self::Discover => f.write_str("discover"),
        }
    }
}

#[derive(Debug)]
pub struct StrategySelector {
    personalize: Option<Regex>,
    similar: Option<Regex>,
    noop_queries: Vec<String>,
}

impl StrategySelector {
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        Ok(Self {
            personalize: alternation(&config.personalize_triggers)
                .context("invalid [agent] personalize_triggers")?,
            similar: alternation(&config.similar_triggers)
                .context("invalid [agent] similar_triggers")?,
            noop_queries: config
                .noop_queries
                .iter()
                .map(|q| q.trim().to_lowercase())
                .collect(),
        })
    }

    /// Triggers are matched against the raw message; the no-op check uses
    /// the directive-free text.
    pub fn select(&self, raw: &str, cleaned: &str, has_profile: bool) -> Strategy {
        let matches = |re: &Option<Regex>| re.as_ref().is_some_and(|re| re.is_match(raw));

        if has_profile && matches(&self.personalize) {
            return Strategy::Personalized;
        }
        if matches(&self.similar) {
            return Strategy::Similar;
        }
        let query = cleaned.trim();
        if query.is_empty() || self.is_noop(query) {
            Strategy::Discover
        } else {
            Strategy::Search {
                query: query.to_string(),
            }
        }
    }

    fn is_noop(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.noop_queries.iter().any(|q| *q == query)
    }
}

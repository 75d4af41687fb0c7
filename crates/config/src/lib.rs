use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

// ── Agent / orchestration ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub name: String,
    /// Catalog id used by the "similar to …" path.  The message text never
    /// names the target, so every similarity request compares against this
    /// title.
    pub reference_movie_id: u64,
    /// Candidates kept after scoring on the personalized path.
    pub personalized_limit: usize,
    /// Candidates kept on the similarity path.
    pub similar_limit: usize,
    /// Result cap for keyword search and discovery.
    pub search_limit: usize,
    /// Movies returned to the caller after composition.
    pub result_limit: usize,
    /// Similar titles fetched per liked movie when building the candidate pool.
    pub similar_per_like: usize,
    /// Regex fragments that route a message to the personalized path (only
    /// when a profile is attached to the request).
    pub personalize_triggers: Vec<String>,
    /// Regex fragments that route a message to the similarity path.
    pub similar_triggers: Vec<String>,
    /// Cleaned queries that carry no search intent on their own.
    pub noop_queries: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Cinebot".to_string(),
            reference_movie_id: 329_865,
            personalized_limit: 8,
            similar_limit: 8,
            search_limit: 6,
            result_limit: 4,
            similar_per_like: 20,
            personalize_triggers: vec![
                "收藏".to_string(),
                "个性化".to_string(),
                "周末片单".to_string(),
                "for me".to_string(),
                "personali[sz]ed".to_string(),
                "my favou?rites".to_string(),
            ],
            similar_triggers: vec![
                "类似".to_string(),
                "像.*?这样的".to_string(),
                "similar".to_string(),
            ],
            noop_queries: vec![
                "找".to_string(),
                "推荐".to_string(),
                "find".to_string(),
                "recommend".to_string(),
            ],
        }
    }
}

/// Synonym lists behind the natural-language intent rules.  Each entry is a
/// regex fragment; matching is case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    pub sci_fi_terms: Vec<String>,
    pub female_lead_terms: Vec<String>,
    pub rating_sort_terms: Vec<String>,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            sci_fi_terms: vec![
                "科幻".to_string(),
                "sci-?fi".to_string(),
                "science fiction".to_string(),
            ],
            female_lead_terms: vec![
                "女性主演".to_string(),
                "女主".to_string(),
                "female".to_string(),
            ],
            rating_sort_terms: vec![
                "评分".to_string(),
                "imdb".to_string(),
                "按.*分".to_string(),
            ],
        }
    }
}

// ── Catalog (TMDB) ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the TMDB v3 API.  Overridden by `TMDB_BASE_URL`.
    pub base_url: String,
    /// Prefix joined with `poster_path` to build poster URLs.
    pub image_base_url: String,
    /// v4 read access token, sent as a bearer token.  Overridden by
    /// `TMDB_READ_TOKEN`.
    pub read_token: String,
    /// v3 api key, appended as `api_key=` when no read token is set.
    /// Overridden by `TMDB_KEY`.
    pub api_key: String,
    /// Per-attempt request timeout.
    pub timeout_secs: u64,
    /// Retries after the first attempt on transient failures.
    pub max_retries: u32,
    /// Backoff before retry `n` is `backoff_base_ms * 2^n`.
    pub backoff_base_ms: u64,
    /// How many results the female-cast post-filter inspects.
    pub female_scan_limit: usize,
    /// Minimum vote count applied when discovery is sorted by rating.
    /// `0` disables the floor.
    pub rating_sort_min_votes: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p/w342".to_string(),
            read_token: String::new(),
            api_key: String::new(),
            timeout_secs: 15,
            max_retries: 2,
            backoff_base_ms: 500,
            female_scan_limit: 20,
            rating_sort_min_votes: 200,
        }
    }
}

impl CatalogConfig {
    pub fn has_credentials(&self) -> bool {
        !self.read_token.trim().is_empty() || !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub search_ttl_secs: u64,
    pub detail_ttl_secs: u64,
    pub similar_ttl_secs: u64,
    /// TTL for the direct search tool, which bypasses the orchestrator.
    pub direct_search_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_ttl_secs: 60 * 60,
            detail_ttl_secs: 60 * 120,
            similar_ttl_secs: 60 * 60,
            direct_search_ttl_secs: 60 * 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub socket_path: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: "/tmp/cinebot.sock".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub intent: IntentConfig,
    pub catalog: CatalogConfig,
    pub cache: CacheConfig,
    pub telemetry: TelemetryConfig,
    pub daemon: DaemonConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        // Credentials from the environment take precedence over the file.
        if let Ok(token) = env::var("TMDB_READ_TOKEN") {
            if !token.is_empty() {
                config.catalog.read_token = token;
            }
        }
        if let Ok(key) = env::var("TMDB_KEY") {
            if !key.is_empty() {
                config.catalog.api_key = key;
            }
        }
        if let Ok(url) = env::var("TMDB_BASE_URL") {
            if !url.is_empty() {
                config.catalog.base_url = url;
            }
        }

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

//! Cached catalog operations used by the chat orchestrator.
//!
//! Every operation consults the shared [`Cache`] first and stores what it
//! fetched, keyed by the operation tag plus its parameters.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cinebot_catalog::{CatalogClient, CatalogMovie, DiscoverSort, GenreRef, SearchQuery};
use cinebot_config::AppConfig;
use cinebot_memory::{Cache, Filters, SortBy, cache_key};

/// Weight of the catalog rating in the personalized score.
const RATING_WEIGHT: f64 = 0.7;
/// Flat bonus when any genre matches a profile tag.
const TAG_MATCH_BONUS: f64 = 3.0;

/// Caller-supplied taste profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Catalog ids of liked movies.
    #[serde(default)]
    pub likes: Vec<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl UserProfile {
    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// Parameters of a filtered search; also the cache key material.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(flatten)]
    pub filters: Filters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// A personalized candidate with the profile tags its genres matched.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub movie: CatalogMovie,
    pub score: f64,
    pub matched_tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub search_ttl: Duration,
    pub detail_ttl: Duration,
    pub similar_ttl: Duration,
    pub direct_search_ttl: Duration,
    pub female_scan_limit: usize,
    pub rating_sort_min_votes: u32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ToolSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            search_ttl: Duration::from_secs(config.cache.search_ttl_secs),
            detail_ttl: Duration::from_secs(config.cache.detail_ttl_secs),
            similar_ttl: Duration::from_secs(config.cache.similar_ttl_secs),
            direct_search_ttl: Duration::from_secs(config.cache.direct_search_ttl_secs),
            female_scan_limit: config.catalog.female_scan_limit,
            rating_sort_min_votes: config.catalog.rating_sort_min_votes,
        }
    }
}

#[derive(Clone)]
pub struct MovieTools {
    catalog: Arc<dyn CatalogClient>,
    cache: Arc<dyn Cache>,
    settings: ToolSettings,
}

impl MovieTools {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        cache: Arc<dyn Cache>,
        settings: ToolSettings,
    ) -> Self {
        Self {
            catalog,
            cache,
            settings,
        }
    }

    /// Keyword search (or discovery when `args.query` is absent) with the
    /// session filters applied: year and genre server-side, female cast as
    /// a detail-backed post-filter, then local ordering and the limit.
    pub async fn search_movies(&self, args: &SearchArgs) -> Result<Vec<CatalogMovie>> {
        let key = cache_key("search", args)?;
        if let Some(hit) = self.cached::<Vec<CatalogMovie>>(&key) {
            return Ok(hit);
        }

        let mut query = SearchQuery {
            query: args.query.clone(),
            year: args.filters.year,
            genre: args.filters.genre.as_deref().map(GenreRef::parse),
            ..Default::default()
        };
        if query.keyword().is_none() {
            match args.filters.sort_by {
                Some(SortBy::Imdb) => {
                    query.sort = Some(DiscoverSort::VoteAverageDesc);
                    query.min_votes = Some(self.settings.rating_sort_min_votes);
                }
                Some(SortBy::Popularity) => query.sort = Some(DiscoverSort::PopularityDesc),
                None => {}
            }
        }

        let mut items = self.catalog.search(&query).await?;
        if args.filters.wants_female_cast() {
            items = self.filter_by_female_cast(items).await?;
        }
        sort_by_score(&mut items, args.filters.sort_by.unwrap_or_default());
        if let Some(limit) = args.limit {
            items.truncate(limit);
        }

        self.remember(&key, &items, self.settings.search_ttl);
        Ok(items)
    }

    pub async fn movie_detail(&self, id: u64) -> Result<CatalogMovie> {
        let key = format!("detail:{id}");
        if let Some(hit) = self.cached::<CatalogMovie>(&key) {
            return Ok(hit);
        }
        let movie = self.catalog.detail(id).await?;
        self.remember(&key, &movie, self.settings.detail_ttl);
        Ok(movie)
    }

    /// Movies similar to `id`.  The full list is cached; `limit` only trims
    /// the returned slice.
    pub async fn similar_movies(&self, id: u64, limit: usize) -> Result<Vec<CatalogMovie>> {
        let key = format!("similar:{id}");
        let mut list = match self.cached::<Vec<CatalogMovie>>(&key) {
            Some(hit) => hit,
            None => {
                let list = self.catalog.similar(id).await?;
                self.remember(&key, &list, self.settings.similar_ttl);
                list
            }
        };
        list.truncate(limit);
        Ok(list)
    }

    /// Build a candidate pool from titles similar to each liked movie and
    /// rank it against the profile tags.
    ///
    /// Lookups run concurrently.  Pool order follows `profile.likes` and the
    /// catalog order within each list; a movie reached from two likes keeps
    /// its first entry.  Ties in score keep pool order.
    pub async fn recommend_for_user(
        &self,
        profile: &UserProfile,
        limit: usize,
        per_like: usize,
    ) -> Result<Vec<Recommendation>> {
        let lookups = profile
            .likes
            .iter()
            .map(|id| self.similar_movies(*id, per_like));
        let lists = try_join_all(lookups).await?;

        let mut seen = HashSet::new();
        let pool: Vec<CatalogMovie> = lists
            .into_iter()
            .flatten()
            .filter(|m| seen.insert(m.id))
            .collect();
        debug!(likes = profile.likes.len(), pool = pool.len(), "personalized candidate pool");

        let tags: Vec<(String, String)> = profile
            .tags
            .iter()
            .map(|t| (t.clone(), t.to_lowercase()))
            .collect();

        let mut scored: Vec<Recommendation> = pool
            .into_iter()
            .map(|movie| {
                let genres: HashSet<String> =
                    movie.genres.iter().map(|g| g.to_lowercase()).collect();
                let matched_tags: Vec<String> = tags
                    .iter()
                    .filter(|(_, lower)| genres.contains(lower))
                    .map(|(original, _)| original.clone())
                    .collect();
                let bonus = if matched_tags.is_empty() { 0.0 } else { TAG_MATCH_BONUS };
                Recommendation {
                    score: movie.rating * RATING_WEIGHT + bonus,
                    movie,
                    matched_tags,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }

    /// Keep movies whose cast includes at least one woman.  Only the first
    /// `female_scan_limit` results are inspected, via their detail records.
    pub async fn filter_by_female_cast(
        &self,
        items: Vec<CatalogMovie>,
    ) -> Result<Vec<CatalogMovie>> {
        let details = try_join_all(
            items
                .iter()
                .take(self.settings.female_scan_limit)
                .map(|m| self.movie_detail(m.id)),
        )
        .await?;
        Ok(details.into_iter().filter(|m| m.has_female_cast()).collect())
    }

    // ── Direct surface (no filters, passthrough caching) ─────────────────────

    pub async fn direct_search(&self, query: &SearchQuery) -> Result<Vec<CatalogMovie>> {
        let key = cache_key("search-api", query)?;
        if let Some(hit) = self.cached::<Vec<CatalogMovie>>(&key) {
            return Ok(hit);
        }
        let list = self.catalog.search(query).await?;
        self.remember(&key, &list, self.settings.direct_search_ttl);
        Ok(list)
    }

    pub async fn direct_detail(&self, id: u64) -> Result<CatalogMovie> {
        let key = format!("detail-api:{id}");
        if let Some(hit) = self.cached::<CatalogMovie>(&key) {
            return Ok(hit);
        }
        let movie = self.catalog.detail(id).await?;
        self.remember(&key, &movie, self.settings.detail_ttl);
        Ok(movie)
    }

    pub async fn direct_similar(&self, id: u64) -> Result<Vec<CatalogMovie>> {
        let key = format!("similar-api:{id}");
        if let Some(hit) = self.cached::<Vec<CatalogMovie>>(&key) {
            return Ok(hit);
        }
        let list = self.catalog.similar(id).await?;
        self.remember(&key, &list, self.settings.similar_ttl);
        Ok(list)
    }

    // ── Cache helpers ────────────────────────────────────────────────────────

    fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.cache.get(key)?;
        match serde_json::from_value(value) {
            Ok(hit) => {
                debug!(key, "cache hit");
                Some(hit)
            }
            Err(err) => {
                warn!(key, %err, "discarding undecodable cache entry");
                None
            }
        }
    }

    fn remember<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_value(value) {
            Ok(json) => self.cache.set(key, json, ttl),
            Err(err) => warn!(key, %err, "failed to cache catalog result"),
        }
    }
}

/// Order movies in place, highest first.  The sort is stable.
pub fn sort_by_score(items: &mut [CatalogMovie], by: SortBy) {
    match by {
        SortBy::Popularity => items.sort_by(|a, b| b.popularity.total_cmp(&a.popularity)),
        SortBy::Imdb => items.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
    }
}

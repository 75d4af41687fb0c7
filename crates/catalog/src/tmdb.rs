//! TMDB v3 REST backend.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use cinebot_config::CatalogConfig;

use crate::model::{RawMovie, RawPage};
use crate::{CatalogClient, CatalogError, CatalogMovie, RetryPolicy, SearchQuery};

#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: Url,
    image_base_url: String,
    read_token: Option<String>,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl TmdbClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .user_agent("cinebot/0.1")
            .build()
            .map_err(CatalogError::Transport)?;
        let non_empty = |s: &str| {
            let s = s.trim();
            if s.is_empty() { None } else { Some(s.to_string()) }
        };
        Ok(Self {
            http,
            base_url: Url::parse(config.base_url.trim_end_matches('/'))?,
            image_base_url: config.image_base_url.clone(),
            read_token: non_empty(&config.read_token),
            api_key: non_empty(&config.api_key),
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Build `{base}/{segments…}` and attach the v3 key when no bearer token
    /// is configured.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if self.read_token.is_none() {
            if let Some(key) = &self.api_key {
                url.query_pairs_mut().append_pair("api_key", key);
            }
        }
        Ok(url)
    }

    pub(crate) fn search_url(&self, query: &SearchQuery) -> Result<Url, CatalogError> {
        if let Some(keyword) = query.keyword() {
            let mut url = self.endpoint(&["search", "movie"])?;
            {
                let mut pairs = url.query_pairs_mut();
                pairs.append_pair("query", keyword);
                pairs.append_pair("include_adult", "false");
                if let Some(year) = query.year {
                    pairs.append_pair("year", &year.to_string());
                }
                if let Some(page) = query.page {
                    pairs.append_pair("page", &page.to_string());
                }
            }
            return Ok(url);
        }

        let mut url = self.endpoint(&["discover", "movie"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("include_adult", "false");
            if let Some(year) = query.year {
                pairs.append_pair("year", &year.to_string());
            }
            if let Some(genre) = query.genre.as_ref().and_then(|g| g.resolve()) {
                pairs.append_pair("with_genres", &genre.to_string());
            }
            if let Some(page) = query.page {
                pairs.append_pair("page", &page.to_string());
            }
            if let Some(sort) = query.sort {
                pairs.append_pair("sort_by", sort.as_param());
            }
            if let Some(min_votes) = query.min_votes.filter(|v| *v > 0) {
                pairs.append_pair("vote_count.gte", &min_votes.to_string());
            }
        }
        Ok(url)
    }

    pub(crate) fn detail_url(&self, id: u64) -> Result<Url, CatalogError> {
        let mut url = self.endpoint(&["movie", &id.to_string()])?;
        url.query_pairs_mut()
            .append_pair("append_to_response", "credits,external_ids");
        Ok(url)
    }

    pub(crate) fn similar_url(&self, id: u64) -> Result<Url, CatalogError> {
        self.endpoint(&["movie", &id.to_string(), "similar"])
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        debug!(path = url.path(), "catalog request");
        self.retry.run(|| self.get_once(url.clone())).await
    }

    async fn get_once<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let path = url.path().to_string();
        let mut request = self.http.get(url).header(ACCEPT, "application/json");
        if let Some(token) = &self.read_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(CatalogError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                path,
                body,
            });
        }

        response.json::<T>().await.map_err(|err| {
            if err.is_decode() {
                CatalogError::Decode(err.to_string())
            } else {
                CatalogError::Transport(err)
            }
        })
    }

    fn normalize_page(&self, page: RawPage) -> Vec<CatalogMovie> {
        page.results
            .into_iter()
            .map(|raw| raw.normalize(&self.image_base_url))
            .collect()
    }
}

#[async_trait]
impl CatalogClient for TmdbClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CatalogMovie>, CatalogError> {
        let url = self.search_url(query)?;
        let page: RawPage = self.fetch_json(url).await?;
        let mut movies = self.normalize_page(page);

        // The keyword endpoint has no genre parameter, so the genre filter is
        // applied to its results here.
        if query.keyword().is_some() {
            if let Some(genre) = query.genre.as_ref().and_then(|g| g.resolve()) {
                movies.retain(|m| m.has_genre(genre));
            }
        }
        Ok(movies)
    }

    async fn detail(&self, id: u64) -> Result<CatalogMovie, CatalogError> {
        let url = self.detail_url(id)?;
        let raw: RawMovie = self.fetch_json(url).await?;
        Ok(raw.normalize(&self.image_base_url))
    }

    async fn similar(&self, id: u64) -> Result<Vec<CatalogMovie>, CatalogError> {
        let url = self.similar_url(id)?;
        let page: RawPage = self.fetch_json(url).await?;
        Ok(self.normalize_page(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiscoverSort, GenreRef};

    fn client(read_token: &str, api_key: &str) -> TmdbClient {
        TmdbClient::new(&CatalogConfig {
            read_token: read_token.to_string(),
            api_key: api_key.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn param(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn keyword_search_uses_search_endpoint() {
        let c = client("token", "");
        let url = c
            .search_url(&SearchQuery {
                query: Some("星际 穿越".into()),
                year: Some(2014),
                genre: Some(GenreRef::parse("Drama")),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(url.path(), "/3/search/movie");
        assert_eq!(param(&url, "query").as_deref(), Some("星际 穿越"));
        assert_eq!(param(&url, "year").as_deref(), Some("2014"));
        assert_eq!(param(&url, "with_genres"), None);
        assert_eq!(param(&url, "api_key"), None);
    }

    #[test]
    fn discovery_carries_filters_and_sort() {
        let c = client("token", "");
        let url = c
            .search_url(&SearchQuery {
                year: Some(1999),
                genre: Some(GenreRef::parse("sci-fi")),
                sort: Some(DiscoverSort::VoteAverageDesc),
                min_votes: Some(200),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(url.path(), "/3/discover/movie");
        assert_eq!(param(&url, "with_genres").as_deref(), Some("878"));
        assert_eq!(param(&url, "sort_by").as_deref(), Some("vote_average.desc"));
        assert_eq!(param(&url, "vote_count.gte").as_deref(), Some("200"));
    }

    #[test]
    fn unknown_genre_means_no_genre_filter() {
        let c = client("token", "");
        let url = c
            .search_url(&SearchQuery {
                genre: Some(GenreRef::parse("mumblecore")),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(param(&url, "with_genres"), None);
    }

    #[test]
    fn api_key_used_only_without_bearer_token() {
        let keyed = client("", "v3key");
        let url = keyed.similar_url(42).unwrap();
        assert_eq!(url.path(), "/3/movie/42/similar");
        assert_eq!(param(&url, "api_key").as_deref(), Some("v3key"));

        let bearer = client("token", "v3key");
        assert_eq!(param(&bearer.similar_url(42).unwrap(), "api_key"), None);
    }

    #[test]
    fn detail_appends_credits() {
        let c = client("token", "");
        let url = c.detail_url(7).unwrap();
        assert_eq!(url.path(), "/3/movie/7");
        assert_eq!(
            param(&url, "append_to_response").as_deref(),
            Some("credits,external_ids")
        );
    }
}

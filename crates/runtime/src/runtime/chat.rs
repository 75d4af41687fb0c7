//! One chat turn: parse, merge, retrieve, compose.

use anyhow::{Context, Result};
use tracing::{debug, error, info, instrument, warn};

use cinebot_memory::Filters;
use cinebot_tools::{SearchArgs, UserProfile};

use crate::compose::{self, Candidate, SummaryKind};
use crate::directives::ParsedDirectives;
use crate::filters::merge_into_session;
use crate::request::{ChatRequest, ChatResponse, RequestError};
use crate::strategy::Strategy;

use super::AgentRuntime;

impl AgentRuntime {
    /// Validate, then run the turn.  Only malformed requests are errors;
    /// everything past validation yields a response.
    pub async fn handle(&self, request: &ChatRequest) -> Result<ChatResponse, RequestError> {
        request.validate()?;
        Ok(self.chat(request).await)
    }

    /// Run one turn.  Any failure along the way is logged and replaced by the
    /// degraded response.
    #[instrument(skip(self, request), fields(session_id = %request.session_id, message_len = request.message.len()))]
    pub async fn chat(&self, request: &ChatRequest) -> ChatResponse {
        match self.run_turn(request).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = ?err, "chat turn failed; returning degraded response");
                compose::degraded()
            }
        }
    }

    async fn run_turn(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let raw = request.message.trim();
        let directives = ParsedDirectives::parse(raw);
        let inferred = self.intent.extract(&directives.rest);
        let filters = merge_into_session(
            self.store.as_ref(),
            &request.session_id,
            &directives,
            &inferred,
        )
        .await
        .context("session store")?;

        let profile = request.profile.as_ref();
        let strategy = self.selector.select(raw, &directives.rest, profile.is_some());
        info!(%strategy, filters = ?filters, "retrieval strategy selected");

        let candidates = self.retrieve(&strategy, &filters, profile).await?;
        let summary = SummaryKind::for_turn(profile.is_some(), strategy == Strategy::Similar);
        Ok(compose::compose(
            candidates,
            &filters,
            profile,
            summary,
            self.config.agent.result_limit,
        ))
    }

    async fn retrieve(
        &self,
        strategy: &Strategy,
        filters: &Filters,
        profile: Option<&UserProfile>,
    ) -> Result<Vec<Candidate>> {
        let agent = &self.config.agent;
        match strategy {
            Strategy::Personalized => {
                let profile = profile.context("personalized path without a profile")?;
                let recs = self
                    .tools
                    .recommend_for_user(profile, agent.personalized_limit, agent.similar_per_like)
                    .await?;
                Ok(recs.into_iter().map(Candidate::from).collect())
            }
            Strategy::Similar => {
                warn!(
                    reference_id = agent.reference_movie_id,
                    "no similarity target resolved from the message; using the reference title"
                );
                let list = self
                    .tools
                    .similar_movies(agent.reference_movie_id, agent.similar_limit)
                    .await?;
                Ok(list.into_iter().map(Candidate::from).collect())
            }
            Strategy::Search { query } => {
                let found = self.search(Some(query.clone()), filters).await?;
                if !found.is_empty() {
                    return Ok(found);
                }
                debug!(query, "keyword search empty; falling back to discovery");
                self.search(None, filters).await
            }
            Strategy::Discover => self.search(None, filters).await,
        }
    }

    async fn search(&self, query: Option<String>, filters: &Filters) -> Result<Vec<Candidate>> {
        let args = SearchArgs {
            query,
            filters: filters.clone(),
            limit: Some(self.config.agent.search_limit),
        };
        let list = self.tools.search_movies(&args).await?;
        Ok(list.into_iter().map(Candidate::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use cinebot_catalog::{CastMember, CatalogClient, CatalogError, CatalogMovie, SearchQuery};
    use cinebot_config::AppConfig;
    use cinebot_memory::{InMemorySessionStore, SessionStore, SortBy};
    use cinebot_tools::UserProfile;

    use crate::compose::{
        REASON_FEMALE_LEAD, SUMMARY_DEGRADED, SUMMARY_PERSONALIZED, SUMMARY_SEARCH,
        SUMMARY_SIMILAR,
    };
    use crate::{AgentRuntime, ChatRequest, RequestError};

    fn movie(id: u64, rating: f64, popularity: f64, genres: &[&str]) -> CatalogMovie {
        CatalogMovie {
            id,
            title: format!("movie-{id}"),
            year: None,
            poster: None,
            overview: None,
            popularity,
            rating,
            genre_ids: Vec::new(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            cast: Vec::new(),
        }
    }

    /// Scripted catalog that records every call it receives.
    #[derive(Default)]
    struct FakeCatalog {
        keyword_results: Vec<CatalogMovie>,
        discover_results: Vec<CatalogMovie>,
        similar: HashMap<u64, Vec<CatalogMovie>>,
        female_ids: HashSet<u64>,
        fail: bool,
        searches: Mutex<Vec<SearchQuery>>,
        similar_calls: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl CatalogClient for FakeCatalog {
        async fn search(&self, query: &SearchQuery) -> Result<Vec<CatalogMovie>, CatalogError> {
            self.searches.lock().unwrap().push(query.clone());
            if self.fail {
                return Err(CatalogError::Status {
                    status: 503,
                    path: "/3/search/movie".into(),
                    body: String::new(),
                });
            }
            Ok(if query.keyword().is_some() {
                self.keyword_results.clone()
            } else {
                self.discover_results.clone()
            })
        }

        async fn detail(&self, id: u64) -> Result<CatalogMovie, CatalogError> {
            let mut m = movie(id, 5.0, 1.0, &[]);
            let gender = if self.female_ids.contains(&id) { 1 } else { 2 };
            m.cast = vec![CastMember {
                id: 1,
                name: "lead".into(),
                gender,
            }];
            Ok(m)
        }

        async fn similar(&self, id: u64) -> Result<Vec<CatalogMovie>, CatalogError> {
            self.similar_calls.lock().unwrap().push(id);
            Ok(self.similar.get(&id).cloned().unwrap_or_default())
        }
    }

    fn runtime(catalog: FakeCatalog) -> (AgentRuntime, Arc<FakeCatalog>, Arc<InMemorySessionStore>) {
        let catalog = Arc::new(catalog);
        let store = Arc::new(InMemorySessionStore::new());
        let rt = AgentRuntime::new(AppConfig::default(), store.clone(), catalog.clone()).unwrap();
        (rt, catalog, store)
    }

    fn ids(resp: &crate::ChatResponse) -> Vec<u64> {
        resp.movies.iter().map(|m| m.id).collect()
    }

    #[tokio::test]
    async fn year_directive_persists_into_later_turns() {
        let (rt, catalog, store) = runtime(FakeCatalog::default());
        rt.chat(&ChatRequest::new("s1", "推荐 year=1999")).await;
        rt.chat(&ChatRequest::new("s1", "推荐 科幻")).await;

        let searches = catalog.searches.lock().unwrap();
        let last = searches.last().unwrap();
        assert_eq!(last.year, Some(1999));
        assert!(last.genre.is_some());
        assert_eq!(store.get("s1").await.unwrap().unwrap().year, Some(1999));
    }

    #[tokio::test]
    async fn directive_overrides_natural_language_year() {
        let (rt, catalog, _) = runtime(FakeCatalog::default());
        rt.chat(&ChatRequest::new("s", "2010 的电影 year=2020")).await;
        assert_eq!(catalog.searches.lock().unwrap()[0].year, Some(2020));
    }

    #[tokio::test]
    async fn directive_before_sentence_punctuation_still_wins() {
        let (rt, catalog, store) = runtime(FakeCatalog::default());
        rt.chat(&ChatRequest::new("s", "推荐2019年的电影 year=2020。")).await;
        assert_eq!(catalog.searches.lock().unwrap()[0].year, Some(2020));
        assert_eq!(store.get("s").await.unwrap().unwrap().year, Some(2020));

        rt.chat(&ChatRequest::new("t", "想看 female=true.")).await;
        assert_eq!(store.get("t").await.unwrap().unwrap().cast_female, Some(true));
    }

    #[tokio::test]
    async fn sessions_do_not_share_filters() {
        let (rt, catalog, _) = runtime(FakeCatalog::default());
        rt.chat(&ChatRequest::new("a", "year=1999")).await;
        rt.chat(&ChatRequest::new("b", "推荐")).await;
        assert_eq!(catalog.searches.lock().unwrap()[1].year, None);
    }

    #[tokio::test]
    async fn empty_keyword_search_falls_back_to_exactly_one_discovery() {
        let (rt, catalog, _) = runtime(FakeCatalog {
            discover_results: vec![movie(1, 7.0, 1.0, &[])],
            ..Default::default()
        });
        let resp = rt
            .chat(&ChatRequest::new("s", "obscure title year=2001 genre=Drama"))
            .await;
        assert_eq!(ids(&resp), vec![1]);
        assert_eq!(resp.summary, SUMMARY_SEARCH);

        let searches = catalog.searches.lock().unwrap();
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[0].query.as_deref(), Some("obscure title"));
        assert_eq!(searches[1].query, None);
        assert_eq!(searches[0].year, searches[1].year);
        assert_eq!(searches[0].genre, searches[1].genre);
    }

    #[tokio::test]
    async fn keyword_hits_skip_discovery_and_are_capped() {
        let (rt, catalog, _) = runtime(FakeCatalog {
            keyword_results: (1..=10).map(|i| movie(i, i as f64, 0.0, &[])).collect(),
            ..Default::default()
        });
        let resp = rt.chat(&ChatRequest::new("s", "星际穿越")).await;
        assert_eq!(ids(&resp), vec![10, 9, 8, 7]);
        assert_eq!(catalog.searches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn popularity_sort_orders_results() {
        let (rt, _, _) = runtime(FakeCatalog {
            discover_results: vec![
                movie(1, 9.0, 5.0, &[]),
                movie(2, 3.0, 50.0, &[]),
                movie(3, 6.0, 20.0, &[]),
            ],
            ..Default::default()
        });
        let resp = rt.chat(&ChatRequest::new("s", "sortBy=popularity")).await;
        assert_eq!(ids(&resp), vec![2, 3, 1]);
        assert!(resp.movies[0].why_for_user.ends_with("popularity"));
    }

    #[tokio::test]
    async fn personalization_requires_trigger_and_profile() {
        let mut similar = HashMap::new();
        similar.insert(1, vec![movie(11, 8.0, 0.0, &["Drama"])]);
        let (rt, catalog, _) = runtime(FakeCatalog {
            similar,
            ..Default::default()
        });
        let profile = UserProfile {
            likes: vec![1],
            tags: vec!["drama".into()],
        };

        let without_trigger = rt
            .chat(&ChatRequest::new("s", "星际穿越").with_profile(profile.clone()))
            .await;
        assert!(catalog.similar_calls.lock().unwrap().is_empty());
        assert_eq!(without_trigger.summary, SUMMARY_PERSONALIZED);

        let before = catalog.searches.lock().unwrap().len();
        rt.chat(&ChatRequest::new("s", "周末片单")).await;
        assert!(catalog.similar_calls.lock().unwrap().is_empty());
        {
            let searches = catalog.searches.lock().unwrap();
            let issued = &searches[before..];
            // The discovery fallback is already cached from the first turn.
            assert_eq!(issued.len(), 1);
            assert_eq!(issued[0].keyword(), Some("周末片单"));
        }

        let resp = rt
            .chat(&ChatRequest::new("s", "周末片单").with_profile(profile))
            .await;
        assert_eq!(*catalog.similar_calls.lock().unwrap(), vec![1]);
        assert_eq!(ids(&resp), vec![11]);
        assert_eq!(resp.movies[0].why_for_user, "Matched tags: drama");
        assert_eq!(resp.summary, SUMMARY_PERSONALIZED);
    }

    #[tokio::test]
    async fn personalized_pool_dedupes_across_likes() {
        let mut similar = HashMap::new();
        similar.insert(1, vec![movie(50, 7.0, 0.0, &[]), movie(51, 6.0, 0.0, &[])]);
        similar.insert(2, vec![movie(50, 7.0, 0.0, &[]), movie(52, 5.0, 0.0, &[])]);
        let (rt, _, _) = runtime(FakeCatalog {
            similar,
            ..Default::default()
        });
        let profile = UserProfile {
            likes: vec![1, 2],
            tags: Vec::new(),
        };
        let resp = rt
            .chat(&ChatRequest::new("s", "个性化推荐").with_profile(profile))
            .await;
        assert_eq!(ids(&resp), vec![50, 51, 52]);
    }

    #[tokio::test]
    async fn similarity_path_uses_reference_title() {
        let mut similar = HashMap::new();
        similar.insert(329_865, (1..=10).map(|i| movie(i, 5.0, 0.0, &[])).collect());
        let (rt, catalog, _) = runtime(FakeCatalog {
            similar,
            ..Default::default()
        });
        let resp = rt.chat(&ChatRequest::new("s", "有类似降临的吗")).await;
        assert_eq!(resp.movies.len(), 4);
        assert_eq!(resp.summary, SUMMARY_SIMILAR);
        assert_eq!(*catalog.similar_calls.lock().unwrap(), vec![329_865]);
        assert!(catalog.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn female_filter_changes_reason_and_results() {
        let (rt, _, store) = runtime(FakeCatalog {
            discover_results: (1..=5).map(|i| movie(i, 5.0, 0.0, &[])).collect(),
            female_ids: [3].into_iter().collect(),
            ..Default::default()
        });
        let resp = rt.chat(&ChatRequest::new("s", "女性主演 的片")).await;
        assert_eq!(ids(&resp), vec![3]);
        assert_eq!(resp.movies[0].reason, REASON_FEMALE_LEAD);

        let stored = store.get("s").await.unwrap().unwrap();
        assert_eq!(stored.cast_female, Some(true));
        assert_eq!(stored.sort_by, None);
        assert_eq!(resp.movies[0].why_for_user, "Matches filters: default rule");
    }

    #[tokio::test]
    async fn rating_terms_set_imdb_sort() {
        let (rt, catalog, store) = runtime(FakeCatalog::default());
        rt.chat(&ChatRequest::new("s", "按评分")).await;
        assert_eq!(store.get("s").await.unwrap().unwrap().sort_by, Some(SortBy::Imdb));

        // keyword search carries no vote floor; the discovery fallback does
        let searches = catalog.searches.lock().unwrap();
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[0].min_votes, None);
        assert_eq!(searches[1].min_votes, Some(200));
    }

    #[tokio::test]
    async fn catalog_failure_degrades_after_saving_filters() {
        let (rt, _, store) = runtime(FakeCatalog {
            fail: true,
            ..Default::default()
        });
        let resp = rt.chat(&ChatRequest::new("s", "星际穿越 year=2014")).await;
        assert_eq!(resp.summary, SUMMARY_DEGRADED);
        assert!(resp.movies.is_empty());
        assert_eq!(store.get("s").await.unwrap().unwrap().year, Some(2014));
    }

    #[tokio::test]
    async fn malformed_requests_are_rejected_before_processing() {
        let (rt, catalog, store) = runtime(FakeCatalog::default());
        let err = rt.handle(&ChatRequest::new("", "hi")).await.unwrap_err();
        assert_eq!(err, RequestError::MissingSession);
        assert!(rt.handle(&ChatRequest::new("s", "")).await.is_err());
        assert!(catalog.searches.lock().unwrap().is_empty());
        assert!(store.is_empty().await);
    }
}

mod client;
mod commands;
pub mod compose;
pub mod directives;
pub mod filters;
pub mod intent;
mod request;
mod runtime;
mod server;
pub mod strategy;

pub use client::DaemonClient;
pub use commands::{ClientCommand, DaemonStatus, ServerEvent};
pub use request::{ChatRequest, ChatResponse, MovieCard, RequestError};
pub use runtime::AgentRuntime;
pub use server::run_daemon;

#[cfg(test)]
mod daemon_tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use cinebot_catalog::{CatalogClient, CatalogError, CatalogMovie, SearchQuery};
    use cinebot_config::AppConfig;
    use cinebot_memory::InMemorySessionStore;

    use super::*;

    struct OneMovieCatalog;

    fn arrival() -> CatalogMovie {
        CatalogMovie {
            id: 329_865,
            title: "Arrival".into(),
            year: Some(2016),
            poster: None,
            overview: None,
            popularity: 40.0,
            rating: 7.6,
            genre_ids: vec![878],
            genres: vec!["Science Fiction".into()],
            cast: Vec::new(),
        }
    }

    #[async_trait]
    impl CatalogClient for OneMovieCatalog {
        async fn search(&self, _query: &SearchQuery) -> Result<Vec<CatalogMovie>, CatalogError> {
            Ok(vec![arrival()])
        }
        async fn detail(&self, _id: u64) -> Result<CatalogMovie, CatalogError> {
            Ok(arrival())
        }
        async fn similar(&self, _id: u64) -> Result<Vec<CatalogMovie>, CatalogError> {
            Ok(vec![arrival()])
        }
    }

    #[tokio::test]
    async fn daemon_serves_chat_tools_and_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("cinebot.sock");
        let runtime = AgentRuntime::new(
            AppConfig::default(),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(OneMovieCatalog),
        )
        .unwrap();
        let server = tokio::spawn(run_daemon(runtime, socket.clone()));

        let client = DaemonClient::new(&socket);
        client.connect_with_backoff(20).await.unwrap();
        client.ping().await.unwrap();

        let response = client
            .chat(ChatRequest::new("s1", "arrival year=2016"))
            .await
            .unwrap();
        assert_eq!(response.movies.len(), 1);
        assert_eq!(response.movies[0].id, 329_865);

        let rejected = client.chat(ChatRequest::new("", "hi")).await;
        assert!(rejected.unwrap_err().to_string().contains("sessionId"));

        let tools = client.list_tools().await.unwrap();
        assert_eq!(tools.len(), 3);
        let (ok, output) = client
            .execute_tool("movie_detail", [("id".to_string(), "329865".to_string())].into())
            .await
            .unwrap();
        assert!(ok);
        assert!(output.contains("Arrival"));

        let status = client.get_status().await.unwrap();
        assert_eq!(status.bot_name, "Cinebot");
        assert_eq!(status.turns_served, 1);

        client.graceful_shutdown().await.unwrap();
        server.await.unwrap().unwrap();
        assert!(!socket.exists());
    }
}

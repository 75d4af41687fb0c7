//! Direct search/detail/similar access to the catalog.
//!
//! These bypass the chat orchestrator: no session filters, no ranking, and
//! results are cached exactly as the catalog returned them.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use cinebot_catalog::{GenreRef, SearchQuery};

use crate::{MovieTools, Tool, ToolOutput, ToolParam, ToolSpec};

fn required_id(args: &HashMap<String, String>) -> Result<u64> {
    let raw = args
        .get("id")
        .ok_or_else(|| anyhow::anyhow!("missing required param: id"))?;
    raw.trim()
        .parse()
        .with_context(|| format!("invalid movie id: {raw}"))
}

fn optional_number<T: std::str::FromStr>(args: &HashMap<String, String>, key: &str) -> Option<T> {
    args.get(key).and_then(|v| v.trim().parse().ok())
}

fn json_output<T: Serialize>(value: &T) -> Result<ToolOutput> {
    Ok(ToolOutput {
        success: true,
        output: serde_json::to_string_pretty(value)?,
    })
}

pub struct SearchCatalogTool {
    pub tools: MovieTools,
}

#[async_trait]
impl Tool for SearchCatalogTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "search_catalog".to_string(),
            description: "Keyword search, or discovery when no keyword is given.".to_string(),
            params: vec![
                ToolParam::optional("q", "Keyword; omit to discover by filters"),
                ToolParam::optional("year", "Release year"),
                ToolParam::optional("genre", "Genre name or numeric id"),
                ToolParam::optional("page", "Result page (default: 1)"),
            ],
        }
    }

    async fn run(&self, args: &HashMap<String, String>) -> Result<ToolOutput> {
        let query = SearchQuery {
            query: args.get("q").cloned(),
            year: optional_number(args, "year"),
            genre: args
                .get("genre")
                .filter(|g| !g.trim().is_empty())
                .map(|g| GenreRef::parse(g)),
            page: optional_number(args, "page"),
            ..Default::default()
        };
        let items = self.tools.direct_search(&query).await?;
        json_output(&items)
    }
}

pub struct MovieDetailTool {
    pub tools: MovieTools,
}

#[async_trait]
impl Tool for MovieDetailTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "movie_detail".to_string(),
            description: "Full record for one movie, including cast.".to_string(),
            params: vec![ToolParam::required("id", "Catalog movie id")],
        }
    }

    async fn run(&self, args: &HashMap<String, String>) -> Result<ToolOutput> {
        let movie = self.tools.direct_detail(required_id(args)?).await?;
        json_output(&movie)
    }
}

pub struct SimilarMoviesTool {
    pub tools: MovieTools,
}

#[async_trait]
impl Tool for SimilarMoviesTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "similar_movies".to_string(),
            description: "Movies the catalog considers similar to the given one.".to_string(),
            params: vec![ToolParam::required("id", "Catalog movie id")],
        }
    }

    async fn run(&self, args: &HashMap<String, String>) -> Result<ToolOutput> {
        let items = self.tools.direct_similar(required_id(args)?).await?;
        json_output(&items)
    }
}

//! Turns ranked candidates into the client-facing response.

use cinebot_catalog::CatalogMovie;
use cinebot_memory::Filters;
use cinebot_tools::{Recommendation, UserProfile};

use crate::request::{ChatResponse, MovieCard};

pub const REASON_FEMALE_LEAD: &str = "Female lead or strong female presence in the cast";
pub const REASON_GENERIC: &str = "Matches the current theme and reputation";

pub const SUMMARY_PERSONALIZED: &str =
    "A personalized list built from your favourites and preferences.";
pub const SUMMARY_SIMILAR: &str =
    "Recommendations based on similar features, ordered by reputation.";
pub const SUMMARY_SEARCH: &str = "Candidates found with your filters, ranked for you.";
pub const SUMMARY_DEGRADED: &str =
    "Sorry, the assistant is having trouble right now. Please try a plain keyword search.";

/// A movie plus the profile tags it matched during personalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub movie: CatalogMovie,
    pub matched_tags: Vec<String>,
}

impl From<CatalogMovie> for Candidate {
    fn from(movie: CatalogMovie) -> Self {
        Self {
            movie,
            matched_tags: Vec::new(),
        }
    }
}

impl From<Recommendation> for Candidate {
    fn from(rec: Recommendation) -> Self {
        Self {
            movie: rec.movie,
            matched_tags: rec.matched_tags,
        }
    }
}

/// Which summary wording applies to a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Personalized,
    Similar,
    Search,
}

impl SummaryKind {
    /// A supplied profile decides the wording even when personalization did
    /// not run.
    pub fn for_turn(has_profile: bool, similar_path: bool) -> Self {
        if has_profile {
            Self::Personalized
        } else if similar_path {
            Self::Similar
        } else {
            Self::Search
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Self::Personalized => SUMMARY_PERSONALIZED,
            Self::Similar => SUMMARY_SIMILAR,
            Self::Search => SUMMARY_SEARCH,
        }
    }
}

pub fn compose(
    candidates: Vec<Candidate>,
    filters: &Filters,
    profile: Option<&UserProfile>,
    summary: SummaryKind,
    limit: usize,
) -> ChatResponse {
    let reason = if filters.wants_female_cast() {
        REASON_FEMALE_LEAD
    } else {
        REASON_GENERIC
    };
    let tagged_profile = profile.is_some_and(UserProfile::has_tags);
    let filter_note = filter_explanation(filters);

    let movies = candidates
        .into_iter()
        .take(limit)
        .map(|c| MovieCard {
            id: c.movie.id,
            reason: reason.to_string(),
            why_for_user: if tagged_profile {
                tag_explanation(&c.matched_tags)
            } else {
                filter_note.clone()
            },
        })
        .collect();

    ChatResponse {
        summary: summary.text().to_string(),
        movies,
    }
}

pub fn degraded() -> ChatResponse {
    ChatResponse {
        summary: SUMMARY_DEGRADED.to_string(),
        movies: Vec::new(),
    }
}

fn tag_explanation(matched: &[String]) -> String {
    if matched.is_empty() {
        "Matched tags: high similarity".to_string()
    } else {
        format!("Matched tags: {}", matched.join("/"))
    }
}

fn filter_explanation(filters: &Filters) -> String {
    let labels = filters.labels();
    if labels.is_empty() {
        "Matches filters: default rule".to_string()
    } else {
        format!("Matches filters: {}", labels.join(" / "))
    }
}

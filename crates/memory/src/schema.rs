use std::fmt;

use serde::{Deserialize, Serialize};

/// Result ordering a session can ask for.
///
/// | Variant      | Orders by                         |
/// |--------------|-----------------------------------|
/// | `Imdb`       | Vote average (rating), descending |
/// | `Popularity` | Catalog popularity, descending    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Imdb,
    Popularity,
}

impl SortBy {
    /// Lowercase label used in directives, cache keys and explanations.
    pub fn label(self) -> &'static str {
        match self {
            Self::Imdb => "imdb",
            Self::Popularity => "popularity",
        }
    }

    /// Parse a directive value (case-insensitive).  Unknown values yield
    /// `None` so the caller falls back to the next source of truth.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imdb" => Some(Self::Imdb),
            "popularity" => Some(Self::Popularity),
            _ => None,
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accumulated search constraints for one chat session.
///
/// Every field is optional; `None` means "no preference".  Absent fields are
/// omitted from the serialized form so that two filter sets with the same
/// preferences always encode identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast_female: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.year.is_none()
            && self.genre.is_none()
            && self.cast_female.is_none()
            && self.sort_by.is_none()
    }

    pub fn wants_female_cast(&self) -> bool {
        self.cast_female == Some(true)
    }

    /// Layer `self` over `prior`: each field set here wins, each unset field
    /// keeps the prior value.
    pub fn overlay(self, prior: &Filters) -> Filters {
        Filters {
            year: self.year.or(prior.year),
            genre: self.genre.or_else(|| prior.genre.clone()),
            cast_female: self.cast_female.or(prior.cast_female),
            sort_by: self.sort_by.or(prior.sort_by),
        }
    }

    /// Human-readable labels for the active year / genre / sort values, in
    /// that order.  The cast flag is reported separately by callers.
    pub fn labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if let Some(year) = self.year {
            labels.push(year.to_string());
        }
        if let Some(genre) = self.genre.as_deref().filter(|g| !g.is_empty()) {
            labels.push(genre.to_string());
        }
        if let Some(sort) = self.sort_by {
            labels.push(sort.label().to_string());
        }
        labels
    }
}

//! Natural-language filter inference.
//!
//! An ordered table of `(pattern, transform)` rules.  Every rule runs against
//! the directive-free text; for each filter field the first rule that yields
//! a value wins.

use anyhow::{Context, Result};
use regex::Regex;

use cinebot_config::IntentConfig;
use cinebot_memory::{Filters, SortBy};

/// Canonical genre emitted when a science-fiction term is found.
pub const SCI_FI_GENRE: &str = "Sci-Fi";

/// A filter value produced by one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inferred {
    Year(i32),
    Genre(String),
    CastFemale(bool),
    Sort(SortBy),
}

type Transform = fn(&str) -> Option<Inferred>;

struct IntentRule {
    name: &'static str,
    pattern: Regex,
    transform: Transform,
}

pub struct IntentExtractor {
    rules: Vec<IntentRule>,
}

impl std::fmt::Debug for IntentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.name))
            .finish()
    }
}

impl IntentExtractor {
    /// Build the rule table.  The year rule is fixed; the others come from
    /// the configured term lists, which are regex fragments matched
    /// case-insensitively.  An empty list disables its rule.
    pub fn from_config(config: &IntentConfig) -> Result<Self> {
        let mut rules = vec![IntentRule {
            name: "year",
            pattern: Regex::new(r"(19|20)\d{2}")?,
            transform: |m| m.parse().ok().map(Inferred::Year),
        }];

        let configured: [(&'static str, &[String], Transform); 3] = [
            ("sci_fi", config.sci_fi_terms.as_slice(), |_| {
                Some(Inferred::Genre(SCI_FI_GENRE.to_string()))
            }),
            ("female_lead", config.female_lead_terms.as_slice(), |_| {
                Some(Inferred::CastFemale(true))
            }),
            ("rating_sort", config.rating_sort_terms.as_slice(), |_| {
                Some(Inferred::Sort(SortBy::Imdb))
            }),
        ];
        for (name, terms, transform) in configured {
            if let Some(pattern) = alternation(terms)
                .with_context(|| format!("invalid [intent] terms for rule '{name}'"))?
            {
                rules.push(IntentRule {
                    name,
                    pattern,
                    transform,
                });
            }
        }

        Ok(Self { rules })
    }

    /// Every value the rules produce, in table order.
    pub fn infer(&self, text: &str) -> Vec<Inferred> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let m = rule.pattern.find(text)?;
                (rule.transform)(m.as_str())
            })
            .collect()
    }

    /// Fold [`Self::infer`] into a filter set, first value per field.
    pub fn extract(&self, text: &str) -> Filters {
        let mut filters = Filters::default();
        for value in self.infer(text) {
            match value {
                Inferred::Year(y) => {
                    filters.year.get_or_insert(y);
                }
                Inferred::Genre(g) => {
                    filters.genre.get_or_insert(g);
                }
                Inferred::CastFemale(f) => {
                    filters.cast_female.get_or_insert(f);
                }
                Inferred::Sort(s) => {
                    filters.sort_by.get_or_insert(s);
                }
            }
        }
        filters
    }
}

/// `(?i)(?:a|b|c)` from regex fragments, or `None` when there are none.
pub(crate) fn alternation(terms: &[String]) -> Result<Option<Regex>> {
    let parts: Vec<&str> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if parts.is_empty() {
        return Ok(None);
    }
    let source = format!("(?i)(?:{})", parts.join("|"));
    Ok(Some(Regex::new(&source)?))
}

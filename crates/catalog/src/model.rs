use serde::{Deserialize, Serialize};

use crate::genres::{genre_id, genre_name};

/// TMDB gender code for female cast members.
const GENDER_FEMALE: u8 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    /// TMDB gender code: 0 unknown, 1 female, 2 male, 3 non-binary.
    pub gender: u8,
}

impl CastMember {
    pub fn is_female(&self) -> bool {
        self.gender == GENDER_FEMALE
    }
}

/// Normalized movie record.  List endpoints leave `cast` empty; only
/// [`crate::CatalogClient::detail`] fills it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMovie {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    /// Vote average on a 0–10 scale.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    /// Genre names; ids missing from the genre table are rendered as digits.
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

impl CatalogMovie {
    pub fn has_female_cast(&self) -> bool {
        self.cast.iter().any(CastMember::is_female)
    }

    pub fn has_genre(&self, id: u32) -> bool {
        self.genre_ids.contains(&id)
    }
}

/// Server-side ordering for discovery queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoverSort {
    #[serde(rename = "vote_average.desc")]
    VoteAverageDesc,
    #[serde(rename = "popularity.desc")]
    PopularityDesc,
    #[serde(rename = "release_date.desc")]
    ReleaseDateDesc,
}

impl DiscoverSort {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::VoteAverageDesc => "vote_average.desc",
            Self::PopularityDesc => "popularity.desc",
            Self::ReleaseDateDesc => "release_date.desc",
        }
    }
}

/// Genre filter given either by TMDB id or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenreRef {
    Id(u32),
    Name(String),
}

impl GenreRef {
    /// Digits are read as an id, anything else as a name.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<u32>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(raw.trim().to_string()),
        }
    }

    pub fn resolve(&self) -> Option<u32> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Name(name) => genre_id(name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<GenreRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<DiscoverSort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_votes: Option<u32>,
}

impl SearchQuery {
    /// The trimmed keyword, if there is one.
    pub fn keyword(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

// ── Wire format ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct RawPage {
    #[serde(default)]
    pub results: Vec<RawMovie>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGenre {
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCast {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCredits {
    #[serde(default)]
    pub cast: Vec<RawCast>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMovie {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub genres: Option<Vec<RawGenre>>,
    #[serde(default)]
    pub genre_ids: Option<Vec<u32>>,
    #[serde(default)]
    pub credits: Option<RawCredits>,
}

impl RawMovie {
    pub(crate) fn normalize(self, image_base: &str) -> CatalogMovie {
        let (genre_ids, genres): (Vec<u32>, Vec<String>) = match (self.genres, self.genre_ids) {
            (Some(list), _) => list
                .into_iter()
                .map(|g| {
                    let name = g
                        .name
                        .filter(|n| !n.is_empty())
                        .or_else(|| genre_name(g.id).map(str::to_string))
                        .unwrap_or_else(|| g.id.to_string());
                    (g.id, name)
                })
                .unzip(),
            (None, Some(ids)) => {
                let names = ids
                    .iter()
                    .map(|id| {
                        genre_name(*id)
                            .map(str::to_string)
                            .unwrap_or_else(|| id.to_string())
                    })
                    .collect();
                (ids, names)
            }
            (None, None) => (Vec::new(), Vec::new()),
        };

        let year = self
            .release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse::<i32>().ok());

        let poster = self
            .poster_path
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}{}", image_base.trim_end_matches('/'), p));

        let cast = self
            .credits
            .unwrap_or_default()
            .cast
            .into_iter()
            .map(|c| CastMember {
                id: c.id,
                name: c.name,
                gender: c.gender.unwrap_or(0),
            })
            .collect();

        CatalogMovie {
            id: self.id,
            title: self.title.or(self.name).unwrap_or_default(),
            year,
            poster,
            overview: self.overview.filter(|o| !o.is_empty()),
            popularity: self.popularity.unwrap_or(0.0),
            rating: self.vote_average.unwrap_or(0.0),
            genre_ids,
            genres,
            cast,
        }
    }
}

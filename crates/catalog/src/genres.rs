//! TMDB movie genre table.

/// `(id, canonical name)` pairs as published by `/genre/movie/list`.
pub const GENRES: &[(u32, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

/// Alternate spellings accepted on input.
const ALIASES: &[(&str, u32)] = &[("sci-fi", 878), ("scifi", 878), ("tv", 10770)];

/// Resolve a genre name to its id, ignoring case and surrounding whitespace.
/// Unknown names resolve to `None`, which callers treat as "no genre filter".
pub fn genre_id(name: &str) -> Option<u32> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    GENRES
        .iter()
        .find(|(_, n)| n.to_lowercase() == needle)
        .map(|(id, _)| *id)
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == needle)
                .map(|(_, id)| *id)
        })
}

pub fn genre_name(id: u32) -> Option<&'static str> {
    GENRES.iter().find(|(gid, _)| *gid == id).map(|(_, n)| *n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(genre_id("Drama"), Some(18));
        assert_eq!(genre_id("drama"), Some(18));
        assert_eq!(genre_id(" SCIENCE FICTION "), Some(878));
    }

    #[test]
    fn sci_fi_aliases_map_to_science_fiction() {
        assert_eq!(genre_id("Sci-Fi"), Some(878));
        assert_eq!(genre_id("scifi"), Some(878));
        assert_eq!(genre_name(878), Some("Science Fiction"));
    }

    #[test]
    fn unknown_genres_resolve_to_none() {
        assert_eq!(genre_id("mumblecore"), None);
        assert_eq!(genre_id(""), None);
        assert_eq!(genre_name(1), None);
    }
}

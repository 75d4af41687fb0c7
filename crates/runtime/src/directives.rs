//! `key=value` directives embedded in user text.
//!
//! A directive deterministically sets one filter and beats anything the
//! intent rules infer from the same message.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use cinebot_memory::SortBy;

/// The identifier may not continue an ASCII word, but may follow CJK text
/// directly (`年份year=2020`). The value ends on its last ASCII word
/// character, so trailing punctuation (`year=2020。`) stays in the text.
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_])([A-Za-z_]+)\s*=\s*([^\s，,]*[A-Za-z0-9_])")
        .expect("valid regex")
});

static TRUTHY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(1|true|yes|on)$").expect("valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDirectives {
    /// Lowercased key to raw value; a repeated key keeps its last value.
    pub values: HashMap<String, String>,
    /// Input with every directive removed and whitespace collapsed.
    pub rest: String,
    /// Lowercased key to the index of its last occurrence.
    order: HashMap<String, usize>,
}

impl ParsedDirectives {
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        let mut order = HashMap::new();
        let mut rest = String::with_capacity(text.len());
        let mut cursor = 0;

        for (index, caps) in DIRECTIVE.captures_iter(text).enumerate() {
            let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let name = key.as_str().to_lowercase();
            order.insert(name.clone(), index);
            values.insert(name, value.as_str().to_string());
            rest.push_str(&text[cursor..key.start()]);
            rest.push(' ');
            cursor = value.end();
        }
        rest.push_str(&text[cursor..]);

        Self {
            values,
            rest: rest.split_whitespace().collect::<Vec<_>>().join(" "),
            order,
        }
    }

    /// Value of whichever alias appeared last in the text.
    fn latest(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| Some((self.order.get(*k)?, self.values.get(*k)?)))
            .max_by_key(|(index, _)| **index)
            .map(|(_, value)| value.as_str())
    }

    /// `year=`; values that are not integers are ignored.
    pub fn year(&self) -> Option<i32> {
        self.latest(&["year"]).and_then(|v| v.trim().parse().ok())
    }

    pub fn genre(&self) -> Option<String> {
        self.latest(&["genre"])
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
    }

    pub fn sort_by(&self) -> Option<SortBy> {
        self.latest(&["sortby", "sort_by", "sort"])
            .and_then(SortBy::from_label)
    }

    /// Any present value other than `1|true|yes|on` reads as `false`.
    pub fn cast_female(&self) -> Option<bool> {
        self.latest(&["female", "cast_female", "castfemale"])
            .map(|v| TRUTHY.is_match(v.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_pairs_and_cleans_rest() {
        let parsed = ParsedDirectives::parse("科幻 电影 year=2020 sortBy=IMDB 推荐");
        assert_eq!(parsed.values.get("year").map(String::as_str), Some("2020"));
        assert_eq!(parsed.values.get("sortby").map(String::as_str), Some("IMDB"));
        assert_eq!(parsed.rest, "科幻 电影 推荐");
        assert_eq!(parsed.year(), Some(2020));
        assert_eq!(parsed.sort_by(), Some(SortBy::Imdb));
    }

    #[test]
    fn last_occurrence_wins() {
        let parsed = ParsedDirectives::parse("year=1999 year=2001");
        assert_eq!(parsed.year(), Some(2001));
        assert_eq!(parsed.rest, "");
    }

    #[test]
    fn identifier_may_follow_cjk_but_not_ascii_words() {
        let parsed = ParsedDirectives::parse("年份year=2020");
        assert_eq!(parsed.year(), Some(2020));
        assert_eq!(parsed.rest, "年份");

        let glued = ParsedDirectives::parse("abc9year=2020");
        assert_eq!(glued.year(), None);
        assert_eq!(glued.rest, "abc9year=2020");
    }

    #[test]
    fn value_stops_at_commas_and_whitespace() {
        let parsed = ParsedDirectives::parse("genre = Drama，female=yes,sort=popularity");
        assert_eq!(parsed.genre().as_deref(), Some("Drama"));
        assert_eq!(parsed.cast_female(), Some(true));
        assert_eq!(parsed.sort_by(), Some(SortBy::Popularity));
    }

    #[test]
    fn unrecognised_values_are_ignored_or_false() {
        let parsed = ParsedDirectives::parse("year=soon sortby=stars female=nah");
        assert_eq!(parsed.year(), None);
        assert_eq!(parsed.sort_by(), None);
        assert_eq!(parsed.cast_female(), Some(false));
    }

    #[test]
    fn trailing_punctuation_is_not_part_of_the_value() {
        let parsed = ParsedDirectives::parse("推荐2019年的电影 year=2020。");
        assert_eq!(parsed.year(), Some(2020));
        assert_eq!(parsed.rest, "推荐2019年的电影 。");

        let parsed = ParsedDirectives::parse("I want female=true.");
        assert_eq!(parsed.cast_female(), Some(true));
        assert_eq!(parsed.rest, "I want .");

        let parsed = ParsedDirectives::parse("year=2020年的 genre=Drama!");
        assert_eq!(parsed.year(), Some(2020));
        assert_eq!(parsed.genre().as_deref(), Some("Drama"));
        assert_eq!(parsed.rest, "年的 !");
    }

    #[test]
    fn punctuation_only_value_is_not_a_directive() {
        let parsed = ParsedDirectives::parse("year=。");
        assert!(parsed.values.is_empty());
        assert_eq!(parsed.rest, "year=。");
    }

    #[test]
    fn later_alias_wins_over_earlier_one() {
        let parsed = ParsedDirectives::parse("sort=imdb sortBy=popularity");
        assert_eq!(parsed.sort_by(), Some(SortBy::Popularity));

        let parsed = ParsedDirectives::parse("sortby=popularity sort=imdb");
        assert_eq!(parsed.sort_by(), Some(SortBy::Imdb));

        let parsed = ParsedDirectives::parse("castfemale=yes female=no");
        assert_eq!(parsed.cast_female(), Some(false));
    }

    #[test]
    fn text_without_directives_is_only_collapsed() {
        let parsed = ParsedDirectives::parse("  find   me\tsomething  ");
        assert!(parsed.values.is_empty());
        assert_eq!(parsed.rest, "find me something");
    }
}

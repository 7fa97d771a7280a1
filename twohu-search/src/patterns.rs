//! Query pattern generation for candidate retrieval.
//!
//! A query yields an ordered, de-duplicated list of substring patterns. Order
//! is priority: the raw query first, then its normalized form (when it is not
//! an over-aggressive rewrite), then whitespace segments and script runs.
//! CJK text has no word boundaries, so maximal runs of one script class
//! (Hiragana, Katakana, Han, Latin/digit) stand in for tokens.
//!
//! Fuzzy recall appends character trigrams of each query word, so rows that
//! differ from the query by a typo are still retrieved for fuzzy scoring.

use unicode_normalization::UnicodeNormalization;

use crate::normalize::normalize;

/// Normalized pattern is kept only if it retains this share of the query length.
pub const NORMALIZED_PATTERN_RATIO: f64 = 0.7;
/// Queries longer than this (in chars) also get fragment patterns.
pub const SEGMENT_MIN_QUERY_LEN: usize = 4;
/// Minimum fragment length when the fragment contains CJK.
pub const MIN_CJK_SEGMENT_LEN: usize = 2;
/// Minimum fragment length otherwise.
pub const MIN_LATIN_SEGMENT_LEN: usize = 3;
/// Length in chars of a fuzzy recall gram.
pub const FUZZY_GRAM_LEN: usize = 3;
/// Most fuzzy recall grams added for one query.
pub const MAX_FUZZY_GRAMS: usize = 24;

/// A substring fragment for `LIKE %fragment%` containment matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchPattern(String);

impl SearchPattern {
    pub fn fragment(&self) -> &str {
        &self.0
    }

    /// Render as a SQL `LIKE` operand, escaping wildcards with `\`.
    /// Must be paired with `ESCAPE '\'`.
    pub fn to_like(&self) -> String {
        let mut like = String::with_capacity(self.0.len() + 2);
        like.push('%');
        for c in self.0.chars() {
            if matches!(c, '%' | '_' | '\\') {
                like.push('\\');
            }
            like.push(c);
        }
        like.push('%');
        like
    }
}

/// Unicode script class used for segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Hiragana,
    Katakana,
    Han,
    Latin,
}

impl Script {
    pub fn of(c: char) -> Option<Script> {
        match c {
            '\u{3041}'..='\u{309F}' => Some(Script::Hiragana),
            '\u{30A0}'..='\u{30FF}' => Some(Script::Katakana),
            '\u{4E00}'..='\u{9FFF}' => Some(Script::Han),
            'a'..='z' | '0'..='9' => Some(Script::Latin),
            _ => None,
        }
    }

    pub fn is_cjk(self) -> bool {
        !matches!(self, Script::Latin)
    }
}

/// Whether the text contains any Hiragana, Katakana or Han character.
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| Script::of(c).is_some_and(Script::is_cjk))
}

/// Maximal runs of a single script class, in order of appearance.
/// Characters outside the four classes end a run and are not included.
pub fn script_runs(text: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut current: Option<(Script, usize)> = None;

    for (pos, c) in text.char_indices() {
        let script = Script::of(c);
        match (current, script) {
            (Some((cur, _)), Some(s)) if cur == s => {}
            (Some((_, start)), _) => {
                runs.push(&text[start..pos]);
                current = script.map(|s| (s, pos));
            }
            (None, Some(s)) => current = Some((s, pos)),
            (None, None) => {}
        }
    }
    if let Some((_, start)) = current {
        runs.push(&text[start..]);
    }

    runs
}

/// Pattern generator with tunable guards.
#[derive(Debug, Clone, Copy)]
pub struct PatternGenerator {
    pub normalized_ratio: f64,
    pub segment_min_query_len: usize,
    /// Append trigram fragments for typo-tolerant retrieval.
    pub fuzzy_recall: bool,
}

impl Default for PatternGenerator {
    fn default() -> Self {
        Self {
            normalized_ratio: NORMALIZED_PATTERN_RATIO,
            segment_min_query_len: SEGMENT_MIN_QUERY_LEN,
            fuzzy_recall: false,
        }
    }
}

impl PatternGenerator {
    /// Build the prioritized pattern list. The raw query is always first;
    /// an empty query yields no patterns.
    pub fn build(&self, query: &str) -> Vec<SearchPattern> {
        if query.is_empty() {
            return Vec::new();
        }

        let mut patterns: Vec<String> = vec![query.to_string()];
        let normalized = normalize(query);
        let query_lower = query.to_lowercase();
        let query_len = query.chars().count();

        if normalized != query_lower
            && !normalized.is_empty()
            && normalized.chars().count() as f64 >= query_len as f64 * self.normalized_ratio
        {
            patterns.push(normalized.clone());
        }

        if query_len > self.segment_min_query_len {
            let mut segments: Vec<&str> = Vec::new();
            let candidates = normalized
                .split_whitespace()
                .chain(script_runs(&normalized));
            for segment in candidates {
                if !segments.contains(&segment) {
                    segments.push(segment);
                }
            }

            for segment in segments {
                let min_len = if contains_cjk(segment) {
                    MIN_CJK_SEGMENT_LEN
                } else {
                    MIN_LATIN_SEGMENT_LEN
                };
                if segment.chars().count() >= min_len
                    && segment != normalized
                    && segment != query_lower
                {
                    patterns.push(segment.to_string());
                }
            }
        }

        if self.fuzzy_recall {
            patterns.extend(fuzzy_grams(query));
        }

        let mut unique: Vec<SearchPattern> = Vec::with_capacity(patterns.len());
        for p in patterns {
            let p = SearchPattern(p);
            if !unique.contains(&p) {
                unique.push(p);
            }
        }
        unique
    }
}

/// Distinct overlapping trigrams of each word of the normalized query, in
/// query order and capped at [`MAX_FUZZY_GRAMS`]. Words shorter than a gram
/// contribute nothing. Grams are recomposed (NFC) to match stored titles.
pub fn fuzzy_grams(query: &str) -> Vec<String> {
    let folded: String = normalize(query).nfc().collect();
    let mut grams: Vec<String> = Vec::new();

    for word in folded.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for window in chars.windows(FUZZY_GRAM_LEN) {
            let gram: String = window.iter().collect();
            if !grams.contains(&gram) {
                grams.push(gram);
                if grams.len() == MAX_FUZZY_GRAMS {
                    return grams;
                }
            }
        }
    }
    grams
}

/// Build patterns with the default guards.
pub fn build_patterns(query: &str) -> Vec<SearchPattern> {
    PatternGenerator::default().build(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(query: &str) -> Vec<String> {
        build_patterns(query).iter().map(|p| p.fragment().to_string()).collect()
    }

    #[test]
    fn test_exact_query_always_first() {
        for q in ["霊夢", "Bad Apple!!", "【東方】灵梦的日常", "東方2hu", "a"] {
            assert_eq!(build_patterns(q)[0].fragment(), q);
        }
    }

    #[test]
    fn test_fuzzy_recall_appends_grams() {
        let generator = PatternGenerator {
            fuzzy_recall: true,
            ..Default::default()
        };
        let out: Vec<String> = generator
            .build("Gensokyp")
            .iter()
            .map(|p| p.fragment().to_string())
            .collect();
        assert_eq!(out[0], "Gensokyp");
        // "gen" is shared with the correctly spelled "Gensokyo".
        assert!(out.contains(&"gen".to_string()));
        assert!(out.contains(&"kyp".to_string()));
        assert!(!fragments("Gensokyp").contains(&"gen".to_string()));
    }

    #[test]
    fn test_fuzzy_grams_recomposed_and_capped() {
        assert_eq!(fuzzy_grams("ガイド"), vec!["ガイド"]);
        assert_eq!(fuzzy_grams("ab cd"), Vec::<String>::new());
        let long = "abcdefghijklmnopqrstuvwxyz0123456789";
        assert_eq!(fuzzy_grams(long).len(), MAX_FUZZY_GRAMS);
    }

    #[test]
    fn test_empty_query_has_no_patterns() {
        assert!(build_patterns("").is_empty());
    }

    #[test]
    fn test_short_query_no_segments() {
        assert_eq!(fragments("霊夢"), vec!["霊夢"]);
        assert_eq!(fragments("MMD"), vec!["MMD"]);
    }

    #[test]
    fn test_normalized_pattern_added_when_different() {
        // 10 chars in, 9 chars out: above the 70% guard
        assert_eq!(fragments("Bad Apple～"), vec!["Bad Apple～", "bad apple", "bad", "apple"]);
    }

    #[test]
    fn test_normalized_pattern_skipped_when_same_as_lowercase() {
        let f = fragments("bad apple");
        assert_eq!(f[0], "bad apple");
        assert_eq!(f.iter().filter(|p| p.as_str() == "bad apple").count(), 1);
    }

    #[test]
    fn test_normalized_pattern_ratio_guard() {
        // 10 chars -> "ab" (2 chars) is below 70%
        let f = fragments("【【【ab】】】!!");
        assert!(!f.contains(&"ab!!".to_string()));
        assert_eq!(f[0], "【【【ab】】】!!");
    }

    #[test]
    fn test_script_segmentation_mixed_kanji_latin() {
        assert_eq!(fragments("東方2hu"), vec!["東方2hu", "東方", "2hu"]);
    }

    #[test]
    fn test_segment_min_length() {
        // "ab" is Latin and too short; "東" is a single CJK char
        let f = fragments("東ab魔理沙 xyz");
        assert!(!f.contains(&"ab".to_string()));
        assert!(!f.contains(&"東".to_string()));
        assert!(f.contains(&"魔理沙".to_string()));
        assert!(f.contains(&"xyz".to_string()));
    }

    #[test]
    fn test_kana_runs_split() {
        let f = fragments("ゆっくりレイムしてね");
        assert!(f.contains(&"ゆっくり".to_string()));
        assert!(f.contains(&"レイム".to_string()));
        assert!(f.contains(&"してね".to_string()));
    }

    #[test]
    fn test_no_duplicates() {
        let f = fragments("霊夢 霊夢 霊夢");
        let mut seen = std::collections::HashSet::new();
        for p in &f {
            assert!(seen.insert(p.clone()), "duplicate pattern {}", p);
        }
    }

    #[test]
    fn test_script_runs() {
        assert_eq!(script_runs("東方2hu!です"), vec!["東方", "2hu", "です"]);
        assert_eq!(script_runs("---"), Vec::<&str>::new());
        assert_eq!(script_runs("abc"), vec!["abc"]);
    }

    #[test]
    fn test_to_like_escapes_wildcards() {
        let p = SearchPattern("100%_a\\b".to_string());
        assert_eq!(p.to_like(), "%100\\%\\_a\\\\b%");
        assert_eq!(SearchPattern("霊夢".to_string()).to_like(), "%霊夢%");
    }
}

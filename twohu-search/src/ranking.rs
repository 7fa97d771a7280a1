//! Relevance scoring strategies.
//!
//! Scores are integers where lower is better. The tiered strategy places each
//! candidate in exactly one band, and bands never overlap:
//!
//! 1. `1..=9`   normalized query found in a field's core title (field order)
//! 2. `10..=19` found in a field's full normalized title
//! 3. `20..=29` some query words found in a core title; more words, lower score
//! 4. `50`      weak fallback, nothing matched directly
//!
//! The default filter threshold (40) sits between bands 3 and 4, so weak
//! matches are retrieved but never returned. `UNSCORED` (100) is the upper
//! bound every real score stays below.
//!
//! The weighted fuzzy strategy is the alternate evolution: it compares raw
//! fields (no core extraction) with edit-distance and trigram similarity and
//! maps the best weighted similarity onto the same lower-is-better scale.

use std::collections::HashSet;

use crate::candidate::{prepare_titles, SearchCandidate};
use crate::config::{SearchConfig, StrategyKind};
use crate::normalize::normalize;

/// Lower is better.
pub type RelevanceScore = u32;

/// Query found in the core of field `i`: `CORE_MATCH + i`.
pub const CORE_MATCH: RelevanceScore = 1;
/// Query found in the full title of field `i`: `FULL_TITLE_MATCH + i`.
pub const FULL_TITLE_MATCH: RelevanceScore = 10;
/// Word-overlap band base: `WORD_MATCH + (WORD_MATCH_CAP - min(words, WORD_MATCH_CAP))`.
pub const WORD_MATCH: RelevanceScore = 20;
pub const WORD_MATCH_CAP: RelevanceScore = 10;
/// Nothing matched.
pub const WEAK_MATCH: RelevanceScore = 50;
/// Baseline above every assigned score.
pub const UNSCORED: RelevanceScore = 100;
/// Default filter bound for the tiered strategy.
pub const DEFAULT_THRESHOLD: RelevanceScore = 40;

/// Default minimum weighted similarity kept by the fuzzy strategy.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.3;

/// The normalized effective query, split once per search.
#[derive(Debug, Clone)]
pub struct QueryContext {
    normalized: String,
}

impl QueryContext {
    pub fn new(effective_query: &str) -> Self {
        Self {
            normalized: normalize(effective_query),
        }
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.normalized.split_whitespace()
    }
}

/// Score and the core title it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relevance {
    pub score: RelevanceScore,
    pub core_title: String,
}

/// A relevance scorer. Implementations are pure and hold no per-search state.
pub trait ScoringStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Candidates scoring at or above this bound are filtered out.
    fn threshold(&self) -> RelevanceScore;

    fn score(&self, candidate: &dyn SearchCandidate, query: &QueryContext) -> Relevance;
}

/// Tiered substring-priority scorer (the current strategy).
#[derive(Debug, Clone, Copy)]
pub struct TieredScorer {
    pub threshold: RelevanceScore,
}

impl Default for TieredScorer {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD }
    }
}

impl ScoringStrategy for TieredScorer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Tiered
    }

    fn threshold(&self) -> RelevanceScore {
        self.threshold
    }

    fn score(&self, candidate: &dyn SearchCandidate, query: &QueryContext) -> Relevance {
        let titles = prepare_titles(candidate);
        let core_title = titles
            .iter()
            .map(|t| t.core())
            .find(|c| !c.is_empty())
            .unwrap_or("")
            .to_string();
        let q = query.normalized();

        let score = titles
            .iter()
            .position(|t| t.normalized_core().contains(q))
            .map(|i| band(CORE_MATCH, i, FULL_TITLE_MATCH))
            .or_else(|| {
                titles
                    .iter()
                    .position(|t| t.normalized_full().contains(q))
                    .map(|i| band(FULL_TITLE_MATCH, i, WORD_MATCH))
            })
            .unwrap_or_else(|| {
                let matched = query
                    .words()
                    .filter(|w| titles.iter().any(|t| t.normalized_core().contains(w)))
                    .count() as RelevanceScore;
                if matched > 0 {
                    WORD_MATCH + (WORD_MATCH_CAP - matched.min(WORD_MATCH_CAP))
                } else {
                    WEAK_MATCH
                }
            });

        Relevance { score, core_title }
    }
}

/// `base + index`, kept below the next band.
fn band(base: RelevanceScore, index: usize, next: RelevanceScore) -> RelevanceScore {
    (base + index as RelevanceScore).min(next - 1)
}

/// Weighted-field fuzzy scorer over raw (non-core) fields.
#[derive(Debug, Clone, Copy)]
pub struct WeightedFuzzyScorer {
    /// Minimum weighted similarity in `[0, 1]`.
    pub min_similarity: f64,
}

impl Default for WeightedFuzzyScorer {
    fn default() -> Self {
        Self { min_similarity: DEFAULT_FUZZY_THRESHOLD }
    }
}

impl ScoringStrategy for WeightedFuzzyScorer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WeightedFuzzy
    }

    // Below-threshold candidates are already pushed to UNSCORED.
    fn threshold(&self) -> RelevanceScore {
        UNSCORED
    }

    fn score(&self, candidate: &dyn SearchCandidate, query: &QueryContext) -> Relevance {
        let q = query.normalized();
        let mut best = 0.0_f64;
        let mut best_field = "";

        for (field, weight) in candidate.weighted_fields() {
            let Some(raw) = field else { continue };
            let weighted = field_similarity(q, &normalize(raw)) * weight;
            if weighted > best {
                best = weighted;
                best_field = raw;
            }
        }

        let score = if q.is_empty() || best < self.min_similarity {
            UNSCORED
        } else {
            ((1.0 - best.clamp(0.0, 1.0)) * 100.0).round() as RelevanceScore
        };

        Relevance {
            score,
            core_title: best_field.to_string(),
        }
    }
}

/// Similarity in `[0, 1]` between a normalized query and a normalized field.
///
/// Containment is a full match. Otherwise the best of Damerau-Levenshtein
/// similarity against the whole field and against each token, and character
/// trigram overlap.
pub fn field_similarity(query: &str, field: &str) -> f64 {
    if query.is_empty() || field.is_empty() {
        return 0.0;
    }
    if field.contains(query) {
        return 1.0;
    }

    let mut best = strsim::normalized_damerau_levenshtein(query, field);
    for token in field.split_whitespace() {
        best = best.max(strsim::normalized_damerau_levenshtein(query, token));
    }
    best.max(trigram_similarity(query, field))
}

/// Dice coefficient over character trigrams. Strings shorter than three
/// characters have no trigrams and score 0.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let ta = trigrams(a);
    let tb = trigrams(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.intersection(&tb).count();
    (2 * shared) as f64 / (ta.len() + tb.len()) as f64
}

fn trigrams(s: &str) -> HashSet<[char; 3]> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(3).map(|w| [w[0], w[1], w[2]]).collect()
}

/// Build the strategy selected by configuration.
pub fn strategy_from_config(config: &SearchConfig) -> Box<dyn ScoringStrategy> {
    match config.strategy {
        StrategyKind::Tiered => Box::new(TieredScorer {
            threshold: config.relevance_threshold,
        }),
        StrategyKind::WeightedFuzzy => Box::new(WeightedFuzzyScorer {
            min_similarity: config.fuzzy.threshold,
        }),
    }
}

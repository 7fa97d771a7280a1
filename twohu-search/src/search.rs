//! Query preparation and the ranker/filter.
//!
//! A raw query is reduced to its effective query (the core title, when the
//! core is markedly shorter), expanded into retrieval patterns, and finally
//! used to score, filter, order and truncate the retrieved candidates.

use std::cmp::Ordering;

use crate::candidate::SearchCandidate;
use crate::config::SearchConfig;
use crate::core_title::extract_core;
use crate::patterns::SearchPattern;
use crate::ranking::{QueryContext, RelevanceScore, ScoringStrategy};

/// A query ready for retrieval and scoring.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub original: String,
    pub effective: String,
    pub patterns: Vec<SearchPattern>,
}

impl PreparedQuery {
    pub fn new(query: &str, config: &SearchConfig) -> Self {
        let effective = effective_query(query, config.core_query_ratio);
        let patterns = config.pattern_generator().build(&effective);
        Self {
            original: query.to_string(),
            effective,
            patterns,
        }
    }

    pub fn used_core(&self) -> bool {
        self.effective != self.original
    }
}

/// Select the query used for matching.
///
/// The extracted core replaces the query only when it is non-empty and
/// shorter than `ratio` times the query length, so a query that is already
/// core content is never "simplified".
pub fn effective_query(query: &str, ratio: f64) -> String {
    let core = extract_core(query);
    let core_len = core.chars().count();
    let query_len = query.chars().count();
    if core_len > 0 && (core_len as f64) < query_len as f64 * ratio {
        core
    } else {
        query.to_string()
    }
}

/// Resolve a caller-supplied limit.
///
/// Leading digits are read after optional whitespace and `+`, so `"25abc"`
/// is 25. Missing, non-numeric, negative or zero values fall back to
/// `default`. Larger values, including ones too large to represent, are
/// clamped to `max`.
pub fn resolve_limit(raw: Option<&str>, default: usize, max: usize) -> usize {
    let Some(raw) = raw else {
        return default.min(max);
    };
    let s = raw.trim_start();
    if s.starts_with('-') {
        return default.min(max);
    }
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let digits = &s[..end];
    if digits.is_empty() {
        return default.min(max);
    }

    // All-digit input only fails to parse on overflow.
    match digits.parse::<usize>() {
        Ok(0) => default.min(max),
        Ok(n) => n.min(max),
        Err(_) => max,
    }
}

/// A candidate paired with its internal ranking data.
#[derive(Debug, Clone)]
pub struct ScoredResult<C> {
    pub candidate: C,
    pub score: RelevanceScore,
    pub core_title: String,
}

/// Score, filter, sort and truncate candidates; returns the bare candidates.
pub fn rank<C: SearchCandidate>(
    candidates: Vec<C>,
    effective_query: &str,
    strategy: &dyn ScoringStrategy,
    threshold: RelevanceScore,
    limit: usize,
) -> Vec<C> {
    rank_scored(candidates, effective_query, strategy, threshold, limit)
        .into_iter()
        .map(|r| r.candidate)
        .collect()
}

/// As [`rank`], keeping score and core title for inspection.
pub fn rank_scored<C: SearchCandidate>(
    candidates: Vec<C>,
    effective_query: &str,
    strategy: &dyn ScoringStrategy,
    threshold: RelevanceScore,
    limit: usize,
) -> Vec<ScoredResult<C>> {
    let query = QueryContext::new(effective_query);

    let mut results: Vec<ScoredResult<C>> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let relevance = strategy.score(&candidate, &query);
            (relevance.score < threshold).then(|| ScoredResult {
                candidate,
                score: relevance.score,
                core_title: relevance.core_title,
            })
        })
        .collect();

    results.sort_by(|a, b| compare_ranked(a.score, &a.candidate, b.score, &b.candidate));
    results.truncate(limit);
    results
}

/// Score ascending, then dated before undated with earlier dates first, then id.
/// Ascending dates keep episodic series in broadcast order.
fn compare_ranked<C: SearchCandidate>(a_score: RelevanceScore, a: &C, b_score: RelevanceScore, b: &C) -> Ordering {
    a_score
        .cmp(&b_score)
        .then_with(|| match (a.date(), b.date()) {
            (Some(da), Some(db)) => da.cmp(db),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.id().cmp(&b.id()))
}

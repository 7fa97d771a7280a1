//! Search candidates and their memoized title forms.
//!
//! A candidate exposes its title fields in match-priority order. Scoring needs
//! each field's core title, normalized core, and normalized full title; these
//! are computed on first access and cached for the duration of one search.

use std::sync::OnceLock;

use crate::core_title::extract_core;
use crate::normalize::normalize;

/// A record that can be scored and ranked.
pub trait SearchCandidate {
    fn id(&self) -> i64;

    /// ISO-8601 date used as the first tie-break, if known.
    fn date(&self) -> Option<&str>;

    /// Title fields, most trusted first. Missing fields are `None`.
    fn title_fields(&self) -> Vec<Option<&str>>;

    /// Fields and weights for the weighted fuzzy strategy.
    /// Defaults to every title field at full weight.
    fn weighted_fields(&self) -> Vec<(Option<&str>, f64)> {
        self.title_fields().into_iter().map(|f| (f, 1.0)).collect()
    }
}

/// One title field with lazily derived comparison forms.
#[derive(Debug)]
pub(crate) struct PreparedTitle<'a> {
    raw: &'a str,
    core: OnceLock<String>,
    normalized_core: OnceLock<String>,
    normalized_full: OnceLock<String>,
}

impl<'a> PreparedTitle<'a> {
    pub(crate) fn new(raw: Option<&'a str>) -> Self {
        Self {
            raw: raw.unwrap_or(""),
            core: OnceLock::new(),
            normalized_core: OnceLock::new(),
            normalized_full: OnceLock::new(),
        }
    }

    pub(crate) fn core(&self) -> &str {
        self.core.get_or_init(|| extract_core(self.raw))
    }

    pub(crate) fn normalized_core(&self) -> &str {
        self.normalized_core.get_or_init(|| normalize(self.core()))
    }

    pub(crate) fn normalized_full(&self) -> &str {
        self.normalized_full.get_or_init(|| normalize(self.raw))
    }
}

/// Prepare every title field of a candidate, preserving priority order.
pub(crate) fn prepare_titles(candidate: &dyn SearchCandidate) -> Vec<PreparedTitle<'_>> {
    candidate
        .title_fields()
        .into_iter()
        .map(PreparedTitle::new)
        .collect()
}

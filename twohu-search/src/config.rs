//! Search configuration.
//!
//! Every tunable of the search pipeline lives here with its production
//! default. Configuration is loaded from a JSON file; absent keys keep their
//! defaults and an absent file yields the defaults outright.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::patterns::{PatternGenerator, NORMALIZED_PATTERN_RATIO, SEGMENT_MIN_QUERY_LEN};
use crate::ranking::{RelevanceScore, DEFAULT_FUZZY_THRESHOLD, DEFAULT_THRESHOLD};

/// Use the extracted core as the effective query only below this length ratio.
pub const CORE_QUERY_RATIO: f64 = 0.8;
pub const DEFAULT_LIMIT: usize = 300;
pub const MAX_LIMIT: usize = 1000;
pub const CACHE_TTL_SECS: u64 = 5 * 60;
pub const CACHE_SWEEP_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which relevance scorer is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Tiered substring priority over core and full titles.
    #[default]
    Tiered,
    /// Weighted edit-distance / trigram similarity over raw fields.
    WeightedFuzzy,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Tiered => "tiered",
            StrategyKind::WeightedFuzzy => "weighted_fuzzy",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Minimum weighted similarity in `[0, 1]`.
    pub threshold: f64,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Tiered results scoring at or above this are dropped.
    pub relevance_threshold: RelevanceScore,
    pub core_query_ratio: f64,
    pub normalized_pattern_ratio: f64,
    pub segment_min_query_len: usize,
    pub default_limit: usize,
    pub max_limit: usize,
    pub cache_ttl_secs: u64,
    pub cache_sweep_secs: u64,
    pub strategy: StrategyKind,
    pub fuzzy: FuzzyConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: DEFAULT_THRESHOLD,
            core_query_ratio: CORE_QUERY_RATIO,
            normalized_pattern_ratio: NORMALIZED_PATTERN_RATIO,
            segment_min_query_len: SEGMENT_MIN_QUERY_LEN,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            cache_ttl_secs: CACHE_TTL_SECS,
            cache_sweep_secs: CACHE_SWEEP_SECS,
            strategy: StrategyKind::Tiered,
            fuzzy: FuzzyConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::info!("Loaded search configuration from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, ratio) in [
            ("core_query_ratio", self.core_query_ratio),
            ("normalized_pattern_ratio", self.normalized_pattern_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(ConfigError::Invalid(format!("{} must be in (0, 1], got {}", name, ratio)));
            }
        }
        if !(0.0..=1.0).contains(&self.fuzzy.threshold) {
            return Err(ConfigError::Invalid(format!(
                "fuzzy.threshold must be in [0, 1], got {}",
                self.fuzzy.threshold
            )));
        }
        if self.default_limit == 0 || self.max_limit == 0 {
            return Err(ConfigError::Invalid("limits must be positive".to_string()));
        }
        if self.default_limit > self.max_limit {
            return Err(ConfigError::Invalid(format!(
                "default_limit {} exceeds max_limit {}",
                self.default_limit, self.max_limit
            )));
        }
        if self.cache_sweep_secs == 0 {
            return Err(ConfigError::Invalid("cache_sweep_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn pattern_generator(&self) -> PatternGenerator {
        PatternGenerator {
            normalized_ratio: self.normalized_pattern_ratio,
            segment_min_query_len: self.segment_min_query_len,
            fuzzy_recall: self.strategy == StrategyKind::WeightedFuzzy,
        }
    }
}

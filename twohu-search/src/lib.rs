//! Twohu Search - title normalization and fuzzy ranking for a catalogue of
//! CJK fan-video reposts and their authors.
//!
//! Queries flow through normalization, core-title extraction, and pattern
//! generation before SQLite retrieval; candidates are then scored by a
//! pluggable strategy, filtered, sorted, and truncated.

pub mod cache;
pub(crate) mod candidate;
pub mod config;
pub mod core_title;
pub mod database;
pub mod interface;
pub mod models;
pub mod normalize;
pub mod patterns;
pub mod ranking;
pub mod search;
mod store;

pub use candidate::SearchCandidate;
pub use config::{SearchConfig, StrategyKind};
pub use core_title::extract_core;
pub use interface::*;
pub use normalize::normalize;
pub use patterns::build_patterns;
pub use store::SearchService;

//! Video and author records as stored in the catalogue database.
//!
//! Serialized field names follow the database columns, so ranked results
//! leave the crate with exactly the fields a row carries.

use serde::{Deserialize, Serialize};

use crate::candidate::SearchCandidate;

/// Fuzzy-strategy weight for a video's repost title.
pub const REPOST_NAME_WEIGHT: f64 = 1.0;
/// Fuzzy-strategy weight for a video's original title.
pub const ORIGINAL_NAME_WEIGHT: f64 = 0.9;
/// Fuzzy-strategy weight for a video's free-text comment.
pub const COMMENT_WEIGHT: f64 = 0.4;

/// Translation state of a video, stored as an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum TranslationStatus {
    #[default]
    NotSet,
    ChineseEmbedded,
    CcSubtitles,
    DanmakuTranslation,
    NoTranslationNeeded,
    NotTranslatedYet,
    Unknown(i64),
}

impl From<i64> for TranslationStatus {
    fn from(value: i64) -> Self {
        match value {
            0 => TranslationStatus::NotSet,
            1 => TranslationStatus::ChineseEmbedded,
            2 => TranslationStatus::CcSubtitles,
            3 => TranslationStatus::DanmakuTranslation,
            4 => TranslationStatus::NoTranslationNeeded,
            5 => TranslationStatus::NotTranslatedYet,
            other => TranslationStatus::Unknown(other),
        }
    }
}

impl From<TranslationStatus> for i64 {
    fn from(status: TranslationStatus) -> Self {
        match status {
            TranslationStatus::NotSet => 0,
            TranslationStatus::ChineseEmbedded => 1,
            TranslationStatus::CcSubtitles => 2,
            TranslationStatus::DanmakuTranslation => 3,
            TranslationStatus::NoTranslationNeeded => 4,
            TranslationStatus::NotTranslatedYet => 5,
            TranslationStatus::Unknown(other) => other,
        }
    }
}

/// Per-platform names, links and avatars of an author.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub yt_name: Option<String>,
    pub yt_url: Option<String>,
    pub yt_avatar: Option<String>,
    pub nico_name: Option<String>,
    pub nico_url: Option<String>,
    pub nico_avatar: Option<String>,
    pub twitter_name: Option<String>,
    pub twitter_url: Option<String>,
    pub twitter_avatar: Option<String>,
}

/// A video joined with its author's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: i64,
    pub original_name: Option<String>,
    pub original_url: Option<String>,
    pub original_thumbnail: Option<String>,
    pub date: Option<String>,
    pub repost_name: Option<String>,
    pub repost_url: Option<String>,
    pub repost_thumbnail: Option<String>,
    pub translation_status: TranslationStatus,
    pub comment: Option<String>,
    pub author_id: i64,
    #[serde(flatten)]
    pub author: AuthorProfile,
}

impl SearchCandidate for VideoRecord {
    fn id(&self) -> i64 {
        self.id
    }

    fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    /// Repost titles are curated and usually cleaner, so they are matched first.
    fn title_fields(&self) -> Vec<Option<&str>> {
        vec![self.repost_name.as_deref(), self.original_name.as_deref()]
    }

    fn weighted_fields(&self) -> Vec<(Option<&str>, f64)> {
        vec![
            (self.repost_name.as_deref(), REPOST_NAME_WEIGHT),
            (self.original_name.as_deref(), ORIGINAL_NAME_WEIGHT),
            (self.comment.as_deref(), COMMENT_WEIGHT),
        ]
    }
}

/// An author with aggregate statistics over their videos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub id: i64,
    #[serde(flatten)]
    pub profile: AuthorProfile,
    #[serde(rename = "worksCount")]
    pub works_count: i64,
    #[serde(rename = "lastUpdate")]
    pub last_update: Option<String>,
}

impl SearchCandidate for AuthorRecord {
    fn id(&self) -> i64 {
        self.id
    }

    // Authors are not episodic; equal scores fall through to id order.
    fn date(&self) -> Option<&str> {
        None
    }

    fn title_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.profile.yt_name.as_deref(),
            self.profile.nico_name.as_deref(),
            self.profile.twitter_name.as_deref(),
        ]
    }
}

/// Author row to insert.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewAuthor {
    #[serde(flatten)]
    pub profile: AuthorProfile,
}

/// Video row to insert.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewVideo {
    pub original_name: Option<String>,
    pub original_url: Option<String>,
    pub original_thumbnail: Option<String>,
    pub date: Option<String>,
    pub repost_name: Option<String>,
    pub repost_url: Option<String>,
    pub repost_thumbnail: Option<String>,
    pub translation_status: TranslationStatus,
    pub comment: Option<String>,
}

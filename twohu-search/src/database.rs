//! SQLite catalogue of authors and their videos.
//!
//! Acts as the candidate-retrieval collaborator: given search patterns it
//! returns every row whose title (or platform name) contains any pattern.
//! Uses r2d2 connection pooling so concurrent searches never block each other.

use crate::models::{AuthorProfile, AuthorRecord, NewAuthor, NewVideo, TranslationStatus, VideoRecord};
use crate::patterns::SearchPattern;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, params_from_iter, Row};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

const AUTHOR_COLUMNS: &str = "a.yt_name, a.yt_url, a.yt_avatar, a.nico_name, a.nico_url, a.nico_avatar, a.twitter_name, a.twitter_url, a.twitter_avatar";

/// Thread-safe database wrapper using connection pooling
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open or create a database at the given path with connection pooling
    pub fn open<P: AsRef<Path>>(path: P) -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| {
                conn.execute_batch("
                    PRAGMA journal_mode=WAL;
                    PRAGMA synchronous=NORMAL;
                    PRAGMA foreign_keys=ON;
                    PRAGMA cache_size=10000;
                    PRAGMA temp_store=MEMORY;
                ")?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(8)
            .build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        debug!("catalogue database ready");
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| {
                conn.execute_batch("PRAGMA foreign_keys=ON;")?;
                Ok(())
            });

        // In-memory needs single connection to maintain state
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        Ok(db)
    }

    fn get_conn(&self) -> DatabaseResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn setup_schema(&self) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                yt_name TEXT,
                yt_url TEXT,
                yt_avatar TEXT,
                nico_name TEXT,
                nico_url TEXT,
                nico_avatar TEXT,
                twitter_name TEXT,
                twitter_url TEXT,
                twitter_avatar TEXT
            );

            CREATE TABLE IF NOT EXISTS videos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
                original_name TEXT,
                original_url TEXT,
                original_thumbnail TEXT,
                date TEXT,
                repost_name TEXT,
                repost_url TEXT,
                repost_thumbnail TEXT,
                translation_status INTEGER,
                comment TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_videos_author ON videos(author);
            CREATE INDEX IF NOT EXISTS idx_videos_date ON videos(date);
        "#)?;
        Ok(())
    }

    pub fn insert_author(&self, author: &NewAuthor) -> DatabaseResult<i64> {
        let conn = self.get_conn()?;
        let p = &author.profile;
        conn.execute(
            r#"INSERT INTO authors (yt_name, yt_url, yt_avatar, nico_name, nico_url, nico_avatar, twitter_name, twitter_url, twitter_avatar)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                p.yt_name,
                p.yt_url,
                p.yt_avatar,
                p.nico_name,
                p.nico_url,
                p.nico_avatar,
                p.twitter_name,
                p.twitter_url,
                p.twitter_avatar,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_video(&self, author_id: i64, video: &NewVideo) -> DatabaseResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO videos (author, original_name, original_url, original_thumbnail, date, repost_name, repost_url, repost_thumbnail, translation_status, comment)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
            params![
                author_id,
                video.original_name,
                video.original_url,
                video.original_thumbnail,
                video.date,
                video.repost_name,
                video.repost_url,
                video.repost_thumbnail,
                i64::from(video.translation_status),
                video.comment,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Videos whose original or repost title contains any of the patterns.
    pub fn fetch_video_candidates(&self, patterns: &[SearchPattern]) -> DatabaseResult<Vec<VideoRecord>> {
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let where_clause = like_clause(&["v.original_name", "v.repost_name"], patterns.len());
        let sql = format!(
            "SELECT v.id, v.original_name, v.original_url, v.original_thumbnail, v.date, v.repost_name, v.repost_url, v.repost_thumbnail, v.translation_status, v.comment, a.id, {}
             FROM videos v
             JOIN authors a ON v.author = a.id
             WHERE {}",
            AUTHOR_COLUMNS, where_clause
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(like_params(patterns, 2)), Self::row_to_video)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(patterns = patterns.len(), rows = rows.len(), "fetched video candidates");
        Ok(rows)
    }

    /// Authors with any platform name containing any of the patterns,
    /// with their video count and latest video date.
    pub fn fetch_author_candidates(&self, patterns: &[SearchPattern]) -> DatabaseResult<Vec<AuthorRecord>> {
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let where_clause = like_clause(&["a.yt_name", "a.nico_name", "a.twitter_name"], patterns.len());
        let sql = format!(
            "SELECT a.id, {}, COUNT(v.id), MAX(v.date)
             FROM authors a
             LEFT JOIN videos v ON a.id = v.author
             WHERE {}
             GROUP BY a.id",
            AUTHOR_COLUMNS, where_clause
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(like_params(patterns, 3)), |row| {
                Ok(AuthorRecord {
                    id: row.get(0)?,
                    profile: Self::row_to_profile(row, 1)?,
                    works_count: row.get(10)?,
                    last_update: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_video(row: &Row<'_>) -> rusqlite::Result<VideoRecord> {
        let status: Option<i64> = row.get(8)?;
        Ok(VideoRecord {
            id: row.get(0)?,
            original_name: row.get(1)?,
            original_url: row.get(2)?,
            original_thumbnail: row.get(3)?,
            date: row.get(4)?,
            repost_name: row.get(5)?,
            repost_url: row.get(6)?,
            repost_thumbnail: row.get(7)?,
            translation_status: status.map(TranslationStatus::from).unwrap_or_default(),
            comment: row.get(9)?,
            author_id: row.get(10)?,
            author: Self::row_to_profile(row, 11)?,
        })
    }

    fn row_to_profile(row: &Row<'_>, offset: usize) -> rusqlite::Result<AuthorProfile> {
        Ok(AuthorProfile {
            yt_name: row.get(offset)?,
            yt_url: row.get(offset + 1)?,
            yt_avatar: row.get(offset + 2)?,
            nico_name: row.get(offset + 3)?,
            nico_url: row.get(offset + 4)?,
            nico_avatar: row.get(offset + 5)?,
            twitter_name: row.get(offset + 6)?,
            twitter_url: row.get(offset + 7)?,
            twitter_avatar: row.get(offset + 8)?,
        })
    }
}

/// `(c1 LIKE ? ESCAPE '\' OR c2 LIKE ? ESCAPE '\') OR ...`, one group per pattern.
fn like_clause(columns: &[&str], pattern_count: usize) -> String {
    let group = columns
        .iter()
        .map(|c| format!("{} LIKE ? ESCAPE '\\'", c))
        .collect::<Vec<_>>()
        .join(" OR ");
    vec![format!("({})", group); pattern_count].join(" OR ")
}

/// Each pattern's LIKE operand, repeated once per column.
fn like_params(patterns: &[SearchPattern], columns: usize) -> Vec<String> {
    patterns
        .iter()
        .flat_map(|p| std::iter::repeat(p.to_like()).take(columns))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::build_patterns;

    fn seed(db: &Database) -> (i64, i64) {
        let reimu = db
            .insert_author(&NewAuthor {
                profile: AuthorProfile {
                    yt_name: Some("Hakurei Channel".to_string()),
                    nico_name: Some("博麗P".to_string()),
                    ..Default::default()
                },
            })
            .unwrap();
        let marisa = db
            .insert_author(&NewAuthor {
                profile: AuthorProfile {
                    twitter_name: Some("kirisame_mmd".to_string()),
                    ..Default::default()
                },
            })
            .unwrap();

        db.insert_video(reimu, &NewVideo {
            original_name: Some("【東方MMD】霊夢の日常（前編）".to_string()),
            repost_name: Some("【东方MMD/中文内嵌】灵梦的日常（前篇）".to_string()),
            date: Some("2019-04-01".to_string()),
            translation_status: TranslationStatus::ChineseEmbedded,
            ..Default::default()
        })
        .unwrap();
        db.insert_video(marisa, &NewVideo {
            original_name: Some("魔理沙の100%実験".to_string()),
            date: None,
            ..Default::default()
        })
        .unwrap();
        (reimu, marisa)
    }

    #[test]
    fn test_insert_requires_existing_author() {
        let db = Database::open_in_memory().unwrap();
        let (reimu, marisa) = seed(&db);
        assert_ne!(reimu, marisa);
        assert!(db.insert_video(999, &NewVideo::default()).is_err());
    }

    #[test]
    fn test_fetch_video_candidates_by_pattern() {
        let db = Database::open_in_memory().unwrap();
        let (reimu, _) = seed(&db);

        let rows = db.fetch_video_candidates(&build_patterns("灵梦的日常")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].author_id, reimu);
        assert_eq!(rows[0].author.yt_name.as_deref(), Some("Hakurei Channel"));
        assert_eq!(rows[0].translation_status, TranslationStatus::ChineseEmbedded);

        // original title only
        let rows = db.fetch_video_candidates(&build_patterns("霊夢の日常")).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_like_is_case_insensitive_for_ascii() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        let rows = db.fetch_video_candidates(&build_patterns("mmd")).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_wildcards_are_literal() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        assert_eq!(db.fetch_video_candidates(&build_patterns("100%")).unwrap().len(), 1);
        assert_eq!(db.fetch_video_candidates(&build_patterns("%")).unwrap().len(), 1);
        assert!(db.fetch_video_candidates(&build_patterns("_")).unwrap().is_empty());
    }

    #[test]
    fn test_no_patterns_no_rows() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        assert!(db.fetch_video_candidates(&[]).unwrap().is_empty());
        assert!(db.fetch_author_candidates(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_fetch_author_candidates_with_stats() {
        let db = Database::open_in_memory().unwrap();
        let (reimu, marisa) = seed(&db);

        let rows = db.fetch_author_candidates(&build_patterns("博麗")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, reimu);
        assert_eq!(rows[0].works_count, 1);
        assert_eq!(rows[0].last_update.as_deref(), Some("2019-04-01"));

        let rows = db.fetch_author_candidates(&build_patterns("KIRISAME")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, marisa);
        assert_eq!(rows[0].last_update, None);
    }

    #[test]
    fn test_like_clause_shape() {
        assert_eq!(
            like_clause(&["x", "y"], 2),
            "(x LIKE ? ESCAPE '\\' OR y LIKE ? ESCAPE '\\') OR (x LIKE ? ESCAPE '\\' OR y LIKE ? ESCAPE '\\')"
        );
        let params = like_params(&build_patterns("ab"), 2);
        assert_eq!(params, vec!["%ab%", "%ab%"]);
    }
}

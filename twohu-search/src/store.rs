//! SearchService - ranked search over the video/author catalogue.
//!
//! Wires the pieces together: configuration, response caches, the active
//! scoring strategy, and the SQLite retrieval layer. Each search resolves its
//! limit, consults the cache, prepares the query, then retrieves and ranks
//! candidates on a blocking thread.
//!
//! Async Cancellation:
//! Dropping a search future drops a DropGuard that cancels a CancellationToken.
//! The blocking task checks the token between retrieval and ranking.

use crate::cache::{cache_key, Clock, ResponseCache, SearchDomain, SystemClock};
use crate::candidate::SearchCandidate;
use crate::config::SearchConfig;
use crate::database::{Database, DatabaseResult};
use crate::interface::{SearchError, SearchServiceApi};
use crate::models::{AuthorRecord, VideoRecord};
use crate::patterns::SearchPattern;
use crate::ranking::{strategy_from_config, ScoringStrategy};
use crate::search::{rank, resolve_limit, PreparedQuery};
use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fallback Tokio runtime for when the service is driven outside any runtime.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create fallback tokio runtime")
});

/// RAII guard that cancels a token when dropped.
struct DropGuard {
    token: CancellationToken,
}

impl DropGuard {
    fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

type Fetch<C> = fn(&Database, &[SearchPattern]) -> DatabaseResult<Vec<C>>;

/// Thread-safe search service over SQLite.
///
/// Concurrency Model:
/// - Database uses an r2d2 connection pool (concurrent reads)
/// - Retrieval and ranking run on tokio::spawn_blocking threads
/// - Response caches are behind short-lived mutexes
pub struct SearchService {
    db: Arc<Database>,
    config: SearchConfig,
    strategy: Arc<dyn ScoringStrategy>,
    videos: Arc<ResponseCache<Vec<VideoRecord>>>,
    authors: Arc<ResponseCache<Vec<AuthorRecord>>>,
}

impl SearchService {
    /// Open (or create) the catalogue at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P, config: SearchConfig) -> Result<Self, SearchError> {
        let db = Database::open(db_path)?;
        Self::with_database(db, config, Arc::new(SystemClock))
    }

    pub fn with_database(db: Database, config: SearchConfig, clock: Arc<dyn Clock>) -> Result<Self, SearchError> {
        config.validate()?;
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        let strategy: Arc<dyn ScoringStrategy> = Arc::from(strategy_from_config(&config));
        info!(
            strategy = strategy.kind().as_str(),
            threshold = strategy.threshold(),
            "search service ready"
        );

        Ok(Self {
            db: Arc::new(db),
            config,
            strategy,
            videos: Arc::new(ResponseCache::new(ttl, Arc::clone(&clock))),
            authors: Arc::new(ResponseCache::new(ttl, clock)),
        })
    }

    /// Create a service with an in-memory database (for testing)
    #[cfg(test)]
    pub(crate) fn new_in_memory(config: SearchConfig, clock: Arc<dyn Clock>) -> Result<Self, SearchError> {
        let db = Database::open_in_memory()?;
        Self::with_database(db, config, clock)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Effective query and patterns for `query`, as a search would use them.
    pub fn prepare(&self, query: &str) -> PreparedQuery {
        PreparedQuery::new(query, &self.config)
    }

    /// Drop expired entries from every cache. Returns how many were removed.
    pub fn sweep_caches(&self) -> usize {
        self.videos.sweep() + self.authors.sweep()
    }

    /// Sweep caches periodically until the returned token is cancelled.
    pub fn spawn_cache_sweeper(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let stop = token.clone();
        let videos = Arc::clone(&self.videos);
        let authors = Arc::clone(&self.authors);
        let period = Duration::from_secs(self.config.cache_sweep_secs);

        self.runtime_handle().spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = videos.sweep() + authors.sweep();
                        if removed > 0 {
                            debug!(removed, "swept expired cache entries");
                        }
                    }
                }
            }
        });

        token
    }

    /// Current runtime if there is one, otherwise the global fallback
    fn runtime_handle(&self) -> tokio::runtime::Handle {
        tokio::runtime::Handle::try_current()
            .unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
    }

    async fn run_search<C>(
        &self,
        domain: SearchDomain,
        query: String,
        limit: Option<String>,
        cache: &ResponseCache<Vec<C>>,
        fetch: Fetch<C>,
    ) -> Result<Vec<C>, SearchError>
    where
        C: SearchCandidate + Clone + Send + 'static,
    {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let limit = resolve_limit(limit.as_deref(), self.config.default_limit, self.config.max_limit);
        let prepared = PreparedQuery::new(&query, &self.config);
        let key = cache_key(domain, self.strategy.kind(), limit, &prepared.effective);

        if let Some(hit) = cache.get(&key) {
            debug!(domain = domain.as_str(), query = query.as_str(), "cache hit");
            return Ok(hit);
        }

        debug!(
            domain = domain.as_str(),
            query = query.as_str(),
            effective = prepared.effective.as_str(),
            used_core = prepared.used_core(),
            patterns = prepared.patterns.len(),
            "searching"
        );

        let token = CancellationToken::new();
        let _guard = DropGuard::new(token.clone());

        let db = Arc::clone(&self.db);
        let strategy = Arc::clone(&self.strategy);

        let handle = self.runtime_handle().spawn_blocking(move || {
            let candidates = fetch(&db, &prepared.patterns)?;
            if token.is_cancelled() {
                return Err(SearchError::Cancelled);
            }
            let retrieved = candidates.len();
            let threshold = strategy.threshold();
            let ranked = rank(candidates, &prepared.effective, strategy.as_ref(), threshold, limit);
            Ok::<_, SearchError>((retrieved, ranked))
        });

        match handle.await {
            Ok(Ok((retrieved, ranked))) => {
                debug!(
                    domain = domain.as_str(),
                    retrieved,
                    returned = ranked.len(),
                    "ranked"
                );
                cache.insert(key, ranked.clone());
                Ok(ranked)
            }
            Ok(Err(e)) => {
                warn!(domain = domain.as_str(), error = %e, "search failed");
                Err(e)
            }
            Err(_join_error) => Err(SearchError::Cancelled),
        }
    }
}

#[async_trait::async_trait]
impl SearchServiceApi for SearchService {
    async fn search_videos(&self, query: String, limit: Option<String>) -> Result<Vec<VideoRecord>, SearchError> {
        self.run_search(SearchDomain::Videos, query, limit, &self.videos, Database::fetch_video_candidates)
            .await
    }

    async fn search_authors(&self, query: String, limit: Option<String>) -> Result<Vec<AuthorRecord>, SearchError> {
        self.run_search(SearchDomain::Authors, query, limit, &self.authors, Database::fetch_author_candidates)
            .await
    }

    fn cache_size(&self) -> usize {
        self.videos.len() + self.authors.len()
    }
}

/// Catalog metadata abstraction
///
/// The pipeline reaches the external catalog through this trait so the
/// resolver, aggregator, and orchestrator stay unit-testable without network
/// access. The four operations are idempotent reads; implementations absorb
/// transport and HTTP failures and hand back empty shapes instead of errors,
/// so callers treat the catalog as always reachable but possibly empty.
use crate::models::{CastEntry, MediaDetails, MediaType, SearchHit, WatchProvider};

pub mod tmdb;

pub use tmdb::TmdbClient;

/// How many cast entries a credits lookup keeps
pub const MAX_CAST_ENTRIES: usize = 5;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataClient: Send + Sync {
    /// Multi-type search across movies, TV shows, and people
    async fn search_multi(&self, term: &str, language: &str) -> Vec<SearchHit>;

    /// Subscription streaming providers for a title in a region.
    /// Empty when the title has no providers configured there.
    async fn watch_providers(
        &self,
        id: u64,
        media_type: MediaType,
        region: &str,
    ) -> Vec<WatchProvider>;

    /// Top-billed cast, truncated to [`MAX_CAST_ENTRIES`]
    async fn credits(&self, id: u64, media_type: MediaType, language: &str) -> Vec<CastEntry>;

    /// Detail lookup; field availability depends on the media type
    async fn details(&self, id: u64, media_type: MediaType, language: &str) -> MediaDetails;
}

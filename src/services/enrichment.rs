/// Enrichment aggregation
///
/// Fans out the three secondary lookups for one resolved record and merges
/// them into a single bundle. The metadata client absorbs its own failures,
/// so the bundle is always structurally complete; the worst case is empty
/// fields, never a missing bundle.
use std::sync::Arc;

use crate::{
    models::{EnrichmentBundle, MediaRecord},
    services::metadata::MetadataClient,
};

#[derive(Clone)]
pub struct EnrichmentAggregator {
    client: Arc<dyn MetadataClient>,
}

impl EnrichmentAggregator {
    pub fn new(client: Arc<dyn MetadataClient>) -> Self {
        Self { client }
    }

    /// One pass, three concurrent lookups, no retry
    pub async fn enrich(
        &self,
        record: &MediaRecord,
        region: &str,
        language: &str,
    ) -> EnrichmentBundle {
        let (providers, cast, details) = tokio::join!(
            self.client
                .watch_providers(record.id, record.media_type, region),
            self.client.credits(record.id, record.media_type, language),
            self.client.details(record.id, record.media_type, language),
        );

        tracing::debug!(
            id = record.id,
            providers = providers.len(),
            cast = cast.len(),
            "Record enriched"
        );

        EnrichmentBundle {
            providers,
            cast,
            details,
        }
    }
}

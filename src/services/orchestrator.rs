/// Recommendation pipeline orchestration
///
/// One request flows through six stages, sequential at the stage level and
/// concurrent inside the fan-out stages: validate, generate, resolve, filter
/// and dedupe, enrich, assemble. A generator failure aborts the request;
/// per-title and per-record failures inside the fan-outs are absorbed so the
/// request degrades to fewer results instead of failing outright.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        EnrichmentBundle, MediaId, MediaRecord, RecommendationRequest, ResolvedRecommendationSet,
    },
    services::{
        enrichment::EnrichmentAggregator,
        generator::{GeneratedRecommendations, GeneratorRequest, RecommendationGenerator},
        resolver::{fallback_languages, ContentFilter, TitleResolver},
    },
};

pub struct RecommendationOrchestrator {
    generator: Arc<dyn RecommendationGenerator>,
    resolver: TitleResolver,
    aggregator: EnrichmentAggregator,
}

impl RecommendationOrchestrator {
    pub fn new(
        generator: Arc<dyn RecommendationGenerator>,
        resolver: TitleResolver,
        aggregator: EnrichmentAggregator,
    ) -> Self {
        Self {
            generator,
            resolver,
            aggregator,
        }
    }

    pub async fn run(
        &self,
        request: &RecommendationRequest,
    ) -> AppResult<ResolvedRecommendationSet> {
        validate(request)?;

        let generated = self.generate(request).await?;
        let resolved = self.resolve_titles(&generated.titles, request).await;
        let records = filter_and_dedupe(resolved);
        let enrichments = self.enrich_records(&records, request).await;

        tracing::info!(
            requested = generated.titles.len(),
            resolved = records.len(),
            "Recommendation pipeline completed"
        );

        Ok(ResolvedRecommendationSet {
            records,
            enrichments,
            reply: generated.reply,
        })
    }

    /// Stage 2: the single external AI call. Fatal on failure, no retry.
    async fn generate(
        &self,
        request: &RecommendationRequest,
    ) -> AppResult<GeneratedRecommendations> {
        let mut content_labels = Vec::new();
        if request.include_movies {
            content_labels.push("movies".to_string());
        }
        if request.include_tv {
            content_labels.push("TV shows".to_string());
        }

        let generator_request = GeneratorRequest {
            prompt: request.query.trim().to_string(),
            desired_count: request.desired_count,
            content_labels,
            region: request.region.clone(),
            language: request.language.clone(),
        };

        self.generator.generate(&generator_request).await
    }

    /// Stage 3: resolve every candidate title concurrently. Results are
    /// collected by input index, so output order matches generator order no
    /// matter which lookup finishes first. A panicked task collapses to a
    /// no-match for that title only.
    async fn resolve_titles(
        &self,
        titles: &[String],
        request: &RecommendationRequest,
    ) -> Vec<Option<MediaRecord>> {
        let filter = ContentFilter {
            include_movies: request.include_movies,
            include_tv: request.include_tv,
        };
        let languages = fallback_languages(&request.language);

        let mut tasks = Vec::new();
        for title in titles {
            let resolver = self.resolver.clone();
            let title = title.clone();
            let languages = languages.clone();
            tasks.push(tokio::spawn(async move {
                resolver.resolve(&title, filter, &languages).await
            }));
        }

        let mut resolved = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(result) => resolved.push(result),
                Err(e) => {
                    tracing::error!(error = %e, "Title resolution task failed");
                    resolved.push(None);
                }
            }
        }
        resolved
    }

    /// Stage 5: enrich every surviving record concurrently, keyed by record
    /// identity. A panicked task degrades to the empty bundle.
    async fn enrich_records(
        &self,
        records: &[MediaRecord],
        request: &RecommendationRequest,
    ) -> HashMap<MediaId, EnrichmentBundle> {
        let mut tasks = Vec::new();
        for record in records {
            let aggregator = self.aggregator.clone();
            let record = record.clone();
            let region = request.region.clone();
            let language = request.language.clone();
            tasks.push((
                record.identity(),
                tokio::spawn(async move { aggregator.enrich(&record, &region, &language).await }),
            ));
        }

        let mut enrichments = HashMap::with_capacity(tasks.len());
        for (identity, task) in tasks {
            let bundle = match task.await {
                Ok(bundle) => bundle,
                Err(e) => {
                    tracing::error!(error = %e, id = %identity, "Enrichment task failed");
                    EnrichmentBundle::default()
                }
            };
            enrichments.insert(identity, bundle);
        }
        enrichments
    }
}

/// Stage 1: reject before any network call is made
fn validate(request: &RecommendationRequest) -> AppResult<()> {
    if request.query.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Recommendation query cannot be empty".to_string(),
        ));
    }
    if !request.include_movies && !request.include_tv {
        return Err(AppError::InvalidInput(
            "At least one content type must be selected".to_string(),
        ));
    }
    Ok(())
}

/// Stage 4: drop no-matches and records missing a mandatory field, then
/// dedupe by identity keeping the first occurrence.
fn filter_and_dedupe(resolved: Vec<Option<MediaRecord>>) -> Vec<MediaRecord> {
    let mut seen: HashSet<MediaId> = HashSet::new();
    let mut records = Vec::new();

    for record in resolved.into_iter().flatten() {
        if record.title.trim().is_empty() || record.overview.trim().is_empty() {
            tracing::debug!(id = record.id, "Dropping record with missing mandatory field");
            continue;
        }
        if seen.insert(record.identity()) {
            records.push(record);
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HitKind, MediaType, SearchHit};
    use crate::services::generator::MockRecommendationGenerator;
    use crate::services::metadata::{MetadataClient, MockMetadataClient};
    use crate::models::{CastEntry, MediaDetails, WatchProvider};
    use std::time::Duration;

    fn request(query: &str, movies: bool, tv: bool) -> RecommendationRequest {
        RecommendationRequest {
            query: query.to_string(),
            desired_count: 5,
            include_movies: movies,
            include_tv: tv,
            region: "US".to_string(),
            language: "en-US".to_string(),
        }
    }

    fn generated(titles: &[&str]) -> GeneratedRecommendations {
        GeneratedRecommendations {
            titles: titles.iter().map(|t| t.to_string()).collect(),
            reply: "Here you go!".to_string(),
        }
    }

    fn orchestrator_with(
        generator: MockRecommendationGenerator,
        client: Arc<dyn MetadataClient>,
    ) -> RecommendationOrchestrator {
        RecommendationOrchestrator::new(
            Arc::new(generator),
            TitleResolver::new(client.clone()),
            EnrichmentAggregator::new(client),
        )
    }

    /// Catalog stub with per-title latency so completion order differs from
    /// input order. Enrichment lookups return fixed small shapes.
    struct LaggyCatalog;

    #[async_trait::async_trait]
    impl MetadataClient for LaggyCatalog {
        async fn search_multi(&self, term: &str, _language: &str) -> Vec<SearchHit> {
            let (id, delay_ms, overview) = match term {
                "Alpha" => (1, 0u64, "First pick."),
                "Beta" => (2, 150, "Second pick."),
                "Gamma" => (3, 20, "Third pick."),
                "Blank" => (4, 0, ""),
                _ => return Vec::new(),
            };
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            vec![SearchHit {
                id,
                kind: HitKind::Movie,
                title: term.to_string(),
                overview: overview.to_string(),
                poster_path: None,
                release_date: None,
                rating_average: 7.0,
                vote_count: 1000,
            }]
        }

        async fn watch_providers(
            &self,
            _id: u64,
            _media_type: MediaType,
            _region: &str,
        ) -> Vec<WatchProvider> {
            vec![WatchProvider {
                name: "Netflix".to_string(),
                logo_path: None,
            }]
        }

        async fn credits(
            &self,
            _id: u64,
            _media_type: MediaType,
            _language: &str,
        ) -> Vec<CastEntry> {
            Vec::new()
        }

        async fn details(
            &self,
            _id: u64,
            _media_type: MediaType,
            _language: &str,
        ) -> MediaDetails {
            MediaDetails::default()
        }
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_generator_call() {
        // No expectation set: any generator invocation would fail the test.
        let generator = MockRecommendationGenerator::new();
        let client = MockMetadataClient::new();
        let orchestrator = orchestrator_with(generator, Arc::new(client));

        let result = orchestrator.run(&request("   ", true, true)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_no_content_type_rejected_before_generator_call() {
        let generator = MockRecommendationGenerator::new();
        let client = MockMetadataClient::new();
        let orchestrator = orchestrator_with(generator, Arc::new(client));

        let result = orchestrator.run(&request("something fun", false, false)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_generator_failure_is_fatal() {
        let mut generator = MockRecommendationGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Err(AppError::Generator("model unavailable".to_string())));
        let client = MockMetadataClient::new();
        let orchestrator = orchestrator_with(generator, Arc::new(client));

        let result = orchestrator.run(&request("anything", true, true)).await;
        assert!(matches!(result, Err(AppError::Generator(_))));
    }

    #[tokio::test]
    async fn test_duplicate_titles_dedupe_to_one_record() {
        let mut generator = MockRecommendationGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Ok(generated(&["Alpha", "Alpha"])));
        let orchestrator = orchestrator_with(generator, Arc::new(LaggyCatalog));

        let set = orchestrator
            .run(&request("the same thing twice", true, true))
            .await
            .unwrap();

        assert_eq!(set.records.len(), 1);
        assert_eq!(set.records[0].id, 1);
        assert_eq!(set.enrichments.len(), 1);
    }

    #[tokio::test]
    async fn test_output_order_matches_generator_order() {
        // Beta resolves slowest; order must still be Alpha, Beta, Gamma.
        let mut generator = MockRecommendationGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Ok(generated(&["Alpha", "Beta", "Gamma"])));
        let orchestrator = orchestrator_with(generator, Arc::new(LaggyCatalog));

        let set = orchestrator
            .run(&request("three picks", true, true))
            .await
            .unwrap();

        let titles: Vec<&str> = set.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[tokio::test]
    async fn test_unresolved_titles_are_dropped_silently() {
        let mut generator = MockRecommendationGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Ok(generated(&["Alpha", "No Such Title", "Gamma"])));
        let orchestrator = orchestrator_with(generator, Arc::new(LaggyCatalog));

        let set = orchestrator
            .run(&request("mixed bag", true, true))
            .await
            .unwrap();

        let titles: Vec<&str> = set.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Gamma"]);
        assert_eq!(set.reply, "Here you go!");
    }

    #[tokio::test]
    async fn test_record_missing_overview_is_dropped() {
        let mut generator = MockRecommendationGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Ok(generated(&["Alpha", "Blank"])));
        let orchestrator = orchestrator_with(generator, Arc::new(LaggyCatalog));

        let set = orchestrator
            .run(&request("one valid one blank", true, true))
            .await
            .unwrap();

        assert_eq!(set.records.len(), 1);
        assert_eq!(set.records[0].title, "Alpha");
    }

    #[tokio::test]
    async fn test_every_record_has_an_enrichment_bundle() {
        let mut generator = MockRecommendationGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Ok(generated(&["Alpha", "Beta", "Gamma"])));
        let orchestrator = orchestrator_with(generator, Arc::new(LaggyCatalog));

        let set = orchestrator
            .run(&request("three picks", true, true))
            .await
            .unwrap();

        assert_eq!(set.enrichments.len(), set.records.len());
        for record in &set.records {
            let bundle = set.enrichments.get(&record.identity()).unwrap();
            assert_eq!(bundle.providers[0].name, "Netflix");
        }
    }
}

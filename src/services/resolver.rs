/// Title resolution
///
/// Maps one AI-generated title string to at most one catalog record.
/// Generated titles are often stylized, translated, or carry subtitles the
/// catalog does not know verbatim, so resolution walks a progressive ladder
/// of (search term, language) pairs and stops at the first pair that yields
/// a usable hit. Exhausting the ladder is a "no match", not an error.
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    models::{HitKind, MediaRecord, SearchHit},
    services::metadata::MetadataClient,
};

/// Leading articles and particles across the languages the ladder searches in
static LEADING_ARTICLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(the|a|an|el|la|los|las|un|una|une|le|les|der|die|das|ein|eine|il|lo|gli|o|os|as|de|het)\s+",
    )
    .expect("leading article regex should compile")
});

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));

/// Languages tried after the caller's primary language
const SECONDARY_LANGUAGES: &[&str] = &["en-US", "es-ES", "fr-FR", "de-DE"];
const BASE_LANGUAGE: &str = "en";

/// Search terms shorter than this are too ambiguous to be worth a round-trip
const MIN_TERM_CHARS: usize = 2;

/// Which media kinds a request accepts. At least one flag is true by the
/// time resolution runs; the orchestrator validates that upstream.
#[derive(Debug, Clone, Copy)]
pub struct ContentFilter {
    pub include_movies: bool,
    pub include_tv: bool,
}

impl ContentFilter {
    /// Person hits are never acceptable; title hits follow the flags
    pub fn allows(&self, hit: &SearchHit) -> bool {
        match hit.kind {
            HitKind::Movie => self.include_movies,
            HitKind::Tv => self.include_tv,
            HitKind::Person | HitKind::Other => false,
        }
    }
}

/// Fallback language sequence: primary first, then the fixed secondary set,
/// finally the base language. Duplicates collapse, order preserved.
pub fn fallback_languages(primary: &str) -> Vec<String> {
    let mut languages: Vec<String> = Vec::new();
    let candidates = std::iter::once(primary)
        .chain(SECONDARY_LANGUAGES.iter().copied())
        .chain(std::iter::once(BASE_LANGUAGE));

    for lang in candidates {
        if !lang.is_empty() && !languages.iter().any(|l| l == lang) {
            languages.push(lang.to_string());
        }
    }
    languages
}

fn clean_title(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '\u{201C}' | '\u{201D}'))
        .trim()
        .to_string()
}

/// Builds the ordered (term, language) ladder for one title:
/// the cleaned title per language, an article-stripped variant for the first
/// two languages, and a whitespace-collapsed variant for the first language.
fn search_attempts(title: &str, languages: &[String]) -> Vec<(String, String)> {
    let cleaned = clean_title(title);
    let mut attempts: Vec<(String, String)> = Vec::new();

    let mut push = |term: String, language: &str| {
        if term.chars().count() < MIN_TERM_CHARS {
            return;
        }
        let pair = (term, language.to_string());
        if !attempts.contains(&pair) {
            attempts.push(pair);
        }
    };

    for (index, language) in languages.iter().enumerate() {
        push(cleaned.clone(), language);

        if index < 2 {
            let stripped = LEADING_ARTICLE.replace(&cleaned, "").trim().to_string();
            if stripped != cleaned {
                push(stripped, language);
            }
        }

        if index == 0 {
            let collapsed = WHITESPACE.replace_all(&cleaned, " ").trim().to_string();
            if collapsed != cleaned {
                push(collapsed, language);
            }
        }
    }

    attempts
}

#[derive(Clone)]
pub struct TitleResolver {
    client: Arc<dyn MetadataClient>,
}

impl TitleResolver {
    pub fn new(client: Arc<dyn MetadataClient>) -> Self {
        Self { client }
    }

    /// Resolves one candidate title. The first ladder rung with at least one
    /// filtered hit wins; among its hits the highest popularity score wins,
    /// and score ties keep the catalog's own ordering.
    pub async fn resolve(
        &self,
        title: &str,
        filter: ContentFilter,
        languages: &[String],
    ) -> Option<MediaRecord> {
        for (term, language) in search_attempts(title, languages) {
            let hits = self.client.search_multi(&term, &language).await;
            let filtered: Vec<SearchHit> = hits.into_iter().filter(|h| filter.allows(h)).collect();

            if filtered.is_empty() {
                continue;
            }

            let best = filtered
                .into_iter()
                .enumerate()
                .max_by(|(index_a, a), (index_b, b)| {
                    a.popularity_score()
                        .partial_cmp(&b.popularity_score())
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| index_b.cmp(index_a))
                })
                .map(|(_, hit)| hit)?;

            tracing::debug!(
                title = %title,
                term = %term,
                language = %language,
                resolved_id = best.id,
                "Title resolved"
            );
            return best.into_record();
        }

        tracing::debug!(title = %title, "Title resolution exhausted all attempts");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaType;
    use crate::services::metadata::MockMetadataClient;
    use mockall::predicate::eq;

    fn hit(id: u64, kind: HitKind, title: &str, rating: f64, votes: u64) -> SearchHit {
        SearchHit {
            id,
            kind,
            title: title.to_string(),
            overview: "overview".to_string(),
            poster_path: None,
            release_date: Some("1999-03-31".to_string()),
            rating_average: rating,
            vote_count: votes,
        }
    }

    fn both() -> ContentFilter {
        ContentFilter {
            include_movies: true,
            include_tv: true,
        }
    }

    #[test]
    fn test_fallback_languages_dedupes_primary() {
        let languages = fallback_languages("en-US");
        assert_eq!(languages[0], "en-US");
        assert_eq!(
            languages.iter().filter(|l| l.as_str() == "en-US").count(),
            1
        );
        assert_eq!(languages.last().map(String::as_str), Some("en"));
    }

    #[test]
    fn test_fallback_languages_keeps_unknown_primary_first() {
        let languages = fallback_languages("ja-JP");
        assert_eq!(languages[0], "ja-JP");
        assert!(languages.iter().any(|l| l == "en-US"));
    }

    #[test]
    fn test_search_attempts_ladder_order() {
        let languages = vec!["pt-BR".to_string(), "en-US".to_string(), "en".to_string()];
        let attempts = search_attempts("The  Matrix", &languages);

        // First language: exact, article-stripped, whitespace-collapsed
        assert_eq!(attempts[0], ("The  Matrix".to_string(), "pt-BR".to_string()));
        assert_eq!(attempts[1], ("Matrix".to_string(), "pt-BR".to_string()));
        assert_eq!(attempts[2], ("The Matrix".to_string(), "pt-BR".to_string()));
        // Second language: exact and article-stripped only
        assert_eq!(attempts[3], ("The  Matrix".to_string(), "en-US".to_string()));
        assert_eq!(attempts[4], ("Matrix".to_string(), "en-US".to_string()));
        // Third language: exact only
        assert_eq!(attempts[5], ("The  Matrix".to_string(), "en".to_string()));
        assert_eq!(attempts.len(), 6);
    }

    #[test]
    fn test_search_attempts_skips_short_terms() {
        let languages = vec!["en-US".to_string()];
        let attempts = search_attempts("A", &languages);
        assert!(attempts.is_empty());
    }

    #[test]
    fn test_search_attempts_strips_wrapping_quotes() {
        let languages = vec!["en-US".to_string()];
        let attempts = search_attempts("\"Heat\"", &languages);
        assert_eq!(attempts[0], ("Heat".to_string(), "en-US".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_returns_top_scored_hit() {
        let mut client = MockMetadataClient::new();
        client
            .expect_search_multi()
            .with(eq("Heat"), eq("en-US"))
            .times(1)
            .returning(|_, _| {
                vec![
                    hit(10, HitKind::Movie, "Heat", 6.0, 100),
                    hit(949, HitKind::Movie, "Heat", 7.9, 7000),
                ]
            });

        let resolver = TitleResolver::new(Arc::new(client));
        let languages = vec!["en-US".to_string()];
        let record = resolver.resolve("Heat", both(), &languages).await.unwrap();

        assert_eq!(record.id, 949);
        assert_eq!(record.media_type, MediaType::Movie);
    }

    #[tokio::test]
    async fn test_resolve_tie_keeps_catalog_order() {
        let mut client = MockMetadataClient::new();
        client.expect_search_multi().returning(|_, _| {
            vec![
                hit(1, HitKind::Movie, "Heat", 7.0, 100),
                hit(2, HitKind::Movie, "Heat", 7.0, 100),
            ]
        });

        let resolver = TitleResolver::new(Arc::new(client));
        let languages = vec!["en-US".to_string()];
        let record = resolver.resolve("Heat", both(), &languages).await.unwrap();

        assert_eq!(record.id, 1);
    }

    #[tokio::test]
    async fn test_resolve_falls_through_to_later_attempt() {
        let mut client = MockMetadataClient::new();
        client
            .expect_search_multi()
            .with(eq("The Phantom"), eq("en-US"))
            .times(1)
            .returning(|_, _| vec![]);
        client
            .expect_search_multi()
            .with(eq("Phantom"), eq("en-US"))
            .times(1)
            .returning(|_, _| vec![hit(42, HitKind::Movie, "Phantom", 6.5, 900)]);

        let resolver = TitleResolver::new(Arc::new(client));
        let languages = vec!["en-US".to_string()];
        let record = resolver
            .resolve("The Phantom", both(), &languages)
            .await
            .unwrap();

        assert_eq!(record.id, 42);
    }

    #[tokio::test]
    async fn test_resolve_person_only_hits_is_no_match() {
        let mut client = MockMetadataClient::new();
        client
            .expect_search_multi()
            .returning(|_, _| vec![hit(7, HitKind::Person, "Keanu Reeves", 0.0, 0)]);

        let resolver = TitleResolver::new(Arc::new(client));
        let languages = vec!["en-US".to_string()];
        let result = resolver.resolve("Keanu Reeves", both(), &languages).await;

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_resolve_respects_movies_only_filter() {
        let mut client = MockMetadataClient::new();
        client
            .expect_search_multi()
            .returning(|_, _| vec![hit(1396, HitKind::Tv, "Breaking Bad", 8.9, 12000)]);

        let resolver = TitleResolver::new(Arc::new(client));
        let languages = vec!["en-US".to_string()];
        let filter = ContentFilter {
            include_movies: true,
            include_tv: false,
        };
        let result = resolver.resolve("Breaking Bad", filter, &languages).await;

        assert!(result.is_none());
    }
}

//! Raw TMDB v3 response types and their conversions into domain models.

use std::collections::HashMap;

use serde::Deserialize;

use crate::models::{CastEntry, HitKind, MediaDetails, SearchHit, WatchProvider};

/// Response from GET /search/multi
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<RawSearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchHit {
    pub id: u64,
    #[serde(default)]
    pub media_type: String,
    /// Movies carry `title`, TV shows carry `name`
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
}

impl From<RawSearchHit> for SearchHit {
    fn from(raw: RawSearchHit) -> Self {
        let kind = match raw.media_type.as_str() {
            "movie" => HitKind::Movie,
            "tv" => HitKind::Tv,
            "person" => HitKind::Person,
            _ => HitKind::Other,
        };

        SearchHit {
            id: raw.id,
            kind,
            title: raw.title.or(raw.name).unwrap_or_default(),
            overview: raw.overview.unwrap_or_default(),
            poster_path: raw.poster_path,
            release_date: raw.release_date.or(raw.first_air_date),
            rating_average: raw.vote_average,
            vote_count: raw.vote_count,
        }
    }
}

/// Response from GET /{kind}/{id}/watch/providers
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersResponse {
    #[serde(default)]
    pub results: HashMap<String, RegionProviders>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionProviders {
    #[serde(default)]
    pub flatrate: Option<Vec<RawProvider>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProvider {
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
}

impl From<RawProvider> for WatchProvider {
    fn from(raw: RawProvider) -> Self {
        WatchProvider {
            name: raw.provider_name,
            logo_path: raw.logo_path,
        }
    }
}

/// Response from GET /{kind}/{id}/credits
#[derive(Debug, Clone, Deserialize)]
pub struct CreditsResponse {
    #[serde(default)]
    pub cast: Vec<RawCastMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCastMember {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
}

impl From<RawCastMember> for CastEntry {
    fn from(raw: RawCastMember) -> Self {
        CastEntry {
            name: raw.name,
            role: raw.character,
        }
    }
}

/// Response from GET /movie/{id} or GET /tv/{id}. The two shapes overlap;
/// fields absent for a given kind deserialize to None.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailsResponse {
    #[serde(default)]
    pub genres: Vec<RawGenre>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGenre {
    pub name: String,
}

impl From<DetailsResponse> for MediaDetails {
    fn from(raw: DetailsResponse) -> Self {
        let year = raw
            .release_date
            .as_deref()
            .or(raw.first_air_date.as_deref())
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok());

        MediaDetails {
            genres: raw.genres.into_iter().map(|g| g.name).collect(),
            runtime_minutes: raw.runtime,
            season_count: raw.number_of_seasons,
            episode_count: raw.number_of_episodes,
            status: raw.status,
            year,
        }
    }
}

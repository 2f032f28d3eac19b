use std::{collections::HashMap, fmt::Display, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

pub mod tmdb;

pub use tmdb::{
    CreditsResponse, DetailsResponse, ProvidersResponse, RawCastMember, RawSearchHit,
    SearchResponse,
};

/// Kind of catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Path segment used by the catalog API (`/movie/{id}`, `/tv/{id}`)
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            other => Err(format!("unknown media type: {}", other)),
        }
    }
}

/// Identity of a resolved catalog entry. Catalog IDs are only unique within
/// a media type, so both halves are part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaId {
    pub media_type: MediaType,
    pub id: u64,
}

impl Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.media_type.as_str(), self.id)
    }
}

impl FromStr for MediaId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("malformed media id: {}", s))?;
        Ok(MediaId {
            media_type: kind.parse()?,
            id: id.parse().map_err(|_| format!("malformed media id: {}", s))?,
        })
    }
}

// Serialized as "movie:603" so the identity can key a JSON map and survive a
// round-trip without re-keying.
impl Serialize for MediaId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MediaId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A recommendation request as the pipeline consumes it
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    /// Free-text mood or request typed by the user
    pub query: String,
    /// How many titles to ask the generator for
    pub desired_count: u32,
    pub include_movies: bool,
    pub include_tv: bool,
    /// ISO 3166-1 region for watch providers (e.g. "US")
    pub region: String,
    /// BCP-47 language tag for catalog lookups (e.g. "en-US")
    pub language: String,
}

/// Canonical resolved catalog entry, immutable once built
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaRecord {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    /// Release date for movies, first air date for TV
    pub release_date: Option<String>,
    pub rating_average: f64,
}

impl MediaRecord {
    pub fn identity(&self) -> MediaId {
        MediaId {
            media_type: self.media_type,
            id: self.id,
        }
    }
}

/// Kind tag carried by a multi-search hit. The catalog mixes people in with
/// titles, so this is wider than [`MediaType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Movie,
    Tv,
    Person,
    Other,
}

/// One raw multi-search hit, normalized from the catalog response
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: u64,
    pub kind: HitKind,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub rating_average: f64,
    pub vote_count: u64,
}

impl SearchHit {
    /// Popularity-weighted relevance used to rank competing hits
    pub fn popularity_score(&self) -> f64 {
        self.rating_average * self.vote_count as f64
    }

    pub fn media_type(&self) -> Option<MediaType> {
        match self.kind {
            HitKind::Movie => Some(MediaType::Movie),
            HitKind::Tv => Some(MediaType::Tv),
            HitKind::Person | HitKind::Other => None,
        }
    }

    /// Converts a title hit into a [`MediaRecord`]; person and unknown hits
    /// have no record form.
    pub fn into_record(self) -> Option<MediaRecord> {
        let media_type = self.media_type()?;
        Some(MediaRecord {
            id: self.id,
            media_type,
            title: self.title,
            overview: self.overview,
            poster_path: self.poster_path,
            release_date: self.release_date,
            rating_average: self.rating_average,
        })
    }
}

/// A streaming provider offering a title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchProvider {
    pub name: String,
    pub logo_path: Option<String>,
}

/// One cast credit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastEntry {
    pub name: String,
    pub role: Option<String>,
}

/// Detail fields shared across movie and TV lookups; absent fields stay None
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MediaDetails {
    pub genres: Vec<String>,
    pub runtime_minutes: Option<u32>,
    pub season_count: Option<u32>,
    pub episode_count: Option<u32>,
    pub status: Option<String>,
    pub year: Option<i32>,
}

/// Secondary lookups for one record, merged into a single shape.
/// Always structurally complete; worst case every field is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentBundle {
    pub providers: Vec<WatchProvider>,
    pub cast: Vec<CastEntry>,
    pub details: MediaDetails,
}

/// Final pipeline output handed back to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRecommendationSet {
    /// Records in generator order
    pub records: Vec<MediaRecord>,
    /// Enrichment keyed by record identity
    pub enrichments: HashMap<MediaId, EnrichmentBundle>,
    /// Conversational reply produced alongside the titles
    pub reply: String,
}

//! Artist records and the request bodies that create and change them.
//!
//! [`ArtistInfo`] is both the stored document and the JSON response body.
//! Its `id` is stored as `_id`.

use gostream_store::Entity;
use serde::{Deserialize, Serialize};

/// A stored artist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistInfo {
    /// Primary key (UUID v4, assigned on create).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Genres the artist is active in.
    pub genres: Vec<String>,
    /// Follower count.
    pub followers: u32,
    /// Derived statistics.
    pub stats: ArtistStats,
}

impl Entity for ArtistInfo {}

/// Artist statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ArtistStats {
    /// Popularity factor.
    pub popularity: f32,
}

/// Body of `POST /artists`. Absent fields take their zero value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateArtistRequest {
    /// Display name. Must not be blank.
    pub name: String,
    /// Genres. No entry may be blank.
    pub genres: Vec<String>,
    /// Initial follower count.
    pub followers: u32,
    /// Initial statistics.
    pub stats: ArtistStats,
}

impl CreateArtistRequest {
    /// Build the record to store under `id`.
    pub fn into_artist(self, id: String) -> ArtistInfo {
        ArtistInfo {
            id,
            name: self.name,
            genres: self.genres,
            followers: self.followers,
            stats: self.stats,
        }
    }
}

/// Body of `PUT /artists/{id}`. Only the fields present are changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArtistRequest {
    /// New display name.
    pub name: Option<String>,
    /// Replacement genre list.
    pub genres: Option<Vec<String>>,
    /// New follower count.
    pub followers: Option<u32>,
    /// Statistics to change.
    pub stats: Option<UpdateStatsRequest>,
}

/// Statistics part of [`UpdateArtistRequest`].
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UpdateStatsRequest {
    /// New popularity factor.
    pub popularity: Option<f32>,
}

/// Query string of `GET /artists`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListArtistsParams {
    /// Exact name to match.
    pub name: Option<String>,
    /// Maximum number of results. Unparsable values are ignored.
    pub limit: Option<String>,
}

impl ListArtistsParams {
    /// The effective limit; `0` when absent or not a non-negative integer.
    pub fn limit(&self) -> u32 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_defaults_missing_fields() {
        let body: Option<CreateArtistRequest> = serde_json::from_str(r#"{"name":"A"}"#).ok();
        let body = body.unwrap_or_default();
        assert_eq!(body.name, "A");
        assert!(body.genres.is_empty());
        assert_eq!(body.followers, 0);
    }

    #[test]
    fn update_body_distinguishes_absent_from_zero() {
        let body: Option<UpdateArtistRequest> =
            serde_json::from_str(r#"{"followers":0,"stats":{}}"#).ok();
        let body = body.unwrap_or_default();
        assert_eq!(body.followers, Some(0));
        assert!(body.name.is_none());
        assert!(body.stats.is_some_and(|s| s.popularity.is_none()));
    }

    #[test]
    fn artist_json_uses_plain_id() {
        let artist = CreateArtistRequest {
            name: String::from("A"),
            ..CreateArtistRequest::default()
        }
        .into_artist(String::from("a1"));
        let json = serde_json::to_value(&artist).ok();
        assert_eq!(
            json.as_ref().and_then(|v| v.get("id")).and_then(|v| v.as_str()),
            Some("a1")
        );
    }

    #[test]
    fn limit_parsing_ignores_garbage() {
        let params = |limit: Option<&str>| ListArtistsParams {
            name: None,
            limit: limit.map(str::to_owned),
        };
        assert_eq!(params(None).limit(), 0);
        assert_eq!(params(Some("5")).limit(), 5);
        assert_eq!(params(Some("five")).limit(), 0);
        assert_eq!(params(Some("-1")).limit(), 0);
    }
}

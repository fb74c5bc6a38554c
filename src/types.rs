use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub token: Option<Token>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackArtist {
    pub id: String,
    pub name: String,
}

/// A track as it flows through the pipeline. Immutable once collected.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<TrackArtist>,
    pub album_art_url: Option<String>,
    pub external_url: String,
}

/// A track together with its derived familiarity score (0-100). The score is
/// recomputed each session and never persisted remotely. Tracks whose scoring
/// failed carry the default of 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTrack {
    pub track: Track,
    pub familiarity: u8,
}

/// Per-track audio character, every dimension in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AudioFeatures {
    pub valence: f32,
    pub energy: f32,
    pub danceability: f32,
    pub acousticness: f32,
    pub instrumentalness: f32,
    pub liveness: f32,
}

/// The user's desired point in audio-feature space. Unset dimensions are not
/// constrained; `tolerance` applies uniformly across all set dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodTarget {
    pub valence: Option<f32>,
    pub energy: Option<f32>,
    pub danceability: Option<f32>,
    pub acousticness: Option<f32>,
    pub instrumentalness: Option<f32>,
    pub liveness: Option<f32>,
    pub tolerance: f32,
}

impl Default for MoodTarget {
    fn default() -> Self {
        MoodTarget {
            valence: None,
            energy: None,
            danceability: None,
            acousticness: None,
            instrumentalness: None,
            liveness: None,
            tolerance: 0.3,
        }
    }
}

impl MoodTarget {
    /// Returns true if every dimension set on the target deviates from the
    /// track's features by at most `tolerance`.
    pub fn matches(&self, features: &AudioFeatures) -> bool {
        let pairs = [
            (self.valence, features.valence),
            (self.energy, features.energy),
            (self.danceability, features.danceability),
            (self.acousticness, features.acousticness),
            (self.instrumentalness, features.instrumentalness),
            (self.liveness, features.liveness),
        ];

        pairs
            .into_iter()
            .filter_map(|(target, value)| target.map(|t| (t, value)))
            .all(|(target, value)| (value - target).abs() <= self.tolerance)
    }
}

/// What the user asked the mood filter to keep. An empty genre set disables
/// genre filtering entirely.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub familiarity_threshold: u8,
    pub selected_genres: HashSet<String>,
    pub mood: MoodTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// Outcome of a playlist build, including how many tracks were added.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistBuildResult {
    pub playlist_id: String,
    pub external_url: String,
    pub added: usize,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub title: String,
    pub artists: String,
    pub familiarity: u8,
}

// --- Spotify wire types ---

/// One page of saved-tracks or playlist-tracks items. Both endpoints share
/// this shape; `track` may be null and ids/names may be missing for local
/// or removed tracks, which the collector skips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPageResponse {
    pub items: Vec<TrackEntry>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackEntry {
    pub track: Option<TrackObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackObject {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    pub album: Option<AlbumRef>,
    pub external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumRef {
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeveralArtistsResponse {
    pub artists: Vec<Option<FullArtist>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<AudioFeaturesObject>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesObject {
    pub id: String,
    #[serde(flatten)]
    pub features: AudioFeatures,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentlyPlayedResponse {
    pub items: Vec<PlayHistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayHistoryEntry {
    pub track: Option<TrackObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopTracksResponse {
    pub items: Vec<TrackObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: String,
    pub name: String,
    pub external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksResponse {
    pub snapshot_id: String,
}

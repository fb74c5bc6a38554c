//! # Spotify Integration Module
//!
//! This module provides the interface to the Spotify Web API, implementing
//! authentication, data retrieval, and playlist management functionality. It
//! serves as the integration layer between EchoMood and Spotify's services,
//! handling all HTTP communication, authentication flows, error handling, and
//! rate limiting.
//!
//! ## Architecture
//!
//! The module follows a feature-based organization where each submodule covers
//! one domain of the Web API:
//!
//! ```text
//! Application Layer (CLI, Pipeline)
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (OAuth 2.0 PKCE)
//!     ├── Track Collection (saved tracks, playlist tracks)
//!     ├── Artist Metadata (genres)
//!     ├── Audio Features
//!     ├── Listening History (recently played, top tracks)
//!     └── Playlist Operations (create, add tracks)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Core Modules
//!
//! - [`auth`] - OAuth 2.0 PKCE flow: verifier/challenge generation, browser
//!   launch, local callback server and the code-for-token exchange. No client
//!   secret is stored; tokens are persisted in the local data directory and
//!   refreshed with a 4-minute expiry buffer.
//! - [`tracks`] - Offset/limit pagination over the user's saved tracks and
//!   over a playlist's tracks. Page responses carry the source's total count,
//!   which the collector uses for progress reporting.
//! - [`artists`] - Batch retrieval of full artist objects (up to 50 ids per
//!   call), the only place track genres can be resolved from.
//! - [`features`] - Batch retrieval of audio features (up to 100 ids per
//!   call) for the mood filter.
//! - [`history`] - The two inputs of familiarity scoring: the 50 most
//!   recently played items and the top tracks of the `short_term` and
//!   `medium_term` windows.
//! - [`playlist`] - Playlist creation and sequential batched track adds
//!   (up to 100 URIs per call).
//!
//! ## Error Handling
//!
//! - **Rate limiting**: 429 responses are retried after the `Retry-After`
//!   delay when it is reasonable (≤ 120 seconds); excessive delays produce a
//!   warning instead.
//! - **Transient failures**: 502 Bad Gateway responses are retried after a
//!   fixed 10-second delay.
//! - **Everything else** is propagated as `reqwest::Error`; the pipeline
//!   decides per component whether to fail open or surface the error.
//!
//! ## API Coverage
//!
//! - `GET /me/tracks` - Saved tracks with pagination
//! - `GET /playlists/{id}/tracks` - Playlist tracks with pagination
//! - `GET /artists` - Batch artist lookup with genres
//! - `GET /audio-features` - Batch audio features lookup
//! - `GET /me/player/recently-played` - Recent listening history
//! - `GET /me/top/tracks` - Top tracks per time range
//! - `GET /me` - Current user profile
//! - `POST /users/{user_id}/playlists` - Create playlists
//! - `POST /playlists/{playlist_id}/tracks` - Add tracks to playlists
//! - `POST /api/token` - Token exchange and refresh

pub mod artists;
pub mod auth;
pub mod features;
pub mod history;
pub mod playlist;
pub mod tracks;

use std::collections::{HashMap, HashSet};

use tokio::sync::Mutex;

use crate::{
    Res,
    management::TokenManager,
    pipeline::{
        builder::{CreatedPlaylist, PlaylistSink},
        collect::{CatalogSource, TrackPageSource},
        filter::{FeatureSource, GenreSource},
        score::HistorySource,
    },
    types::{AudioFeatures, TrackPageResponse, Visibility},
};

use history::TimeRange;

/// Live implementation of the pipeline's collaborator traits, backed by the
/// Spotify Web API. Holds the token manager behind a mutex so the shared
/// reference the traits hand out can still refresh an expiring token.
pub struct WebCatalog {
    token: Mutex<TokenManager>,
}

impl WebCatalog {
    /// Loads the persisted token. Fails when the user has not run
    /// `echomood auth` yet.
    pub async fn connect() -> Result<Self, String> {
        let manager = TokenManager::load().await?;
        Ok(WebCatalog {
            token: Mutex::new(manager),
        })
    }

    async fn token(&self) -> String {
        self.token.lock().await.get_valid_token().await
    }
}

impl TrackPageSource for WebCatalog {
    async fn page(
        &self,
        source: &CatalogSource,
        limit: usize,
        offset: usize,
    ) -> Res<TrackPageResponse> {
        let token = self.token().await;
        let page = match source {
            CatalogSource::SavedTracks => tracks::saved_tracks_page(&token, limit, offset).await?,
            CatalogSource::Playlist(id) => {
                tracks::playlist_tracks_page(&token, id, limit, offset).await?
            }
        };
        Ok(page)
    }
}

impl HistorySource for WebCatalog {
    async fn recent_play_counts(&self) -> Res<HashMap<String, u32>> {
        let token = self.token().await;
        let recent = history::recently_played(&token).await?;

        let mut counts: HashMap<String, u32> = HashMap::new();
        for entry in recent.items {
            if let Some(id) = entry.track.and_then(|t| t.id) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn top_track_ids(&self, range: TimeRange) -> Res<HashSet<String>> {
        let token = self.token().await;
        let top = history::top_tracks(&token, range).await?;
        Ok(top.items.into_iter().filter_map(|t| t.id).collect())
    }
}

impl GenreSource for WebCatalog {
    async fn artist_genres(&self, artist_ids: &[String]) -> Res<HashMap<String, Vec<String>>> {
        let token = self.token().await;
        let response = artists::several_artists(&token, artist_ids).await?;
        Ok(response
            .artists
            .into_iter()
            .flatten()
            .map(|artist| (artist.id, artist.genres))
            .collect())
    }
}

impl FeatureSource for WebCatalog {
    async fn audio_features(&self, track_ids: &[String]) -> Res<HashMap<String, AudioFeatures>> {
        let token = self.token().await;
        let response = features::audio_features(&token, track_ids).await?;
        Ok(response
            .audio_features
            .into_iter()
            .flatten()
            .map(|object| (object.id, object.features))
            .collect())
    }
}

impl PlaylistSink for WebCatalog {
    async fn create_playlist(&self, name: &str, visibility: Visibility) -> Res<CreatedPlaylist> {
        let token = self.token().await;
        let user_id = playlist::current_user(&token).await?.id;
        let created = playlist::create(&token, &user_id, name, visibility.is_public()).await?;

        let external_url = created
            .external_urls
            .and_then(|urls| urls.spotify)
            .unwrap_or_else(|| format!("https://open.spotify.com/playlist/{}", created.id));

        Ok(CreatedPlaylist {
            id: created.id,
            external_url,
        })
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Res<()> {
        let token = self.token().await;
        playlist::add_tracks(&token, playlist_id, track_ids).await?;
        Ok(())
    }
}

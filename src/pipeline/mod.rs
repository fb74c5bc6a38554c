//! # Filtering Pipeline
//!
//! The core of EchoMood: a four-stage pipeline that turns a remote catalog
//! into a mood-matched playlist.
//!
//! ```text
//! Catalog Collector → Familiarity Scorer → Mood Filter → Playlist Builder
//! ```
//!
//! - [`collect`] pages through a catalog source (saved tracks or a playlist)
//!   and assembles a flat track list, skipping malformed entries and
//!   reporting progress along the way.
//! - [`score`] derives a 0-100 familiarity score per track from recent play
//!   counts and top-track membership, with an injectable random fallback for
//!   the degraded case where no history is available.
//! - [`filter`] narrows the scored list by familiarity threshold, genre
//!   overlap and audio-feature distance from a mood target. Every remote
//!   failure inside the filter fails open so a service hiccup never empties
//!   the result.
//! - [`builder`] shuffles, truncates and submits the final list as a new
//!   remote playlist in sequential batches.
//!
//! Each stage talks to the catalog through a small trait
//! ([`collect::TrackPageSource`], [`score::HistorySource`],
//! [`filter::GenreSource`], [`filter::FeatureSource`],
//! [`builder::PlaylistSink`]), all implemented by
//! [`crate::spotify::WebCatalog`] for live use and by stubs in the tests.
//! The pipeline itself is synchronous request/response logic: batches are
//! awaited one after the other, never fanned out.
//!
//! Per-user state lives in an explicit [`MixSession`] owned by the caller;
//! there are no process-wide singletons.

pub mod builder;
pub mod collect;
pub mod filter;
pub mod score;

use std::collections::HashMap;

use crate::types::{FilterCriteria, ScoredTrack, Track};

/// In-memory state of one filtering session: the collected tracks with their
/// scores, the most recent filter result, and the criteria that produced it.
/// Single caller, single mutator; discarded when the session ends.
#[derive(Debug, Default)]
pub struct MixSession {
    tracks: Vec<ScoredTrack>,
    filtered: Vec<ScoredTrack>,
    criteria: FilterCriteria,
}

impl MixSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches familiarity scores to the collected tracks. Tracks missing
    /// from the score map carry the default of 0, so everything entering the
    /// mood filter has a score.
    pub fn load(&mut self, tracks: Vec<Track>, scores: &HashMap<String, u8>) {
        self.tracks = tracks
            .into_iter()
            .map(|track| {
                let familiarity = scores.get(&track.id).copied().unwrap_or(0);
                ScoredTrack { track, familiarity }
            })
            .collect();
        self.filtered.clear();
    }

    pub fn tracks(&self) -> &[ScoredTrack] {
        &self.tracks
    }

    /// Runs the mood filter over the session's tracks and remembers both the
    /// criteria and the result.
    pub async fn apply_filter(
        &mut self,
        criteria: FilterCriteria,
        genres: &impl filter::GenreSource,
        features: &impl filter::FeatureSource,
    ) -> &[ScoredTrack] {
        self.filtered = filter::filter(&self.tracks, &criteria, genres, features).await;
        self.criteria = criteria;
        &self.filtered
    }

    pub fn filtered(&self) -> &[ScoredTrack] {
        &self.filtered
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }
}

use std::collections::{HashMap, HashSet};

use crate::{
    Res,
    types::{AudioFeatures, FilterCriteria, ScoredTrack},
};

/// Batch limit of the artists endpoint.
pub const ARTIST_BATCH_SIZE: usize = 50;
/// Batch limit of the audio-features endpoint.
pub const FEATURE_BATCH_SIZE: usize = 100;

/// Resolves artist ids to genre lists. Implemented by
/// [`crate::spotify::WebCatalog`] and by stubs in tests.
pub trait GenreSource {
    async fn artist_genres(&self, artist_ids: &[String]) -> Res<HashMap<String, Vec<String>>>;
}

/// Resolves track ids to audio features. Tracks without analysis data are
/// simply absent from the returned map.
pub trait FeatureSource {
    async fn audio_features(&self, track_ids: &[String]) -> Res<HashMap<String, AudioFeatures>>;
}

/// Narrows a scored track list by the user's criteria in three sequential,
/// order-preserving passes: familiarity threshold, genre overlap, audio
/// features.
///
/// The filter is deliberately lossy-safe. Upstream service errors never
/// empty the result: a failed genre lookup skips the genre pass, a failed
/// feature batch keeps that whole batch, and tracks with unknown features
/// are kept unconditionally. The result only shrinks to empty when the
/// user's explicit criteria are genuinely unmet by every track's known data.
///
/// The genre pass additionally falls back to its own input whenever it would
/// eliminate every remaining track, so selecting genres can never zero out
/// the result on its own.
pub async fn filter(
    tracks: &[ScoredTrack],
    criteria: &FilterCriteria,
    genres: &impl GenreSource,
    features: &impl FeatureSource,
) -> Vec<ScoredTrack> {
    let survivors = familiarity_pass(tracks, criteria);
    let survivors = genre_pass(survivors, criteria, genres).await;
    feature_pass(survivors, criteria, features).await
}

fn familiarity_pass(tracks: &[ScoredTrack], criteria: &FilterCriteria) -> Vec<ScoredTrack> {
    tracks
        .iter()
        .filter(|t| t.familiarity >= criteria.familiarity_threshold)
        .cloned()
        .collect()
}

/// Keeps tracks whose genre set (union over their artists' genres,
/// case-insensitive) intersects the selected genres. No-op when no genres
/// are selected, when the lookup fails, or when the pass would eliminate
/// every remaining track.
async fn genre_pass(
    tracks: Vec<ScoredTrack>,
    criteria: &FilterCriteria,
    genres: &impl GenreSource,
) -> Vec<ScoredTrack> {
    if criteria.selected_genres.is_empty() || tracks.is_empty() {
        return tracks;
    }

    let selected: HashSet<String> = criteria
        .selected_genres
        .iter()
        .map(|g| g.to_lowercase())
        .collect();

    let mut artist_ids: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for track in &tracks {
        for artist in &track.track.artists {
            if seen.insert(artist.id.as_str()) {
                artist_ids.push(artist.id.clone());
            }
        }
    }

    let mut genres_by_artist: HashMap<String, Vec<String>> = HashMap::new();
    for chunk in artist_ids.chunks(ARTIST_BATCH_SIZE) {
        match genres.artist_genres(chunk).await {
            Ok(resolved) => genres_by_artist.extend(resolved),
            // fail open: without genre data the pass cannot filter fairly
            Err(_) => return tracks,
        }
    }

    let kept: Vec<ScoredTrack> = tracks
        .iter()
        .filter(|t| {
            t.track.artists.iter().any(|artist| {
                genres_by_artist
                    .get(&artist.id)
                    .is_some_and(|genres| genres.iter().any(|g| selected.contains(&g.to_lowercase())))
            })
        })
        .cloned()
        .collect();

    // a genre selection that matches nothing becomes a no-op instead of
    // emptying the result
    if kept.is_empty() { tracks } else { kept }
}

/// Keeps tracks whose known audio features sit within the mood target's
/// tolerance. Feature-unknown tracks and whole batches whose lookup failed
/// are kept.
async fn feature_pass(
    tracks: Vec<ScoredTrack>,
    criteria: &FilterCriteria,
    features: &impl FeatureSource,
) -> Vec<ScoredTrack> {
    if tracks.is_empty() {
        return tracks;
    }

    let mut kept: Vec<ScoredTrack> = Vec::with_capacity(tracks.len());

    for batch in tracks.chunks(FEATURE_BATCH_SIZE) {
        let ids: Vec<String> = batch.iter().map(|t| t.track.id.clone()).collect();

        match features.audio_features(&ids).await {
            Ok(resolved) => {
                for track in batch {
                    match resolved.get(&track.track.id) {
                        Some(f) => {
                            if criteria.mood.matches(f) {
                                kept.push(track.clone());
                            }
                        }
                        // feature unknown: keep
                        None => kept.push(track.clone()),
                    }
                }
            }
            // fail open at the batch level
            Err(_) => kept.extend(batch.iter().cloned()),
        }
    }

    kept
}

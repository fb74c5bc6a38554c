use rand::seq::SliceRandom;

use crate::{
    Res,
    error::PipelineError,
    types::{PlaylistBuildResult, ScoredTrack, Visibility},
};

/// Batch limit of the add-tracks endpoint.
pub const ADD_TRACKS_BATCH_SIZE: usize = 100;

/// A freshly created, still empty remote playlist.
#[derive(Debug, Clone)]
pub struct CreatedPlaylist {
    pub id: String,
    pub external_url: String,
}

/// Remote playlist operations. Implemented by
/// [`crate::spotify::WebCatalog`] and by stubs in tests.
pub trait PlaylistSink {
    async fn create_playlist(&self, name: &str, visibility: Visibility) -> Res<CreatedPlaylist>;
    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Res<()>;
}

/// Creates a remote playlist from the filtered track list.
///
/// Optionally shuffles the *full* filtered set, then truncates to `count`
/// (shuffle-then-truncate; asking for more tracks than available returns
/// them all). Tracks are added sequentially in batches of up to 100; an
/// error on any batch surfaces immediately as
/// [`PipelineError::PlaylistUpdate`] with the number of tracks that were
/// already added.
pub async fn build(
    tracks: &[ScoredTrack],
    name: &str,
    count: usize,
    shuffle: bool,
    visibility: Visibility,
    sink: &impl PlaylistSink,
) -> Result<PlaylistBuildResult, PipelineError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PipelineError::InvalidName);
    }

    let mut track_ids: Vec<String> = tracks.iter().map(|t| t.track.id.clone()).collect();
    if shuffle {
        track_ids.shuffle(&mut rand::rng());
    }
    track_ids.truncate(count);

    let playlist = sink
        .create_playlist(name, visibility)
        .await
        .map_err(|e| PipelineError::PlaylistCreate(e.to_string()))?;

    let mut added = 0;
    for batch in track_ids.chunks(ADD_TRACKS_BATCH_SIZE) {
        sink.add_tracks(&playlist.id, batch)
            .await
            .map_err(|e| PipelineError::PlaylistUpdate {
                added,
                reason: e.to_string(),
            })?;
        added += batch.len();
    }

    Ok(PlaylistBuildResult {
        playlist_id: playlist.id,
        external_url: playlist.external_url,
        added,
    })
}

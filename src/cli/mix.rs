use std::collections::HashSet;

use tabled::Table;

use crate::{
    error,
    error::PipelineError,
    info,
    pipeline::{MixSession, builder},
    spotify::WebCatalog,
    success,
    types::{FilterCriteria, MoodTarget, TrackTableRow, Visibility},
    utils, warning,
};

use super::tracks::{collect_with_progress, resolve_source, score_collected_seeded};

/// Everything the mix command needs from the user: the source, the filter
/// criteria, and (optionally) the playlist to create from the result.
#[derive(Debug, Clone)]
pub struct MixRequest {
    pub playlist: Option<String>,
    pub threshold: u8,
    pub genres: Vec<String>,
    pub mood: MoodTarget,
    pub name: Option<String>,
    pub count: usize,
    pub shuffle: bool,
    pub public: bool,
    pub seed: Option<u64>,
}

/// Runs the full pipeline: collect, score, filter, and - when a playlist
/// name was given - build the remote playlist. Without a name this is a dry
/// run that prints the filtered list.
pub async fn mix(request: MixRequest) {
    let catalog = match WebCatalog::connect().await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(
                "Failed to load token. Please run echomood auth\n Error: {}",
                e
            );
        }
    };

    let source = match resolve_source(request.playlist.clone()) {
        Ok(source) => source,
        Err(e) => error!("{}", e),
    };

    let collected = match collect_with_progress(&source, &catalog).await {
        Ok(tracks) => tracks,
        Err(PipelineError::EmptySource) => {
            warning!("The selected source contains no tracks.");
            return;
        }
        Err(e) => error!("{}", e),
    };

    info!("Collected {} tracks. Scoring familiarity...", collected.len());
    let scores = score_collected_seeded(&collected, &catalog, request.seed).await;

    let criteria = FilterCriteria {
        familiarity_threshold: request.threshold,
        selected_genres: request
            .genres
            .iter()
            .map(|g| g.to_lowercase())
            .collect::<HashSet<String>>(),
        mood: request.mood,
    };

    let mut session = MixSession::new();
    session.load(collected, &scores);

    info!("Filtering {} tracks...", session.tracks().len());
    session.apply_filter(criteria, &catalog, &catalog).await;

    if session.filtered().is_empty() {
        warning!("No tracks matched your criteria. Try a lower threshold or a wider tolerance.");
        return;
    }

    success!(
        "{} of {} tracks matched.",
        session.filtered().len(),
        session.tracks().len()
    );

    let Some(name) = request.name else {
        // dry run: show what would end up in the playlist
        let mut rows: Vec<TrackTableRow> = session
            .filtered()
            .iter()
            .map(|t| TrackTableRow {
                title: t.track.name.clone(),
                artists: utils::join_artist_names(&t.track.artists),
                familiarity: t.familiarity,
            })
            .collect();
        utils::sort_track_rows(&mut rows);
        println!("{}", Table::new(rows));
        info!("Pass --name to create a playlist from this result.");
        return;
    };

    let visibility = if request.public {
        Visibility::Public
    } else {
        Visibility::Private
    };

    match builder::build(
        session.filtered(),
        &name,
        request.count,
        request.shuffle,
        visibility,
        &catalog,
    )
    .await
    {
        Ok(result) => {
            success!("Playlist created with {} tracks.", result.added);
            info!("Listen at {}", result.external_url);
        }
        Err(PipelineError::PlaylistUpdate { added, reason }) => {
            warning!(
                "Playlist left incomplete: {} tracks were added before the failure ({}).",
                added,
                reason
            );
        }
        Err(e) => error!("{}", e),
    }
}

use std::collections::HashSet;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    error, info,
    error::PipelineError,
    pipeline::{
        collect::{self, CatalogSource},
        score::{self, RandomFallback},
    },
    spotify::WebCatalog,
    types::{Track, TrackTableRow},
    utils, warning,
};

/// Collects the selected source, scores it for familiarity and prints the
/// result as a table sorted by score.
pub async fn tracks(playlist: Option<String>) {
    let catalog = match WebCatalog::connect().await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(
                "Failed to load token. Please run echomood auth\n Error: {}",
                e
            );
        }
    };

    let source = match resolve_source(playlist) {
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
    let scores = score_collected(&collected, &catalog).await;

    let mut rows: Vec<TrackTableRow> = collected
        .iter()
        .map(|track| TrackTableRow {
            title: track.name.clone(),
            artists: utils::join_artist_names(&track.artists),
            familiarity: scores.get(&track.id).copied().unwrap_or(0),
        })
        .collect();
    utils::sort_track_rows(&mut rows);

    let table = Table::new(rows);
    println!("{}", table);
}

pub(super) fn resolve_source(playlist: Option<String>) -> Result<CatalogSource, PipelineError> {
    match playlist {
        Some(url) => CatalogSource::from_playlist_url(&url),
        None => Ok(CatalogSource::SavedTracks),
    }
}

pub(super) async fn collect_with_progress(
    source: &CatalogSource,
    catalog: &WebCatalog,
) -> Result<Vec<Track>, PipelineError> {
    let pb = ProgressBar::new_spinner();
    pb.set_message("Collecting tracks...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let result = collect::collect(source, catalog, |collected, total| {
        pb.set_message(format!("Collected {} of {} tracks...", collected, total));
    })
    .await;

    pb.finish_and_clear();
    result
}

pub(super) async fn score_collected(
    tracks: &[Track],
    catalog: &WebCatalog,
) -> std::collections::HashMap<String, u8> {
    score_collected_seeded(tracks, catalog, None).await
}

pub(super) async fn score_collected_seeded(
    tracks: &[Track],
    catalog: &WebCatalog,
    seed: Option<u64>,
) -> std::collections::HashMap<String, u8> {
    let history = score::gather_history(catalog).await;
    if history.is_none() {
        warning!("Listening history unavailable, falling back to random familiarity scores.");
    }

    let ids: HashSet<String> = tracks.iter().map(|t| t.id.clone()).collect();
    let mut fallback = match seed {
        Some(seed) => RandomFallback::seeded(seed),
        None => RandomFallback::new(),
    };

    score::score_batch(&ids, history.as_ref(), &mut fallback)
}

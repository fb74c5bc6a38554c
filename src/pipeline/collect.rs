use std::time::Duration;

use tokio::time::sleep;

use crate::{
    Res,
    error::PipelineError,
    types::{Track, TrackArtist, TrackEntry, TrackPageResponse},
    utils,
};

/// Page size for the saved-tracks endpoint.
pub const SAVED_TRACKS_PAGE_SIZE: usize = 50;
/// Page size for the playlist-tracks endpoint.
pub const PLAYLIST_TRACKS_PAGE_SIZE: usize = 100;

const PAGE_ATTEMPTS: u32 = 3;
const PAGE_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Where the collector pulls tracks from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// The authenticated user's saved ("liked") tracks.
    SavedTracks,
    /// A playlist, identified by its opaque id.
    Playlist(String),
}

impl CatalogSource {
    /// Builds a playlist source from a user-supplied link. The id is the path
    /// segment following `/playlist/` with any query string stripped.
    pub fn from_playlist_url(url: &str) -> Result<Self, PipelineError> {
        utils::extract_playlist_id(url)
            .map(CatalogSource::Playlist)
            .ok_or_else(|| PipelineError::InvalidSource(url.to_string()))
    }

    pub fn page_size(&self) -> usize {
        match self {
            CatalogSource::SavedTracks => SAVED_TRACKS_PAGE_SIZE,
            CatalogSource::Playlist(_) => PLAYLIST_TRACKS_PAGE_SIZE,
        }
    }
}

/// Paginated access to a catalog source. Implemented by
/// [`crate::spotify::WebCatalog`] and by stubs in tests.
pub trait TrackPageSource {
    async fn page(
        &self,
        source: &CatalogSource,
        limit: usize,
        offset: usize,
    ) -> Res<TrackPageResponse>;
}

/// Collects every track of a source into a flat list.
///
/// Pages through the source until a page returns fewer raw items than
/// requested. Malformed entries (missing track object, id or name) are
/// skipped without aborting the collection. After each page, `progress` is
/// called with (tracks collected so far, total count from the first page's
/// metadata) so the caller can render a progress indicator.
///
/// # Errors
///
/// Each page is attempted up to 3 times with a fixed 2-second delay. A
/// first-page failure surfaces as [`PipelineError::Collection`]; a later-page
/// failure ends the collection early and returns whatever was gathered. A
/// source reporting zero total items yields [`PipelineError::EmptySource`],
/// which callers treat as a warning rather than a hard failure.
pub async fn collect(
    source: &CatalogSource,
    pages: &impl TrackPageSource,
    mut progress: impl FnMut(usize, u64),
) -> Result<Vec<Track>, PipelineError> {
    let limit = source.page_size();
    let mut tracks: Vec<Track> = Vec::new();
    let mut offset = 0;
    let mut total = 0;

    loop {
        let page = match fetch_page_with_retries(source, pages, limit, offset).await {
            Ok(page) => page,
            Err(e) if offset == 0 => return Err(PipelineError::Collection(e.to_string())),
            // keep the partial collection
            Err(_) => break,
        };

        if offset == 0 {
            total = page.total;
            if total == 0 {
                return Err(PipelineError::EmptySource);
            }
        }

        let fetched = page.items.len();
        for entry in page.items {
            if let Some(track) = sanitize_entry(entry) {
                tracks.push(track);
            }
        }
        progress(tracks.len(), total);

        if fetched < limit {
            break;
        }
        offset += limit;
    }

    Ok(tracks)
}

async fn fetch_page_with_retries(
    source: &CatalogSource,
    pages: &impl TrackPageSource,
    limit: usize,
    offset: usize,
) -> Res<TrackPageResponse> {
    let mut last_error: Option<Box<dyn std::error::Error + Send + Sync>> = None;

    for attempt in 0..PAGE_ATTEMPTS {
        if attempt > 0 {
            sleep(PAGE_RETRY_DELAY).await;
        }

        match pages.page(source, limit, offset).await {
            Ok(page) => return Ok(page),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.unwrap_or_else(|| "page fetch failed".into()))
}

/// Converts a raw page entry into a [`Track`], dropping malformed entries.
/// Artists without an id or name are dropped from the track rather than
/// invalidating it; a missing external URL falls back to the canonical
/// `open.spotify.com` form.
fn sanitize_entry(entry: TrackEntry) -> Option<Track> {
    let object = entry.track?;
    let id = object.id.filter(|id| !id.is_empty())?;
    let name = object.name.filter(|name| !name.is_empty())?;

    let artists = object
        .artists
        .into_iter()
        .filter_map(|a| match (a.id, a.name) {
            (Some(id), Some(name)) => Some(TrackArtist { id, name }),
            _ => None,
        })
        .collect();

    let album_art_url = object
        .album
        .and_then(|album| album.images.into_iter().next())
        .map(|image| image.url);

    let external_url = object
        .external_urls
        .and_then(|urls| urls.spotify)
        .unwrap_or_else(|| format!("https://open.spotify.com/track/{}", id));

    Some(Track {
        id,
        name,
        artists,
        album_art_url,
        external_url,
    })
}

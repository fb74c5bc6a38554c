use std::cmp::Ordering;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::types::{TrackArtist, TrackTableRow};

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Extracts the playlist id from a user-supplied playlist link: the path
/// segment following `/playlist/`, with any query string stripped. Returns
/// `None` when the link carries no such segment.
pub fn extract_playlist_id(url: &str) -> Option<String> {
    let rest = url.split("/playlist/").nth(1)?;
    let id = rest
        .split('?')
        .next()
        .unwrap_or_default()
        .split('/')
        .next()
        .unwrap_or_default();

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

pub fn join_artist_names(artists: &[TrackArtist]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn sort_track_rows(rows: &mut Vec<TrackTableRow>) {
    rows.sort_by(|a, b| {
        match b.familiarity.cmp(&a.familiarity) {
            Ordering::Equal => a.title.to_lowercase().cmp(&b.title.to_lowercase()), // secondary sort: title ascending
            other => other,
        }
    });
}

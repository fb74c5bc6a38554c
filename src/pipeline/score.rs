use std::collections::{HashMap, HashSet};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{Res, spotify::history::TimeRange};

const RECENT_PLAY_WEIGHT: u32 = 15;
const RECENT_BASE_CAP: u32 = 60;
const TOP_TRACK_BONUS: u32 = 40;

/// The two facts familiarity scoring is derived from: per-track play counts
/// over the user's 50 most recently played items, and top-track membership
/// over the short- and medium-term windows. `top_tracks` is `None` when the
/// top-track fetch failed; scoring then proceeds with a bonus of 0 instead
/// of failing the whole batch.
#[derive(Debug, Clone)]
pub struct ListeningHistory {
    pub recent_plays: HashMap<String, u32>,
    pub top_tracks: Option<HashSet<String>>,
}

impl ListeningHistory {
    /// Derives the 0-100 familiarity score for one track:
    /// `min(play_count * 15, 60)` plus a flat 40 for top-track membership,
    /// capped at 100. Deterministic given the two inputs.
    pub fn familiarity(&self, track_id: &str) -> u8 {
        let plays = self.recent_plays.get(track_id).copied().unwrap_or(0);
        let base = (plays * RECENT_PLAY_WEIGHT).min(RECENT_BASE_CAP);
        let bonus = match &self.top_tracks {
            Some(top) if top.contains(track_id) => TOP_TRACK_BONUS,
            _ => 0,
        };

        (base + bonus).min(100) as u8
    }
}

/// Access to the user's listening history. Implemented by
/// [`crate::spotify::WebCatalog`] and by stubs in tests.
pub trait HistorySource {
    async fn recent_play_counts(&self) -> Res<HashMap<String, u32>>;
    async fn top_track_ids(&self, range: TimeRange) -> Res<HashSet<String>>;
}

/// Assembles a [`ListeningHistory`] from the source, degrading instead of
/// failing:
///
/// - recently-played unavailable → `None` (callers fall back to random
///   scores for the whole batch)
/// - both top-track windows unavailable → history with `top_tracks: None`
///   (bonus 0 for every track)
/// - one window unavailable → membership from the window that answered
pub async fn gather_history(source: &impl HistorySource) -> Option<ListeningHistory> {
    let recent_plays = source.recent_play_counts().await.ok()?;

    let mut top_tracks: HashSet<String> = HashSet::new();
    let mut any_window = false;
    for range in [TimeRange::ShortTerm, TimeRange::MediumTerm] {
        if let Ok(ids) = source.top_track_ids(range).await {
            top_tracks.extend(ids);
            any_window = true;
        }
    }

    Some(ListeningHistory {
        recent_plays,
        top_tracks: any_window.then_some(top_tracks),
    })
}

/// Scoring strategy used when the listening history could not be fetched at
/// all. Injected so tests can substitute a deterministic stub.
pub trait FallbackScoring {
    fn score(&mut self, track_id: &str) -> u8;
}

/// Uniformly random scores in [0,100]. A weak stand-in for real familiarity,
/// kept so the tool still produces a usable mix when the history endpoints
/// are down.
pub struct RandomFallback {
    rng: StdRng,
}

impl RandomFallback {
    pub fn new() -> Self {
        RandomFallback {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        RandomFallback {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomFallback {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackScoring for RandomFallback {
    fn score(&mut self, _track_id: &str) -> u8 {
        self.rng.random_range(0..=100)
    }
}

/// Scores a batch of track ids against the listening history.
///
/// With `history` present every score is derived deterministically via
/// [`ListeningHistory::familiarity`]. With `history` absent (the whole
/// history fetch failed) every track receives a score from the fallback
/// strategy instead.
pub fn score_batch(
    track_ids: &HashSet<String>,
    history: Option<&ListeningHistory>,
    fallback: &mut impl FallbackScoring,
) -> HashMap<String, u8> {
    track_ids
        .iter()
        .map(|id| {
            let score = match history {
                Some(history) => history.familiarity(id),
                None => fallback.score(id),
            };
            (id.clone(), score)
        })
        .collect()
}

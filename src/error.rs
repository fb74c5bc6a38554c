//! Error taxonomy of the filtering pipeline.
//!
//! Only failures the user has to act on surface as `PipelineError`. Remote
//! failures inside scoring and filtering degrade fail-open instead: affected
//! tracks are kept and the caller gets a warning, never an empty result
//! caused by a service hiccup.

use thiserror::Error;

/// Errors surfaced by the collect / score / filter / build pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The very first page of the catalog source could not be fetched.
    /// Later page failures return the partial collection instead.
    #[error("failed to fetch the first page from the catalog: {0}")]
    Collection(String),

    /// The source is valid but contains no tracks. Callers treat this as a
    /// user-facing warning, not a hard failure.
    #[error("the selected source contains no tracks")]
    EmptySource,

    /// The supplied playlist reference does not contain a `/playlist/{id}`
    /// segment.
    #[error("not a valid playlist link: {0}")]
    InvalidSource(String),

    /// The playlist name is empty after trimming.
    #[error("playlist name must not be empty")]
    InvalidName,

    /// The remote playlist could not be created, so no tracks were added.
    #[error("failed to create the playlist: {0}")]
    PlaylistCreate(String),

    /// Adding a batch of tracks failed. `added` reports how many tracks made
    /// it into the playlist before the failing batch; partial success stays
    /// visible to the caller.
    #[error("failed to add tracks to the playlist ({added} already added): {reason}")]
    PlaylistUpdate { added: usize, reason: String },
}

//! # CLI Module
//!
//! This module provides the command-line interface layer for EchoMood, a
//! Spotify client that scores a user's library for familiarity and builds
//! mood-matched playlists. It implements all user-facing commands and
//! coordinates between the Spotify integration layer and the filtering
//! pipeline.
//!
//! ## Commands
//!
//! ### Authentication
//!
//! - [`auth`] - Initiates the Spotify OAuth authentication flow with PKCE
//!   security
//!
//! ### Library Inspection
//!
//! - [`tracks`] - Collects the user's saved tracks or a playlist's tracks and
//!   prints them with their familiarity scores
//!
//! ### Playlist Generation
//!
//! - [`mix`] - Runs the full pipeline (collect, score, filter, build) and
//!   optionally creates a playlist from the result
//!
//! ## Data Flow
//!
//! ```text
//! CLI Layer (user interaction, progress, tables)
//!     ↓
//! Pipeline Layer (collect → score → filter → build)
//!     ↓
//! Spotify Integration Layer (WebCatalog)
//!     ↓
//! Spotify Web API
//! ```
//!
//! Each command connects a [`crate::spotify::WebCatalog`] and drives the
//! pipeline with it, handling user feedback (progress spinners via
//! `indicatif`, tables via `tabled`, status lines via the logging macros)
//! and error presentation.
//!
//! ## Error Presentation
//!
//! The pipeline's fail-open posture carries through to the CLI: degraded
//! scoring and skipped filter passes surface as warnings while still showing
//! a usable result. Only unrecoverable situations (no stored token, a
//! first-page collection failure, an invalid playlist link) terminate the
//! command.

mod auth;
mod mix;
mod tracks;

pub use auth::auth;
pub use mix::{MixRequest, mix};
pub use tracks::tracks;

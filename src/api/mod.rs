//! # API Module
//!
//! HTTP endpoints for the temporary local server that EchoMood runs during
//! authentication. The server exists only to receive the OAuth redirect from
//! Spotify; everything else the tool does goes out over plain client requests.
//!
//! ## Endpoints
//!
//! - [`callback`] - Handles the OAuth redirect from Spotify's authorization
//!   server and completes the PKCE exchange, storing the obtained token in the
//!   shared auth state.
//! - [`health`] - Returns application status and version, useful to check
//!   whether the callback server came up before the browser redirect lands.
//!
//! Both endpoints are plain async functions wired into an [`axum`] router by
//! [`crate::server::start_api_server`].

mod callback;
mod health;

pub use callback::callback;
pub use health::health;

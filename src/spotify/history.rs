use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;

use crate::{
    config,
    types::{RecentlyPlayedResponse, TopTracksResponse},
};

/// Top-track time windows supported by the scorer. The API defines a third
/// window (`long_term`) which familiarity scoring does not use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    ShortTerm,
    MediumTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
        }
    }
}

/// Retrieves the user's 50 most recently played items.
///
/// The familiarity scorer counts per-track occurrences in this list; a track
/// played on repeat shows up multiple times and scores accordingly.
pub async fn recently_played(token: &str) -> Result<RecentlyPlayedResponse, reqwest::Error> {
    let api_url = format!(
        "{uri}/me/player/recently-played?limit=50",
        uri = &config::spotify_apiurl()
    );

    loop {
        let client = Client::new();
        let response = client.get(&api_url).bearer_auth(token).send().await;

        let response = match response {
            Ok(resp) => match resp.error_for_status() {
                Ok(valid_response) => valid_response,
                Err(err) => {
                    if let Some(status) = err.status() {
                        if status == StatusCode::BAD_GATEWAY {
                            sleep(Duration::from_secs(10)).await;
                            continue; // retry
                        }
                    }
                    return Err(err); // propagate other errors
                }
            },
            Err(err) => {
                return Err(err);
            } // network or reqwest error
        };

        return response.json::<RecentlyPlayedResponse>().await;
    }
}

/// Retrieves the user's top tracks for the given time window, capped at 50.
pub async fn top_tracks(
    token: &str,
    range: TimeRange,
) -> Result<TopTracksResponse, reqwest::Error> {
    let api_url = format!(
        "{uri}/me/top/tracks?time_range={range}&limit=50",
        uri = &config::spotify_apiurl(),
        range = range.as_str()
    );

    loop {
        let client = Client::new();
        let response = client.get(&api_url).bearer_auth(token).send().await;

        let response = match response {
            Ok(resp) => match resp.error_for_status() {
                Ok(valid_response) => valid_response,
                Err(err) => {
                    if let Some(status) = err.status() {
                        if status == StatusCode::BAD_GATEWAY {
                            sleep(Duration::from_secs(10)).await;
                            continue; // retry
                        }
                    }
                    return Err(err); // propagate other errors
                }
            },
            Err(err) => {
                return Err(err);
            } // network or reqwest error
        };

        return response.json::<TopTracksResponse>().await;
    }
}

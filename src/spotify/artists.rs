use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;

use crate::{config, types::SeveralArtistsResponse};

/// Retrieves full artist objects, including genre lists, for a batch of ids.
///
/// Combines up to 50 artist ids into a single `/artists` request (the API
/// limit for this endpoint). Unknown ids come back as null entries in the
/// response and are dropped by the caller.
///
/// # Arguments
///
/// * `token` - Valid access token for Spotify API authentication
/// * `artist_ids` - Artist ids to look up, at most 50 per call
///
/// # Retry Logic
///
/// Implements automatic retry for 502 Bad Gateway errors with a 10-second
/// delay. Other HTTP errors are propagated immediately to the caller.
pub async fn several_artists(
    token: &str,
    artist_ids: &[String],
) -> Result<SeveralArtistsResponse, reqwest::Error> {
    let ids = artist_ids
        .iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(",");

    let api_url = format!(
        "{uri}/artists?ids={ids}",
        uri = &config::spotify_apiurl(),
        ids = ids
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

        return response.json::<SeveralArtistsResponse>().await;
    }
}

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;

use crate::{config, types::AudioFeaturesResponse};

/// Retrieves audio features for a batch of track ids.
///
/// Combines up to 100 track ids into a single `/audio-features` request (the
/// API limit for this endpoint). Tracks without analysis data come back as
/// null entries; the mood filter treats those tracks as feature-unknown and
/// keeps them.
///
/// # Arguments
///
/// * `token` - Valid access token for Spotify API authentication
/// * `track_ids` - Track ids to look up, at most 100 per call
pub async fn audio_features(
    token: &str,
    track_ids: &[String],
) -> Result<AudioFeaturesResponse, reqwest::Error> {
    let ids = track_ids
        .iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(",");

    let api_url = format!(
        "{uri}/audio-features?ids={ids}",
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

        return response.json::<AudioFeaturesResponse>().await;
    }
}

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;

use crate::{config, types::TrackPageResponse, warning};

/// Retrieves one page of the authenticated user's saved tracks.
///
/// Uses offset/limit pagination against `/me/tracks`. The response carries
/// the library's total item count alongside the page items, which the
/// collector uses for progress reporting.
///
/// # Arguments
///
/// * `token` - Valid access token for Spotify API authentication
/// * `limit` - Page size (1-50)
/// * `offset` - Index of the first item to return
///
/// # Retry Logic
///
/// 502 Bad Gateway responses are retried after a 10-second delay. Other
/// errors are propagated immediately.
pub async fn saved_tracks_page(
    token: &str,
    limit: usize,
    offset: usize,
) -> Result<TrackPageResponse, reqwest::Error> {
    let api_url = format!(
        "{uri}/me/tracks?limit={limit}&offset={offset}",
        uri = &config::spotify_apiurl(),
        limit = limit,
        offset = offset
    );

    fetch_page(token, &api_url).await
}

/// Retrieves one page of a playlist's tracks.
///
/// Uses offset/limit pagination against `/playlists/{id}/tracks`. Entries
/// whose track object is null (removed or local tracks) are returned as-is;
/// the collector decides what to skip.
///
/// # Arguments
///
/// * `token` - Valid access token for Spotify API authentication
/// * `playlist_id` - Opaque playlist id extracted from the user's link
/// * `limit` - Page size (1-100)
/// * `offset` - Index of the first item to return
pub async fn playlist_tracks_page(
    token: &str,
    playlist_id: &str,
    limit: usize,
    offset: usize,
) -> Result<TrackPageResponse, reqwest::Error> {
    let api_url = format!(
        "{uri}/playlists/{id}/tracks?limit={limit}&offset={offset}",
        uri = &config::spotify_apiurl(),
        id = playlist_id,
        limit = limit,
        offset = offset
    );

    fetch_page(token, &api_url).await
}

async fn fetch_page(token: &str, api_url: &str) -> Result<TrackPageResponse, reqwest::Error> {
    loop {
        let client = Client::new();
        let response = client.get(api_url).bearer_auth(token).send().await?;

        // check for retry-after header
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            if let Some(retry_after) = response.headers().get("retry-after") {
                let retry_after = retry_after
                    .to_str()
                    .unwrap_or("0")
                    .parse::<u64>()
                    .unwrap_or(0);
                if retry_after <= 120 {
                    sleep(Duration::from_secs(retry_after)).await;
                    continue;
                }
                warning!(
                    "Retry after has reached an abnormal high of {} seconds. Try again later.",
                    retry_after
                );
            }
        }

        let response = match response.error_for_status() {
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
        };

        return response.json::<TrackPageResponse>().await;
    }
}

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;

use crate::{
    config,
    types::{
        AddTracksRequest, AddTracksResponse, CreatePlaylistRequest, CreatePlaylistResponse,
        CurrentUserResponse,
    },
};

/// Retrieves the authenticated user's profile, used to resolve the user id
/// that playlist creation requests are addressed to.
pub async fn current_user(token: &str) -> Result<CurrentUserResponse, reqwest::Error> {
    let api_url = format!("{uri}/me", uri = &config::spotify_apiurl());

    let client = Client::new();
    let response = client
        .get(&api_url)
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?;

    response.json::<CurrentUserResponse>().await
}

/// Creates a playlist owned by the given user.
///
/// The playlist starts out empty; tracks are appended afterwards via
/// [`add_tracks`]. Returns the created playlist's id and external URL.
pub async fn create(
    token: &str,
    user_id: &str,
    name: &str,
    public: bool,
) -> Result<CreatePlaylistResponse, reqwest::Error> {
    let api_url = format!(
        "{uri}/users/{user_id}/playlists",
        uri = &config::spotify_apiurl(),
        user_id = user_id
    );

    let body = CreatePlaylistRequest {
        name: name.to_string(),
        description: "Created with EchoMood".to_string(),
        public,
        collaborative: false,
    };

    loop {
        let client = Client::new();
        let response = client
            .post(&api_url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await;

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

        return response.json::<CreatePlaylistResponse>().await;
    }
}

/// Appends a batch of tracks to a playlist.
///
/// Track ids are converted into `spotify:track:{id}` URIs on the wire. The
/// endpoint accepts at most 100 URIs per call; the playlist builder chunks
/// accordingly and submits batches sequentially.
pub async fn add_tracks(
    token: &str,
    playlist_id: &str,
    track_ids: &[String],
) -> Result<AddTracksResponse, reqwest::Error> {
    let api_url = format!(
        "{uri}/playlists/{id}/tracks",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    );

    let body = AddTracksRequest {
        uris: track_ids
            .iter()
            .map(|id| format!("spotify:track:{}", id))
            .collect(),
    };

    let client = Client::new();
    let response = client
        .post(&api_url)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await?
        .error_for_status()?;

    response.json::<AddTracksResponse>().await
}

// Copyright 2026 The Mnemo Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP transport for the sync protocol.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::EngineError;
use crate::error::Result;
use crate::sync::envelope::BeginRequest;
use crate::sync::envelope::BeginResponse;
use crate::sync::envelope::PushRequest;
use crate::sync::envelope::PushResponse;

/// Environment variable holding the bearer token.
pub const TOKEN_ENV_VAR: &str = "MNEMO_SYNC_TOKEN";

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct SyncClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl SyncClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EngineError::Network(e.to_string()))?;
        let endpoint = endpoint.into();
        Ok(SyncClient {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub async fn begin(&self, request: &BeginRequest) -> Result<BeginResponse> {
        self.post("sync/begin", request).await
    }

    pub async fn push(&self, request: &PushRequest) -> Result<PushResponse> {
        self.post("sync/push", request).await
    }

    pub async fn fetch_media(&self, name: &str) -> Result<Vec<u8>> {
        let url = format!("{}/media/{name}", self.endpoint);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;
        let response = check_status(response)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    pub async fn push_media(&self, name: &str, contents: Vec<u8>) -> Result<()> {
        let url = format!("{}/media/{name}", self.endpoint);
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .body(contents)
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;
        check_status(response)?;
        Ok(())
    }

    /// POST with retry. Transient failures (connection errors, 5xx) are
    /// retried with exponential backoff; an authentication rejection is
    /// final on the first attempt.
    async fn post<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{path}", self.endpoint);
        let mut delay = BACKOFF_BASE;
        let mut last_failure = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                log::debug!("retrying {url} (attempt {attempt}) after {last_failure}");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            let sent = self
                .http
                .post(&url)
                .bearer_auth(&self.token)
                .json(request)
                .send()
                .await;
            match sent {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        return Err(EngineError::Auth(format!("server returned {status}")));
                    }
                    if status.is_server_error() {
                        last_failure = format!("status {status}");
                        continue;
                    }
                    if !status.is_success() {
                        return Err(EngineError::Network(format!("server returned {status}")));
                    }
                    return response
                        .json::<Resp>()
                        .await
                        .map_err(|e| EngineError::Network(format!("bad response body: {e}")));
                }
                Err(err) => {
                    last_failure = err.to_string();
                }
            }
        }
        Err(EngineError::Network(format!(
            "{url} failed after {MAX_ATTEMPTS} attempts: {last_failure}"
        )))
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(EngineError::Auth(format!("server returned {status}")));
    }
    if !status.is_success() {
        return Err(EngineError::Network(format!("server returned {status}")));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;
    use wiremock::matchers::header;
    use wiremock::matchers::method;
    use wiremock::matchers::path;

    use super::*;
    use crate::sync::envelope::ChangeBatch;

    fn begin_request() -> BeginRequest {
        BeginRequest {
            checkpoint: None,
            media: Default::default(),
        }
    }

    fn begin_body() -> serde_json::Value {
        serde_json::json!({
            "checkpoint": "c1",
            "batch": {"decks": [], "notes": [], "cards": [], "logs": []},
            "media_actions": [],
        })
    }

    #[tokio::test]
    async fn test_begin_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sync/begin"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(begin_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = SyncClient::new(server.uri(), "secret").unwrap();
        let response = client.begin(&begin_request()).await.unwrap();
        assert_eq!(response.checkpoint, "c1");
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sync/begin"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/sync/begin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(begin_body()))
            .mount(&server)
            .await;

        let client = SyncClient::new(server.uri(), "secret").unwrap();
        let response = client.begin(&begin_request()).await.unwrap();
        assert_eq!(response.checkpoint, "c1");
    }

    #[tokio::test]
    async fn test_auth_rejection_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sync/begin"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let client = SyncClient::new(server.uri(), "wrong").unwrap();
        let result = client.begin(&begin_request()).await;
        assert!(matches!(result, Err(EngineError::Auth(_))));
    }

    #[tokio::test]
    async fn test_push_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sync/push"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"checkpoint": "c2"})),
            )
            .mount(&server)
            .await;

        let client = SyncClient::new(server.uri(), "secret").unwrap();
        let response = client
            .push(&PushRequest {
                checkpoint: "c1".to_string(),
                batch: ChangeBatch::default(),
            })
            .await
            .unwrap();
        assert_eq!(response.checkpoint, "c2");
    }

    #[tokio::test]
    async fn test_media_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pixels".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/media/clip.mp3"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = SyncClient::new(server.uri(), "secret").unwrap();
        assert_eq!(client.fetch_media("img.png").await.unwrap(), b"pixels");
        client.push_media("clip.mp3", b"audio".to_vec()).await.unwrap();
    }
}

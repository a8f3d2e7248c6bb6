use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};

use crate::core::{IdolError, IdolStats, PersonaType, Result, StatDelta};

pub mod frame;
pub mod stream;

pub use frame::{FrameDecoder, StreamEvent};
pub use stream::{ChatStream, StreamState};

/// Backend reachability, decided by the health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    Online,
    Offline,
}

impl std::fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionMode::Online => write!(f, "online"),
            ConnectionMode::Offline => write!(f, "offline"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub backend: String,
    #[serde(default)]
    pub ollama: String,
}

impl HealthStatus {
    pub fn is_available(&self) -> bool {
        matches!(self.status.as_str(), "ok" | "degraded")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub bond_level: i32,
    pub kindness: i32,
    pub confidence: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub stats: RequestStats,
    pub persona: PersonaType,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, stats: &IdolStats) -> Self {
        ChatRequest {
            message: message.into(),
            stats: RequestStats {
                bond_level: stats.bond_level,
                kindness: stats.personality.kindness,
                confidence: stats.personality.confidence,
            },
            persona: stats.persona,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default, rename = "statChanges", alias = "statDelta")]
    pub stat_changes: StatDelta,
}

/// HTTP client for the chat backend
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        // No client-wide timeout: it would also cap how long a stream may run.
        let client = Client::builder()
            .connect_timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .client
            .get(self.url("/api/health"))
            .timeout(self.request_timeout)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Probe the backend once. Any failure reads as offline.
    pub async fn probe(&self) -> ConnectionMode {
        match self.health().await {
            Ok(health) if health.is_available() => {
                tracing::info!(status = %health.status, backend = %health.backend, ollama = %health.ollama, "backend online");
                ConnectionMode::Online
            }
            Ok(health) => {
                tracing::warn!(status = %health.status, "backend reported unhealthy");
                ConnectionMode::Offline
            }
            Err(e) => {
                tracing::warn!(error = %e, "health check failed, running offline");
                ConnectionMode::Offline
            }
        }
    }

    /// Single request/response exchange.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let response = self
            .client
            .post(self.url("/api/chat"))
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Open a streamed reply. Errors here are connect or status failures;
    /// read failures surface through the returned stream.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<ChatStream> {
        let response = self
            .client
            .post(self.url("/api/chat/stream"))
            .header(header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body = response
            .bytes_stream()
            .map(|read| read.map(|bytes| bytes.to_vec()).map_err(IdolError::from))
            .boxed();
        Ok(ChatStream::new(body))
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| "Unknown error".to_string());
    Err(IdolError::Status {
        status: status.as_u16(),
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PersonalityScore;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ChatClient {
        ChatClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn sample_stats() -> IdolStats {
        let personality = PersonalityScore { kindness: 30, confidence: -25 };
        IdolStats {
            bond_level: 44,
            personality,
            persona: personality.persona(),
        }
    }

    #[test]
    fn test_request_wire_format() {
        let request = ChatRequest::new("hello", &sample_stats());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "message": "hello",
                "stats": { "bondLevel": 44, "kindness": 30, "confidence": -25 },
                "persona": "gentle-shy"
            })
        );
    }

    #[tokio::test]
    async fn test_probe_ok_and_degraded_are_online() {
        for status in ["ok", "degraded"] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/api/health"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "status": status, "backend": "up", "ollama": "up"
                })))
                .mount(&server)
                .await;
            assert_eq!(client_for(&server).probe().await, ConnectionMode::Online);
        }
    }

    #[tokio::test]
    async fn test_probe_failures_are_offline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        assert_eq!(client_for(&server).probe().await, ConnectionMode::Offline);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "down", "backend": "up", "ollama": "down"
            })))
            .mount(&server)
            .await;
        assert_eq!(client_for(&server).probe().await, ConnectionMode::Offline);

        let unreachable = ChatClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        assert_eq!(unreachable.probe().await, ConnectionMode::Offline);
    }

    #[tokio::test]
    async fn test_chat_non_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({ "persona": "gentle-shy" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "Thanks!",
                "statChanges": { "bond": 3, "kindness": 1 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .chat(&ChatRequest::new("you did great", &sample_stats()))
            .await
            .unwrap();
        assert_eq!(reply.response, "Thanks!");
        assert_eq!(reply.stat_changes.bond, Some(3));
        assert_eq!(reply.stat_changes.kindness, Some(1));
        assert_eq!(reply.stat_changes.confidence, None);
    }

    #[tokio::test]
    async fn test_error_status_carries_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(serde_json::json!({ "detail": "model loading" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .chat(&ChatRequest::new("hi", &sample_stats()))
            .await
            .unwrap_err();
        match err {
            IdolError::Status { status, detail } => {
                assert_eq!(status, 503);
                assert_eq!(detail, "model loading");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_stream_chat_over_http() {
        let body = concat!(
            "data: {\"type\":\"chunk\",\"content\":\"Hi\"}\n",
            "data: not-json\n",
            "data: {\"type\":\"chunk\",\"content\":\" there\"}\n",
            "data: {\"type\":\"done\",\"statChanges\":{\"bond\":5}}\n",
            "data: [DONE]\n",
        );
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let mut stream = client_for(&server)
            .stream_chat(&ChatRequest::new("hi", &sample_stats()))
            .await
            .unwrap();
        let mut text = String::new();
        while let Some(event) = stream.next_event().await {
            if let StreamEvent::Chunk(chunk) = event.unwrap() {
                text.push_str(&chunk);
            }
        }
        assert_eq!(text, "Hi there");
        assert_eq!(
            stream.state(),
            &StreamState::Completed(StatDelta { bond: Some(5), ..Default::default() })
        );
    }

    #[tokio::test]
    async fn test_stream_chat_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/stream"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .stream_chat(&ChatRequest::new("hi", &sample_stats()))
            .await;
        assert!(matches!(result, Err(IdolError::Status { status: 502, .. })));
    }
}

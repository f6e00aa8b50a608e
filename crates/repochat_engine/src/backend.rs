use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use repochat_logging::{repochat_debug, repochat_trace};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::sse::SseDecoder;
use crate::{ChatReply, ChatRequest, ClientError, FailureKind, ProjectEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to the directory and chat requests only; the progress
    /// stream stays open until completion, failure or cancellation.
    pub request_timeout: Duration,
    pub chat: ChatTuning,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            chat: ChatTuning::default(),
        }
    }
}

/// Optional inference knobs forwarded to `/chat` as query parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatTuning {
    pub model_name: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub k: Option<u32>,
}

impl ChatTuning {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(model_name) = &self.model_name {
            pairs.push(("model_name", model_name.clone()));
        }
        if let Some(temperature) = self.temperature {
            pairs.push(("temperature", temperature.to_string()));
        }
        if let Some(top_p) = self.top_p {
            pairs.push(("top_p", top_p.to_string()));
        }
        if let Some(k) = self.k {
            pairs.push(("k", k.to_string()));
        }
        pairs
    }
}

/// How a progress stream stopped without a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    ServerClosed,
    Cancelled,
}

/// Receives raw progress frames in arrival order.
pub trait FrameSink: Send + Sync {
    fn frame(&self, raw: String);
}

#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<ProjectEntry>, ClientError>;

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ClientError>;

    /// Streams `GET /progress?repo_url=..` into `sink` until the server
    /// closes, the transport fails, or `cancel` fires.
    async fn stream_progress(
        &self,
        repo_url: &str,
        sink: &dyn FrameSink,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, ClientError> {
        let base = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn list_projects(&self) -> Result<Vec<ProjectEntry>, ClientError> {
        let url = self.endpoint("projectslist")?;
        repochat_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(&response)?;

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        let mut url = self.endpoint("chat")?;
        let pairs = self.settings.chat.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        let payload = serde_json::to_vec(request)
            .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))?;
        repochat_debug!("POST {} project={}", url, request.project_name);

        let response = self
            .client
            .post(url)
            .timeout(self.settings.request_timeout)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(&response)?;

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))
    }

    async fn stream_progress(
        &self,
        repo_url: &str,
        sink: &dyn FrameSink,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd, ClientError> {
        let mut url = self.endpoint("progress")?;
        url.query_pairs_mut().append_pair("repo_url", repo_url);
        repochat_debug!("Subscribing to {}", url);

        let request = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
            response = request => response.map_err(map_reqwest_error)?,
        };
        ensure_success(&response)?;

        let mut decoder = SseDecoder::new();
        let mut body = response.bytes_stream();
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
                chunk = body.next() => chunk,
            };
            match chunk {
                Some(Ok(bytes)) => {
                    repochat_trace!("Progress chunk of {} bytes", bytes.len());
                    for frame in decoder.feed(&bytes) {
                        sink.frame(frame);
                    }
                }
                Some(Err(err)) => return Err(map_reqwest_error(err)),
                None => {
                    for frame in decoder.finish() {
                        sink.frame(frame);
                    }
                    return Ok(StreamEnd::ServerClosed);
                }
            }
        }
    }
}

/// Parses the configured base URL so that endpoint names join below any
/// path prefix it carries.
fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let base = Url::parse(&normalized)
        .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(ClientError::new(
            FailureKind::InvalidUrl,
            format!("{raw} cannot be used as a base url"),
        ));
    }
    Ok(base)
}

fn ensure_success(response: &reqwest::Response) -> Result<(), ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ClientError::new(FailureKind::Decode, err.to_string());
    }
    ClientError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_below_base_path() {
        let base = parse_base_url("http://localhost:8000/api").expect("base");
        assert_eq!(
            base.join("projectslist").expect("join").as_str(),
            "http://localhost:8000/api/projectslist"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert_eq!(
            parse_base_url("not a url").unwrap_err().kind,
            FailureKind::InvalidUrl
        );
        assert_eq!(
            parse_base_url("mailto:someone@example.com").unwrap_err().kind,
            FailureKind::InvalidUrl
        );
    }

    #[test]
    fn tuning_only_sends_configured_values() {
        assert!(ChatTuning::default().query_pairs().is_empty());
        let tuning = ChatTuning {
            model_name: Some("gpt-4o-mini".to_string()),
            k: Some(20),
            ..ChatTuning::default()
        };
        assert_eq!(
            tuning.query_pairs(),
            vec![
                ("model_name", "gpt-4o-mini".to_string()),
                ("k", "20".to_string())
            ]
        );
    }
}

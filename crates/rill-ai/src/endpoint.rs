//! Inference endpoint: opens one streaming request per submit

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Error, Result},
    stream::ByteStream,
    types::{ChatRequest, EndpointKind},
};

/// Base URL of a locally hosted backend
pub const DEFAULT_BASE_URL: &str = "http://localhost:5088";

/// Trait for inference backends
#[async_trait]
pub trait InferenceEndpoint: Send + Sync {
    /// Request encoding this endpoint uses
    fn kind(&self) -> EndpointKind;

    /// Send `request` and return the response body as raw reads.
    ///
    /// Once `cancel` fires, the returned stream (or the pending send) ends
    /// with [`Error::Aborted`].
    async fn open(&self, request: &ChatRequest, cancel: CancellationToken) -> Result<ByteStream>;
}

/// Connection settings for [`HttpEndpoint`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub base_url: String,
    pub kind: EndpointKind,
    /// Model name sent in the JSON body of analyze requests
    pub analyze_model: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            kind: EndpointKind::default(),
            analyze_model: String::new(),
        }
    }
}

/// HTTP client for the chat backend
pub struct HttpEndpoint {
    client: reqwest::Client,
    config: EndpointConfig,
}

impl HttpEndpoint {
    /// Create a new endpoint client
    pub fn new(mut config: EndpointConfig) -> Result<Self> {
        let base = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                config.base_url
            )));
        }
        config.base_url = base;

        Ok(Self {
            client: reqwest::Client::new(),
            config,
        })
    }

    /// Full URL requests are sent to
    pub fn url(&self) -> String {
        format!("{}{}", self.config.base_url, self.config.kind.path())
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    fn build_request(&self, request: &ChatRequest) -> Result<reqwest::RequestBuilder> {
        let url = self.url();

        match self.config.kind {
            EndpointKind::Chat => {
                let mut form = reqwest::multipart::Form::new()
                    .text("prompt", request.prompt.clone())
                    .text("model", request.model.to_string());

                if let Some(ref attachment) = request.attachment {
                    let part = reqwest::multipart::Part::bytes(attachment.data.clone())
                        .file_name(attachment.file_name.clone())
                        .mime_str(&attachment.mime_type)?;
                    form = form.part("attachment", part);
                }

                Ok(self.client.post(url).multipart(form))
            }
            EndpointKind::Analyze => {
                if let Some(name) = request.attachment_name() {
                    tracing::warn!(
                        "Analyze endpoint does not accept files, dropping attachment '{}'",
                        name
                    );
                }

                let body = AnalyzeRequest {
                    model: &self.config.analyze_model,
                    prompt: &request.prompt,
                };
                Ok(self.client.post(url).json(&body))
            }
        }
    }
}

#[async_trait]
impl InferenceEndpoint for HttpEndpoint {
    fn kind(&self) -> EndpointKind {
        self.config.kind
    }

    async fn open(&self, request: &ChatRequest, cancel: CancellationToken) -> Result<ByteStream> {
        let builder = self.build_request(request)?;
        tracing::debug!(
            "POST {} (model {}, attachment: {})",
            self.url(),
            request.model,
            request.attachment_name().unwrap_or("none")
        );

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Aborted),
            result = builder.send() => result?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Aborted),
                text = response.text() => text.unwrap_or_default(),
            };
            return Err(Error::status(status.as_u16(), body));
        }

        Ok(Box::pin(body_stream(response, cancel)))
    }
}

fn body_stream(
    response: reqwest::Response,
    cancel: CancellationToken,
) -> impl futures::Stream<Item = Result<Vec<u8>>> {
    stream! {
        let mut body = response.bytes_stream();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                chunk = body.next() => Some(chunk),
            };

            match next {
                None => {
                    yield Err(Error::Aborted);
                    return;
                }
                Some(Some(Ok(bytes))) => yield Ok(bytes.to_vec()),
                Some(Some(Err(e))) => {
                    yield Err(Error::from(e));
                    return;
                }
                Some(None) => return,
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelSelector;
    use crate::stream::{Frame, decode_frames};
    use crate::types::Attachment;
    use mockito::{Matcher, Server};

    fn endpoint(server: &Server, kind: EndpointKind) -> HttpEndpoint {
        HttpEndpoint::new(EndpointConfig {
            base_url: server.url(),
            kind,
            analyze_model: String::new(),
        })
        .unwrap()
    }

    fn streamed_body() -> String {
        [
            Frame::delta("Hi"),
            Frame::delta(" there"),
            Frame::done(),
        ]
        .iter()
        .map(Frame::to_line)
        .collect()
    }

    async fn read_all(stream: ByteStream) -> Vec<u8> {
        let chunks: Vec<Result<Vec<u8>>> = stream.collect().await;
        chunks.into_iter().flat_map(|c| c.unwrap()).collect()
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let err = HttpEndpoint::new(EndpointConfig {
            base_url: "localhost:5088".into(),
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_url_joins_base_and_kind_path() {
        let endpoint = HttpEndpoint::new(EndpointConfig {
            base_url: "http://localhost:5088/".into(),
            kind: EndpointKind::Analyze,
            analyze_model: String::new(),
        })
        .unwrap();
        assert_eq!(endpoint.url(), "http://localhost:5088/api/chats/analyze");
    }

    #[tokio::test]
    async fn test_analyze_sends_json_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chats/analyze")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "model": "",
                "prompt": "Who joined in 2023?"
            })))
            .with_status(200)
            .with_body(streamed_body())
            .create_async()
            .await;

        let endpoint = endpoint(&server, EndpointKind::Analyze);
        let request = ChatRequest::new("Who joined in 2023?", ModelSelector(1));
        let stream = endpoint
            .open(&request, CancellationToken::new())
            .await
            .unwrap();

        let frames: Vec<Frame> = decode_frames(stream)
            .map(|f| f.unwrap())
            .collect()
            .await;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].content, "Hi");
        assert!(frames[2].done);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_sends_multipart_form() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chats")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="prompt"\r\n\r\nSummarize this\r\n"#.to_string()),
                Matcher::Regex(r#"name="model"\r\n\r\n2\r\n"#.to_string()),
                Matcher::Regex(r#"name="attachment"; filename="notes.txt""#.to_string()),
                Matcher::Regex("buy milk".to_string()),
            ]))
            .with_status(200)
            .with_body(streamed_body())
            .create_async()
            .await;

        let endpoint = endpoint(&server, EndpointKind::Chat);
        let request = ChatRequest::new("Summarize this", ModelSelector(2)).with_attachment(
            Attachment::new("notes.txt", b"buy milk".to_vec()).with_mime_type("text/plain"),
        );
        let stream = endpoint
            .open(&request, CancellationToken::new())
            .await
            .unwrap();

        let body = read_all(stream).await;
        assert_eq!(String::from_utf8(body).unwrap(), streamed_body());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_without_attachment_omits_file_part() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chats")
            .match_body(Matcher::Regex(r#"name="prompt"\r\n\r\nHello\r\n"#.to_string()))
            .with_status(200)
            .with_body(streamed_body())
            .create_async()
            .await;

        let endpoint = endpoint(&server, EndpointKind::Chat);
        let stream = endpoint
            .open(&ChatRequest::new("Hello", ModelSelector(1)), CancellationToken::new())
            .await
            .unwrap();
        let body = String::from_utf8(read_all(stream).await).unwrap();
        assert!(body.contains("\"done\":true"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/chats")
            .with_status(500)
            .with_body("model crashed")
            .create_async()
            .await;

        let endpoint = endpoint(&server, EndpointKind::Chat);
        let err = endpoint
            .open(&ChatRequest::new("Hello", ModelSelector(1)), CancellationToken::new())
            .await
            .err()
            .unwrap();

        match err {
            Error::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "model crashed");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_send_is_aborted() {
        let server = Server::new_async().await;
        let endpoint = endpoint(&server, EndpointKind::Chat);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = endpoint
            .open(&ChatRequest::new("Hello", ModelSelector(1)), cancel)
            .await
            .err()
            .unwrap();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn test_cancel_after_open_ends_body_with_aborted() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/chats")
            .with_status(200)
            .with_body(streamed_body())
            .create_async()
            .await;

        let endpoint = endpoint(&server, EndpointKind::Chat);
        let cancel = CancellationToken::new();
        let mut stream = endpoint
            .open(&ChatRequest::new("Hello", ModelSelector(1)), cancel.clone())
            .await
            .unwrap();

        cancel.cancel();
        let next = stream.next().await.unwrap();
        assert!(matches!(next, Err(Error::Aborted)));
        assert!(stream.next().await.is_none());
    }
}

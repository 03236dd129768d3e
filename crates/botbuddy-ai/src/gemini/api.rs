//! ChatService implementation for GeminiClient.

use async_trait::async_trait;
use botbuddy_common::ChatId;
use tracing::debug;

use crate::{AiError, AiReply, ChatService, SessionHandle};

use super::client::GeminiClient;

/// Map a non-success HTTP status to an `AiError`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AiError> {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(AiError::RateLimited);
    }
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(AiError::ApiError(format!("HTTP {status}: {text}")));
    }
    Ok(response)
}

#[async_trait]
impl ChatService for GeminiClient {
    /// Probe the model resource so bad keys, exhausted quota or an
    /// unreachable endpoint fail here instead of on the first message.
    async fn create_session(&self, chat: ChatId) -> Result<SessionHandle, AiError> {
        if self.config.api_key.trim().is_empty() {
            return Err(AiError::NotConfigured("Gemini API key is empty".into()));
        }

        let url = self.model_url(&self.config.model);
        debug!(model = %self.config.model, %chat, "Gemini session probe");

        let response = self
            .http
            .get(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| AiError::NetworkError(e.to_string()))?;
        check_status(response).await?;

        Ok(SessionHandle::new(chat, self.config.model.clone()))
    }

    async fn send_message(&self, handle: &SessionHandle, text: &str) -> Result<AiReply, AiError> {
        let body = self.build_request_body(handle.context(), text);
        let url = self.generate_url(handle.model());

        debug!(
            model = %handle.model(),
            session = %handle.id(),
            context_len = handle.context().len(),
            "Gemini API request"
        );

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout
                } else {
                    AiError::NetworkError(e.to_string())
                }
            })?;
        let response = check_status(response).await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        Self::parse_response(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use crate::{GeminiConfig, Message, SessionController, SessionError, SessionStatus};

    /// Serve exactly one HTTP response on a local port. Yields the base URL
    /// and the raw request head (request line and headers) once received.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (head_tx, head_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            let head_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending headers");
                request.extend_from_slice(&chunk[..n]);
                if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&request[..head_end]).to_string();
            let body_len = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while request.len() < head_end + body_len {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            let _ = head_tx.send(head);

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        (format!("http://{addr}"), head_rx)
    }

    fn client_for(base_url: &str) -> GeminiClient {
        GeminiClient::new(
            GeminiConfig::new("test-key")
                .with_model("gemini-test")
                .with_base_url(base_url),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn empty_key_is_not_configured() {
        // Nothing listens here; the key check must fail first.
        let client =
            GeminiClient::new(GeminiConfig::new("  ").with_base_url("http://127.0.0.1:9")).unwrap();
        let err = client.create_session(ChatId(1)).await.unwrap_err();
        assert!(matches!(err, AiError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn create_session_probes_the_model_with_the_key_header() {
        let (base, head) = serve_once("200 OK", "{\"name\":\"models/gemini-test\"}").await;
        let client = client_for(&base);

        let handle = client.create_session(ChatId(2)).await.unwrap();
        assert_eq!(handle.chat(), ChatId(2));
        assert_eq!(handle.model(), "gemini-test");
        assert!(handle.context().is_empty());

        let head = head.await.unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /gemini-test http/1.1"), "{head}");
        assert!(head.contains("x-goog-api-key: test-key"), "{head}");
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limited() {
        let (base, _head) = serve_once("429 Too Many Requests", "{}").await;
        let err = client_for(&base).create_session(ChatId(1)).await.unwrap_err();
        assert!(matches!(err, AiError::RateLimited));
    }

    #[tokio::test]
    async fn other_failure_status_carries_status_and_body() {
        let (base, _head) = serve_once("500 Internal Server Error", "boom").await;
        let client = client_for(&base);
        let handle = SessionHandle::new(ChatId(1), "gemini-test");

        let err = client.send_message(&handle, "Hi").await.unwrap_err();
        match err {
            AiError::ApiError(msg) => assert_eq!(msg, "HTTP 500 Internal Server Error: boom"),
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_message_posts_generate_content() {
        let (base, head) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello!"}]},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":3,"candidatesTokenCount":1}}"#,
        )
        .await;
        let client = client_for(&base);
        let handle = SessionHandle::new(ChatId(1), "gemini-test");

        let reply = client.send_message(&handle, "Hi").await.unwrap();
        assert_eq!(reply.content, "Hello!");
        assert_eq!(reply.usage.input_tokens, 3);
        assert_eq!(reply.usage.output_tokens, 1);

        let head = head.await.unwrap().to_ascii_lowercase();
        assert!(head.starts_with("post /gemini-test:generatecontent http/1.1"), "{head}");
        assert!(head.contains("x-goog-api-key: test-key"), "{head}");
    }

    #[tokio::test]
    async fn rejected_probe_surfaces_as_initialization_error() {
        let (base, _head) = serve_once("403 Forbidden", "API key not valid").await;
        let controller = SessionController::new(ChatId(1), Arc::new(client_for(&base)));

        let err = controller.initialize_session().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to initialize chat");
        assert!(matches!(
            err,
            SessionError::Initialization { ref cause } if cause.contains("HTTP 403 Forbidden: API key not valid")
        ));
        assert_eq!(controller.status(), SessionStatus::Uninitialized);

        // Without a handle the message never leaves the process.
        assert!(controller.submit("Hi").await.is_err());
        assert_eq!(controller.messages()[0], Message::user("Hi"));
    }
}

//! OpenAI-compatible Chat Completions adapter (DeepSeek, OpenAI).
//!
//! `POST {base}/chat/completions`. Streaming replies arrive as SSE `data:`
//! lines carrying `choices[0].delta.content`, terminated by `data: [DONE]`.

use super::http::{build_client, check_status, classify_reqwest_error, resolve_credential};
use super::sse::{SseStep, spawn_reader};
use super::{ProviderKind, ProviderSettings};
use async_trait::async_trait;
use eventsource_stream::Event;
use parley_application::ports::llm_gateway::{
    CompletionRequest, GatewayError, LlmGateway, StreamHandle,
};
use parley_domain::StreamEvent;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use tracing::debug;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

pub struct OpenAiCompatibleProvider {
    settings: ProviderSettings,
    http: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            http: build_client(),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.settings.kind
    }

    async fn post(&self, request: &CompletionRequest, stream: bool) -> Result<Response, GatewayError> {
        let credential = resolve_credential(
            request,
            self.settings.credential.as_ref(),
            &self.settings.credential_hint,
        )?;

        let body = ChatCompletionBody {
            model: request.model.as_str(),
            messages: request
                .messages
                .iter()
                .map(|turn| WireMessage {
                    role: turn.role.as_str(),
                    content: &turn.content,
                })
                .collect(),
            stream,
            max_tokens: self.settings.max_tokens,
        };

        let url = format!("{}{}", self.settings.base_url, CHAT_COMPLETIONS_PATH);
        debug!(
            provider = self.name(),
            url = %url,
            model = %request.model,
            messages = request.messages.len(),
            stream,
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;
        check_status(response).await
    }
}

#[async_trait]
impl LlmGateway for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        self.settings.kind.as_str()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let response = self.post(request, false).await?;
        let payload: ChatCompletionResponse =
            response.json().await.map_err(classify_reqwest_error)?;

        let choice = payload
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Provider("Response contained no choices".to_string()))?;
        Ok(choice.message.content.unwrap_or_default())
    }

    async fn stream_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<StreamHandle, GatewayError> {
        if !self.settings.streaming {
            let text = self.complete(request).await?;
            return Ok(StreamHandle::from_events(vec![StreamEvent::Completed(text)]));
        }

        let response = self.post(request, true).await?;
        Ok(spawn_reader(
            self.settings.kind.as_str(),
            response.bytes_stream(),
            decode_chunk,
        ))
    }
}

fn decode_chunk(event: &Event) -> SseStep {
    let data = event.data.trim();
    if data.is_empty() {
        return SseStep::Skip;
    }
    if data == "[DONE]" {
        return SseStep::Done;
    }

    match serde_json::from_str::<ChunkPayload>(data) {
        Ok(ChunkPayload {
            error: Some(error), ..
        }) => SseStep::Error(error.message),
        Ok(payload) => payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|text| !text.is_empty())
            .map_or(SseStep::Skip, SseStep::Text),
        Err(e) => SseStep::Error(format!("Malformed stream chunk: {e}")),
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_application::ports::llm_gateway::Credential;
    use parley_domain::{Message, Model};
    use serde_json::json;
    use wiremock::matchers::{any, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse(chunks: &[&str]) -> String {
        let mut body: String = chunks
            .iter()
            .map(|text| {
                format!(
                    "data: {}\n\n",
                    json!({"choices": [{"index": 0, "delta": {"content": text}}]})
                )
            })
            .collect();
        body.push_str("data: [DONE]\n\n");
        body
    }

    fn provider(server: &MockServer, key: Option<&str>) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(
            ProviderSettings::new(ProviderKind::Deepseek)
                .with_base_url(server.uri())
                .with_credential(key.and_then(Credential::new)),
        )
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            &[Message::user("hi"), Message::assistant("hello"), Message::user("again")],
            Model::DeepseekChat,
        )
    }

    #[tokio::test]
    async fn streams_deltas_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "deepseek-chat",
                "stream": true,
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"},
                    {"role": "user", "content": "again"}
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(sse(&["Hel", "lo, ", "world"]), "text/event-stream"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut handle = provider(&server, Some("sk-test"))
            .stream_completion(&request())
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Some(event) = handle.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hel".to_string()),
                StreamEvent::Delta("lo, ".to_string()),
                StreamEvent::Delta("world".to_string()),
                StreamEvent::Completed("Hello, world".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider(&server, None)
            .stream_completion(&request())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, GatewayError::Configuration(ref m) if m.contains("DEEPSEEK_API_KEY")));
    }

    #[tokio::test]
    async fn request_credential_overrides_configured_key() {
        let server = MockServer::start().await;
        Mock::given(header("authorization", "Bearer sk-override"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(sse(&["ok"]), "text/event-stream"))
            .expect(1)
            .mount(&server)
            .await;

        let request = request().with_credential(Credential::new("sk-override"));
        let text = provider(&server, Some("sk-configured"))
            .stream_completion(&request)
            .await
            .unwrap()
            .collect_text()
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn unauthorized_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Authentication Fails, Your api key is invalid", "type": "authentication_error"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server, Some("sk-bad"))
            .stream_completion(&request())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, GatewayError::Authentication(ref m) if m.contains("api key is invalid")));
        assert_eq!(err.user_notice(), "⚠️ Invalid API key");
    }

    #[tokio::test]
    async fn server_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&server)
            .await;

        let err = provider(&server, Some("sk-test"))
            .complete(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Provider(ref m) if m.contains("503")));
    }

    #[tokio::test]
    async fn error_object_in_stream_becomes_error_event() {
        let server = MockServer::start().await;
        let body = format!(
            "data: {}\n\ndata: {}\n\n",
            json!({"choices": [{"delta": {"content": "par"}}]}),
            json!({"error": {"message": "upstream overloaded"}})
        );
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let err = provider(&server, Some("sk-test"))
            .stream_completion(&request())
            .await
            .unwrap()
            .collect_text()
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Provider(ref m) if m == "upstream overloaded"));
    }

    #[tokio::test]
    async fn non_streaming_mode_yields_single_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "whole answer"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiCompatibleProvider::new(
            ProviderSettings::new(ProviderKind::OpenAi)
                .with_base_url(server.uri())
                .with_credential(Credential::new("sk-test"))
                .with_streaming(false),
        );
        let mut handle = provider.stream_completion(&request()).await.unwrap();

        assert_eq!(
            handle.recv().await,
            Some(StreamEvent::Completed("whole answer".to_string()))
        );
        assert_eq!(handle.recv().await, None);
        assert_eq!(provider.kind(), ProviderKind::OpenAi);
    }

    #[test]
    fn decode_skips_role_and_empty_deltas() {
        let event = |data: &str| Event {
            event: "message".to_string(),
            data: data.to_string(),
            id: String::new(),
            retry: None,
        };
        assert_eq!(
            decode_chunk(&event(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#)),
            SseStep::Skip
        );
        assert_eq!(
            decode_chunk(&event(r#"{"choices":[{"delta":{"content":""}}]}"#)),
            SseStep::Skip
        );
        assert_eq!(decode_chunk(&event(r#"{"choices":[],"usage":{}}"#)), SseStep::Skip);
        assert!(matches!(decode_chunk(&event("{oops")), SseStep::Error(_)));
    }
}

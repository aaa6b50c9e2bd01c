//! Anthropic Messages API adapter.
//!
//! `POST {base}/v1/messages` with `x-api-key` and `anthropic-version`
//! headers. Streaming text arrives in `content_block_delta` events; the
//! reply ends with `message_stop`, or with an `error` event.

use super::http::{build_client, check_status, classify_reqwest_error, resolve_credential};
use super::sse::{SseStep, spawn_reader};
use super::ProviderSettings;
use async_trait::async_trait;
use eventsource_stream::Event;
use parley_application::ports::llm_gateway::{
    CompletionRequest, GatewayError, LlmGateway, StreamHandle,
};
use parley_domain::StreamEvent;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use tracing::debug;

const MESSAGES_PATH: &str = "/v1/messages";
const API_VERSION: &str = "2023-06-01";
/// The Messages API requires `max_tokens`.
const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicProvider {
    settings: ProviderSettings,
    http: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            http: build_client(),
        }
    }

    async fn post(&self, request: &CompletionRequest, stream: bool) -> Result<Response, GatewayError> {
        let credential = resolve_credential(
            request,
            self.settings.credential.as_ref(),
            &self.settings.credential_hint,
        )?;

        let body = MessagesBody {
            model: request.model.as_str(),
            max_tokens: self.settings.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            messages: request
                .messages
                .iter()
                .map(|turn| WireMessage {
                    role: turn.role.as_str(),
                    content: &turn.content,
                })
                .collect(),
            stream,
        };

        let url = format!("{}{}", self.settings.base_url, MESSAGES_PATH);
        debug!(
            provider = self.name(),
            url = %url,
            model = %request.model,
            messages = request.messages.len(),
            stream,
            "Sending messages request"
        );

        let response = self
            .http
            .post(&url)
            .header("x-api-key", credential.expose())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;
        check_status(response).await
    }
}

#[async_trait]
impl LlmGateway for AnthropicProvider {
    fn name(&self) -> &str {
        self.settings.kind.as_str()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let response = self.post(request, false).await?;
        let payload: MessagesResponse = response.json().await.map_err(classify_reqwest_error)?;

        Ok(payload
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect())
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
            decode_event,
        ))
    }
}

fn decode_event(event: &Event) -> SseStep {
    match event.event.as_str() {
        "content_block_delta" => match serde_json::from_str::<ContentBlockDelta>(&event.data) {
            Ok(ContentBlockDelta {
                delta: BlockDelta::TextDelta { text },
            }) if !text.is_empty() => SseStep::Text(text),
            Ok(_) => SseStep::Skip,
            Err(e) => SseStep::Error(format!("Malformed content_block_delta: {e}")),
        },
        "message_stop" => SseStep::Done,
        "error" => match serde_json::from_str::<ErrorEvent>(&event.data) {
            Ok(parsed) => SseStep::Error(parsed.error.message),
            Err(_) => SseStep::Error(event.data.clone()),
        },
        // message_start, content_block_start/stop, message_delta, ping
        _ => SseStep::Skip,
    }
}

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ContentBlockDelta {
    delta: BlockDelta,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorEvent {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

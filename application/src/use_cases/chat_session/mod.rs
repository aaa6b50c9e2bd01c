//! Chat session use case.
//!
//! [`ChatSession`] owns one conversation: it replays the history store on
//! open, sends each user message with the full history to the provider,
//! forwards the streamed reply to a [`ReplySink`], and appends both sides of
//! the exchange to the store.
//!
//! Only one turn can be in flight: `send_message` takes `&mut self`.
//! Provider failures never escape as errors; they come back as a
//! [`TurnOutcome::Failed`] with a user-visible notice as the reply.

mod state;

pub use state::{SessionState, TurnOutcome, TurnOutput};

use crate::cancel::CancelSignal;
use crate::config::SessionParams;
use crate::ports::history_store::HistoryStore;
use crate::ports::llm_gateway::{CompletionRequest, GatewayError, LlmGateway};
use crate::ports::reply_sink::{ReplySink, SinkFlow};
use parley_domain::util::preview;
use parley_domain::{Conversation, Message, Model, StreamEvent};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// How the stream of one turn ended, before bookkeeping.
enum StreamEnd {
    Completed(String),
    Cancelled(String),
    Failed(GatewayError),
}

/// A single conversation with one provider.
pub struct ChatSession {
    gateway: Arc<dyn LlmGateway>,
    history: Arc<dyn HistoryStore>,
    params: SessionParams,
    conversation: Conversation,
    cancel: CancelSignal,
    state: SessionState,
}

impl ChatSession {
    /// Open a session, replaying whatever the store holds.
    ///
    /// A store that can't be read is logged and treated as empty; new
    /// messages are still appended to it.
    pub fn open(
        gateway: Arc<dyn LlmGateway>,
        history: Arc<dyn HistoryStore>,
        params: SessionParams,
    ) -> Self {
        let messages = match history.load() {
            Ok(messages) => messages,
            Err(e) => {
                warn!(location = %history.location(), error = %e, "Failed to load history, starting empty");
                Vec::new()
            }
        };
        info!(
            location = %history.location(),
            messages = messages.len(),
            provider = gateway.name(),
            model = %params.model,
            "Session opened"
        );

        Self {
            gateway,
            history,
            params,
            conversation: Conversation::from_messages(messages),
            cancel: CancelSignal::new(),
            state: SessionState::Idle,
        }
    }

    /// Share an externally created cancel signal.
    pub fn with_cancel_signal(mut self, signal: CancelSignal) -> Self {
        self.cancel = signal;
        self
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn model(&self) -> &Model {
        &self.params.model
    }

    pub fn provider_name(&self) -> &str {
        self.gateway.name()
    }

    /// A clone of the signal that stops the in-flight turn.
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    pub fn request_cancel(&self) {
        self.cancel.request_cancel();
    }

    /// Run one turn: store the user message, stream the reply into `sink`,
    /// store the reply.
    ///
    /// Blank input is ignored. A cancel requested before this call is
    /// discarded. On cancel the partial reply is kept and stored; on failure
    /// the reply is a notice and nothing is stored for the assistant.
    pub async fn send_message(&mut self, text: &str, sink: &mut dyn ReplySink) -> TurnOutput {
        if text.trim().is_empty() {
            debug!("Ignoring blank message");
            return TurnOutput::skipped();
        }

        if self.state != SessionState::Idle {
            // Only reachable when a previous send future was dropped mid-turn
            warn!(state = %self.state, "Previous turn was abandoned, resetting");
            self.state = SessionState::Idle;
        }

        let token = self.cancel.arm();
        self.persist(Message::user(text));
        self.transition(SessionState::Sending);

        info!(
            provider = self.gateway.name(),
            model = %self.params.model,
            history = self.conversation.len(),
            message = %preview(text, 60),
            "Sending message"
        );

        let request = CompletionRequest::new(self.conversation.messages(), self.params.model.clone())
            .with_credential(self.params.credential.clone());
        let end = self.run_stream(&request, sink, &token).await;
        let output = self.finish(end);

        self.cancel.reset();
        self.transition(SessionState::Idle);
        output
    }

    async fn run_stream(
        &mut self,
        request: &CompletionRequest,
        sink: &mut dyn ReplySink,
        token: &CancellationToken,
    ) -> StreamEnd {
        let gateway = Arc::clone(&self.gateway);
        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => return StreamEnd::Cancelled(String::new()),
            opened = gateway.stream_completion(request) => opened,
        };
        let mut handle = match opened {
            Ok(handle) => handle,
            Err(e) => return StreamEnd::Failed(e),
        };

        let mut buffer = String::new();
        let mut saw_delta = false;

        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => return StreamEnd::Cancelled(buffer),
                event = handle.recv() => event,
            };

            match event {
                Some(StreamEvent::Delta(chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    saw_delta = true;
                    let flow = self.deliver(&chunk, &mut buffer, sink);
                    if flow == SinkFlow::Stop || token.is_cancelled() {
                        return StreamEnd::Cancelled(buffer);
                    }
                }
                Some(StreamEvent::Completed(text)) => {
                    // Non-streaming replies arrive whole, as a single chunk
                    if !saw_delta && !text.is_empty() {
                        self.deliver(&text, &mut buffer, sink);
                    }
                    return StreamEnd::Completed(buffer);
                }
                Some(StreamEvent::Error(message)) => {
                    return StreamEnd::Failed(GatewayError::Provider(message));
                }
                None => {
                    debug!(chars = buffer.len(), "Stream closed without completion event");
                    return StreamEnd::Completed(buffer);
                }
            }
        }
    }

    fn deliver(&mut self, chunk: &str, buffer: &mut String, sink: &mut dyn ReplySink) -> SinkFlow {
        if self.state == SessionState::Sending {
            self.transition(SessionState::Streaming);
            sink.on_stream_start();
        }
        buffer.push_str(chunk);
        sink.on_chunk(chunk)
    }

    fn finish(&mut self, end: StreamEnd) -> TurnOutput {
        let output = match end {
            StreamEnd::Completed(text) => {
                info!(chars = text.len(), "Reply completed");
                self.keep_reply(text, TurnOutcome::Completed)
            }
            StreamEnd::Cancelled(text) => {
                info!(chars = text.len(), "Reply cancelled");
                self.keep_reply(text, TurnOutcome::Cancelled)
            }
            StreamEnd::Failed(error) => {
                warn!(provider = self.gateway.name(), error = %error, "Turn failed");
                TurnOutput {
                    reply: error.user_notice(),
                    outcome: TurnOutcome::Failed(error.kind()),
                }
            }
        };

        if let Some(terminal) = output.outcome.terminal_state() {
            self.transition(terminal);
        }
        output
    }

    fn keep_reply(&mut self, text: String, outcome: TurnOutcome) -> TurnOutput {
        if !text.is_empty() {
            self.persist(Message::assistant(text.clone()));
        }
        TurnOutput {
            reply: text,
            outcome,
        }
    }

    /// Write to the store, then to memory. A failed write is logged and the
    /// message is kept in memory anyway.
    fn persist(&mut self, message: Message) {
        if let Err(e) = self.history.append(&message) {
            warn!(
                location = %self.history.location(),
                role = %message.role(),
                error = %e,
                "Failed to persist message"
            );
        }
        self.conversation.push(message);
    }

    fn transition(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "Unexpected session state transition");
        }
        trace!(from = %self.state, to = %next, "Session state");
        self.state = next;
    }
}

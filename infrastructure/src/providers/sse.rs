//! Server-sent events pump shared by the streaming providers.
//!
//! A spawned reader task owns the HTTP body, parses it into SSE events with
//! `eventsource-stream`, lets the provider decode each event, and forwards
//! the resulting [`StreamEvent`]s over a bounded channel. The task ends on
//! the provider's end marker, on a provider error, on a transport error, or
//! as soon as the consumer drops its [`StreamHandle`].

use bytes::Bytes;
use eventsource_stream::{Event, Eventsource};
use futures::{Stream, StreamExt};
use parley_application::ports::llm_gateway::StreamHandle;
use parley_domain::StreamEvent;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, trace};

const STREAM_CHANNEL_CAPACITY: usize = 64;

/// What one decoded SSE event means for the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseStep {
    Text(String),
    /// Keep-alives, metadata and empty deltas.
    Skip,
    /// The provider's end-of-reply marker.
    Done,
    /// An error object reported inside the stream.
    Error(String),
}

/// Appends a blank line after the body ends so a final event without a
/// trailing separator is still dispatched.
pub(crate) struct SseTerminatedStream<S> {
    inner: S,
    emitted_terminator: bool,
}

impl<S> SseTerminatedStream<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self {
            inner,
            emitted_terminator: false,
        }
    }
}

impl<S, E> Stream for SseTerminatedStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.emitted_terminator {
            return Poll::Ready(None);
        }

        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(item)) => Poll::Ready(Some(item)),
            Poll::Ready(None) => {
                self.emitted_terminator = true;
                Poll::Ready(Some(Ok(Bytes::from_static(b"\n\n"))))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Spawn the reader task for `body` and return the consumer's handle.
pub(crate) fn spawn_reader<S, E, D>(provider: &'static str, body: S, mut decode: D) -> StreamHandle
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: std::fmt::Display + Send + 'static,
    D: FnMut(&Event) -> SseStep + Send + 'static,
{
    let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut events = std::pin::pin!(SseTerminatedStream::new(body).eventsource());
        let mut full_text = String::new();

        loop {
            let item = tokio::select! {
                _ = tx.closed() => {
                    debug!(provider, "Stream consumer went away, closing connection");
                    return;
                }
                item = events.next() => item,
            };

            let event = match item {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    // Ends without Completed; the consumer keeps what it has
                    debug!(provider, error = %e, "Stream read failed");
                    return;
                }
                None => break,
            };
            trace!(provider, event = %event.event, data = %event.data, "SSE event");

            match decode(&event) {
                SseStep::Text(chunk) => {
                    full_text.push_str(&chunk);
                    if tx.send(StreamEvent::Delta(chunk)).await.is_err() {
                        return;
                    }
                }
                SseStep::Skip => {}
                SseStep::Done => break,
                SseStep::Error(message) => {
                    let _ = tx.send(StreamEvent::Error(message)).await;
                    return;
                }
            }
        }

        debug!(provider, chars = full_text.len(), "Stream finished");
        let _ = tx.send(StreamEvent::Completed(full_text)).await;
    });

    StreamHandle::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(chunks: &[&'static str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Unpin {
        futures::stream::iter(
            chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    fn echo(event: &Event) -> SseStep {
        match event.data.as_str() {
            "[DONE]" => SseStep::Done,
            "" => SseStep::Skip,
            data if data.starts_with("err:") => SseStep::Error(data[4..].to_string()),
            data => SseStep::Text(data.to_string()),
        }
    }

    async fn drain(mut handle: StreamHandle) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = handle.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn events_split_across_chunks_are_reassembled() {
        let handle = spawn_reader(
            "test",
            body(&["data: Hel", "lo\n\ndata: , wor", "ld\n\n", "data: [DONE]\n\n"]),
            echo,
        );

        assert_eq!(
            drain(handle).await,
            vec![
                StreamEvent::Delta("Hello".to_string()),
                StreamEvent::Delta(", world".to_string()),
                StreamEvent::Completed("Hello, world".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn final_event_without_separator_is_delivered() {
        let handle = spawn_reader("test", body(&["data: tail"]), echo);

        assert_eq!(
            drain(handle).await,
            vec![
                StreamEvent::Delta("tail".to_string()),
                StreamEvent::Completed("tail".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn nothing_after_done_is_read() {
        let handle = spawn_reader(
            "test",
            body(&["data: a\n\ndata: [DONE]\n\ndata: ignored\n\n"]),
            echo,
        );

        let events = drain(handle).await;
        assert_eq!(events.last(), Some(&StreamEvent::Completed("a".to_string())));
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn error_object_ends_stream() {
        let handle = spawn_reader(
            "test",
            body(&["data: part\n\ndata: err:overloaded\n\ndata: more\n\n"]),
            echo,
        );

        assert_eq!(
            drain(handle).await,
            vec![
                StreamEvent::Delta("part".to_string()),
                StreamEvent::Error("overloaded".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn transport_error_closes_without_completion() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: partial\n\n")),
            Err(std::io::Error::other("connection reset")),
        ];
        let handle = spawn_reader("test", futures::stream::iter(chunks), echo);

        assert_eq!(
            drain(handle).await,
            vec![StreamEvent::Delta("partial".to_string())]
        );
    }

    #[tokio::test]
    async fn reader_stops_when_handle_is_dropped() {
        let (tx, rx) = futures::channel::mpsc::unbounded::<Result<Bytes, std::io::Error>>();
        let mut handle = spawn_reader("test", rx, echo);

        tx.unbounded_send(Ok(Bytes::from_static(b"data: first\n\n")))
            .unwrap();
        assert_eq!(handle.recv().await, Some(StreamEvent::Delta("first".to_string())));
        drop(handle);

        // The task drops the body stream once it notices, closing the sender side
        for _ in 0..100 {
            if tx.is_closed() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("reader task kept the body open after the handle was dropped");
    }
}

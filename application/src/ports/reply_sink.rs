//! Port for incremental reply display.
//!
//! The session pushes each chunk of the assistant's reply to a [`ReplySink`]
//! as soon as it arrives. The sink may ask the session to stop early.

/// Whether the session should keep consuming the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFlow {
    Continue,
    Stop,
}

/// Receives reply chunks while a turn is streaming.
pub trait ReplySink: Send {
    /// Called once, before the first chunk of a reply.
    fn on_stream_start(&mut self) {}

    /// Called for each chunk, in arrival order.
    fn on_chunk(&mut self, chunk: &str) -> SinkFlow;
}

/// Sink that ignores every chunk.
pub struct NoReplySink;

impl ReplySink for NoReplySink {
    fn on_chunk(&mut self, _chunk: &str) -> SinkFlow {
        SinkFlow::Continue
    }
}

impl<F> ReplySink for F
where
    F: FnMut(&str) -> SinkFlow + Send,
{
    fn on_chunk(&mut self, chunk: &str) -> SinkFlow {
        self(chunk)
    }
}

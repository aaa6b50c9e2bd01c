//! Terminal reply sink: spinner until the first chunk, then raw text.

use indicatif::{ProgressBar, ProgressStyle};
use parley_application::{ReplySink, SinkFlow};
use std::io::Write;
use std::time::Duration;

/// Prints streamed reply chunks to a writer as they arrive.
pub struct ConsoleReplySink<W: Write + Send> {
    out: W,
    spinner: Option<ProgressBar>,
    wrote_any: bool,
}

impl<W: Write + Send> ConsoleReplySink<W> {
    /// Sink with no spinner.
    pub fn new(out: W) -> Self {
        Self {
            out,
            spinner: None,
            wrote_any: false,
        }
    }

    /// Show a "Thinking..." spinner until the reply starts.
    pub fn with_spinner(mut self) -> Self {
        self.spinner = Some(Self::thinking_spinner(ProgressBar::new_spinner()));
        self
    }

    /// Use a caller-provided bar as the spinner.
    pub fn with_progress_bar(mut self, bar: ProgressBar) -> Self {
        self.spinner = Some(bar);
        self
    }

    fn thinking_spinner(pb: ProgressBar) -> ProgressBar {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Thinking...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// True once any chunk has been written.
    pub fn wrote_any(&self) -> bool {
        self.wrote_any
    }

    /// Clear a spinner that never saw a chunk and end the reply line.
    pub fn finish(&mut self) {
        self.clear_spinner();
        if self.wrote_any {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn clear_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}

impl<W: Write + Send> ReplySink for ConsoleReplySink<W> {
    fn on_stream_start(&mut self) {
        self.clear_spinner();
    }

    fn on_chunk(&mut self, chunk: &str) -> SinkFlow {
        let written = self
            .out
            .write_all(chunk.as_bytes())
            .and_then(|()| self.out.flush());
        match written {
            Ok(()) => {
                self.wrote_any = true;
                SinkFlow::Continue
            }
            // Nobody is reading anymore
            Err(_) => SinkFlow::Stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn chunks_are_written_in_order() {
        let mut sink = ConsoleReplySink::new(Vec::new());
        sink.on_stream_start();
        for chunk in ["Hel", "lo, ", "world"] {
            assert_eq!(sink.on_chunk(chunk), SinkFlow::Continue);
        }
        sink.finish();

        assert!(sink.wrote_any());
        assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "Hello, world\n");
    }

    #[test]
    fn spinner_is_cleared_on_stream_start() {
        let bar = ProgressBar::hidden();
        let mut sink = ConsoleReplySink::new(Vec::new()).with_progress_bar(bar.clone());

        sink.on_stream_start();
        assert!(bar.is_finished());
        assert!(sink.spinner.is_none());
    }

    #[test]
    fn finish_without_chunks_prints_nothing() {
        let bar = ProgressBar::hidden();
        let mut sink = ConsoleReplySink::new(Vec::new()).with_progress_bar(bar.clone());
        sink.finish();

        assert!(bar.is_finished());
        assert!(!sink.wrote_any());
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn write_failure_stops_the_stream() {
        let mut sink = ConsoleReplySink::new(BrokenPipe);
        assert_eq!(sink.on_chunk("x"), SinkFlow::Stop);
        assert!(!sink.wrote_any());
    }
}

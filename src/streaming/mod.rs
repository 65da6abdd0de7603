//! SSE (Server-Sent Events) observation helpers
//!
//! The proxy never rewrites a relayed event stream. It only watches the bytes
//! go past so stream completion can be logged with an event count.

/// Counts SSE events in a byte stream without altering it.
///
/// Chunks may split lines anywhere, so the trailing partial line is kept
/// between calls. An event ends at a blank line.
///
/// # Example
/// ```
/// use modelhub_proxy::streaming::SseEventCounter;
///
/// let mut counter = SseEventCounter::new();
/// counter.feed(b"data: {\"delta\":\"hel");
/// assert_eq!(counter.events(), 0);
///
/// counter.feed(b"lo\"}\n\ndata: [DONE]\n\n");
/// assert_eq!(counter.events(), 2);
/// assert!(counter.saw_done());
/// ```
#[derive(Debug, Default)]
pub struct SseEventCounter {
    partial: Vec<u8>,
    in_event: bool,
    events: usize,
    saw_done: bool,
}

impl SseEventCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of the stream.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.partial.extend_from_slice(chunk);

        let mut consumed = 0;
        while let Some(offset) = self.partial[consumed..].iter().position(|&b| b == b'\n') {
            let end = consumed + offset;
            let line = strip_cr(&self.partial[consumed..end]);
            let line = line.to_vec();
            self.observe_line(&line);
            consumed = end + 1;
        }
        self.partial.drain(..consumed);
    }

    fn observe_line(&mut self, line: &[u8]) {
        if line.is_empty() {
            if self.in_event {
                self.events += 1;
                self.in_event = false;
            }
            return;
        }

        // Comment lines (": keep-alive") do not make an event.
        if line.starts_with(b":") {
            return;
        }

        self.in_event = true;
        if let Some(data) = line.strip_prefix(b"data:") {
            if data.trim_ascii() == b"[DONE]" {
                self.saw_done = true;
            }
        }
    }

    /// Number of complete events seen so far
    pub fn events(&self) -> usize {
        self.events
    }

    /// Whether the OpenAI-style `data: [DONE]` terminator went past
    pub fn saw_done(&self) -> bool {
        self.saw_done
    }

    /// Close the stream, counting an event left unterminated at the end.
    ///
    /// Returns true when the stream ended mid-event.
    pub fn finish(&mut self) -> bool {
        if !self.partial.is_empty() {
            let line = std::mem::take(&mut self.partial);
            self.observe_line(strip_cr(&line));
        }

        let truncated = self.in_event;
        if truncated {
            self.events += 1;
            self.in_event = false;
        }
        truncated
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

//! Incremental parser for server-sent-event framing.
//!
//! Chunks arrive at arbitrary byte boundaries, so the parser buffers until a
//! blank line completes an event, then hands back the joined `data:` payload.
//! `event:`, `id:`, `retry:` and comment lines are framing only and dropped.

pub(crate) struct EventStreamParser {
    buffer: Vec<u8>,
}

impl EventStreamParser {
    pub(crate) const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed one chunk of the response body; returns the data payload of
    /// every event completed by it, in arrival order.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some((end, delimiter_len)) = frame_boundary(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..end + delimiter_len).collect();
            let frame = String::from_utf8_lossy(&frame[..end]);
            if let Some(data) = extract_data(&frame) {
                payloads.push(data);
            }
        }
        payloads
    }
}

/// Position and length of the earliest blank-line delimiter, if any.
fn frame_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer
        .windows(2)
        .position(|w| w == b"\n\n")
        .map(|i| (i, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4));

    match (lf, crlf) {
        (Some(l), Some(c)) => Some(if c.0 < l.0 { c } else { l }),
        (lf, crlf) => lf.or(crlf),
    }
}

/// Joined `data:` lines of one frame, or `None` for frames that carry none
/// (comments and keep-alive padding).
fn extract_data(frame: &str) -> Option<String> {
    let mut lines = Vec::new();
    for line in frame.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

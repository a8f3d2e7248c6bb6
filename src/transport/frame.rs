//! Decoder for the `data: <json>\n` framing used by the chat stream.

use serde::Deserialize;

use crate::core::StatDelta;

/// Literal end-of-stream marker. It is not JSON and is skipped.
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text fragment to append to the in-flight reply.
    Chunk(String),
    /// End of reply, with the stat delta the exchange produced.
    Done(StatDelta),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Frame {
    Chunk {
        #[serde(default)]
        content: String,
    },
    Done {
        #[serde(default, rename = "statChanges", alias = "statDelta")]
        stat_changes: Option<StatDelta>,
    },
}

/// Incremental line decoder. Bytes are buffered until a `\n` arrives, so a
/// frame (or a UTF-8 sequence) split across reads is reassembled before it
/// is parsed.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network read and return the events completed by it, in
    /// arrival order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Bytes held back waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// End of input: an unterminated trailing line is dropped.
    pub fn finish(&mut self) {
        if !self.buffer.is_empty() {
            tracing::debug!(
                bytes = self.buffer.len(),
                "discarding unterminated frame at end of stream"
            );
            self.buffer.clear();
        }
    }
}

fn parse_line(line: &str) -> Option<StreamEvent> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return None;
    }

    let Some(payload) = line.strip_prefix("data:") else {
        tracing::debug!(line, "ignoring non-data line");
        return None;
    };
    let payload = payload.trim();
    if payload.is_empty() || payload == DONE_SENTINEL {
        return None;
    }

    match serde_json::from_str::<Frame>(payload) {
        Ok(Frame::Chunk { content }) => Some(StreamEvent::Chunk(content)),
        Ok(Frame::Done { stat_changes }) => Some(StreamEvent::Done(stat_changes.unwrap_or_default())),
        Err(e) => {
            tracing::warn!(payload, error = %e, "skipping malformed stream frame");
            None
        }
    }
}

use std::collections::VecDeque;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;

use super::frame::{FrameDecoder, StreamEvent};
use crate::core::{Result, StatDelta};

pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming,
    Completed(StatDelta),
    Failed(String),
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamState::Completed(_) | StreamState::Failed(_))
    }
}

/// A streamed chat reply: `Idle -> Streaming -> Completed | Failed`.
///
/// `next_event` yields chunks in arrival order and at most one `Done`.
/// Anything after `Done` is ignored. A body that ends without a `done`
/// frame completes with an empty delta.
pub struct ChatStream {
    body: ByteStream,
    decoder: FrameDecoder,
    pending: VecDeque<StreamEvent>,
    state: StreamState,
}

impl ChatStream {
    pub fn new(body: ByteStream) -> Self {
        Self {
            body,
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            state: StreamState::Idle,
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    pub async fn next_event(&mut self) -> Option<Result<StreamEvent>> {
        loop {
            if self.state.is_terminal() {
                return None;
            }

            if let Some(event) = self.pending.pop_front() {
                match &event {
                    StreamEvent::Done(delta) => {
                        self.state = StreamState::Completed(*delta);
                        self.pending.clear();
                    }
                    StreamEvent::Chunk(_) => self.state = StreamState::Streaming,
                }
                return Some(Ok(event));
            }

            match self.body.next().await {
                Some(Ok(bytes)) => {
                    self.state = StreamState::Streaming;
                    self.pending.extend(self.decoder.feed(&bytes));
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "chat stream read failed");
                    self.state = StreamState::Failed(e.to_string());
                    return Some(Err(e));
                }
                None => {
                    self.decoder.finish();
                    tracing::debug!("chat stream ended without a done frame");
                    self.state = StreamState::Completed(StatDelta::default());
                    return None;
                }
            }
        }
    }
}

use crate::core::{IdolError, Message, Result, StatDelta};
use crate::mock::MockResponder;
use crate::storage::KeyValueStore;
use crate::store::StatStore;
use crate::transport::{ChatClient, ChatRequest, ConnectionMode, StreamEvent};

/// Shown in place of a reply when the backend fails mid-exchange.
pub const APOLOGY: &str = "Sorry, something went wrong on my side. Could you say that again?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Remote,
    Mock,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeOutcome {
    /// The finalised assistant message.
    pub message: Message,
    /// Delta applied to the store. Empty for failed exchanges.
    pub delta: StatDelta,
    pub source: ReplySource,
}

/// One conversation with the trainee.
///
/// The connection mode is decided by a single health probe and only changes
/// on `reconnect` or `set_mode`. Failures while online are reported with
/// [`APOLOGY`] and never fall back to the mock responder.
pub struct ChatSession<S: KeyValueStore> {
    store: StatStore<S>,
    client: ChatClient,
    responder: MockResponder,
    mode: Option<ConnectionMode>,
    streaming: bool,
}

impl<S: KeyValueStore> ChatSession<S> {
    pub fn new(
        store: StatStore<S>,
        client: ChatClient,
        responder: MockResponder,
        streaming: bool,
    ) -> Self {
        Self {
            store,
            client,
            responder,
            mode: None,
            streaming,
        }
    }

    pub fn store(&self) -> &StatStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StatStore<S> {
        &mut self.store
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    pub fn mode(&self) -> Option<ConnectionMode> {
        self.mode
    }

    /// Pin the mode without probing, e.g. for `--offline`.
    pub fn set_mode(&mut self, mode: ConnectionMode) {
        self.mode = Some(mode);
    }

    pub fn streaming(&self) -> bool {
        self.streaming
    }

    pub async fn connect(&mut self) -> ConnectionMode {
        if let Some(mode) = self.mode {
            return mode;
        }
        self.reconnect().await
    }

    pub async fn reconnect(&mut self) -> ConnectionMode {
        let mode = self.client.probe().await;
        self.mode = Some(mode);
        mode
    }

    /// Run one exchange. `on_chunk` sees reply text as it arrives: every
    /// streamed chunk, or the whole reply at once for the other paths.
    /// Transport failures are absorbed into a [`ReplySource::Failed`]
    /// outcome; only misuse (empty text, no onboarding) is an error.
    pub async fn send<F>(&mut self, text: &str, mut on_chunk: F) -> Result<ExchangeOutcome>
    where
        F: FnMut(&str),
    {
        let text = text.trim();
        if text.is_empty() {
            return Err(IdolError::EmptyMessage);
        }
        if !self.store.onboarding_completed() {
            return Err(IdolError::NotOnboarded);
        }

        self.finish_abandoned();
        let mode = self.connect().await;

        let stats = self.store.stats();
        self.store.push_message(Message::user(text));
        let reply_id = self.store.push_message(Message::streaming_assistant());

        let (finished, delta, source) = match mode {
            ConnectionMode::Offline => {
                let reply = self.responder.respond(text, &stats).await;
                on_chunk(&reply.response);
                let finished = self.store.replace_message(
                    &reply_id,
                    &reply.response,
                    Some(reply.stat_changes),
                );
                (finished, reply.stat_changes, ReplySource::Mock)
            }
            ConnectionMode::Online => {
                let request = ChatRequest::new(text, &stats);
                let result = if self.streaming {
                    self.stream_reply(&reply_id, &request, &mut on_chunk).await
                } else {
                    self.single_reply(&reply_id, &request, &mut on_chunk).await
                };
                match result {
                    Ok(delta) => {
                        let finished = self.store.finish_message(&reply_id, Some(delta));
                        (finished, delta, ReplySource::Remote)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "chat exchange failed");
                        let finished = self.store.fail_message(&reply_id, APOLOGY);
                        (finished, StatDelta::default(), ReplySource::Failed)
                    }
                }
            }
        };

        let message = finished.ok_or(IdolError::MessageNotStreaming(reply_id))?;
        self.store.apply_delta(&delta);
        tracing::debug!(%delta, ?source, "exchange finished");

        Ok(ExchangeOutcome {
            message,
            delta,
            source,
        })
    }

    async fn stream_reply<F>(
        &mut self,
        reply_id: &str,
        request: &ChatRequest,
        on_chunk: &mut F,
    ) -> Result<StatDelta>
    where
        F: FnMut(&str),
    {
        let mut stream = self.client.stream_chat(request).await?;
        while let Some(event) = stream.next_event().await {
            match event? {
                StreamEvent::Chunk(chunk) => {
                    if self.store.append_chunk(reply_id, &chunk) {
                        on_chunk(&chunk);
                    }
                }
                StreamEvent::Done(delta) => return Ok(delta),
            }
        }
        Ok(StatDelta::default())
    }

    async fn single_reply<F>(
        &mut self,
        reply_id: &str,
        request: &ChatRequest,
        on_chunk: &mut F,
    ) -> Result<StatDelta>
    where
        F: FnMut(&str),
    {
        let reply = self.client.chat(request).await?;
        self.store.append_chunk(reply_id, &reply.response);
        on_chunk(&reply.response);
        Ok(reply.stat_changes)
    }

    /// Close out any reply left streaming by a dropped `send`.
    fn finish_abandoned(&mut self) {
        while let Some(id) = self.store.streaming_message().map(|m| m.id.clone()) {
            tracing::info!(message_id = %id, "finalising interrupted reply");
            self.store.finish_message(&id, None);
        }
    }
}

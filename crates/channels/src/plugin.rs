use {
    async_trait::async_trait,
    onebridge_common::types::{IncomingMessage, MediaItem, Notification, TorrentContext},
};

use crate::Result;

/// Why an inbound payload did not produce a message.
///
/// Inbound payloads come from an untrusted peer; every non-message outcome
/// is a normal result the caller pattern-matches on, never an error that
/// tears down the read loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Payload was not parsable as a protocol event.
    Malformed,
    /// Event type is not a chat message.
    NotAMessage,
    /// Event carried no message text.
    Empty,
    /// Sender or group failed the source's access policy.
    PolicyRejected,
    /// No source with that name is configured.
    UnknownSource,
}

impl std::fmt::Display for ParseOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => write!(f, "payload is not a protocol event"),
            Self::NotAMessage => write!(f, "event is not a chat message"),
            Self::Empty => write!(f, "event has no message text"),
            Self::PolicyRejected => write!(f, "sender rejected by access policy"),
            Self::UnknownSource => write!(f, "source is not configured"),
        }
    }
}

/// Sink for accepted inbound messages; the host pipeline provides the
/// concrete implementation.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Hand one normalized message to the host pipeline.
    async fn dispatch(&self, message: IncomingMessage);
}

/// Core channel plugin trait. Each messaging platform implements this.
#[async_trait]
pub trait ChannelPlugin: Send + Sync {
    /// Channel identifier (e.g. "onebot").
    fn id(&self) -> &str;

    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Register a named source with its JSON configuration.
    async fn start_source(&self, source: &str, config: serde_json::Value) -> Result<()>;

    /// Remove a named source.
    async fn stop_source(&self, source: &str) -> Result<()>;

    /// Parse a raw inbound payload under a source's access policy.
    ///
    /// Policy rejection may push a notice back to the sender as a side
    /// effect before returning [`ParseOutcome::PolicyRejected`].
    async fn parse(
        &self,
        source: &str,
        raw: &str,
    ) -> std::result::Result<IncomingMessage, ParseOutcome>;

    /// Send a plain notification to its resolved recipients.
    async fn send_notification(&self, notification: &Notification) -> Result<()>;

    /// Send a ranked media list.
    async fn send_media_list(
        &self,
        notification: &Notification,
        medias: &[MediaItem],
    ) -> Result<()>;

    /// Send a ranked torrent list. An empty list is a caller error.
    async fn send_torrent_list(
        &self,
        notification: &Notification,
        torrents: &[TorrentContext],
    ) -> Result<()>;

    /// Liveness of the channel's peer connection.
    fn probe(&self) -> bool;

    /// Drop the peer connection and stop accepting sends.
    fn shutdown(&self);
}

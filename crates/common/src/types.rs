use {
    serde::{Deserialize, Serialize},
    std::collections::HashMap,
};

/// Channel identifier for the OneBot v11 channel.
pub const CHANNEL_ONEBOT: &str = "onebot";

/// Target-map key carrying a per-source user-id override for OneBot sends.
pub const TARGET_ONEBOT_USER: &str = "onebot_userid";

/// A normalized inbound chat message, produced once an event has passed
/// decoding and access control. This is what the host pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Channel the message arrived on (e.g. [`CHANNEL_ONEBOT`]).
    pub channel: String,
    /// Configured source name the message was parsed under.
    pub source: String,
    /// Sender's user ID.
    pub user_id: String,
    /// Sender's display name, when the event carried one.
    pub username: Option<String>,
    /// Message text.
    pub text: String,
}

/// A host-originated request to deliver content to chat recipients.
///
/// Exactly one content shape is sent per call: `send_notification` uses the
/// fields here directly, while media and torrent lists ride alongside as
/// separate parameters of their dedicated send operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub title: String,
    /// Body text. `None` sends a title-only message.
    pub text: Option<String>,
    /// Image URL rendered as an attachment marker ahead of the title.
    pub image: Option<String>,
    /// Trailing link.
    pub link: Option<String>,
    /// Explicit target user. When set, the message goes only to this user
    /// and configured defaults are ignored.
    pub user_id: Option<String>,
    /// Per-channel target overrides (e.g. [`TARGET_ONEBOT_USER`]).
    pub targets: Option<HashMap<String, String>>,
}

impl Notification {
    /// The OneBot user-id override from the target map, if any.
    #[must_use]
    pub fn onebot_target(&self) -> Option<&str> {
        self.targets
            .as_ref()
            .and_then(|t| t.get(TARGET_ONEBOT_USER))
            .map(String::as_str)
    }
}

/// One entry of a ranked media list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaItem {
    /// Display title, typically including the release year.
    pub title: String,
    /// Category label (movie, series, ...).
    pub category: String,
    /// Rating score, omitted from captions when absent.
    pub rating: Option<f32>,
    /// Representative image URL.
    pub image: Option<String>,
}

/// Title tokens extracted by the upstream metadata parser.
///
/// Parsing release titles is an external concern; these tokens arrive
/// pre-computed and are only assembled into a display descriptor here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TorrentMeta {
    pub season_episode: String,
    pub resource_term: String,
    pub video_term: String,
    pub release_group: String,
}

/// One entry of a ranked torrent list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TorrentContext {
    /// Indexer site the torrent was found on.
    pub site: String,
    pub meta: TorrentMeta,
    /// Details page URL, rendered as the entry's link.
    pub page_url: String,
    /// Content size in bytes.
    pub size: u64,
    /// Free-traffic factor label (e.g. "2X Free").
    pub volume_factor: String,
    pub seeders: u32,
}

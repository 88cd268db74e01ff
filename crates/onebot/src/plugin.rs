use {
    async_trait::async_trait,
    std::{
        collections::HashMap,
        sync::{Arc, RwLock},
    },
    tracing::{debug, info, warn},
};

use {
    onebridge_channels::{ChannelPlugin, Error, ParseOutcome, Result},
    onebridge_common::types::{
        CHANNEL_ONEBOT, IncomingMessage, MediaItem, Notification, TorrentContext,
    },
};

use crate::{
    access::check_access,
    caption::{media_list_caption, plain_caption, torrent_list_caption},
    config::OnebotSourceConfig,
    connection::{BotConnection, ConnectionRegistry},
    event,
    outbound::{OnebotOutbound, Recipients},
};

/// OneBot v11 channel plugin: the façade the host wires its websocket
/// ingress and notification pipeline against.
pub struct OnebotPlugin {
    registry: Arc<ConnectionRegistry>,
    outbound: OnebotOutbound,
    sources: RwLock<HashMap<String, OnebotSourceConfig>>,
}

impl OnebotPlugin {
    #[must_use]
    pub fn new() -> Self {
        let registry = Arc::new(ConnectionRegistry::default());
        let outbound = OnebotOutbound::new(Arc::clone(&registry));
        Self {
            registry,
            outbound,
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// Install the peer connection the ingress accepted (last writer wins).
    pub fn register_connection(&self, conn: BotConnection) {
        self.registry.register(conn);
    }

    /// Drop a closing connection, unless a replacement already owns the
    /// slot.
    pub fn clear_connection(&self, conn_id: &str) {
        self.registry.clear_if(conn_id);
    }

    /// Names of all configured sources.
    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        let sources = self.sources.read().unwrap_or_else(|e| e.into_inner());
        sources.keys().cloned().collect()
    }

    fn source_config(&self, source: &str) -> Option<OnebotSourceConfig> {
        let sources = self.sources.read().unwrap_or_else(|e| e.into_inner());
        sources.get(source).cloned()
    }

    /// Resolve where a notification goes for one source: the explicit user
    /// override wins, then the target-map override; only when neither is
    /// given do the source's configured defaults apply. A target map
    /// without an entry for this channel skips the source.
    fn recipients_for(
        config: &OnebotSourceConfig,
        notification: &Notification,
    ) -> Option<Recipients> {
        if let Some(user) = notification.user_id.as_deref() {
            return Some(Recipients::user(user));
        }
        if notification.targets.is_some() {
            return match notification.onebot_target() {
                Some(user) => Some(Recipients::user(user)),
                None => {
                    warn!("onebot: notification targets carry no user id for this channel, skipping");
                    None
                },
            };
        }
        Some(Recipients {
            users: config.users.clone(),
            groups: config.groups.clone(),
        })
    }

    /// Deliver one rendered caption across every configured source. All
    /// sources are attempted; the first error is reported afterwards.
    async fn send_to_sources(&self, notification: &Notification, caption: &str) -> Result<()> {
        if !self.registry.is_connected() {
            return Err(Error::NoConnection);
        }
        let sources: Vec<(String, OnebotSourceConfig)> = {
            let sources = self.sources.read().unwrap_or_else(|e| e.into_inner());
            sources.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        if sources.is_empty() {
            return Err(Error::unavailable("no sources configured"));
        }

        let mut first_error = None;
        for (source, config) in sources {
            let Some(recipients) = Self::recipients_for(&config, notification) else {
                continue;
            };
            if recipients.is_empty() {
                warn!(source = %source, "onebot: no recipients resolved, skipping");
                continue;
            }
            if let Err(error) = self.outbound.deliver(&recipients, caption).await {
                warn!(source = %source, error = %error, "onebot: delivery failed");
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Default for OnebotPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelPlugin for OnebotPlugin {
    fn id(&self) -> &str {
        CHANNEL_ONEBOT
    }

    fn name(&self) -> &str {
        "OneBot v11"
    }

    async fn start_source(&self, source: &str, config: serde_json::Value) -> Result<()> {
        let config: OnebotSourceConfig = serde_json::from_value(config)?;
        info!(source = %source, "onebot: source started");
        let mut sources = self.sources.write().unwrap_or_else(|e| e.into_inner());
        sources.insert(source.to_string(), config);
        Ok(())
    }

    async fn stop_source(&self, source: &str) -> Result<()> {
        let mut sources = self.sources.write().unwrap_or_else(|e| e.into_inner());
        if sources.remove(source).is_some() {
            info!(source = %source, "onebot: source stopped");
        } else {
            warn!(source = %source, "onebot: source not found");
        }
        Ok(())
    }

    async fn parse(
        &self,
        source: &str,
        raw: &str,
    ) -> std::result::Result<IncomingMessage, ParseOutcome> {
        let Some(config) = self.source_config(source) else {
            debug!(source = %source, "onebot: event for unknown source");
            return Err(ParseOutcome::UnknownSource);
        };

        let event = event::decode(raw)?;
        info!(
            source = %source,
            user_id = %event.user_id,
            username = event.username.as_deref().unwrap_or(""),
            message_type = event.message_type.as_deref().unwrap_or(""),
            text = %event.text,
            "onebot: message received"
        );

        if let Err(denied) = check_access(&config, &event) {
            info!(
                source = %source,
                user_id = %event.user_id,
                reason = %denied,
                "onebot: message rejected"
            );
            if let Some(notice) = denied.notice() {
                let caption = plain_caption(&Notification {
                    title: notice.to_string(),
                    ..Default::default()
                });
                if let Err(error) = self
                    .outbound
                    .deliver(&Recipients::user(event.user_id.clone()), &caption)
                    .await
                {
                    warn!(error = %error, "onebot: rejection notice not delivered");
                }
            }
            return Err(ParseOutcome::PolicyRejected);
        }

        Ok(IncomingMessage {
            channel: CHANNEL_ONEBOT.to_string(),
            source: source.to_string(),
            user_id: event.user_id,
            username: event.username,
            text: event.text,
        })
    }

    async fn send_notification(&self, notification: &Notification) -> Result<()> {
        if notification.title.is_empty()
            && notification.text.as_deref().unwrap_or_default().is_empty()
        {
            return Err(Error::invalid_input("title and text are both empty"));
        }
        let caption = plain_caption(notification);
        self.send_to_sources(notification, &caption).await
    }

    async fn send_media_list(
        &self,
        notification: &Notification,
        medias: &[MediaItem],
    ) -> Result<()> {
        let caption = media_list_caption(notification, medias);
        self.send_to_sources(notification, &caption).await
    }

    async fn send_torrent_list(
        &self,
        notification: &Notification,
        torrents: &[TorrentContext],
    ) -> Result<()> {
        let caption = torrent_list_caption(notification, torrents)?;
        self.send_to_sources(notification, &caption).await
    }

    fn probe(&self) -> bool {
        self.registry.is_connected()
    }

    fn shutdown(&self) {
        info!("onebot: channel shut down");
        self.registry.clear();
    }
}

use {
    serde::Serialize,
    std::sync::Arc,
    tracing::{debug, warn},
};

use onebridge_channels::{Error, Result};

use crate::connection::ConnectionRegistry;

const ACTION_PRIVATE: &str = "send_private_msg";
const ACTION_GROUP: &str = "send_group_msg";

/// Protocol acknowledgment correlator carried on every frame. Responses are
/// not matched against it; reserved for future use.
const ECHO_TOKEN: &str = "123";

/// Attempts per frame before the delivery is reported failed. No backoff:
/// each attempt re-reads the registry, so a reconnect is picked up
/// immediately.
pub const SEND_MAX_ATTEMPTS: usize = 3;

/// One outbound action frame. Both actions address their target through
/// `params.user_id`, as the wire protocol defines.
#[derive(Debug, Serialize)]
pub struct ActionFrame<'a> {
    action: &'static str,
    params: ActionParams<'a>,
    echo: &'static str,
}

#[derive(Debug, Serialize)]
struct ActionParams<'a> {
    user_id: &'a str,
    message: &'a str,
}

impl<'a> ActionFrame<'a> {
    fn private(user_id: &'a str, message: &'a str) -> Self {
        Self {
            action: ACTION_PRIVATE,
            params: ActionParams { user_id, message },
            echo: ECHO_TOKEN,
        }
    }

    fn group(group_id: &'a str, message: &'a str) -> Self {
        Self {
            action: ACTION_GROUP,
            params: ActionParams {
                user_id: group_id,
                message,
            },
            echo: ECHO_TOKEN,
        }
    }
}

/// Delivery targets, chosen explicitly by the caller: private frames go to
/// `users`, group frames to `groups`. Nothing is inferred from one field.
#[derive(Debug, Clone, Default)]
pub struct Recipients {
    pub users: Vec<String>,
    pub groups: Vec<String>,
}

impl Recipients {
    /// A single private recipient.
    #[must_use]
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            users: vec![id.into()],
            groups: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty()
    }
}

/// Sends action frames over the registry's live connection.
pub struct OnebotOutbound {
    registry: Arc<ConnectionRegistry>,
}

impl OnebotOutbound {
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver one caption to every recipient, one frame per target.
    ///
    /// Fails immediately when no connection is registered. Frames already
    /// sent stay sent when a later frame exhausts its retries; the first
    /// failure is reported.
    pub async fn deliver(&self, recipients: &Recipients, caption: &str) -> Result<()> {
        if !self.registry.is_connected() {
            return Err(Error::NoConnection);
        }
        for user in &recipients.users {
            self.send_frame(&ActionFrame::private(user, caption)).await?;
        }
        for group in &recipients.groups {
            self.send_frame(&ActionFrame::group(group, caption)).await?;
        }
        Ok(())
    }

    /// Send one frame with bounded retry; each attempt resolves the current
    /// connection anew so a mid-send reconnect is used and a cleared
    /// registry fails cleanly.
    async fn send_frame(&self, frame: &ActionFrame<'_>) -> Result<()> {
        let payload = serde_json::to_string(frame)?;
        for attempt in 1..=SEND_MAX_ATTEMPTS {
            let Some(conn) = self.registry.current() else {
                return Err(Error::NoConnection);
            };
            match conn.send(payload.clone()) {
                Ok(()) => {
                    if attempt > 1 {
                        debug!(attempt, action = frame.action, "onebot: frame sent after retry");
                    }
                    return Ok(());
                },
                Err(_) => {
                    debug!(
                        attempt,
                        conn_id = %conn.conn_id(),
                        action = frame.action,
                        target = %frame.params.user_id,
                        "onebot: frame send failed"
                    );
                    // Let a racing reconnect land before the next attempt.
                    tokio::task::yield_now().await;
                },
            }
        }
        warn!(
            action = frame.action,
            target = %frame.params.user_id,
            attempts = SEND_MAX_ATTEMPTS,
            "onebot: send retries exhausted"
        );
        Err(Error::send_failed(format!(
            "{} to {} after {SEND_MAX_ATTEMPTS} attempts",
            frame.action, frame.params.user_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::connection::BotConnection,
        tokio::sync::mpsc,
    };

    fn engine() -> (OnebotOutbound, Arc<ConnectionRegistry>) {
        let registry = Arc::new(ConnectionRegistry::default());
        (OnebotOutbound::new(Arc::clone(&registry)), registry)
    }

    fn attach(registry: &ConnectionRegistry) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        registry.register(BotConnection::new(tx));
        rx
    }

    #[tokio::test]
    async fn no_connection_fails_immediately() {
        let (engine, _registry) = engine();
        let result = engine.deliver(&Recipients::user("1"), "hello").await;
        assert!(matches!(result, Err(Error::NoConnection)));
    }

    #[tokio::test]
    async fn fans_out_private_and_group_frames() {
        let (engine, registry) = engine();
        let mut rx = attach(&registry);

        let recipients = Recipients {
            users: vec!["1".into(), "2".into()],
            groups: vec!["9".into()],
        };
        engine.deliver(&recipients, "hello").await.unwrap();

        let frames: Vec<serde_json::Value> = (0..3)
            .map(|_| serde_json::from_str(&rx.try_recv().unwrap()).unwrap())
            .collect();
        assert_eq!(frames[0]["action"], "send_private_msg");
        assert_eq!(frames[0]["params"]["user_id"], "1");
        assert_eq!(frames[0]["params"]["message"], "hello");
        assert_eq!(frames[0]["echo"], "123");
        assert_eq!(frames[1]["params"]["user_id"], "2");
        assert_eq!(frames[2]["action"], "send_group_msg");
        assert_eq!(frames[2]["params"]["user_id"], "9");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn user_only_recipients_send_no_group_frames() {
        let (engine, registry) = engine();
        let mut rx = attach(&registry);

        engine.deliver(&Recipients::user("7"), "hi").await.unwrap();

        let frame: serde_json::Value =
            serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(frame["action"], "send_private_msg");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dead_connection_exhausts_retries_and_reports_failure() {
        let (engine, registry) = engine();
        let rx = attach(&registry);
        drop(rx); // write task gone, handle still registered

        let result = engine.deliver(&Recipients::user("1"), "hello").await;
        assert!(matches!(result, Err(Error::SendFailed { .. })));
    }

    #[tokio::test]
    async fn reconnect_during_retry_is_picked_up() {
        let (engine, registry) = engine();
        let rx = attach(&registry);
        drop(rx); // first attempt will fail

        let registry2 = Arc::clone(&registry);
        let send = tokio::spawn(async move {
            engine.deliver(&Recipients::user("1"), "hello").await
        });
        // Replace the dead connection while the send retries.
        let (tx, mut rx2) = mpsc::unbounded_channel();
        registry2.register(BotConnection::new(tx));

        // The send either recovered onto the new connection or exhausted its
        // retries first; both are clean outcomes and neither hangs.
        match send.await.unwrap() {
            Ok(()) => {
                let frame: serde_json::Value =
                    serde_json::from_str(&rx2.recv().await.unwrap()).unwrap();
                assert_eq!(frame["params"]["user_id"], "1");
            },
            Err(error) => assert!(matches!(error, Error::SendFailed { .. })),
        }
    }

    #[tokio::test]
    async fn cleared_registry_mid_fanout_fails_with_no_connection() {
        let (engine, registry) = engine();
        let rx = attach(&registry);
        drop(rx);
        registry.clear();

        // The up-front liveness check catches the cleared slot before any
        // frame is attempted.
        let result = engine.deliver(&Recipients::user("1"), "hello").await;
        assert!(matches!(result, Err(Error::NoConnection)));
    }
}

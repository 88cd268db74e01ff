use {std::sync::Arc, tokio_util::sync::CancellationToken};

use {
    onebridge_channels::{ChannelPlugin, MessageSink},
    onebridge_onebot::OnebotPlugin,
};

/// Shared state behind the ingress routes.
pub struct GatewayState {
    pub plugin: Arc<OnebotPlugin>,
    pub sink: Arc<dyn MessageSink>,
    pub(crate) cancel: CancellationToken,
}

impl GatewayState {
    #[must_use]
    pub fn new(plugin: Arc<OnebotPlugin>, sink: Arc<dyn MessageSink>) -> Arc<Self> {
        Arc::new(Self {
            plugin,
            sink,
            cancel: CancellationToken::new(),
        })
    }

    /// Stop the service: end the connection read loop and drop the peer
    /// connection. In-flight sends observe the cleared registry and fail
    /// instead of hanging.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.plugin.shutdown();
    }
}

//! Channel plugin system.
//!
//! A channel bridges one chat platform to the host pipeline. Each channel
//! implements [`plugin::ChannelPlugin`]; the host hands accepted inbound
//! messages to a [`plugin::MessageSink`] and issues outbound sends through
//! the plugin's notification operations.

pub mod error;
pub mod gating;
pub mod plugin;

pub use {
    error::{Error, Result},
    plugin::{ChannelPlugin, MessageSink, ParseOutcome},
};

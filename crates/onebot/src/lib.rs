//! OneBot v11 channel implementation.
//!
//! Bridges the OneBot v11 JSON event/action protocol, carried over a
//! reverse websocket the peer opens toward this process, to the host
//! notification pipeline. Inbound events are decoded, checked against
//! per-source permission policy, and normalized; outbound notifications are
//! rendered into caption text and fanned out as action frames over the
//! single live connection, with bounded per-frame retry.

pub mod access;
pub mod caption;
pub mod config;
pub mod connection;
pub mod event;
pub mod outbound;
pub mod plugin;

pub use {
    config::OnebotSourceConfig,
    connection::{BotConnection, ConnectionRegistry},
    outbound::{OnebotOutbound, Recipients},
    plugin::OnebotPlugin,
};

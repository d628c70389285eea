//! Coordinator core library: Messenger webhook gateway, per-sender conversation state machine,
//! and geocoding lookups, used by the `coordinator` CLI.

pub mod channels;
pub mod config;
pub mod conversation;
pub mod gateway;
pub mod geocoding;
pub mod init;

//! Messaging channels (Facebook Messenger).
//!
//! Inbound webhook payloads are turned into [`InboundEvent`]s for the dispatcher; replies go out
//! through a [`ChannelHandle`] so the dispatcher can be driven without a network in tests.

mod handle;
mod inbound;
mod messenger;
mod outbound;

pub use handle::ChannelHandle;
pub use inbound::InboundEvent;
pub use messenger::{MessengerChannel, ThreadProfile, WebhookPayload};
pub use outbound::{DeliveryError, OutboundReply, QuickReply};

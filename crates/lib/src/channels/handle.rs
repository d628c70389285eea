//! Outbound side of a channel as seen by the dispatcher.

use super::outbound::{DeliveryError, OutboundReply};
use async_trait::async_trait;

/// Handle to a channel connector that can deliver replies.
#[async_trait]
pub trait ChannelHandle: Send + Sync {
    /// Channel id (e.g. "messenger").
    fn id(&self) -> &str;

    /// Deliver one reply (text plus optional quick replies) to its recipient.
    async fn send_reply(&self, reply: &OutboundReply) -> Result<(), DeliveryError>;

    /// Show a "typing" indicator to the recipient. Default is a no-op.
    async fn send_typing(&self, _recipient_id: &str) -> Result<(), DeliveryError> {
        Ok(())
    }
}

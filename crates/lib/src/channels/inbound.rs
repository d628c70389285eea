//! Inbound event from a channel: delivered to the dispatcher, processed once.

/// A button click (postback) or a free-text message from a sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Postback { sender_id: String, payload: String },
    Message { sender_id: String, text: String },
}

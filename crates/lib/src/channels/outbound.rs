//! Outbound reply and delivery error.

/// Tappable option shown under a reply. `payload` comes back as a postback when tapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickReply {
    pub label: String,
    pub payload: String,
}

impl QuickReply {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// One reply to a recipient, consumed once by a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    pub recipient_id: String,
    pub text: String,
    pub quick_replies: Option<Vec<QuickReply>>,
}

impl OutboundReply {
    pub fn text(recipient_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            text: text.into(),
            quick_replies: None,
        }
    }

    pub fn with_quick_replies(mut self, quick_replies: Vec<QuickReply>) -> Self {
        self.quick_replies = Some(quick_replies);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("messenger access token not configured")]
    NotConfigured,
    #[error("delivery request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("delivery api error: {0}")]
    Api(String),
}

//! Messenger channel: webhook payload parsing, Send API delivery, and page setup via the Graph API.

use super::handle::ChannelHandle;
use super::inbound::InboundEvent;
use super::outbound::{DeliveryError, OutboundReply, QuickReply};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v18.0";
const SUBSCRIBED_FIELDS: &str = "messages,messaging_postbacks";

/// Messenger webhook POST body: `{ "object": "page", "entry": [ { "messaging": [...] } ] }`.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Deserialize)]
pub struct MessagingEvent {
    pub sender: Party,
    #[serde(default)]
    pub postback: Option<PostbackBody>,
    #[serde(default)]
    pub message: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
pub struct Party {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct PostbackBody {
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub is_echo: bool,
    #[serde(default)]
    pub quick_reply: Option<QuickReplyBody>,
}

#[derive(Debug, Deserialize)]
pub struct QuickReplyBody {
    pub payload: String,
}

impl WebhookPayload {
    /// Flatten into inbound events. Non-page objects, echoes and messages without text are dropped;
    /// a tapped quick reply counts as a postback with its payload.
    pub fn into_events(self) -> Vec<InboundEvent> {
        if self.object != "page" {
            return Vec::new();
        }
        self.entry
            .into_iter()
            .flat_map(|e| e.messaging)
            .filter_map(MessagingEvent::into_event)
            .collect()
    }
}

impl MessagingEvent {
    fn into_event(self) -> Option<InboundEvent> {
        let sender_id = self.sender.id;
        if let Some(payload) = self.postback.and_then(|p| p.payload) {
            return Some(InboundEvent::Postback { sender_id, payload });
        }
        let message = self.message?;
        if message.is_echo {
            return None;
        }
        if let Some(qr) = message.quick_reply {
            return Some(InboundEvent::Postback {
                sender_id,
                payload: qr.payload,
            });
        }
        message
            .text
            .map(|text| InboundEvent::Message { sender_id, text })
    }
}

/// Page profile applied once at startup: greeting, get-started payload, persistent menu.
#[derive(Debug, Clone)]
pub struct ThreadProfile {
    pub greeting: String,
    pub get_started_payload: String,
    /// Persistent menu entries, sent as postback buttons.
    pub menu: Vec<QuickReply>,
}

impl ThreadProfile {
    fn to_body(&self) -> serde_json::Value {
        let buttons: Vec<serde_json::Value> = self
            .menu
            .iter()
            .map(|b| json!({ "type": "postback", "title": b.label, "payload": b.payload }))
            .collect();
        json!({
            "greeting": [{ "locale": "default", "text": self.greeting }],
            "get_started": { "payload": self.get_started_payload },
            "persistent_menu": [{
                "locale": "default",
                "composer_input_disabled": false,
                "call_to_actions": buttons,
            }],
        })
    }
}

fn reply_body(reply: &OutboundReply) -> serde_json::Value {
    let mut message = json!({ "text": reply.text });
    if let Some(ref qrs) = reply.quick_replies {
        let items: Vec<serde_json::Value> = qrs
            .iter()
            .map(|q| json!({ "content_type": "text", "title": q.label, "payload": q.payload }))
            .collect();
        message["quick_replies"] = serde_json::Value::Array(items);
    }
    json!({
        "recipient": { "id": reply.recipient_id },
        "message": message,
    })
}

/// Messenger channel connector: sends replies through the Send API and configures the page.
pub struct MessengerChannel {
    id: String,
    access_token: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl MessengerChannel {
    pub fn new(access_token: Option<String>, api_base: Option<String>) -> Self {
        let api_base = api_base
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| GRAPH_API_BASE.to_string());
        Self {
            id: "messenger".to_string(),
            access_token,
            api_base,
            client: reqwest::Client::new(),
        }
    }

    /// POST {graph}/me/{path}?access_token=... with a JSON body; non-2xx is an Api error.
    async fn post_graph(
        &self,
        path: &str,
        body: &serde_json::Value,
        what: &str,
    ) -> Result<(), DeliveryError> {
        let token = self
            .access_token
            .as_ref()
            .ok_or(DeliveryError::NotConfigured)?;
        let url = format!("{}/me/{}", self.api_base, path);
        let res = self
            .client
            .post(&url)
            .query(&[("access_token", token.as_str())])
            .json(body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DeliveryError::Api(format!("{} failed: {} {}", what, status, body)));
        }
        Ok(())
    }

    /// Send a text reply (with optional quick replies) via the Send API.
    pub async fn send_message(&self, reply: &OutboundReply) -> Result<(), DeliveryError> {
        self.post_graph("messages", &reply_body(reply), "send message")
            .await
    }

    /// Send the `typing_on` sender action.
    pub async fn send_typing(&self, recipient_id: &str) -> Result<(), DeliveryError> {
        let body = json!({
            "recipient": { "id": recipient_id },
            "sender_action": "typing_on",
        });
        self.post_graph("messages", &body, "typing indicator").await
    }

    /// Subscribe this app to the page's message and postback webhooks.
    pub async fn subscribe_page(&self) -> Result<(), DeliveryError> {
        let body = json!({ "subscribed_fields": SUBSCRIBED_FIELDS });
        self.post_graph("subscribed_apps", &body, "subscribe page")
            .await
    }

    /// Apply greeting, get-started button and persistent menu.
    pub async fn set_thread_profile(&self, profile: &ThreadProfile) -> Result<(), DeliveryError> {
        self.post_graph("messenger_profile", &profile.to_body(), "set messenger profile")
            .await
    }
}

#[async_trait]
impl ChannelHandle for MessengerChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_reply(&self, reply: &OutboundReply) -> Result<(), DeliveryError> {
        MessengerChannel::send_message(self, reply).await
    }

    async fn send_typing(&self, recipient_id: &str) -> Result<(), DeliveryError> {
        MessengerChannel::send_typing(self, recipient_id).await
    }
}

//! Gateway HTTP wire types (webhook verification, health).

use serde::{Deserialize, Serialize};

/// Query of Messenger's webhook verification GET: `hub.mode`, `hub.verify_token`, `hub.challenge`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode", default)]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge", default)]
    pub challenge: Option<String>,
}

impl VerifyParams {
    /// Challenge to echo back when this is a subscribe request carrying the expected token.
    pub fn accept(&self, expected_token: &str) -> Option<&str> {
        if self.mode.as_deref() != Some("subscribe") {
            return None;
        }
        if self.verify_token.as_deref() != Some(expected_token) {
            return None;
        }
        self.challenge.as_deref()
    }
}

/// GET / payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub runtime: String,
    pub conversations: usize,
    pub port: u16,
}

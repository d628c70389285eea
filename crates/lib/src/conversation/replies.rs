//! Fixed reply texts, postback payloads, the menu, and the page profile.

use crate::channels::{QuickReply, ThreadProfile};

pub const PAYLOAD_START: &str = "START";
pub const PAYLOAD_COORDINATES: &str = "COORDINATES";
pub const PAYLOAD_FULL_ADDRESS: &str = "FULL_ADDRESS";

// "resutls" is the text users have always seen; keep it.
pub const NOT_FOUND: &str = "There were no resutls. Ask me again, please";
pub const ASK_LOCATION: &str = "Enter destination";
pub const UNKNOWN_COMMAND: &str = "Sorry, I did not recognize your command";
pub const MENU_GREETING: &str = "What do you want to look up?";

const PAGE_GREETING: &str = "Coordinator welcomes you!";

/// Quick replies shown with the menu greeting.
pub fn menu_quick_replies() -> Vec<QuickReply> {
    vec![
        QuickReply::new("Coordinates", PAYLOAD_COORDINATES),
        QuickReply::new("Full address", PAYLOAD_FULL_ADDRESS),
    ]
}

/// Greeting, get-started button and persistent menu applied to the page at startup.
pub fn thread_profile() -> ThreadProfile {
    ThreadProfile {
        greeting: PAGE_GREETING.to_string(),
        get_started_payload: PAYLOAD_START.to_string(),
        menu: vec![
            QuickReply::new("Get coordinates", PAYLOAD_COORDINATES),
            QuickReply::new("Get full address", PAYLOAD_FULL_ADDRESS),
        ],
    }
}

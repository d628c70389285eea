//! Pure state transition function
//!
//! `transition(mode, event)` decides the sender's next mode and the effects to run. It does no
//! I/O: lookups are requested as an effect and their outcome comes back as another event.

use super::mode::{ConversationMode, LookupKind};
use super::replies::{
    menu_quick_replies, ASK_LOCATION, MENU_GREETING, NOT_FOUND, PAYLOAD_COORDINATES,
    PAYLOAD_FULL_ADDRESS, PAYLOAD_START, UNKNOWN_COMMAND,
};
use crate::channels::QuickReply;
use crate::geocoding::{to_address_text, to_coordinate_text, Location};

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Button click carrying a payload token.
    Postback(String),
    /// Free text typed by the sender.
    Message(String),
    /// A requested lookup finished.
    LookupCompleted {
        kind: LookupKind,
        outcome: LookupOutcome,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(Location),
    NotFound,
    /// Transport, provider or parse failure. Users see the same reply as NotFound.
    Failed,
}

/// Effects to be executed after a transition, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a text reply to the sender.
    Reply {
        text: String,
        quick_replies: Option<Vec<QuickReply>>,
    },
    /// Show the typing indicator.
    Typing,
    /// Geocode `query`; the result is fed back as `Event::LookupCompleted`.
    Lookup { kind: LookupKind, query: String },
}

impl Effect {
    fn reply(text: impl Into<String>) -> Self {
        Effect::Reply {
            text: text.into(),
            quick_replies: None,
        }
    }

    fn menu() -> Self {
        Effect::Reply {
            text: MENU_GREETING.to_string(),
            quick_replies: Some(menu_quick_replies()),
        }
    }
}

/// Result of a state transition
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub mode: ConversationMode,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn new(mode: ConversationMode) -> Self {
        Self {
            mode,
            effects: Vec::new(),
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Command named by free text: `coord`/`gps` means coordinates, `full ad` means full address
/// (catches misspellings like "full adress"). Case-insensitive; coordinates win.
pub fn match_command(text: &str) -> Option<LookupKind> {
    let lower = text.to_lowercase();
    if lower.contains("coord") || lower.contains("gps") {
        Some(LookupKind::Coordinates)
    } else if lower.contains("full ad") {
        Some(LookupKind::FullAddress)
    } else {
        None
    }
}

fn show_menu() -> Transition {
    Transition::new(ConversationMode::AwaitingMenuSelection).with_effect(Effect::menu())
}

fn ask_location(kind: LookupKind) -> Transition {
    Transition::new(kind.awaiting_mode()).with_effect(Effect::reply(ASK_LOCATION))
}

pub fn transition(mode: ConversationMode, event: Event) -> Transition {
    match event {
        Event::Postback(payload) => match payload.as_str() {
            PAYLOAD_START => show_menu(),
            PAYLOAD_COORDINATES => ask_location(LookupKind::Coordinates),
            PAYLOAD_FULL_ADDRESS => ask_location(LookupKind::FullAddress),
            _ => Transition::new(mode),
        },

        Event::Message(text) => match mode {
            ConversationMode::Idle => show_menu(),
            ConversationMode::AwaitingMenuSelection => match match_command(&text) {
                Some(kind) => ask_location(kind),
                None => Transition::new(ConversationMode::AwaitingMenuSelection)
                    .with_effect(Effect::reply(UNKNOWN_COMMAND))
                    .with_effect(Effect::menu()),
            },
            ConversationMode::AwaitingLocationForCoordinates
            | ConversationMode::AwaitingLocationForAddress => {
                let Some(kind) = mode.lookup_kind() else {
                    return Transition::new(mode);
                };
                Transition::new(mode)
                    .with_effect(Effect::Typing)
                    .with_effect(Effect::Lookup { kind, query: text })
            }
        },

        Event::LookupCompleted { kind, outcome } => match outcome {
            LookupOutcome::Found(location) => {
                let text = match kind {
                    LookupKind::Coordinates => to_coordinate_text(&location),
                    LookupKind::FullAddress => to_address_text(&location),
                };
                Transition::new(ConversationMode::Idle).with_effect(Effect::reply(text))
            }
            LookupOutcome::NotFound | LookupOutcome::Failed => {
                Transition::new(mode.retry_target()).with_effect(Effect::reply(NOT_FOUND))
            }
        },
    }
}

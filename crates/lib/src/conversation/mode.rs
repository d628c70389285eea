//! Conversation mode: what the bot expects the sender's next message to mean.

/// Which formatter a location lookup feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Coordinates,
    FullAddress,
}

impl LookupKind {
    /// Mode that waits for a location string for this kind of lookup.
    pub fn awaiting_mode(self) -> ConversationMode {
        match self {
            LookupKind::Coordinates => ConversationMode::AwaitingLocationForCoordinates,
            LookupKind::FullAddress => ConversationMode::AwaitingLocationForAddress,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConversationMode {
    /// No menu shown yet (or last lookup succeeded); any message shows the menu.
    #[default]
    Idle,
    /// Menu shown; free text is matched against commands.
    AwaitingMenuSelection,
    AwaitingLocationForCoordinates,
    AwaitingLocationForAddress,
}

impl ConversationMode {
    /// Lookup kind when this mode is waiting for a location string.
    pub fn lookup_kind(self) -> Option<LookupKind> {
        match self {
            ConversationMode::AwaitingLocationForCoordinates => Some(LookupKind::Coordinates),
            ConversationMode::AwaitingLocationForAddress => Some(LookupKind::FullAddress),
            ConversationMode::Idle | ConversationMode::AwaitingMenuSelection => None,
        }
    }

    /// Mode to return to after a lookup came back empty or failed.
    pub fn retry_target(self) -> ConversationMode {
        match self {
            ConversationMode::AwaitingLocationForCoordinates => {
                ConversationMode::AwaitingLocationForCoordinates
            }
            ConversationMode::AwaitingLocationForAddress => {
                ConversationMode::AwaitingLocationForAddress
            }
            ConversationMode::AwaitingMenuSelection => ConversationMode::AwaitingMenuSelection,
            ConversationMode::Idle => ConversationMode::Idle,
        }
    }
}

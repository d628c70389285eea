//! Conversation handling: per-sender mode, the pure transition function, and the dispatcher
//! that runs transition effects against the geocoder and the channel.

mod dispatcher;
mod mode;
mod replies;
mod store;
mod transition;

pub use dispatcher::Dispatcher;
pub use mode::{ConversationMode, LookupKind};
pub use replies::{menu_quick_replies, thread_profile};
pub use store::ModeStore;
pub use transition::{match_command, transition, Effect, Event, LookupOutcome, Transition};

//! Dispatcher: runs one inbound event to completion for its sender.
//!
//! Loads the sender's mode, feeds the event through [`transition`], executes the effects
//! (replies, typing indicator, geocoding lookups), and stores the resulting mode.

use super::mode::ConversationMode;
use super::store::ModeStore;
use super::transition::{transition, Effect, Event, LookupOutcome};
use crate::channels::{ChannelHandle, InboundEvent, OutboundReply};
use crate::geocoding::{GeocodeResult, Geocoder};
use std::sync::Arc;

pub struct Dispatcher {
    store: Arc<ModeStore>,
    geocoder: Arc<dyn Geocoder>,
    channel: Arc<dyn ChannelHandle>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<ModeStore>,
        geocoder: Arc<dyn Geocoder>,
        channel: Arc<dyn ChannelHandle>,
    ) -> Self {
        Self {
            store,
            geocoder,
            channel,
        }
    }

    pub fn store(&self) -> &Arc<ModeStore> {
        &self.store
    }

    /// Handle one inbound event; returns the sender's new mode.
    pub async fn handle(&self, event: InboundEvent) -> ConversationMode {
        let (sender_id, event) = match event {
            InboundEvent::Postback { sender_id, payload } => (sender_id, Event::Postback(payload)),
            InboundEvent::Message { sender_id, text } => (sender_id, Event::Message(text)),
        };
        let mut mode = self.store.get(&sender_id).await;
        log::debug!("dispatch: {} in {:?} got {:?}", sender_id, mode, event);

        let mut pending = Some(event);
        while let Some(event) = pending.take() {
            let t = transition(mode, event);
            mode = t.mode;
            for effect in t.effects {
                match effect {
                    Effect::Reply {
                        text,
                        quick_replies,
                    } => {
                        let reply = OutboundReply::text(sender_id.as_str(), text);
                        let reply = match quick_replies {
                            Some(qrs) => reply.with_quick_replies(qrs),
                            None => reply,
                        };
                        self.deliver(&reply).await;
                    }
                    Effect::Typing => {
                        if let Err(e) = self.channel.send_typing(&sender_id).await {
                            log::debug!("dispatch: typing indicator failed: {}", e);
                        }
                    }
                    Effect::Lookup { kind, query } => {
                        let outcome = self.lookup(&query).await;
                        pending = Some(Event::LookupCompleted { kind, outcome });
                    }
                }
            }
        }

        self.store.set(&sender_id, mode).await;
        mode
    }

    async fn lookup(&self, query: &str) -> LookupOutcome {
        match self.geocoder.lookup(query).await {
            Ok(GeocodeResult::Found(location)) => LookupOutcome::Found(location),
            Ok(GeocodeResult::NotFound) => {
                log::info!("geocoding: no results for {:?}", query);
                LookupOutcome::NotFound
            }
            Err(e) => {
                log::warn!("geocoding: lookup failed for {:?}: {}", query, e);
                LookupOutcome::Failed
            }
        }
    }

    /// A failed send loses that reply only; the conversation keeps going.
    async fn deliver(&self, reply: &OutboundReply) {
        if let Err(e) = self.channel.send_reply(reply).await {
            log::warn!(
                "{}: reply to {} not delivered: {}",
                self.channel.id(),
                reply.recipient_id,
                e
            );
        }
    }
}

//! Gateway: webhook HTTP server.
//!
//! One port serves Messenger webhook verification (GET /webhook), event delivery
//! (POST /webhook) and a health probe (GET /). Events are queued and handled one at a time.

mod protocol;
mod server;

pub use protocol::{Health, VerifyParams};
pub use server::{configure_page, run_gateway};

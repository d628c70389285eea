//! Geocoding: free-text address lookup and reply formatting.
//!
//! The client talks to a Google-style geocoding JSON endpoint; the formatter turns a
//! found location into the text sent back to the user.

mod client;
mod format;

pub use client::{GeocodeError, GeocodingClient};
pub use format::{to_address_text, to_coordinate_text};

use async_trait::async_trait;

/// A resolved location: first candidate returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
}

/// Outcome of a lookup that reached the provider and was understood.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeResult {
    Found(Location),
    NotFound,
}

/// Resolves a free-text query to a location. Implemented by [`GeocodingClient`]; tests use fakes.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<GeocodeResult, GeocodeError>;
}

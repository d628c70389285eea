//! Geocoding API client (Google Geocoding JSON API by default).

use super::{GeocodeResult, Geocoder, Location};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const STATUS_OK: &str = "OK";
const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// Client for the geocoding HTTP API.
#[derive(Clone)]
pub struct GeocodingClient {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

/// Lookup failure: anything other than a well-formed answer from the provider.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geocoding request timed out after {0:?}")]
    Timeout(Duration),
    #[error("geocoding api error: {0}")]
    Api(String),
    #[error("geocoding provider status {0}")]
    Status(String),
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<Candidate>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GeocodingClient {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Self {
        let base_url = base_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_key,
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
            client: reqwest::Client::new(),
        }
    }

    /// GET {base}?address=<query>[&key=<key>]: one request, first candidate wins.
    pub async fn lookup(&self, query: &str) -> Result<GeocodeResult, GeocodeError> {
        match tokio::time::timeout(self.timeout, self.request(query)).await {
            Ok(res) => res,
            Err(_) => Err(GeocodeError::Timeout(self.timeout)),
        }
    }

    async fn request(&self, query: &str) -> Result<GeocodeResult, GeocodeError> {
        let mut params = vec![("address", query)];
        if let Some(ref key) = self.api_key {
            params.push(("key", key.as_str()));
        }
        let res = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(GeocodeError::Api(format!("{} {}", status, body)));
        }
        let data: GeocodeResponse = res.json().await?;
        interpret(data)
    }
}

#[async_trait]
impl Geocoder for GeocodingClient {
    async fn lookup(&self, query: &str) -> Result<GeocodeResult, GeocodeError> {
        GeocodingClient::lookup(self, query).await
    }
}

/// Map a provider response to a result: ZERO_RESULTS (or OK with no candidates) is not-found,
/// other statuses are errors.
fn interpret(data: GeocodeResponse) -> Result<GeocodeResult, GeocodeError> {
    match data.status.as_str() {
        STATUS_ZERO_RESULTS => Ok(GeocodeResult::NotFound),
        STATUS_OK => Ok(data
            .results
            .into_iter()
            .next()
            .map(|c| {
                GeocodeResult::Found(Location {
                    latitude: c.geometry.location.lat,
                    longitude: c.geometry.location.lng,
                    formatted_address: c.formatted_address,
                })
            })
            .unwrap_or(GeocodeResult::NotFound)),
        other => Err(GeocodeError::Status(match data.error_message {
            Some(msg) => format!("{}: {}", other, msg),
            None => other.to_string(),
        })),
    }
}

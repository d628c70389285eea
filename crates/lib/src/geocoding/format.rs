//! Reply text for a found location.

use super::Location;

/// `Latitude: <lat>, Longitude: <lng>`, numbers in shortest round-trip form.
pub fn to_coordinate_text(location: &Location) -> String {
    format!(
        "Latitude: {}, Longitude: {}",
        location.latitude, location.longitude
    )
}

pub fn to_address_text(location: &Location) -> String {
    location.formatted_address.clone()
}

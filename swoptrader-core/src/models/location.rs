use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::normalize_label;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic point with an optional human-readable address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, address: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            address: address.into(),
        }
    }

    /// Great-circle distance to another point in kilometres (haversine).
    pub fn distance_km(&self, other: &Location) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetupLocationType {
    #[default]
    PublicPlace,
    PoliceStation,
    Cafe,
    Mall,
    Park,
    Custom,
}

impl MeetupLocationType {
    pub const ALL: [MeetupLocationType; 6] = [
        MeetupLocationType::PublicPlace,
        MeetupLocationType::PoliceStation,
        MeetupLocationType::Cafe,
        MeetupLocationType::Mall,
        MeetupLocationType::Park,
        MeetupLocationType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeetupLocationType::PublicPlace => "PUBLIC_PLACE",
            MeetupLocationType::PoliceStation => "POLICE_STATION",
            MeetupLocationType::Cafe => "CAFE",
            MeetupLocationType::Mall => "MALL",
            MeetupLocationType::Park => "PARK",
            MeetupLocationType::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for MeetupLocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetupLocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == label)
            .ok_or_else(|| format!("Invalid meetup location type '{}'", s))
    }
}

/// Where a meetup takes place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MeetupLocation {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: MeetupLocationType,
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::location::MeetupLocation;
use super::{new_id, normalize_label, now_millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetupType {
    #[default]
    Pickup,
    Delivery,
}

impl MeetupType {
    pub const ALL: [MeetupType; 2] = [MeetupType::Pickup, MeetupType::Delivery];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeetupType::Pickup => "PICKUP",
            MeetupType::Delivery => "DELIVERY",
        }
    }
}

impl fmt::Display for MeetupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == label)
            .ok_or_else(|| format!("Invalid meetup type '{}'. Valid options: pickup, delivery", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetupStatus {
    #[default]
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl MeetupStatus {
    pub const ALL: [MeetupStatus; 5] = [
        MeetupStatus::Pending,
        MeetupStatus::Confirmed,
        MeetupStatus::InProgress,
        MeetupStatus::Completed,
        MeetupStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeetupStatus::Pending => "PENDING",
            MeetupStatus::Confirmed => "CONFIRMED",
            MeetupStatus::InProgress => "IN_PROGRESS",
            MeetupStatus::Completed => "COMPLETED",
            MeetupStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for MeetupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == label)
            .ok_or_else(|| format!("Invalid meetup status '{}'", s))
    }
}

/// An in-person exchange scheduled for an offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Meetup {
    pub id: String,
    pub offer_id: String,
    pub participant_ids: Vec<String>,
    pub location: MeetupLocation,
    pub scheduled_at: i64,
    pub meetup_type: MeetupType,
    pub status: MeetupStatus,
    pub notes: String,
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Meetup {
    pub fn new(
        offer_id: impl Into<String>,
        participant_ids: Vec<String>,
        location: MeetupLocation,
        scheduled_at: i64,
    ) -> Self {
        let now = now_millis();
        Self {
            id: new_id("meetup"),
            offer_id: offer_id.into(),
            participant_ids,
            location,
            scheduled_at,
            created_at: now,
            updated_at: now,
            ..Self::default()
        }
    }

    pub fn with_type(mut self, meetup_type: MeetupType) -> Self {
        self.meetup_type = meetup_type;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn complete(&mut self, at: i64) {
        self.status = MeetupStatus::Completed;
        self.completed_at = Some(at);
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meetup_status_from_str() {
        assert_eq!(
            "in progress".parse::<MeetupStatus>().unwrap(),
            MeetupStatus::InProgress
        );
        assert_eq!(
            "COMPLETED".parse::<MeetupStatus>().unwrap(),
            MeetupStatus::Completed
        );
        assert!("done".parse::<MeetupStatus>().is_err());
    }

    #[test]
    fn test_complete_sets_timestamp() {
        let mut meetup = Meetup::new(
            "offer_1",
            vec!["a".into(), "b".into()],
            MeetupLocation::default(),
            0,
        );
        meetup.complete(1234);

        assert_eq!(meetup.status, MeetupStatus::Completed);
        assert_eq!(meetup.completed_at, Some(1234));
        assert_eq!(meetup.updated_at, 1234);
    }
}

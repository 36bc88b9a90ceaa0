use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::meetup::Meetup;
use super::{new_id, normalize_label, now_millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Countered,
    Expired,
    Cancelled,
}

impl OfferStatus {
    pub const ALL: [OfferStatus; 6] = [
        OfferStatus::Pending,
        OfferStatus::Accepted,
        OfferStatus::Rejected,
        OfferStatus::Countered,
        OfferStatus::Expired,
        OfferStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "PENDING",
            OfferStatus::Accepted => "ACCEPTED",
            OfferStatus::Rejected => "REJECTED",
            OfferStatus::Countered => "COUNTERED",
            OfferStatus::Expired => "EXPIRED",
            OfferStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == label)
            .ok_or_else(|| {
                format!(
                    "Invalid offer status '{}'. Valid options: pending, accepted, rejected, countered, expired, cancelled",
                    s
                )
            })
    }
}

/// A trade pitch: items offered by `from_user_id` for `requested_item_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Offer {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub requested_item_id: String,
    pub offered_item_ids: Vec<String>,
    pub status: OfferStatus,
    pub message: String,
    pub cash_amount: Option<f64>,
    pub meetup: Option<Meetup>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Offer {
    pub fn new(
        from_user_id: impl Into<String>,
        to_user_id: impl Into<String>,
        requested_item_id: impl Into<String>,
    ) -> Self {
        let now = now_millis();
        Self {
            id: new_id("offer"),
            from_user_id: from_user_id.into(),
            to_user_id: to_user_id.into(),
            requested_item_id: requested_item_id.into(),
            created_at: now,
            updated_at: now,
            ..Self::default()
        }
    }

    pub fn with_offered_items(mut self, item_ids: Vec<String>) -> Self {
        self.offered_item_ids = item_ids;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_cash(mut self, amount: f64) -> Self {
        self.cash_amount = Some(amount);
        self
    }

    pub fn participant_ids(&self) -> Vec<String> {
        vec![self.from_user_id.clone(), self.to_user_id.clone()]
    }
}

impl fmt::Display for Offer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Offer {} [{}]", self.id, self.status)?;
        writeln!(f, "From: {}  To: {}", self.from_user_id, self.to_user_id)?;
        writeln!(f, "Requested item: {}", self.requested_item_id)?;
        if !self.offered_item_ids.is_empty() {
            writeln!(f, "Offered items: {}", self.offered_item_ids.join(", "))?;
        }
        if let Some(cash) = self.cash_amount {
            writeln!(f, "Cash: {:.2}", cash)?;
        }
        if let Some(meetup) = &self.meetup {
            writeln!(f, "Meetup: {} ({})", meetup.location.name, meetup.status)?;
        }
        if !self.message.is_empty() {
            writeln!(f, "\n{}", self.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_builder() {
        let offer = Offer::new("alice", "bob", "item_1")
            .with_offered_items(vec!["item_2".into(), "item_3".into()])
            .with_message("Swap?")
            .with_cash(5.0);

        assert!(offer.id.starts_with("offer_"));
        assert_eq!(offer.status, OfferStatus::Pending);
        assert_eq!(offer.offered_item_ids.len(), 2);
        assert_eq!(offer.cash_amount, Some(5.0));
        assert_eq!(offer.participant_ids(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_offer_status_display_and_parse() {
        for status in OfferStatus::ALL {
            assert_eq!(status.to_string().parse::<OfferStatus>().unwrap(), status);
        }
        assert_eq!(
            "countered".parse::<OfferStatus>().unwrap(),
            OfferStatus::Countered
        );
        assert!("maybe".parse::<OfferStatus>().is_err());
    }
}

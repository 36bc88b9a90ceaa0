use serde::{Deserialize, Serialize};

use super::new_id;

/// One item changing hands in a completed trade; `user_id` is the new owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TradedItem {
    pub item_id: String,
    pub user_id: String,
    pub item_name: String,
    pub item_image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TradeRating {
    pub rating: u8,
    pub comment: String,
    pub rated_by: String,
}

/// Record of a completed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TradeHistory {
    pub id: String,
    pub offer_id: String,
    pub participant_ids: Vec<String>,
    pub items_traded: Vec<TradedItem>,
    pub completed_at: i64,
    pub meetup_id: Option<String>,
    pub rating: Option<TradeRating>,
    pub carbon_saved: f64,
    pub trade_score_earned: i64,
}

impl TradeHistory {
    pub fn new(offer_id: impl Into<String>, participant_ids: Vec<String>, completed_at: i64) -> Self {
        Self {
            id: new_id("trade"),
            offer_id: offer_id.into(),
            participant_ids,
            completed_at,
            ..Self::default()
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.participant_ids.iter().any(|p| p == user_id)
    }
}

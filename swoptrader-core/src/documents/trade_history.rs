use serde_json::{json, Value};

use super::{into_document, DecodeError, Document, DocumentCodec, FieldReader};
use crate::models::{TradeHistory, TradeRating, TradedItem};

impl DocumentCodec for TradeHistory {
    fn to_document(&self) -> Document {
        let items: Vec<Value> = self
            .items_traded
            .iter()
            .map(|item| {
                json!({
                    "itemId": item.item_id,
                    "userId": item.user_id,
                    "itemName": item.item_name,
                    "itemImage": item.item_image,
                })
            })
            .collect();

        let rating = match &self.rating {
            Some(rating) => json!({
                "rating": rating.rating,
                "comment": rating.comment,
                "ratedBy": rating.rated_by,
            }),
            None => Value::Null,
        };

        into_document(json!({
            "id": self.id,
            "offerId": self.offer_id,
            "participantIds": self.participant_ids,
            "itemsTraded": items,
            "completedAt": self.completed_at,
            "meetupId": self.meetup_id,
            "rating": rating,
            "carbonSaved": self.carbon_saved,
            "tradeScoreEarned": self.trade_score_earned,
        }))
    }

    fn from_document(id: &str, doc: &Document) -> Result<Self, DecodeError> {
        let r = FieldReader::new(id, doc);

        let items_traded = r
            .maps("itemsTraded")
            .into_iter()
            .map(|item| TradedItem {
                item_id: item.string("itemId"),
                user_id: item.string("userId"),
                item_name: item.string("itemName"),
                item_image: item.string("itemImage"),
            })
            .collect();

        let rating = r.map("rating").map(|rating| TradeRating {
            rating: rating.i64("rating").clamp(0, 5) as u8,
            comment: rating.string("comment"),
            rated_by: rating.string("ratedBy"),
        });

        Ok(TradeHistory {
            id: id.to_string(),
            offer_id: r.required_string("offerId")?,
            participant_ids: r.strings("participantIds"),
            items_traded,
            completed_at: r.millis_or_now("completedAt"),
            meetup_id: r.opt_string("meetupId"),
            rating,
            carbon_saved: r.f64("carbonSaved"),
            trade_score_earned: r.i64("tradeScoreEarned"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TradeHistory {
        let mut history = TradeHistory::new("offer_1", vec!["alice".into(), "bob".into()], 1_000);
        history.items_traded = vec![
            TradedItem {
                item_id: "item_1".into(),
                user_id: "alice".into(),
                item_name: "Camera".into(),
                item_image: "https://img/cam.jpg".into(),
            },
            TradedItem {
                item_id: "item_2".into(),
                user_id: "bob".into(),
                item_name: "Books".into(),
                item_image: String::new(),
            },
        ];
        history.meetup_id = Some("meetup_1".into());
        history.carbon_saved = 5.5;
        history.trade_score_earned = 36;
        history
    }

    #[test]
    fn test_trade_history_roundtrip() {
        let mut history = sample();
        history.rating = Some(TradeRating {
            rating: 4,
            comment: "Smooth".into(),
            rated_by: "alice".into(),
        });

        let decoded = TradeHistory::from_document(&history.id, &history.to_document()).unwrap();
        assert_eq!(decoded, history);
    }

    #[test]
    fn test_trade_history_skips_malformed_items() {
        let history = sample();
        let mut doc = history.to_document();
        doc.insert(
            "itemsTraded".into(),
            json!([{"itemId": "item_9", "userId": "bob"}, "garbage", 42]),
        );
        doc.remove("meetupId");

        let decoded = TradeHistory::from_document(&history.id, &doc).unwrap();
        assert_eq!(decoded.items_traded.len(), 1);
        assert_eq!(decoded.items_traded[0].item_name, "");
        assert_eq!(decoded.meetup_id, None);
    }
}

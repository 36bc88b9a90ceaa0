use serde_json::{json, Value};

use super::{into_document, DecodeError, Document, DocumentCodec, FieldReader};
use crate::models::{Meetup, MeetupLocation, Offer};

fn meetup_location_to_value(location: &MeetupLocation) -> Value {
    json!({
        "name": location.name,
        "address": location.address,
        "latitude": location.latitude,
        "longitude": location.longitude,
        "type": location.location_type.as_str(),
    })
}

fn read_meetup_location(reader: Option<FieldReader<'_>>) -> MeetupLocation {
    match reader {
        Some(loc) => MeetupLocation {
            name: loc.string("name"),
            address: loc.string("address"),
            latitude: loc.f64("latitude"),
            longitude: loc.f64("longitude"),
            location_type: loc.enumeration("type"),
        },
        None => MeetupLocation::default(),
    }
}

fn read_meetup(r: &FieldReader<'_>, id: String) -> Result<Meetup, DecodeError> {
    Ok(Meetup {
        id,
        offer_id: r.required_string("offerId")?,
        participant_ids: r.strings("participantIds"),
        location: read_meetup_location(r.map("location")),
        scheduled_at: r.i64("scheduledAt"),
        meetup_type: r.enumeration("meetupType"),
        status: r.enumeration("status"),
        notes: r.string("notes"),
        completed_at: r.opt_i64("completedAt"),
        created_at: r.millis_or_now("createdAt"),
        updated_at: r.millis_or_now("updatedAt"),
    })
}

impl DocumentCodec for Meetup {
    fn to_document(&self) -> Document {
        into_document(json!({
            "id": self.id,
            "offerId": self.offer_id,
            "participantIds": self.participant_ids,
            "location": meetup_location_to_value(&self.location),
            "scheduledAt": self.scheduled_at,
            "meetupType": self.meetup_type.as_str(),
            "status": self.status.as_str(),
            "notes": self.notes,
            "completedAt": self.completed_at,
            "createdAt": self.created_at,
            "updatedAt": self.updated_at,
        }))
    }

    fn from_document(id: &str, doc: &Document) -> Result<Self, DecodeError> {
        read_meetup(&FieldReader::new(id, doc), id.to_string())
    }
}

impl DocumentCodec for Offer {
    fn to_document(&self) -> Document {
        let meetup = self
            .meetup
            .as_ref()
            .map(|m| Value::Object(m.to_document()))
            .unwrap_or(Value::Null);

        into_document(json!({
            "id": self.id,
            "fromUserId": self.from_user_id,
            "toUserId": self.to_user_id,
            "requestedItemId": self.requested_item_id,
            "offeredItemIds": self.offered_item_ids,
            "status": self.status.as_str(),
            "message": self.message,
            "cashAmount": self.cash_amount,
            "meetup": meetup,
            "createdAt": self.created_at,
            "updatedAt": self.updated_at,
        }))
    }

    fn from_document(id: &str, doc: &Document) -> Result<Self, DecodeError> {
        let r = FieldReader::new(id, doc);

        // An embedded meetup that fails to decode is dropped, not fatal.
        let meetup = r
            .map("meetup")
            .and_then(|m| read_meetup(&m, m.string("id")).ok());

        Ok(Offer {
            id: id.to_string(),
            from_user_id: r.required_string("fromUserId")?,
            to_user_id: r.required_string("toUserId")?,
            requested_item_id: r.required_string("requestedItemId")?,
            offered_item_ids: r.strings("offeredItemIds"),
            status: r.enumeration("status"),
            message: r.string("message"),
            cash_amount: r.opt_f64("cashAmount"),
            meetup,
            created_at: r.millis_or_now("createdAt"),
            updated_at: r.millis_or_now("updatedAt"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MeetupLocationType, MeetupStatus, MeetupType, OfferStatus};

    fn sample_meetup(offer_id: &str) -> Meetup {
        Meetup::new(
            offer_id,
            vec!["alice".into(), "bob".into()],
            MeetupLocation {
                name: "Central Cafe".into(),
                address: "Main St 1".into(),
                latitude: 1.5,
                longitude: 2.5,
                location_type: MeetupLocationType::Cafe,
            },
            1_700_000_000_000,
        )
        .with_type(MeetupType::Delivery)
        .with_notes("Bring cables")
    }

    #[test]
    fn test_offer_roundtrip_with_embedded_meetup() {
        let mut offer = Offer::new("alice", "bob", "item_1")
            .with_offered_items(vec!["item_2".into()])
            .with_message("Trade?")
            .with_cash(10.5);
        offer.status = OfferStatus::Accepted;
        offer.meetup = Some(sample_meetup(&offer.id));

        let decoded = Offer::from_document(&offer.id, &offer.to_document()).unwrap();
        assert_eq!(decoded, offer);
    }

    #[test]
    fn test_meetup_roundtrip() {
        let mut meetup = sample_meetup("offer_1");
        meetup.complete(1_700_000_100_000);

        let decoded = Meetup::from_document(&meetup.id, &meetup.to_document()).unwrap();
        assert_eq!(decoded, meetup);
    }

    #[test]
    fn test_offer_missing_status_defaults_to_pending() {
        let mut offer = Offer::new("alice", "bob", "item_1");
        offer.status = OfferStatus::Rejected;
        let mut doc = offer.to_document();
        doc.remove("status");
        doc.remove("cashAmount");

        let decoded = Offer::from_document(&offer.id, &doc).unwrap();
        assert_eq!(decoded.status, OfferStatus::Pending);
        assert_eq!(decoded.cash_amount, None);
    }

    #[test]
    fn test_meetup_missing_enums_default() {
        let meetup = sample_meetup("offer_1");
        let mut doc = meetup.to_document();
        doc.remove("meetupType");
        doc.remove("status");
        doc.remove("location");

        let decoded = Meetup::from_document(&meetup.id, &doc).unwrap();
        assert_eq!(decoded.meetup_type, MeetupType::Pickup);
        assert_eq!(decoded.status, MeetupStatus::Pending);
        assert_eq!(decoded.location, MeetupLocation::default());
    }

    #[test]
    fn test_offer_with_broken_meetup_drops_meetup() {
        let mut offer = Offer::new("alice", "bob", "item_1");
        offer.meetup = Some(sample_meetup(&offer.id));
        let mut doc = offer.to_document();
        doc.insert("meetup".into(), json!({"status": "COMPLETED"}));

        let decoded = Offer::from_document(&offer.id, &doc).unwrap();
        assert!(decoded.meetup.is_none());
    }

    #[test]
    fn test_offer_without_requested_item_is_rejected() {
        let offer = Offer::new("alice", "bob", "item_1");
        let mut doc = offer.to_document();
        doc.remove("requestedItemId");
        assert!(Offer::from_document(&offer.id, &doc).is_err());
    }
}

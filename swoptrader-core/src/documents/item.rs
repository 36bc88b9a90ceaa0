use serde_json::{json, Value};

use super::{into_document, DecodeError, Document, DocumentCodec, FieldReader};
use crate::models::{Item, Location};

pub(crate) fn location_to_value(location: &Option<Location>) -> Value {
    match location {
        Some(loc) => json!({
            "latitude": loc.latitude,
            "longitude": loc.longitude,
            "address": loc.address,
        }),
        None => Value::Null,
    }
}

pub(crate) fn read_location(reader: &FieldReader<'_>, key: &str) -> Option<Location> {
    reader.map(key).map(|loc| Location {
        latitude: loc.f64("latitude"),
        longitude: loc.f64("longitude"),
        address: loc.string("address"),
    })
}

impl DocumentCodec for Item {
    fn to_document(&self) -> Document {
        into_document(json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "category": self.category.as_str(),
            "condition": self.condition.as_str(),
            "images": self.images,
            "ownerId": self.owner_id,
            "location": location_to_value(&self.location),
            "desiredTrades": self.desired_trades,
            "isAvailable": self.is_available,
            "createdAt": self.created_at,
            "updatedAt": self.updated_at,
            "viewCount": self.view_count,
            "pitchCount": self.pitch_count,
            "commentsCount": self.comments_count,
        }))
    }

    fn from_document(id: &str, doc: &Document) -> Result<Self, DecodeError> {
        let r = FieldReader::new(id, doc);

        Ok(Item {
            id: id.to_string(),
            name: r.string("name"),
            description: r.string("description"),
            category: r.enumeration("category"),
            condition: r.enumeration("condition"),
            images: r.strings("images"),
            owner_id: r.required_string("ownerId")?,
            location: read_location(&r, "location"),
            desired_trades: r.strings("desiredTrades"),
            is_available: r.bool_or("isAvailable", true),
            created_at: r.millis_or_now("createdAt"),
            updated_at: r.millis_or_now("updatedAt"),
            view_count: r.i64("viewCount"),
            pitch_count: r.i64("pitchCount"),
            comments_count: r.i64("commentsCount"),
            distance: None,
            owner: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemCategory, ItemCondition, User};

    fn sample() -> Item {
        let mut item = Item::new("Road Bike", "user1")
            .with_description("Aluminium frame")
            .with_category(ItemCategory::Sports)
            .with_condition(ItemCondition::LikeNew)
            .with_images(vec!["https://img/1.jpg".into(), "https://img/2.jpg".into()])
            .with_location(Location::new(59.3, 18.0, "Stockholm"))
            .with_desired_trades(vec!["Camera".into()]);
        item.view_count = 12;
        item.pitch_count = 3;
        item.comments_count = 4;
        item
    }

    #[test]
    fn test_item_roundtrip() {
        let item = sample();
        let doc = item.to_document();
        let decoded = Item::from_document(&item.id, &doc).unwrap();
        assert_eq!(decoded, item);
    }

    #[test]
    fn test_item_document_omits_read_time_fields() {
        let mut item = sample();
        item.distance = Some(2.5);
        item.owner = Some(Box::new(User::new("Ada", "ada@example.com")));

        let doc = item.to_document();
        assert!(!doc.contains_key("distance"));
        assert!(!doc.contains_key("owner"));
        assert_eq!(doc["category"], "SPORTS");
    }

    #[test]
    fn test_item_stripped_field_falls_back_to_default() {
        let item = sample();

        let mut doc = item.to_document();
        doc.remove("condition");
        let decoded = Item::from_document(&item.id, &doc).unwrap();
        assert_eq!(decoded.condition, ItemCondition::Good);

        let mut doc = item.to_document();
        doc.remove("isAvailable");
        doc.remove("images");
        let decoded = Item::from_document(&item.id, &doc).unwrap();
        assert!(decoded.is_available);
        assert!(decoded.images.is_empty());
        assert_eq!(decoded.name, item.name);
    }

    #[test]
    fn test_item_malformed_enum_defaults() {
        let item = sample();
        let mut doc = item.to_document();
        doc.insert("category".into(), json!("SPACESHIPS"));
        let decoded = Item::from_document(&item.id, &doc).unwrap();
        assert_eq!(decoded.category, ItemCategory::Other);
    }

    #[test]
    fn test_item_without_owner_is_rejected() {
        let item = sample();
        let mut doc = item.to_document();
        doc.remove("ownerId");
        assert!(matches!(
            Item::from_document(&item.id, &doc),
            Err(DecodeError::MissingField { field: "ownerId", .. })
        ));
    }

    #[test]
    fn test_item_from_non_map_value() {
        assert_eq!(
            Item::from_value("item_1", &json!(["not", "a", "map"])),
            Err(DecodeError::NotAMap("item_1".into()))
        );
    }
}

use serde_json::json;

use super::item::{location_to_value, read_location};
use super::{into_document, DecodeError, Document, DocumentCodec, FieldReader};
use crate::models::User;
use crate::scoring::calculate_user_level;

impl DocumentCodec for User {
    fn to_document(&self) -> Document {
        into_document(json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "profileImageUrl": self.profile_image_url,
            "location": location_to_value(&self.location),
            "tradeScore": self.trade_score,
            "level": self.level,
            "carbonSaved": self.carbon_saved,
            "isVerified": self.is_verified,
            "createdAt": self.created_at,
            "lastActive": self.last_active,
        }))
    }

    fn from_document(id: &str, doc: &Document) -> Result<Self, DecodeError> {
        let r = FieldReader::new(id, doc);
        let trade_score = r.i64("tradeScore");

        Ok(User {
            id: id.to_string(),
            name: r.string("name"),
            email: r.string("email"),
            profile_image_url: r.string("profileImageUrl"),
            location: read_location(&r, "location"),
            trade_score,
            // A missing level is derived rather than defaulted to 1.
            level: r
                .opt_i64("level")
                .map(|l| l.clamp(1, 10) as u32)
                .unwrap_or_else(|| calculate_user_level(trade_score)),
            carbon_saved: r.f64("carbonSaved"),
            is_verified: r.bool_or("isVerified", false),
            created_at: r.millis_or_now("createdAt"),
            last_active: r.millis_or_now("lastActive"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;

    #[test]
    fn test_user_roundtrip() {
        let mut user = User::new("Ada", "ada@example.com");
        user.location = Some(Location::new(1.0, 2.0, "Somewhere"));
        user.apply_trade(120, 7.25);
        user.is_verified = true;

        let decoded = User::from_document(&user.id, &user.to_document()).unwrap();
        assert_eq!(decoded, user);
    }

    #[test]
    fn test_user_missing_level_is_derived_from_score() {
        let mut user = User::new("Ada", "ada@example.com");
        user.trade_score = 260;
        user.level = 5;

        let mut doc = user.to_document();
        doc.remove("level");
        let decoded = User::from_document(&user.id, &doc).unwrap();
        assert_eq!(decoded.level, 5);
    }

    #[test]
    fn test_user_missing_carbon_defaults_to_zero() {
        let user = User::new("Ada", "ada@example.com");
        let mut doc = user.to_document();
        doc.remove("carbonSaved");
        doc.remove("email");
        let decoded = User::from_document(&user.id, &doc).unwrap();
        assert_eq!(decoded.carbon_saved, 0.0);
        assert_eq!(decoded.email, "");
    }
}

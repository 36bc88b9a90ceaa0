use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::location::Location;
use super::user::User;
use super::{new_id, normalize_label, now_millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCategory {
    Electronics,
    Vehicles,
    Furniture,
    Appliances,
    Sports,
    Clothing,
    Toys,
    Music,
    HomeGarden,
    Art,
    Books,
    #[default]
    Other,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 12] = [
        ItemCategory::Electronics,
        ItemCategory::Vehicles,
        ItemCategory::Furniture,
        ItemCategory::Appliances,
        ItemCategory::Sports,
        ItemCategory::Clothing,
        ItemCategory::Toys,
        ItemCategory::Music,
        ItemCategory::HomeGarden,
        ItemCategory::Art,
        ItemCategory::Books,
        ItemCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Electronics => "ELECTRONICS",
            ItemCategory::Vehicles => "VEHICLES",
            ItemCategory::Furniture => "FURNITURE",
            ItemCategory::Appliances => "APPLIANCES",
            ItemCategory::Sports => "SPORTS",
            ItemCategory::Clothing => "CLOTHING",
            ItemCategory::Toys => "TOYS",
            ItemCategory::Music => "MUSIC",
            ItemCategory::HomeGarden => "HOME_GARDEN",
            ItemCategory::Art => "ART",
            ItemCategory::Books => "BOOKS",
            ItemCategory::Other => "OTHER",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == label)
            .ok_or_else(|| format!("Invalid item category '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCondition {
    New,
    LikeNew,
    #[default]
    Good,
    Fair,
    Poor,
}

impl ItemCondition {
    pub const ALL: [ItemCondition; 5] = [
        ItemCondition::New,
        ItemCondition::LikeNew,
        ItemCondition::Good,
        ItemCondition::Fair,
        ItemCondition::Poor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCondition::New => "NEW",
            ItemCondition::LikeNew => "LIKE_NEW",
            ItemCondition::Good => "GOOD",
            ItemCondition::Fair => "FAIR",
            ItemCondition::Poor => "POOR",
        }
    }
}

impl fmt::Display for ItemCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == label)
            .ok_or_else(|| format!("Invalid item condition '{}'", s))
    }
}

fn default_available() -> bool {
    true
}

/// A listed item up for trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: ItemCategory,
    pub condition: ItemCondition,
    pub images: Vec<String>,
    pub owner_id: String,
    pub location: Option<Location>,
    pub desired_trades: Vec<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub view_count: i64,
    pub pitch_count: i64,
    pub comments_count: i64,
    /// Kilometres from the viewer; computed at read time, never stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Box<User>>,
}

impl Default for Item {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            category: ItemCategory::default(),
            condition: ItemCondition::default(),
            images: Vec::new(),
            owner_id: String::new(),
            location: None,
            desired_trades: Vec::new(),
            is_available: true,
            created_at: 0,
            updated_at: 0,
            view_count: 0,
            pitch_count: 0,
            comments_count: 0,
            distance: None,
            owner: None,
        }
    }
}

impl Item {
    pub fn new(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: new_id("item"),
            name: name.into(),
            owner_id: owner_id.into(),
            created_at: now,
            updated_at: now,
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: ItemCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_condition(mut self, condition: ItemCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_desired_trades(mut self, desired: Vec<String>) -> Self {
        self.desired_trades = desired;
        self
    }

    /// First image, used as the thumbnail in trade records.
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Case-insensitive match against name, description and desired trades.
    pub fn matches_text(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self
                .desired_trades
                .iter()
                .any(|d| d.to_lowercase().contains(&query))
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "Id: {}", self.id)?;
        writeln!(f, "Category: {}", self.category)?;
        writeln!(f, "Condition: {}", self.condition)?;
        writeln!(
            f,
            "Available: {}",
            if self.is_available { "yes" } else { "no" }
        )?;

        if let Some(distance) = self.distance {
            writeln!(f, "Distance: {:.1} km", distance)?;
        }
        if let Some(location) = &self.location {
            if !location.address.is_empty() {
                writeln!(f, "Location: {}", location.address)?;
            }
        }
        if !self.desired_trades.is_empty() {
            writeln!(f, "Wants: {}", self.desired_trades.join(", "))?;
        }
        writeln!(
            f,
            "Views: {}  Pitches: {}  Comments: {}",
            self.view_count, self.pitch_count, self.comments_count
        )?;
        if !self.description.is_empty() {
            writeln!(f, "\n{}", self.description)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_new() {
        let item = Item::new("Bike", "user1");
        assert!(item.id.starts_with("item_"));
        assert_eq!(item.owner_id, "user1");
        assert!(item.is_available);
        assert_eq!(item.created_at, item.updated_at);
        assert_eq!(item.category, ItemCategory::Other);
        assert_eq!(item.condition, ItemCondition::Good);
    }

    #[test]
    fn test_category_from_str_lenient() {
        assert_eq!(
            "electronics".parse::<ItemCategory>().unwrap(),
            ItemCategory::Electronics
        );
        assert_eq!(
            "Home & Garden".parse::<ItemCategory>().unwrap(),
            ItemCategory::HomeGarden
        );
        assert!("spaceships".parse::<ItemCategory>().is_err());
    }

    #[test]
    fn test_condition_from_str_lenient() {
        assert_eq!(
            "like new".parse::<ItemCondition>().unwrap(),
            ItemCondition::LikeNew
        );
        assert_eq!("POOR".parse::<ItemCondition>().unwrap(), ItemCondition::Poor);
        assert!("broken".parse::<ItemCondition>().is_err());
    }

    #[test]
    fn test_matches_text() {
        let item = Item::new("Vintage Guitar", "user1")
            .with_description("Acoustic, barely played")
            .with_desired_trades(vec!["Turntable".into()]);

        assert!(item.matches_text("guitar"));
        assert!(item.matches_text("ACOUSTIC"));
        assert!(item.matches_text("turntable"));
        assert!(item.matches_text(""));
        assert!(!item.matches_text("bicycle"));
    }

    #[test]
    fn test_item_json_uses_camel_case() {
        let item = Item::new("Lamp", "user1").with_category(ItemCategory::HomeGarden);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["ownerId"], "user1");
        assert_eq!(json["category"], "HOME_GARDEN");
        assert_eq!(json["isAvailable"], true);
        assert!(json.get("distance").is_none());
    }

    #[test]
    fn test_item_json_missing_availability_defaults_true() {
        let item: Item = serde_json::from_str(r#"{"id":"item_1","name":"Lamp"}"#).unwrap();
        assert!(item.is_available);
        assert!(item.images.is_empty());
    }
}

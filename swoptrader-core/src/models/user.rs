use serde::{Deserialize, Serialize};
use std::fmt;

use super::location::Location;
use super::{new_id, now_millis};
use crate::scoring::calculate_user_level;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_image_url: String,
    pub location: Option<Location>,
    pub trade_score: i64,
    pub level: u32,
    pub carbon_saved: f64,
    pub is_verified: bool,
    pub created_at: i64,
    pub last_active: i64,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            email: String::new(),
            profile_image_url: String::new(),
            location: None,
            trade_score: 0,
            level: 1,
            carbon_saved: 0.0,
            is_verified: false,
            created_at: 0,
            last_active: 0,
        }
    }
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: new_id("user"),
            name: name.into(),
            email: email.into(),
            created_at: now,
            last_active: now,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Credits a completed trade and recomputes the level.
    pub fn apply_trade(&mut self, score_earned: i64, carbon_saved: f64) {
        self.trade_score += score_earned;
        self.carbon_saved += carbon_saved;
        self.level = calculate_user_level(self.trade_score);
        self.last_active = now_millis();
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} <{}>", self.name, self.email)?;
        writeln!(f, "Id: {}", self.id)?;
        writeln!(f, "Level: {} (score {})", self.level, self.trade_score)?;
        writeln!(f, "Carbon saved: {:.2} kg", self.carbon_saved)?;
        if self.is_verified {
            writeln!(f, "Verified")?;
        }
        Ok(())
    }
}

//! Gamification tables: carbon savings, trade score and level ladder.
//!
//! All values are fixed lookups; a trade's totals are the sums over every
//! item that changes hands (the requested item plus all offered items).

use crate::models::{Item, ItemCategory, ItemCondition};

/// Score thresholds for levels 2 through 10.
pub const LEVEL_THRESHOLDS: [i64; 9] = [50, 100, 150, 250, 350, 450, 600, 800, 1000];

/// Carbon multiplier applied when more than one item is traded.
pub const MULTI_ITEM_CARBON_BONUS: f64 = 1.1;

/// Flat score credited for every traded item.
pub const PER_ITEM_SCORE_BONUS: i64 = 5;

/// Estimated kilograms of CO2 avoided by reusing an item of this category.
pub fn category_carbon_kg(category: ItemCategory) -> f64 {
    match category {
        ItemCategory::Electronics => 3.0,
        ItemCategory::Vehicles => 5.0,
        ItemCategory::Furniture => 4.0,
        ItemCategory::Appliances => 3.5,
        ItemCategory::Sports => 1.5,
        ItemCategory::Clothing => 1.2,
        ItemCategory::Toys => 1.0,
        ItemCategory::Music => 1.5,
        ItemCategory::HomeGarden => 2.0,
        ItemCategory::Art => 1.0,
        ItemCategory::Books => 0.5,
        ItemCategory::Other => 1.0,
    }
}

pub fn category_points(category: ItemCategory) -> i64 {
    match category {
        ItemCategory::Electronics => 15,
        ItemCategory::Vehicles => 20,
        ItemCategory::Furniture => 12,
        ItemCategory::Appliances => 14,
        ItemCategory::Sports => 8,
        ItemCategory::Clothing => 6,
        ItemCategory::Toys => 6,
        ItemCategory::Music => 8,
        ItemCategory::HomeGarden => 10,
        ItemCategory::Art => 7,
        ItemCategory::Books => 5,
        ItemCategory::Other => 5,
    }
}

pub fn condition_multiplier(condition: ItemCondition) -> f64 {
    match condition {
        ItemCondition::New => 1.5,
        ItemCondition::LikeNew => 1.3,
        ItemCondition::Good => 1.0,
        ItemCondition::Fair => 0.8,
        ItemCondition::Poor => 0.5,
    }
}

pub fn condition_points(condition: ItemCondition) -> i64 {
    match condition {
        ItemCondition::New => 5,
        ItemCondition::LikeNew => 4,
        ItemCondition::Good => 3,
        ItemCondition::Fair => 2,
        ItemCondition::Poor => 1,
    }
}

/// Kilograms of CO2 saved by a trade.
pub fn calculate_carbon_saved(requested: &Item, offered: &[Item]) -> f64 {
    let total: f64 = std::iter::once(requested)
        .chain(offered)
        .map(|item| category_carbon_kg(item.category) * condition_multiplier(item.condition))
        .sum();

    if offered.is_empty() {
        total
    } else {
        total * MULTI_ITEM_CARBON_BONUS
    }
}

/// Score earned by each participant of a trade.
pub fn calculate_trade_score(requested: &Item, offered: &[Item]) -> i64 {
    std::iter::once(requested)
        .chain(offered)
        .map(|item| {
            category_points(item.category) + condition_points(item.condition) + PER_ITEM_SCORE_BONUS
        })
        .sum()
}

/// Level 1 through 10 for a cumulative trade score.
pub fn calculate_user_level(score: i64) -> u32 {
    let reached = LEVEL_THRESHOLDS.iter().filter(|&&t| score >= t).count();
    1 + reached as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(category: ItemCategory, condition: ItemCondition) -> Item {
        Item::new("test", "owner")
            .with_category(category)
            .with_condition(condition)
    }

    #[test]
    fn test_single_new_electronics_item() {
        let requested = item(ItemCategory::Electronics, ItemCondition::New);

        let carbon = calculate_carbon_saved(&requested, &[]);
        assert!((carbon - 3.0 * 1.5 * 1.0).abs() < 1e-9);
        assert_eq!(calculate_trade_score(&requested, &[]), 15 + 5 + 5);
    }

    #[test]
    fn test_multi_item_trade_applies_bonus() {
        let requested = item(ItemCategory::Electronics, ItemCondition::New);
        let offered = vec![item(ItemCategory::Books, ItemCondition::Poor)];

        let carbon = calculate_carbon_saved(&requested, &offered);
        assert!((carbon - (4.5 + 0.5 * 0.5) * 1.1).abs() < 1e-9);

        let score = calculate_trade_score(&requested, &offered);
        assert_eq!(score, 25 + (5 + 1 + PER_ITEM_SCORE_BONUS));
    }

    #[test]
    fn test_every_category_and_condition_has_positive_values() {
        for category in ItemCategory::ALL {
            assert!(category_carbon_kg(category) > 0.0);
            assert!(category_points(category) > 0);
        }
        for condition in ItemCondition::ALL {
            assert!(condition_multiplier(condition) > 0.0);
            assert!(condition_points(condition) > 0);
        }
    }

    #[test]
    fn test_user_level_boundaries() {
        assert_eq!(calculate_user_level(0), 1);
        assert_eq!(calculate_user_level(49), 1);
        assert_eq!(calculate_user_level(50), 2);
        assert_eq!(calculate_user_level(99), 2);
        assert_eq!(calculate_user_level(100), 3);
        assert_eq!(calculate_user_level(150), 4);
        assert_eq!(calculate_user_level(250), 5);
        assert_eq!(calculate_user_level(350), 6);
        assert_eq!(calculate_user_level(450), 7);
        assert_eq!(calculate_user_level(600), 8);
        assert_eq!(calculate_user_level(799), 8);
        assert_eq!(calculate_user_level(800), 9);
        assert_eq!(calculate_user_level(999), 9);
        assert_eq!(calculate_user_level(1000), 10);
        assert_eq!(calculate_user_level(50_000), 10);
    }

    #[test]
    fn test_negative_score_is_level_one() {
        assert_eq!(calculate_user_level(-10), 1);
    }
}

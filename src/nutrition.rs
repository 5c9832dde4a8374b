// Copyright 2023 Remi Bernotavicius

//! Nutrient totals and "fully entered" tracking for meals and ingredient categories. Everything
//! in here is computed from rows already loaded by the store; nothing is cached.

use crate::database::models::{Ingredient, IngredientId, MealDishIngredient, PropertyId};
use std::collections::HashMap;

pub mod completeness;
pub mod servings;
pub mod summary;

pub use completeness::{category_fully_entered, summary_complete};
pub use servings::ServingSizes;
pub use summary::{summarize, Summary, SummaryEntry};

/// What the aggregation needs to know about one ingredient.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientNutrition {
    pub serving_sizes: ServingSizes,
    pub fully_entered: bool,
    /// Amount per serving, for every property the ingredient has a value for.
    pub properties: Vec<(PropertyId, f64)>,
}

impl IngredientNutrition {
    pub fn new(ingredient: &Ingredient, properties: Vec<(PropertyId, f64)>) -> Self {
        Self {
            serving_sizes: ServingSizes::from(ingredient),
            fully_entered: ingredient.fully_entered,
            properties,
        }
    }
}

pub type NutritionTable = HashMap<IngredientId, IngredientNutrition>;

/// The derived part of a meal.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MealNutrition {
    pub summary: Summary,
    pub summary_complete: bool,
}

pub fn meal_nutrition<'a>(
    usages: impl IntoIterator<Item = &'a MealDishIngredient> + Clone,
    nutrition: &NutritionTable,
) -> MealNutrition {
    MealNutrition {
        summary: summarize(usages.clone(), nutrition),
        summary_complete: summary_complete(usages, nutrition),
    }
}

// Copyright 2023 Remi Bernotavicius

use super::NutritionTable;
use crate::database::models::{Ingredient, MealDishIngredient};

/// A category is fully entered when every ingredient mapped to it is. Empty categories are.
pub fn category_fully_entered<'a>(ingredients: impl IntoIterator<Item = &'a Ingredient>) -> bool {
    ingredients.into_iter().all(|i| i.fully_entered)
}

/// Whether a meal's summary is final, i.e. backfilling ingredient data can't change it.
/// Ingredients missing from `nutrition` count as not fully entered.
pub fn summary_complete<'a>(
    usages: impl IntoIterator<Item = &'a MealDishIngredient>,
    nutrition: &NutritionTable,
) -> bool {
    usages.into_iter().all(|usage| {
        nutrition
            .get(&usage.ingredient_id)
            .is_some_and(|i| i.fully_entered)
    })
}

#[cfg(test)]
fn ingredient(id: i32, fully_entered: bool) -> Ingredient {
    Ingredient {
        id: id.into(),
        name: format!("ingredient {id}"),
        serving_size_g: None,
        serving_size_ml: None,
        serving_size_pieces: None,
        fully_entered,
    }
}

#[test]
fn category_completeness() {
    assert!(category_fully_entered(&[] as &[Ingredient]));
    assert!(category_fully_entered(&[ingredient(1, true)]));
    assert!(category_fully_entered(&[ingredient(1, true), ingredient(2, true)]));
    assert!(!category_fully_entered(&[ingredient(1, true), ingredient(2, false)]));
}

#[test]
fn meal_completeness() {
    use super::{servings::ServingSizes, IngredientNutrition};
    use maplit::hashmap;

    let nutrition = hashmap! {
        1.into() => IngredientNutrition {
            serving_sizes: ServingSizes::default(),
            fully_entered: true,
            properties: vec![],
        },
        2.into() => IngredientNutrition {
            serving_sizes: ServingSizes::default(),
            fully_entered: false,
            properties: vec![],
        },
    };
    let usage = |id: i32, ingredient: i32| MealDishIngredient {
        id: id.into(),
        meal_dish_id: 1.into(),
        ingredient_id: ingredient.into(),
        quantity: None,
        unit: None,
    };

    assert!(summary_complete(&[] as &[MealDishIngredient], &nutrition));
    assert!(summary_complete(&[usage(1, 1), usage(2, 1)], &nutrition));
    assert!(!summary_complete(&[usage(1, 1), usage(2, 2)], &nutrition));
    assert!(!summary_complete(&[usage(1, 3)], &nutrition));
}

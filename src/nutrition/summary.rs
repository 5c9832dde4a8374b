// Copyright 2023 Remi Bernotavicius

use super::servings::servings;
use super::NutritionTable;
use crate::database::models::{MealDishIngredient, PropertyId};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct SummaryEntry {
    pub property_id: PropertyId,
    pub value: f64,
}

/// Total amount of each property eaten. Only properties that at least one of the eaten
/// ingredients has a value for are present.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Summary(BTreeMap<PropertyId, f64>);

impl Summary {
    /// Entries ordered by property id.
    pub fn entries(&self) -> Vec<SummaryEntry> {
        self.0
            .iter()
            .map(|(&property_id, &value)| SummaryEntry { property_id, value })
            .collect()
    }
}

pub fn summarize<'a>(
    usages: impl IntoIterator<Item = &'a MealDishIngredient>,
    nutrition: &NutritionTable,
) -> Summary {
    let mut totals = BTreeMap::new();
    for usage in usages {
        let Some(ingredient) = nutrition.get(&usage.ingredient_id) else {
            continue;
        };
        let servings = servings(&ingredient.serving_sizes, usage.quantity, usage.unit);
        if servings == 0.0 {
            continue;
        }
        for &(property_id, value) in &ingredient.properties {
            *totals.entry(property_id).or_insert(0.0) += value * servings;
        }
    }
    Summary(totals)
}

#[cfg(test)]
fn usage(
    id: i32,
    ingredient: i32,
    quantity: f64,
    unit: crate::database::models::Unit,
) -> MealDishIngredient {
    MealDishIngredient {
        id: id.into(),
        meal_dish_id: 1.into(),
        ingredient_id: ingredient.into(),
        quantity: Some(quantity),
        unit: Some(unit),
    }
}

#[cfg(test)]
fn breakfast_table() -> NutritionTable {
    use super::servings::ServingSizes;
    use super::IngredientNutrition;
    use maplit::hashmap;

    let (calories, fat, saturated_fat, protein) = (1.into(), 2.into(), 3.into(), 4.into());
    hashmap! {
        1.into() => IngredientNutrition {
            serving_sizes: ServingSizes { mass: Some(50.0), volume: Some(0.0), pieces: Some(1.0) },
            fully_entered: true,
            properties: vec![(calories, 70.0), (protein, 6.1), (fat, 5.0)],
        },
        2.into() => IngredientNutrition {
            serving_sizes: ServingSizes { mass: Some(51.0), volume: Some(0.0), pieces: Some(2.0) },
            fully_entered: true,
            properties: vec![(calories, 120.0), (protein, 5.0), (fat, 1.0)],
        },
        3.into() => IngredientNutrition {
            serving_sizes: ServingSizes { mass: Some(28.0), volume: Some(0.0), pieces: Some(0.0) },
            fully_entered: false,
            properties: vec![(calories, 70.0), (protein, 2.0), (fat, 5.0), (saturated_fat, 1.0)],
        },
    }
}

#[cfg(test)]
fn assert_summary(summary: &Summary, expected: BTreeMap<i32, f64>) {
    let totals: BTreeMap<i32, f64> = summary
        .entries()
        .into_iter()
        .map(|e| (e.property_id.into(), e.value))
        .collect();
    assert!(totals.keys().eq(expected.keys()), "{summary:?}");
    for (property, value) in expected {
        let actual = totals[&property];
        assert!((actual - value).abs() < 1e-3, "{property}: {actual} != {value}");
    }
}

#[test]
fn egg_on_bread() {
    use crate::database::models::Unit;
    use maplit::btreemap;

    let usages = [usage(1, 1, 2.0, Unit::Pieces), usage(2, 2, 2.0, Unit::Pieces)];
    let summary = summarize(&usages, &breakfast_table());
    assert_summary(
        &summary,
        btreemap! {
            1 => 260.0,
            2 => 11.0,
            4 => 17.2,
        },
    );
}

#[test]
fn summary_spans_every_dish() {
    use crate::database::models::Unit;
    use maplit::btreemap;

    let usages = [
        usage(1, 1, 2.0, Unit::Pieces),
        usage(2, 2, 2.0, Unit::Pieces),
        usage(3, 2, 2.0, Unit::Pieces),
        usage(4, 3, 50.0, Unit::Mass),
    ];
    let summary = summarize(&usages, &breakfast_table());
    assert_summary(
        &summary,
        btreemap! {
            1 => 505.0,
            2 => 20.929,
            3 => 1.786,
            4 => 25.771,
        },
    );

    let ids: Vec<_> = summary.entries().iter().map(|e| i32::from(e.property_id)).collect();
    assert_eq!(ids, [1, 2, 3, 4]);
}

#[test]
fn unmeasurable_usage_contributes_nothing() {
    use crate::database::models::Unit;
    use maplit::btreemap;

    // Cream cheese has no piece serving size.
    let usages = [usage(1, 3, 4.0, Unit::Pieces)];
    assert!(summarize(&usages, &breakfast_table()).entries().is_empty());

    let mut unset = usage(2, 1, 2.0, Unit::Pieces);
    unset.quantity = None;
    assert!(summarize(&[unset.clone()], &breakfast_table())
        .entries()
        .is_empty());

    let usages = [usage(1, 3, 4.0, Unit::Pieces), unset, usage(3, 1, 2.0, Unit::Pieces)];
    assert_summary(
        &summarize(&usages, &breakfast_table()),
        btreemap! {
            1 => 140.0,
            2 => 10.0,
            4 => 12.2,
        },
    );

    assert!(summarize(&[] as &[MealDishIngredient], &breakfast_table())
        .entries()
        .is_empty());
}

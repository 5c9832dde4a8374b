// Copyright 2023 Remi Bernotavicius

use super::properties::find_property;
use super::{check_amount, check_name};
use crate::database;
use crate::database::models::{
    Ingredient, IngredientCategoryMapping, IngredientChanges, IngredientId, IngredientProperty,
    IngredientPropertyChanges, IngredientPropertyId, NewIngredient, NewIngredientProperty,
};
use crate::database::schema::{ingredient_category_mappings, ingredient_properties, ingredients};
use crate::error::{Error, OrNotFound as _, Result};
use crate::nutrition::{IngredientNutrition, NutritionTable};
use diesel::associations::GroupedBy as _;
use diesel::prelude::OptionalExtension as _;
use diesel::BelongingToDsl as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct IngredientView {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub category_mappings: Vec<IngredientCategoryMapping>,
    /// Only filled in when reading a single ingredient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<IngredientProperty>>,
}

pub fn find_ingredient(
    conn: &mut database::Connection,
    ingredient_id: IngredientId,
) -> Result<Ingredient> {
    ingredients::table
        .find(ingredient_id)
        .select(Ingredient::as_select())
        .first(conn)
        .optional()?
        .or_not_found("ingredient", ingredient_id)
}

fn check_serving_sizes(g: Option<f64>, ml: Option<f64>, pieces: Option<f64>) -> Result<()> {
    check_amount("serving_size_g", g)?;
    check_amount("serving_size_ml", ml)?;
    check_amount("serving_size_pieces", pieces)
}

pub fn add_ingredient(
    conn: &mut database::Connection,
    new_ingredient: NewIngredient,
) -> Result<IngredientView> {
    check_name("ingredient", &new_ingredient.name)?;
    check_serving_sizes(
        new_ingredient.serving_size_g,
        new_ingredient.serving_size_ml,
        new_ingredient.serving_size_pieces,
    )?;

    let ingredient = diesel::insert_into(ingredients::table)
        .values(&new_ingredient)
        .returning(Ingredient::as_returning())
        .get_result(conn)?;
    log::info!("added ingredient {} {:?}", ingredient.id, ingredient.name);

    Ok(IngredientView {
        ingredient,
        category_mappings: vec![],
        properties: None,
    })
}

pub fn list_ingredients(conn: &mut database::Connection) -> Result<Vec<IngredientView>> {
    let all = ingredients::table
        .select(Ingredient::as_select())
        .order(ingredients::id)
        .load(conn)?;
    let mappings = IngredientCategoryMapping::belonging_to(&all)
        .select(IngredientCategoryMapping::as_select())
        .order(ingredient_category_mappings::id)
        .load(conn)?;

    Ok(mappings
        .grouped_by(&all)
        .into_iter()
        .zip(all)
        .map(|(category_mappings, ingredient)| IngredientView {
            ingredient,
            category_mappings,
            properties: None,
        })
        .collect())
}

pub fn get_ingredient(
    conn: &mut database::Connection,
    ingredient_id: IngredientId,
) -> Result<IngredientView> {
    let ingredient = find_ingredient(conn, ingredient_id)?;
    let category_mappings = IngredientCategoryMapping::belonging_to(&ingredient)
        .select(IngredientCategoryMapping::as_select())
        .order(ingredient_category_mappings::id)
        .load(conn)?;
    let properties = IngredientProperty::belonging_to(&ingredient)
        .select(IngredientProperty::as_select())
        .order(ingredient_properties::id)
        .load(conn)?;

    Ok(IngredientView {
        ingredient,
        category_mappings,
        properties: Some(properties),
    })
}

pub fn update_ingredient(
    conn: &mut database::Connection,
    ingredient_id: IngredientId,
    changes: IngredientChanges,
) -> Result<()> {
    find_ingredient(conn, ingredient_id)?;
    if let Some(name) = &changes.name {
        check_name("ingredient", name)?;
    }
    check_serving_sizes(
        changes.serving_size_g.flatten(),
        changes.serving_size_ml.flatten(),
        changes.serving_size_pieces.flatten(),
    )?;
    if changes.is_empty() {
        return Ok(());
    }

    diesel::update(ingredients::table.find(ingredient_id))
        .set(&changes)
        .execute(conn)?;
    log::info!("updated ingredient {ingredient_id}");
    Ok(())
}

/// Serving sizes, completeness and per-serving property values of the given ingredients.
/// Ids that don't exist are left out.
pub fn ingredient_nutrition(
    conn: &mut database::Connection,
    ingredient_ids: &[IngredientId],
) -> Result<NutritionTable> {
    let used = ingredients::table
        .filter(ingredients::id.eq_any(ingredient_ids.iter().copied()))
        .select(Ingredient::as_select())
        .load(conn)?;
    let values = IngredientProperty::belonging_to(&used)
        .select(IngredientProperty::as_select())
        .order(ingredient_properties::id)
        .load(conn)?;

    Ok(values
        .grouped_by(&used)
        .into_iter()
        .zip(&used)
        .map(|(values, ingredient)| {
            let properties = values.iter().map(|v| (v.property_id, v.value)).collect();
            (ingredient.id, IngredientNutrition::new(ingredient, properties))
        })
        .collect())
}

pub fn find_ingredient_property(
    conn: &mut database::Connection,
    ingredient_property_id: IngredientPropertyId,
) -> Result<IngredientProperty> {
    ingredient_properties::table
        .find(ingredient_property_id)
        .select(IngredientProperty::as_select())
        .first(conn)
        .optional()?
        .or_not_found("ingredient property", ingredient_property_id)
}

pub fn add_ingredient_property(
    conn: &mut database::Connection,
    new_value: NewIngredientProperty,
) -> Result<IngredientProperty> {
    find_ingredient(conn, new_value.ingredient_id)?;
    find_property(conn, new_value.property_id)?;
    check_amount("value", Some(new_value.value))?;

    let existing = ingredient_properties::table
        .filter(ingredient_properties::ingredient_id.eq(new_value.ingredient_id))
        .filter(ingredient_properties::property_id.eq(new_value.property_id))
        .select(ingredient_properties::id)
        .first::<IngredientPropertyId>(conn)
        .optional()?;
    if let Some(existing) = existing {
        return Err(Error::validation(format!(
            "ingredient {} already has a value for property {} (ingredient property {existing})",
            new_value.ingredient_id, new_value.property_id
        )));
    }

    let value = diesel::insert_into(ingredient_properties::table)
        .values(&new_value)
        .returning(IngredientProperty::as_returning())
        .get_result(conn)?;
    log::info!(
        "added ingredient property {} (ingredient {}, property {})",
        value.id,
        value.ingredient_id,
        value.property_id
    );
    Ok(value)
}

pub fn list_ingredient_properties(
    conn: &mut database::Connection,
) -> Result<Vec<IngredientProperty>> {
    Ok(ingredient_properties::table
        .select(IngredientProperty::as_select())
        .order(ingredient_properties::id)
        .load(conn)?)
}

pub fn update_ingredient_property(
    conn: &mut database::Connection,
    ingredient_property_id: IngredientPropertyId,
    changes: IngredientPropertyChanges,
) -> Result<()> {
    find_ingredient_property(conn, ingredient_property_id)?;
    check_amount("value", changes.value)?;
    if changes.is_empty() {
        return Ok(());
    }

    diesel::update(ingredient_properties::table.find(ingredient_property_id))
        .set(&changes)
        .execute(conn)?;
    log::info!("updated ingredient property {ingredient_property_id}");
    Ok(())
}

#[cfg(test)]
pub fn add_test_ingredient(
    conn: &mut database::Connection,
    name: &str,
    serving_size_g: f64,
    serving_size_ml: f64,
    serving_size_pieces: f64,
) -> Ingredient {
    add_ingredient(
        conn,
        NewIngredient {
            name: name.into(),
            serving_size_g: Some(serving_size_g),
            serving_size_ml: Some(serving_size_ml),
            serving_size_pieces: Some(serving_size_pieces),
            fully_entered: false,
        },
    )
    .unwrap()
    .ingredient
}

#[test]
fn partial_update_keeps_other_fields() {
    let mut conn = database::in_memory();
    let egg = add_test_ingredient(&mut conn, "egg", 50.0, 0.0, 1.0);
    assert!(!egg.fully_entered);

    let changes = IngredientChanges {
        fully_entered: Some(true),
        ..Default::default()
    };
    update_ingredient(&mut conn, egg.id, changes).unwrap();

    let updated = get_ingredient(&mut conn, egg.id).unwrap().ingredient;
    assert_eq!(
        updated,
        Ingredient {
            fully_entered: true,
            ..egg.clone()
        }
    );

    update_ingredient(&mut conn, egg.id, IngredientChanges::default()).unwrap();
    assert_eq!(find_ingredient(&mut conn, egg.id).unwrap(), updated);

    let changes = IngredientChanges {
        serving_size_ml: Some(None),
        ..Default::default()
    };
    update_ingredient(&mut conn, egg.id, changes).unwrap();
    let updated = find_ingredient(&mut conn, egg.id).unwrap();
    assert_eq!(updated.serving_size_ml, None);
    assert_eq!(updated.serving_size_g, Some(50.0));
    assert_eq!(updated.name, "egg");
}

#[test]
fn update_missing_ingredient() {
    let mut conn = database::in_memory();
    let res = update_ingredient(
        &mut conn,
        IngredientId::from(42),
        IngredientChanges {
            name: Some("ghost".into()),
            ..Default::default()
        },
    );
    assert!(matches!(
        res,
        Err(Error::NotFound {
            entity: "ingredient",
            id: 42
        })
    ));
    assert!(list_ingredients(&mut conn).unwrap().is_empty());
}

#[test]
fn negative_serving_size_rejected() {
    let mut conn = database::in_memory();
    let egg = add_test_ingredient(&mut conn, "egg", 50.0, 0.0, 1.0);
    let res = update_ingredient(
        &mut conn,
        egg.id,
        IngredientChanges {
            name: Some("big egg".into()),
            serving_size_g: Some(Some(-5.0)),
            ..Default::default()
        },
    );
    assert!(matches!(res, Err(Error::Validation(_))));
    assert_eq!(find_ingredient(&mut conn, egg.id).unwrap(), egg);
}

#[test]
fn ingredient_property_values() {
    use super::properties::add_test_property;

    let mut conn = database::in_memory();
    let egg = add_test_ingredient(&mut conn, "egg", 50.0, 0.0, 1.0);
    let calories = add_test_property(&mut conn, "calories", None);
    let protein = add_test_property(&mut conn, "protein", None);

    let egg_calories = add_ingredient_property(
        &mut conn,
        NewIngredientProperty {
            ingredient_id: egg.id,
            property_id: calories.id,
            value: 0.0,
        },
    )
    .unwrap();
    update_ingredient_property(
        &mut conn,
        egg_calories.id,
        IngredientPropertyChanges { value: Some(70.0) },
    )
    .unwrap();
    add_ingredient_property(
        &mut conn,
        NewIngredientProperty {
            ingredient_id: egg.id,
            property_id: protein.id,
            value: 6.1,
        },
    )
    .unwrap();

    let duplicate = add_ingredient_property(
        &mut conn,
        NewIngredientProperty {
            ingredient_id: egg.id,
            property_id: calories.id,
            value: 1.0,
        },
    );
    assert!(matches!(duplicate, Err(Error::Validation(_))));

    let view = get_ingredient(&mut conn, egg.id).unwrap();
    let values: Vec<_> = view
        .properties
        .unwrap()
        .iter()
        .map(|p| (p.property_id, p.value))
        .collect();
    assert_eq!(values, [(calories.id, 70.0), (protein.id, 6.1)]);

    let table = ingredient_nutrition(&mut conn, &[egg.id, IngredientId::from(99)]).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table[&egg.id].properties, values);
    assert_eq!(table[&egg.id].serving_sizes.mass, Some(50.0));
}

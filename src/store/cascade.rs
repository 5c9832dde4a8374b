// Copyright 2023 Remi Bernotavicius

//! Deletion. Meals own their meal dishes, which own their meal dish ingredients, so those go
//! away together. Ingredients, properties, dishes and categories are never deleted as a side
//! effect; deleting one of them directly is refused while something that would dangle still
//! points at it.

use super::categories::{find_ingredient_category, find_ingredient_category_mapping};
use super::dishes::find_dish;
use super::ingredients::{find_ingredient, find_ingredient_property};
use super::meals::{find_meal, find_meal_dish, find_meal_dish_ingredient};
use super::properties::find_property;
use crate::database;
use crate::database::models::{
    DishId, IngredientCategoryId, IngredientCategoryMappingId, IngredientId,
    IngredientPropertyId, MealDishId, MealDishIngredientId, MealId, PropertyId,
};
use crate::database::schema::{
    dishes, ingredient_categories, ingredient_category_mappings, ingredient_properties,
    ingredients, meal_dish_ingredients, meal_dishes, meals, properties,
};
use crate::error::{Error, Result};
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;

pub fn delete_meal(conn: &mut database::Connection, meal_id: MealId) -> Result<()> {
    find_meal(conn, meal_id)?;

    let owned_dishes = meal_dishes::table
        .filter(meal_dishes::meal_id.eq(meal_id))
        .select(meal_dishes::id);
    let usages = diesel::delete(
        meal_dish_ingredients::table.filter(meal_dish_ingredients::meal_dish_id.eq_any(owned_dishes)),
    )
    .execute(conn)?;
    let dishes =
        diesel::delete(meal_dishes::table.filter(meal_dishes::meal_id.eq(meal_id))).execute(conn)?;
    diesel::delete(meals::table.find(meal_id)).execute(conn)?;

    log::debug!("meal {meal_id} took {dishes} meal dishes and {usages} ingredients with it");
    log::info!("deleted meal {meal_id}");
    Ok(())
}

pub fn delete_meal_dish(conn: &mut database::Connection, meal_dish_id: MealDishId) -> Result<()> {
    find_meal_dish(conn, meal_dish_id)?;

    let usages = diesel::delete(
        meal_dish_ingredients::table.filter(meal_dish_ingredients::meal_dish_id.eq(meal_dish_id)),
    )
    .execute(conn)?;
    diesel::delete(meal_dishes::table.find(meal_dish_id)).execute(conn)?;

    log::debug!("meal dish {meal_dish_id} took {usages} ingredients with it");
    log::info!("deleted meal dish {meal_dish_id}");
    Ok(())
}

pub fn delete_meal_dish_ingredient(
    conn: &mut database::Connection,
    usage_id: MealDishIngredientId,
) -> Result<()> {
    find_meal_dish_ingredient(conn, usage_id)?;
    diesel::delete(meal_dish_ingredients::table.find(usage_id)).execute(conn)?;
    log::info!("deleted meal dish ingredient {usage_id}");
    Ok(())
}

pub fn delete_ingredient_category_mapping(
    conn: &mut database::Connection,
    mapping_id: IngredientCategoryMappingId,
) -> Result<()> {
    find_ingredient_category_mapping(conn, mapping_id)?;
    diesel::delete(ingredient_category_mappings::table.find(mapping_id)).execute(conn)?;
    log::info!("deleted ingredient category mapping {mapping_id}");
    Ok(())
}

pub fn delete_ingredient_property(
    conn: &mut database::Connection,
    ingredient_property_id: IngredientPropertyId,
) -> Result<()> {
    find_ingredient_property(conn, ingredient_property_id)?;
    diesel::delete(ingredient_properties::table.find(ingredient_property_id)).execute(conn)?;
    log::info!("deleted ingredient property {ingredient_property_id}");
    Ok(())
}

/// Refused while any meal uses the ingredient. Its category mappings and property values
/// are removed with it.
pub fn delete_ingredient(
    conn: &mut database::Connection,
    ingredient_id: IngredientId,
) -> Result<()> {
    find_ingredient(conn, ingredient_id)?;

    let uses: i64 = meal_dish_ingredients::table
        .filter(meal_dish_ingredients::ingredient_id.eq(ingredient_id))
        .count()
        .get_result(conn)?;
    if uses > 0 {
        return Err(Error::ReferentialConflict(format!(
            "ingredient {ingredient_id} is used {uses} times in meals"
        )));
    }

    let mappings = diesel::delete(
        ingredient_category_mappings::table
            .filter(ingredient_category_mappings::ingredient_id.eq(ingredient_id)),
    )
    .execute(conn)?;
    let values = diesel::delete(
        ingredient_properties::table.filter(ingredient_properties::ingredient_id.eq(ingredient_id)),
    )
    .execute(conn)?;
    diesel::delete(ingredients::table.find(ingredient_id)).execute(conn)?;

    log::debug!(
        "ingredient {ingredient_id} took {mappings} category mappings and {values} property values with it"
    );
    log::info!("deleted ingredient {ingredient_id}");
    Ok(())
}

/// The ingredients in the category stay, only their mappings are removed.
pub fn delete_ingredient_category(
    conn: &mut database::Connection,
    category_id: IngredientCategoryId,
) -> Result<()> {
    find_ingredient_category(conn, category_id)?;

    let mappings = diesel::delete(
        ingredient_category_mappings::table
            .filter(ingredient_category_mappings::ingredient_category_id.eq(category_id)),
    )
    .execute(conn)?;
    diesel::delete(ingredient_categories::table.find(category_id)).execute(conn)?;

    log::debug!("ingredient category {category_id} took {mappings} mappings with it");
    log::info!("deleted ingredient category {category_id}");
    Ok(())
}

/// Refused while the property has children or any ingredient has a value for it.
pub fn delete_property(conn: &mut database::Connection, property_id: PropertyId) -> Result<()> {
    find_property(conn, property_id)?;

    let children: i64 = properties::table
        .filter(properties::parent_id.eq(property_id))
        .count()
        .get_result(conn)?;
    if children > 0 {
        return Err(Error::ReferentialConflict(format!(
            "property {property_id} has {children} child properties"
        )));
    }
    let values: i64 = ingredient_properties::table
        .filter(ingredient_properties::property_id.eq(property_id))
        .count()
        .get_result(conn)?;
    if values > 0 {
        return Err(Error::ReferentialConflict(format!(
            "{values} ingredients have a value for property {property_id}"
        )));
    }

    diesel::delete(properties::table.find(property_id)).execute(conn)?;
    log::info!("deleted property {property_id}");
    Ok(())
}

/// Refused while any meal contains the dish.
pub fn delete_dish(conn: &mut database::Connection, dish_id: DishId) -> Result<()> {
    find_dish(conn, dish_id)?;

    let uses: i64 = meal_dishes::table
        .filter(meal_dishes::dish_id.eq(dish_id))
        .count()
        .get_result(conn)?;
    if uses > 0 {
        return Err(Error::ReferentialConflict(format!(
            "dish {dish_id} is part of {uses} meals"
        )));
    }

    diesel::delete(dishes::table.find(dish_id)).execute(conn)?;
    log::info!("deleted dish {dish_id}");
    Ok(())
}

#[cfg(test)]
use crate::database::models::{
    NewDish, NewIngredientCategoryMapping, NewIngredientProperty, NewMeal,
    NewMealDishIngredient, Unit,
};
#[cfg(test)]
use crate::store::categories::{
    add_ingredient_category, add_ingredient_category_mapping, get_ingredient_category,
    CreateIngredientCategory,
};
#[cfg(test)]
use crate::store::dishes::add_dish;
#[cfg(test)]
use crate::store::ingredients::{add_ingredient_property, add_test_ingredient, get_ingredient};
#[cfg(test)]
use crate::store::meals::{
    add_meal, add_meal_dish, add_meal_dish_ingredient, get_meal, list_meal_dish_ingredients,
    list_meal_dishes, list_meals, CreateMealDish,
};
#[cfg(test)]
use crate::store::properties::add_test_property;

#[cfg(test)]
struct Breakfast {
    egg: IngredientId,
    dish: DishId,
    meal: MealId,
    meal_dish: MealDishId,
}

#[cfg(test)]
fn breakfast(conn: &mut database::Connection) -> Breakfast {
    let egg = add_test_ingredient(conn, "egg", 50.0, 0.0, 1.0).id;
    let dish = add_dish(
        conn,
        NewDish {
            name: "eggs".into(),
        },
    )
    .unwrap()
    .id;
    let meal = add_meal(
        conn,
        NewMeal {
            timestamp_utc: 0,
            tz_offs_min: 0,
        },
    )
    .unwrap()
    .meal
    .id;
    let meal_dish = add_meal_dish(
        conn,
        CreateMealDish {
            meal_id: meal,
            dish_id: dish,
            copy_from: None,
        },
    )
    .unwrap()
    .meal_dish
    .id;
    add_meal_dish_ingredient(
        conn,
        NewMealDishIngredient {
            meal_dish_id: meal_dish,
            ingredient_id: egg,
            quantity: Some(2.0),
            unit: Some(Unit::Pieces),
        },
    )
    .unwrap();
    Breakfast {
        egg,
        dish,
        meal,
        meal_dish,
    }
}

#[test]
fn meal_takes_its_dishes_with_it() {
    let mut conn = database::in_memory();
    let b = breakfast(&mut conn);
    let other = add_meal(
        &mut conn,
        NewMeal {
            timestamp_utc: 1,
            tz_offs_min: 60,
        },
    )
    .unwrap()
    .meal
    .id;

    delete_meal(&mut conn, b.meal).unwrap();

    let remaining: Vec<_> = list_meals(&mut conn)
        .unwrap()
        .into_iter()
        .map(|m| m.meal.id)
        .collect();
    assert_eq!(remaining, [other]);
    assert!(list_meal_dishes(&mut conn).unwrap().is_empty());
    assert!(list_meal_dish_ingredients(&mut conn).unwrap().is_empty());
    assert!(find_ingredient(&mut conn, b.egg).is_ok());
    assert!(find_dish(&mut conn, b.dish).is_ok());

    assert!(matches!(
        delete_meal(&mut conn, b.meal),
        Err(Error::NotFound { entity: "meal", .. })
    ));
}

#[test]
fn meal_dish_takes_its_ingredients_with_it() {
    let mut conn = database::in_memory();
    let b = breakfast(&mut conn);

    delete_meal_dish(&mut conn, b.meal_dish).unwrap();

    let meal = get_meal(&mut conn, b.meal).unwrap();
    assert!(meal.dishes.is_empty());
    assert!(meal.summary.is_empty());
    assert!(list_meal_dish_ingredients(&mut conn).unwrap().is_empty());
    assert!(matches!(
        delete_meal_dish(&mut conn, b.meal_dish),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn referenced_entities_are_protected() {
    let mut conn = database::in_memory();
    let b = breakfast(&mut conn);

    assert!(matches!(
        delete_ingredient(&mut conn, b.egg),
        Err(Error::ReferentialConflict(_))
    ));
    assert!(matches!(
        delete_dish(&mut conn, b.dish),
        Err(Error::ReferentialConflict(_))
    ));

    delete_meal(&mut conn, b.meal).unwrap();
    delete_dish(&mut conn, b.dish).unwrap();
    assert!(find_dish(&mut conn, b.dish).is_err());

    let fat = add_test_property(&mut conn, "fat", None);
    let saturated = add_test_property(&mut conn, "saturated fat", Some(fat.id));
    let value = add_ingredient_property(
        &mut conn,
        NewIngredientProperty {
            ingredient_id: b.egg,
            property_id: saturated.id,
            value: 1.5,
        },
    )
    .unwrap();
    assert!(matches!(
        delete_property(&mut conn, fat.id),
        Err(Error::ReferentialConflict(_))
    ));
    assert!(matches!(
        delete_property(&mut conn, saturated.id),
        Err(Error::ReferentialConflict(_))
    ));
    delete_ingredient_property(&mut conn, value.id).unwrap();
    delete_property(&mut conn, saturated.id).unwrap();
    delete_property(&mut conn, fat.id).unwrap();
}

#[test]
fn ingredient_and_category_drop_their_mappings() {
    let mut conn = database::in_memory();
    let egg = add_test_ingredient(&mut conn, "egg", 50.0, 0.0, 1.0);
    let bagel = add_test_ingredient(&mut conn, "bagel", 0.0, 0.0, 0.0);
    let eggs = add_ingredient_category(
        &mut conn,
        CreateIngredientCategory {
            name: None,
            ingredient_id: Some(egg.id),
        },
    )
    .unwrap()
    .category
    .id;
    add_ingredient_category_mapping(
        &mut conn,
        NewIngredientCategoryMapping {
            ingredient_id: bagel.id,
            ingredient_category_id: eggs,
        },
    )
    .unwrap();
    let calories = add_test_property(&mut conn, "calories", None);
    add_ingredient_property(
        &mut conn,
        NewIngredientProperty {
            ingredient_id: egg.id,
            property_id: calories.id,
            value: 70.0,
        },
    )
    .unwrap();

    delete_ingredient(&mut conn, egg.id).unwrap();
    let category = get_ingredient_category(&mut conn, eggs).unwrap();
    assert_eq!(category.mappings.unwrap().len(), 1);
    assert!(!category.fully_entered);
    delete_property(&mut conn, calories.id).unwrap();

    delete_ingredient_category(&mut conn, eggs).unwrap();
    assert!(get_ingredient(&mut conn, bagel.id)
        .unwrap()
        .category_mappings
        .is_empty());
    assert!(find_ingredient_category(&mut conn, eggs).is_err());
}

// Copyright 2023 Remi Bernotavicius

use super::check_amount;
use super::dishes::find_dish;
use super::ingredients::{find_ingredient, ingredient_nutrition};
use crate::database;
use crate::database::models::{
    DishId, Meal, MealChanges, MealDish, MealDishChanges, MealDishId, MealDishIngredient,
    MealDishIngredientChanges, MealDishIngredientId, MealId, NewMeal, NewMealDish,
    NewMealDishIngredient,
};
use crate::database::schema::{meal_dish_ingredients, meal_dishes, meals};
use crate::error::{OrNotFound as _, Result};
use crate::nutrition::{meal_nutrition, MealNutrition, SummaryEntry};
use diesel::associations::GroupedBy as _;
use diesel::prelude::OptionalExtension as _;
use diesel::BelongingToDsl as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MealDishView {
    #[serde(flatten)]
    pub meal_dish: MealDish,
    /// In the order they were added.
    pub ingredients: Vec<MealDishIngredient>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MealView {
    #[serde(flatten)]
    pub meal: Meal,
    pub dishes: Vec<MealDishView>,
    pub summary: Vec<SummaryEntry>,
    pub summary_complete: bool,
}

/// `copy_from` names an existing meal dish whose ingredients are copied into the new one.
#[derive(Deserialize, Debug, Clone)]
pub struct CreateMealDish {
    pub meal_id: MealId,
    pub dish_id: DishId,
    #[serde(default)]
    pub copy_from: Option<MealDishId>,
}

pub fn find_meal(conn: &mut database::Connection, meal_id: MealId) -> Result<Meal> {
    meals::table
        .find(meal_id)
        .select(Meal::as_select())
        .first(conn)
        .optional()?
        .or_not_found("meal", meal_id)
}

/// Loads the dishes and ingredients of `meal` and derives its summary. With `with_ingredients`
/// unset the dishes are returned without their ingredient rows; the summary still covers them.
fn meal_view(
    conn: &mut database::Connection,
    meal: Meal,
    with_ingredients: bool,
) -> Result<MealView> {
    let dishes = MealDish::belonging_to(&meal)
        .select(MealDish::as_select())
        .order(meal_dishes::id)
        .load(conn)?;
    let usages = MealDishIngredient::belonging_to(&dishes)
        .select(MealDishIngredient::as_select())
        .order(meal_dish_ingredients::id)
        .load(conn)?;

    let used: BTreeSet<_> = usages.iter().map(|u| u.ingredient_id).collect();
    let used: Vec<_> = used.into_iter().collect();
    let nutrition = ingredient_nutrition(conn, &used)?;
    let MealNutrition {
        summary,
        summary_complete,
    } = meal_nutrition(&usages, &nutrition);

    let dishes = usages
        .grouped_by(&dishes)
        .into_iter()
        .zip(dishes)
        .map(|(ingredients, meal_dish)| MealDishView {
            meal_dish,
            ingredients: if with_ingredients { ingredients } else { vec![] },
        })
        .collect();

    Ok(MealView {
        meal,
        dishes,
        summary: summary.entries(),
        summary_complete,
    })
}

pub fn add_meal(conn: &mut database::Connection, new_meal: NewMeal) -> Result<MealView> {
    let meal = diesel::insert_into(meals::table)
        .values(&new_meal)
        .returning(Meal::as_returning())
        .get_result(conn)?;
    log::info!("added meal {} at {}", meal.id, meal.timestamp_utc);
    meal_view(conn, meal, true)
}

pub fn list_meals(conn: &mut database::Connection) -> Result<Vec<MealView>> {
    let all = meals::table
        .select(Meal::as_select())
        .order(meals::id)
        .load(conn)?;
    all.into_iter()
        .map(|meal| meal_view(conn, meal, false))
        .collect()
}

pub fn get_meal(conn: &mut database::Connection, meal_id: MealId) -> Result<MealView> {
    let meal = find_meal(conn, meal_id)?;
    meal_view(conn, meal, true)
}

pub fn update_meal(
    conn: &mut database::Connection,
    meal_id: MealId,
    changes: MealChanges,
) -> Result<()> {
    find_meal(conn, meal_id)?;
    if changes.is_empty() {
        return Ok(());
    }

    diesel::update(meals::table.find(meal_id))
        .set(&changes)
        .execute(conn)?;
    log::info!("updated meal {meal_id}");
    Ok(())
}

pub fn find_meal_dish(
    conn: &mut database::Connection,
    meal_dish_id: MealDishId,
) -> Result<MealDish> {
    meal_dishes::table
        .find(meal_dish_id)
        .select(MealDish::as_select())
        .first(conn)
        .optional()?
        .or_not_found("meal dish", meal_dish_id)
}

fn meal_dish_ingredients(
    conn: &mut database::Connection,
    meal_dish: &MealDish,
) -> Result<Vec<MealDishIngredient>> {
    Ok(MealDishIngredient::belonging_to(meal_dish)
        .select(MealDishIngredient::as_select())
        .order(meal_dish_ingredients::id)
        .load(conn)?)
}

pub fn add_meal_dish(
    conn: &mut database::Connection,
    new_meal_dish: CreateMealDish,
) -> Result<MealDishView> {
    find_meal(conn, new_meal_dish.meal_id)?;
    find_dish(conn, new_meal_dish.dish_id)?;
    let source = new_meal_dish
        .copy_from
        .map(|source_id| find_meal_dish(conn, source_id))
        .transpose()?;

    let meal_dish = diesel::insert_into(meal_dishes::table)
        .values(NewMealDish {
            meal_id: new_meal_dish.meal_id,
            dish_id: new_meal_dish.dish_id,
        })
        .returning(MealDish::as_returning())
        .get_result(conn)?;
    log::info!(
        "added meal dish {} (meal {}, dish {})",
        meal_dish.id,
        meal_dish.meal_id,
        meal_dish.dish_id
    );

    let mut ingredients = vec![];
    if let Some(source) = source {
        for usage in meal_dish_ingredients(conn, &source)? {
            let copy = diesel::insert_into(meal_dish_ingredients::table)
                .values(NewMealDishIngredient {
                    meal_dish_id: meal_dish.id,
                    ingredient_id: usage.ingredient_id,
                    quantity: usage.quantity,
                    unit: usage.unit,
                })
                .returning(MealDishIngredient::as_returning())
                .get_result(conn)?;
            ingredients.push(copy);
        }
        log::debug!(
            "copied {} ingredients from meal dish {} into {}",
            ingredients.len(),
            source.id,
            meal_dish.id
        );
    }

    Ok(MealDishView {
        meal_dish,
        ingredients,
    })
}

pub fn list_meal_dishes(conn: &mut database::Connection) -> Result<Vec<MealDish>> {
    Ok(meal_dishes::table
        .select(MealDish::as_select())
        .order(meal_dishes::id)
        .load(conn)?)
}

pub fn get_meal_dish(
    conn: &mut database::Connection,
    meal_dish_id: MealDishId,
) -> Result<MealDishView> {
    let meal_dish = find_meal_dish(conn, meal_dish_id)?;
    let ingredients = meal_dish_ingredients(conn, &meal_dish)?;
    Ok(MealDishView {
        meal_dish,
        ingredients,
    })
}

pub fn update_meal_dish(
    conn: &mut database::Connection,
    meal_dish_id: MealDishId,
    changes: MealDishChanges,
) -> Result<()> {
    find_meal_dish(conn, meal_dish_id)?;
    if let Some(dish_id) = changes.dish_id {
        find_dish(conn, dish_id)?;
    }
    if changes.is_empty() {
        return Ok(());
    }

    diesel::update(meal_dishes::table.find(meal_dish_id))
        .set(&changes)
        .execute(conn)?;
    log::info!("updated meal dish {meal_dish_id}");
    Ok(())
}

pub fn find_meal_dish_ingredient(
    conn: &mut database::Connection,
    usage_id: MealDishIngredientId,
) -> Result<MealDishIngredient> {
    meal_dish_ingredients::table
        .find(usage_id)
        .select(MealDishIngredient::as_select())
        .first(conn)
        .optional()?
        .or_not_found("meal dish ingredient", usage_id)
}

pub fn add_meal_dish_ingredient(
    conn: &mut database::Connection,
    new_usage: NewMealDishIngredient,
) -> Result<MealDishIngredient> {
    find_meal_dish(conn, new_usage.meal_dish_id)?;
    find_ingredient(conn, new_usage.ingredient_id)?;
    check_amount("quantity", new_usage.quantity)?;

    let usage = diesel::insert_into(meal_dish_ingredients::table)
        .values(&new_usage)
        .returning(MealDishIngredient::as_returning())
        .get_result(conn)?;
    log::info!(
        "added meal dish ingredient {} (meal dish {}, ingredient {})",
        usage.id,
        usage.meal_dish_id,
        usage.ingredient_id
    );
    Ok(usage)
}

pub fn list_meal_dish_ingredients(
    conn: &mut database::Connection,
) -> Result<Vec<MealDishIngredient>> {
    Ok(meal_dish_ingredients::table
        .select(MealDishIngredient::as_select())
        .order(meal_dish_ingredients::id)
        .load(conn)?)
}

pub fn update_meal_dish_ingredient(
    conn: &mut database::Connection,
    usage_id: MealDishIngredientId,
    changes: MealDishIngredientChanges,
) -> Result<()> {
    find_meal_dish_ingredient(conn, usage_id)?;
    if let Some(ingredient_id) = changes.ingredient_id {
        find_ingredient(conn, ingredient_id)?;
    }
    check_amount("quantity", changes.quantity.flatten())?;
    if changes.is_empty() {
        return Ok(());
    }

    diesel::update(meal_dish_ingredients::table.find(usage_id))
        .set(&changes)
        .execute(conn)?;
    log::info!("updated meal dish ingredient {usage_id}");
    Ok(())
}

#[cfg(test)]
use crate::database::models::{
    IngredientChanges, IngredientId, NewDish, NewIngredientProperty, PropertyId, Unit,
};
#[cfg(test)]
use crate::error::Error;
#[cfg(test)]
use crate::store::cascade::{delete_meal, delete_meal_dish};
#[cfg(test)]
use crate::store::dishes::add_dish;
#[cfg(test)]
use crate::store::ingredients::{add_ingredient_property, add_test_ingredient, update_ingredient};
#[cfg(test)]
use crate::store::properties::add_test_property;

#[cfg(test)]
struct Pantry {
    egg: IngredientId,
    bread: IngredientId,
    cream_cheese: IngredientId,
    calories: PropertyId,
    fat: PropertyId,
    saturated_fat: PropertyId,
    protein: PropertyId,
    egg_on_bread: DishId,
    bread_and_cheese: DishId,
}

#[cfg(test)]
fn stock_pantry(conn: &mut database::Connection) -> Pantry {
    let egg = add_test_ingredient(conn, "egg", 50.0, 0.0, 1.0).id;
    let bread = add_test_ingredient(conn, "bread", 51.0, 0.0, 2.0).id;
    let cream_cheese = add_test_ingredient(conn, "cream cheese", 28.0, 0.0, 0.0).id;

    let calories = add_test_property(conn, "calories", None).id;
    let fat = add_test_property(conn, "fat", None).id;
    let saturated_fat = add_test_property(conn, "saturated fat", Some(fat)).id;
    let protein = add_test_property(conn, "protein", None).id;

    for (ingredient_id, property_id, value) in [
        (egg, calories, 70.0),
        (egg, protein, 6.1),
        (egg, fat, 5.0),
        (bread, calories, 120.0),
        (bread, protein, 5.0),
        (bread, fat, 1.0),
        (cream_cheese, calories, 70.0),
        (cream_cheese, protein, 2.0),
        (cream_cheese, fat, 5.0),
        (cream_cheese, saturated_fat, 1.0),
    ] {
        add_ingredient_property(
            conn,
            NewIngredientProperty {
                ingredient_id,
                property_id,
                value,
            },
        )
        .unwrap();
    }

    for ingredient_id in [egg, bread] {
        mark_fully_entered(conn, ingredient_id, true);
    }

    let dish = |conn: &mut database::Connection, name: &str| {
        add_dish(conn, NewDish { name: name.into() }).unwrap().id
    };
    let egg_on_bread = dish(conn, "egg on bread");
    let bread_and_cheese = dish(conn, "bread and cheese");

    Pantry {
        egg,
        bread,
        cream_cheese,
        calories,
        fat,
        saturated_fat,
        protein,
        egg_on_bread,
        bread_and_cheese,
    }
}

#[cfg(test)]
fn mark_fully_entered(conn: &mut database::Connection, id: IngredientId, fully_entered: bool) {
    let changes = IngredientChanges {
        fully_entered: Some(fully_entered),
        ..Default::default()
    };
    update_ingredient(conn, id, changes).unwrap();
}

#[cfg(test)]
fn new_meal(conn: &mut database::Connection) -> MealId {
    add_meal(
        conn,
        NewMeal {
            timestamp_utc: 1749585958,
            tz_offs_min: -420,
        },
    )
    .unwrap()
    .meal
    .id
}

#[cfg(test)]
fn add_dish_to_meal(
    conn: &mut database::Connection,
    meal_id: MealId,
    dish_id: DishId,
    ingredients: &[(IngredientId, f64, Unit)],
) -> MealDishId {
    let meal_dish = add_meal_dish(
        conn,
        CreateMealDish {
            meal_id,
            dish_id,
            copy_from: None,
        },
    )
    .unwrap()
    .meal_dish;

    for &(ingredient_id, quantity, unit) in ingredients {
        let usage = add_meal_dish_ingredient(
            conn,
            NewMealDishIngredient {
                meal_dish_id: meal_dish.id,
                ingredient_id,
                quantity: None,
                unit: None,
            },
        )
        .unwrap();
        update_meal_dish_ingredient(
            conn,
            usage.id,
            MealDishIngredientChanges {
                quantity: Some(Some(quantity)),
                unit: Some(Some(unit)),
                ..Default::default()
            },
        )
        .unwrap();
    }
    meal_dish.id
}

#[cfg(test)]
fn assert_summary(meal: &MealView, expected: &[(PropertyId, f64)]) {
    let actual: Vec<_> = meal.summary.iter().map(|e| e.property_id).collect();
    let wanted: Vec<_> = expected.iter().map(|&(p, _)| p).collect();
    assert_eq!(actual, wanted);
    for (entry, &(property_id, value)) in meal.summary.iter().zip(expected) {
        assert!(
            (entry.value - value).abs() < 1e-3,
            "property {property_id}: {} != {value}",
            entry.value
        );
    }
}

#[test]
fn egg_on_bread_summary() {
    let mut conn = database::in_memory();
    let p = stock_pantry(&mut conn);
    let meal_id = new_meal(&mut conn);
    add_dish_to_meal(
        &mut conn,
        meal_id,
        p.egg_on_bread,
        &[(p.egg, 2.0, Unit::Pieces), (p.bread, 2.0, Unit::Pieces)],
    );

    let meal = get_meal(&mut conn, meal_id).unwrap();
    assert_eq!(meal.meal.timestamp_utc, 1749585958);
    assert_eq!(meal.meal.tz_offs_min, -420);
    assert_summary(
        &meal,
        &[(p.calories, 260.0), (p.fat, 11.0), (p.protein, 17.2)],
    );
    assert!(meal.summary_complete);

    let ingredients: Vec<_> = meal.dishes[0]
        .ingredients
        .iter()
        .map(|i| (i.ingredient_id, i.quantity, i.unit))
        .collect();
    assert_eq!(
        ingredients,
        [
            (p.egg, Some(2.0), Some(Unit::Pieces)),
            (p.bread, Some(2.0), Some(Unit::Pieces))
        ]
    );

    mark_fully_entered(&mut conn, p.bread, false);
    assert!(!get_meal(&mut conn, meal_id).unwrap().summary_complete);
}

#[test]
fn mass_quantity_scales_by_serving_size() {
    let mut conn = database::in_memory();
    let p = stock_pantry(&mut conn);
    let meal_id = new_meal(&mut conn);
    add_dish_to_meal(
        &mut conn,
        meal_id,
        p.egg_on_bread,
        &[(p.egg, 100.0, Unit::Mass)],
    );

    let meal = get_meal(&mut conn, meal_id).unwrap();
    assert_summary(
        &meal,
        &[(p.calories, 140.0), (p.fat, 10.0), (p.protein, 12.2)],
    );
}

#[test]
fn incomplete_dish_flips_completeness() {
    let mut conn = database::in_memory();
    let p = stock_pantry(&mut conn);
    let meal_id = new_meal(&mut conn);
    assert!(get_meal(&mut conn, meal_id).unwrap().summary_complete);

    add_dish_to_meal(
        &mut conn,
        meal_id,
        p.egg_on_bread,
        &[(p.egg, 2.0, Unit::Pieces), (p.bread, 2.0, Unit::Pieces)],
    );
    assert!(get_meal(&mut conn, meal_id).unwrap().summary_complete);

    let cheese_dish = add_dish_to_meal(
        &mut conn,
        meal_id,
        p.bread_and_cheese,
        &[(p.bread, 2.0, Unit::Pieces), (p.cream_cheese, 50.0, Unit::Mass)],
    );
    let meal = get_meal(&mut conn, meal_id).unwrap();
    assert!(!meal.summary_complete);
    assert_summary(
        &meal,
        &[
            (p.calories, 505.0),
            (p.fat, 20.929),
            (p.saturated_fat, 1.786),
            (p.protein, 25.771),
        ],
    );

    let listed = list_meals(&mut conn).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].summary, meal.summary);
    assert!(listed[0].dishes.iter().all(|d| d.ingredients.is_empty()));

    delete_meal_dish(&mut conn, cheese_dish).unwrap();
    let meal = get_meal(&mut conn, meal_id).unwrap();
    assert!(meal.summary_complete);
    assert_eq!(meal.dishes.len(), 1);
    assert_eq!(meal.dishes[0].meal_dish.dish_id, p.egg_on_bread);
    assert!(find_dish(&mut conn, p.bread_and_cheese).is_ok());
    assert!(find_ingredient(&mut conn, p.cream_cheese).is_ok());
}

#[test]
fn copy_meal_dish() {
    let mut conn = database::in_memory();
    let p = stock_pantry(&mut conn);
    let yesterday = new_meal(&mut conn);
    let source = add_dish_to_meal(
        &mut conn,
        yesterday,
        p.egg_on_bread,
        &[(p.egg, 2.0, Unit::Pieces), (p.bread, 2.0, Unit::Pieces)],
    );

    let today = new_meal(&mut conn);
    let copy = add_meal_dish(
        &mut conn,
        CreateMealDish {
            meal_id: today,
            dish_id: p.egg_on_bread,
            copy_from: Some(source),
        },
    )
    .unwrap();
    assert_eq!(copy.ingredients.len(), 2);
    assert_eq!(copy.ingredients[0].meal_dish_id, copy.meal_dish.id);

    assert_eq!(
        get_meal(&mut conn, today).unwrap().summary,
        get_meal(&mut conn, yesterday).unwrap().summary
    );

    delete_meal(&mut conn, yesterday).unwrap();
    assert_eq!(get_meal_dish(&mut conn, copy.meal_dish.id).unwrap(), copy);
}

#[test]
fn references_must_exist() {
    let mut conn = database::in_memory();
    let p = stock_pantry(&mut conn);
    let meal_id = new_meal(&mut conn);

    let res = add_meal_dish(
        &mut conn,
        CreateMealDish {
            meal_id: MealId::from(77),
            dish_id: p.egg_on_bread,
            copy_from: None,
        },
    );
    assert!(matches!(res, Err(Error::NotFound { entity: "meal", .. })));

    let meal_dish = add_dish_to_meal(&mut conn, meal_id, p.egg_on_bread, &[]);
    let res = add_meal_dish_ingredient(
        &mut conn,
        NewMealDishIngredient {
            meal_dish_id: meal_dish,
            ingredient_id: IngredientId::from(77),
            quantity: None,
            unit: None,
        },
    );
    assert!(matches!(
        res,
        Err(Error::NotFound {
            entity: "ingredient",
            ..
        })
    ));

    let res = add_meal_dish_ingredient(
        &mut conn,
        NewMealDishIngredient {
            meal_dish_id: meal_dish,
            ingredient_id: p.egg,
            quantity: Some(-1.0),
            unit: Some(Unit::Pieces),
        },
    );
    assert!(matches!(res, Err(Error::Validation(_))));
    assert!(list_meal_dish_ingredients(&mut conn).unwrap().is_empty());
}

#[test]
fn volume_quantity_scales_by_serving_size() {
    let mut conn = database::in_memory();
    let p = stock_pantry(&mut conn);
    let milk = add_test_ingredient(&mut conn, "milk", 0.0, 125.0, 0.0).id;
    add_ingredient_property(
        &mut conn,
        NewIngredientProperty {
            ingredient_id: milk,
            property_id: p.calories,
            value: 60.0,
        },
    )
    .unwrap();

    let meal_id = new_meal(&mut conn);
    let meal_dish = add_dish_to_meal(&mut conn, meal_id, p.egg_on_bread, &[]);
    let usage = add_meal_dish_ingredient(
        &mut conn,
        NewMealDishIngredient {
            meal_dish_id: meal_dish,
            ingredient_id: milk,
            quantity: None,
            unit: None,
        },
    )
    .unwrap();
    assert!(get_meal(&mut conn, meal_id).unwrap().summary.is_empty());

    let changes: MealDishIngredientChanges =
        serde_json::from_str(r#"{"quantity": 250, "unit": "ml"}"#).unwrap();
    update_meal_dish_ingredient(&mut conn, usage.id, changes).unwrap();

    let meal = get_meal(&mut conn, meal_id).unwrap();
    assert_summary(&meal, &[(p.calories, 120.0)]);
    assert_eq!(meal.dishes[0].ingredients[0].unit, Some(Unit::Volume));
}

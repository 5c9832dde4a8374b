// Copyright 2023 Remi Bernotavicius

use super::{AppState, JsonBody};
use crate::database::models::{
    Dish, DishChanges, DishId, IngredientCategoryChanges, IngredientCategoryId,
    IngredientCategoryMapping, IngredientCategoryMappingChanges, IngredientCategoryMappingId,
    IngredientChanges, IngredientId, IngredientProperty, IngredientPropertyChanges,
    IngredientPropertyId, MealChanges, MealDish, MealDishChanges, MealDishId, MealDishIngredient,
    MealDishIngredientChanges, MealDishIngredientId, MealId, NewDish, NewIngredient,
    NewIngredientCategoryMapping, NewIngredientProperty, NewMeal, NewMealDishIngredient,
    NewProperty, Property, PropertyChanges, PropertyId,
};
use crate::error::Result;
use crate::store::categories::{CreateIngredientCategory, IngredientCategoryView};
use crate::store::ingredients::IngredientView;
use crate::store::meals::{CreateMealDish, MealDishView, MealView};
use crate::store::{cascade, categories, dishes, ingredients, meals, properties};
use axum::extract::{Path, State};
use axum::Json;

// ingredients

pub async fn add_ingredient(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewIngredient>,
) -> Result<Json<IngredientView>> {
    state.run(move |conn| ingredients::add_ingredient(conn, body)).await.map(Json)
}

pub async fn list_ingredients(State(state): State<AppState>) -> Result<Json<Vec<IngredientView>>> {
    state.run(ingredients::list_ingredients).await.map(Json)
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<IngredientId>,
) -> Result<Json<IngredientView>> {
    state.run(move |conn| ingredients::get_ingredient(conn, id)).await.map(Json)
}

pub async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<IngredientId>,
    JsonBody(body): JsonBody<IngredientChanges>,
) -> Result<()> {
    state.run(move |conn| ingredients::update_ingredient(conn, id, body)).await
}

pub async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<IngredientId>,
) -> Result<()> {
    state.run(move |conn| cascade::delete_ingredient(conn, id)).await
}

// ingredient categories

pub async fn add_ingredient_category(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateIngredientCategory>,
) -> Result<Json<IngredientCategoryView>> {
    state
        .run(move |conn| categories::add_ingredient_category(conn, body))
        .await
        .map(Json)
}

pub async fn list_ingredient_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<IngredientCategoryView>>> {
    state.run(categories::list_ingredient_categories).await.map(Json)
}

pub async fn get_ingredient_category(
    State(state): State<AppState>,
    Path(id): Path<IngredientCategoryId>,
) -> Result<Json<IngredientCategoryView>> {
    state
        .run(move |conn| categories::get_ingredient_category(conn, id))
        .await
        .map(Json)
}

pub async fn update_ingredient_category(
    State(state): State<AppState>,
    Path(id): Path<IngredientCategoryId>,
    JsonBody(body): JsonBody<IngredientCategoryChanges>,
) -> Result<()> {
    state.run(move |conn| categories::update_ingredient_category(conn, id, body)).await
}

pub async fn delete_ingredient_category(
    State(state): State<AppState>,
    Path(id): Path<IngredientCategoryId>,
) -> Result<()> {
    state.run(move |conn| cascade::delete_ingredient_category(conn, id)).await
}

// ingredient category mappings

pub async fn add_ingredient_category_mapping(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewIngredientCategoryMapping>,
) -> Result<Json<IngredientCategoryMapping>> {
    state
        .run(move |conn| categories::add_ingredient_category_mapping(conn, body))
        .await
        .map(Json)
}

pub async fn list_ingredient_category_mappings(
    State(state): State<AppState>,
) -> Result<Json<Vec<IngredientCategoryMapping>>> {
    state
        .run(categories::list_ingredient_category_mappings)
        .await
        .map(Json)
}

pub async fn get_ingredient_category_mapping(
    State(state): State<AppState>,
    Path(id): Path<IngredientCategoryMappingId>,
) -> Result<Json<IngredientCategoryMapping>> {
    state
        .run(move |conn| categories::find_ingredient_category_mapping(conn, id))
        .await
        .map(Json)
}

pub async fn update_ingredient_category_mapping(
    State(state): State<AppState>,
    Path(id): Path<IngredientCategoryMappingId>,
    JsonBody(body): JsonBody<IngredientCategoryMappingChanges>,
) -> Result<()> {
    state.run(move |conn| categories::update_ingredient_category_mapping(conn, id, body)).await
}

pub async fn delete_ingredient_category_mapping(
    State(state): State<AppState>,
    Path(id): Path<IngredientCategoryMappingId>,
) -> Result<()> {
    state.run(move |conn| cascade::delete_ingredient_category_mapping(conn, id)).await
}

// properties

pub async fn add_property(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewProperty>,
) -> Result<Json<Property>> {
    state.run(move |conn| properties::add_property(conn, body)).await.map(Json)
}

pub async fn list_properties(State(state): State<AppState>) -> Result<Json<Vec<Property>>> {
    state.run(properties::list_properties).await.map(Json)
}

pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<PropertyId>,
) -> Result<Json<Property>> {
    state.run(move |conn| properties::find_property(conn, id)).await.map(Json)
}

pub async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<PropertyId>,
    JsonBody(body): JsonBody<PropertyChanges>,
) -> Result<()> {
    state.run(move |conn| properties::update_property(conn, id, body)).await
}

pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<PropertyId>,
) -> Result<()> {
    state.run(move |conn| cascade::delete_property(conn, id)).await
}

// ingredient properties

pub async fn add_ingredient_property(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewIngredientProperty>,
) -> Result<Json<IngredientProperty>> {
    state
        .run(move |conn| ingredients::add_ingredient_property(conn, body))
        .await
        .map(Json)
}

pub async fn list_ingredient_properties(
    State(state): State<AppState>,
) -> Result<Json<Vec<IngredientProperty>>> {
    state.run(ingredients::list_ingredient_properties).await.map(Json)
}

pub async fn get_ingredient_property(
    State(state): State<AppState>,
    Path(id): Path<IngredientPropertyId>,
) -> Result<Json<IngredientProperty>> {
    state
        .run(move |conn| ingredients::find_ingredient_property(conn, id))
        .await
        .map(Json)
}

pub async fn update_ingredient_property(
    State(state): State<AppState>,
    Path(id): Path<IngredientPropertyId>,
    JsonBody(body): JsonBody<IngredientPropertyChanges>,
) -> Result<()> {
    state.run(move |conn| ingredients::update_ingredient_property(conn, id, body)).await
}

pub async fn delete_ingredient_property(
    State(state): State<AppState>,
    Path(id): Path<IngredientPropertyId>,
) -> Result<()> {
    state.run(move |conn| cascade::delete_ingredient_property(conn, id)).await
}

// dishes

pub async fn add_dish(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewDish>,
) -> Result<Json<Dish>> {
    state.run(move |conn| dishes::add_dish(conn, body)).await.map(Json)
}

pub async fn list_dishes(State(state): State<AppState>) -> Result<Json<Vec<Dish>>> {
    state.run(dishes::list_dishes).await.map(Json)
}

pub async fn get_dish(State(state): State<AppState>, Path(id): Path<DishId>) -> Result<Json<Dish>> {
    state.run(move |conn| dishes::find_dish(conn, id)).await.map(Json)
}

pub async fn update_dish(
    State(state): State<AppState>,
    Path(id): Path<DishId>,
    JsonBody(body): JsonBody<DishChanges>,
) -> Result<()> {
    state.run(move |conn| dishes::update_dish(conn, id, body)).await
}

pub async fn delete_dish(State(state): State<AppState>, Path(id): Path<DishId>) -> Result<()> {
    state.run(move |conn| cascade::delete_dish(conn, id)).await
}

// meals

pub async fn add_meal(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewMeal>,
) -> Result<Json<MealView>> {
    state.run(move |conn| meals::add_meal(conn, body)).await.map(Json)
}

pub async fn list_meals(State(state): State<AppState>) -> Result<Json<Vec<MealView>>> {
    state.run(meals::list_meals).await.map(Json)
}

pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<MealId>,
) -> Result<Json<MealView>> {
    state.run(move |conn| meals::get_meal(conn, id)).await.map(Json)
}

pub async fn update_meal(
    State(state): State<AppState>,
    Path(id): Path<MealId>,
    JsonBody(body): JsonBody<MealChanges>,
) -> Result<()> {
    state.run(move |conn| meals::update_meal(conn, id, body)).await
}

pub async fn delete_meal(State(state): State<AppState>, Path(id): Path<MealId>) -> Result<()> {
    state.run(move |conn| cascade::delete_meal(conn, id)).await
}

// meal dishes

pub async fn add_meal_dish(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateMealDish>,
) -> Result<Json<MealDishView>> {
    state.run(move |conn| meals::add_meal_dish(conn, body)).await.map(Json)
}

pub async fn list_meal_dishes(State(state): State<AppState>) -> Result<Json<Vec<MealDish>>> {
    state.run(meals::list_meal_dishes).await.map(Json)
}

pub async fn get_meal_dish(
    State(state): State<AppState>,
    Path(id): Path<MealDishId>,
) -> Result<Json<MealDishView>> {
    state.run(move |conn| meals::get_meal_dish(conn, id)).await.map(Json)
}

pub async fn update_meal_dish(
    State(state): State<AppState>,
    Path(id): Path<MealDishId>,
    JsonBody(body): JsonBody<MealDishChanges>,
) -> Result<()> {
    state.run(move |conn| meals::update_meal_dish(conn, id, body)).await
}

pub async fn delete_meal_dish(
    State(state): State<AppState>,
    Path(id): Path<MealDishId>,
) -> Result<()> {
    state.run(move |conn| cascade::delete_meal_dish(conn, id)).await
}

// meal dish ingredients

pub async fn add_meal_dish_ingredient(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewMealDishIngredient>,
) -> Result<Json<MealDishIngredient>> {
    state
        .run(move |conn| meals::add_meal_dish_ingredient(conn, body))
        .await
        .map(Json)
}

pub async fn list_meal_dish_ingredients(
    State(state): State<AppState>,
) -> Result<Json<Vec<MealDishIngredient>>> {
    state.run(meals::list_meal_dish_ingredients).await.map(Json)
}

pub async fn get_meal_dish_ingredient(
    State(state): State<AppState>,
    Path(id): Path<MealDishIngredientId>,
) -> Result<Json<MealDishIngredient>> {
    state
        .run(move |conn| meals::find_meal_dish_ingredient(conn, id))
        .await
        .map(Json)
}

pub async fn update_meal_dish_ingredient(
    State(state): State<AppState>,
    Path(id): Path<MealDishIngredientId>,
    JsonBody(body): JsonBody<MealDishIngredientChanges>,
) -> Result<()> {
    state.run(move |conn| meals::update_meal_dish_ingredient(conn, id, body)).await
}

pub async fn delete_meal_dish_ingredient(
    State(state): State<AppState>,
    Path(id): Path<MealDishIngredientId>,
) -> Result<()> {
    state.run(move |conn| cascade::delete_meal_dish_ingredient(conn, id)).await
}

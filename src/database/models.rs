// Copyright 2023 Remi Bernotavicius

use derive_more::Display;
use diesel::associations::{Associations, Identifiable};
use diesel::deserialize::Queryable;
use diesel::expression::Selectable;
use diesel::prelude::{AsChangeset, Insertable};
use diesel_derive_enum::DbEnum;
use diesel_derive_newtype::DieselNewType;
use serde::{Deserialize, Deserializer, Serialize};
use strum::EnumIter;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            DieselNewType,
            Debug,
            Display,
            Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Copy,
            Clone,
            Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_type!(IngredientId);
id_type!(PropertyId);
id_type!(IngredientPropertyId);
id_type!(IngredientCategoryId);
id_type!(IngredientCategoryMappingId);
id_type!(DishId);
id_type!(MealId);
id_type!(MealDishId);
id_type!(MealDishIngredientId);

/// Lets a partial update distinguish a missing field (`None`) from an explicit `null`
/// (`Some(None)`). Use together with `#[serde(default)]`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub serving_size_g: Option<f64>,
    pub serving_size_ml: Option<f64>,
    pub serving_size_pieces: Option<f64>,
    pub fully_entered: bool,
}

#[derive(Insertable, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct NewIngredient {
    pub name: String,
    #[serde(default)]
    pub serving_size_g: Option<f64>,
    #[serde(default)]
    pub serving_size_ml: Option<f64>,
    #[serde(default)]
    pub serving_size_pieces: Option<f64>,
    #[serde(default)]
    pub fully_entered: bool,
}

#[derive(AsChangeset, Deserialize, Default, Debug, Clone)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct IngredientChanges {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub serving_size_g: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub serving_size_ml: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub serving_size_pieces: Option<Option<f64>>,
    pub fully_entered: Option<bool>,
}

impl IngredientChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.serving_size_g.is_none()
            && self.serving_size_ml.is_none()
            && self.serving_size_pieces.is_none()
            && self.fully_entered.is_none()
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::properties)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub parent_id: Option<PropertyId>,
}

#[derive(Insertable, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::database::schema::properties)]
pub struct NewProperty {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<PropertyId>,
}

#[derive(AsChangeset, Deserialize, Default, Debug, Clone)]
#[diesel(table_name = crate::database::schema::properties)]
pub struct PropertyChanges {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<PropertyId>>,
}

impl PropertyChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none()
    }
}

/// The amount of one property contained in a single serving of an ingredient.
#[derive(
    Associations, Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq,
)]
#[diesel(belongs_to(Ingredient))]
#[diesel(belongs_to(Property))]
#[diesel(table_name = crate::database::schema::ingredient_properties)]
pub struct IngredientProperty {
    pub id: IngredientPropertyId,
    pub ingredient_id: IngredientId,
    pub property_id: PropertyId,
    pub value: f64,
}

#[derive(Insertable, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::database::schema::ingredient_properties)]
pub struct NewIngredientProperty {
    pub ingredient_id: IngredientId,
    pub property_id: PropertyId,
    #[serde(default)]
    pub value: f64,
}

#[derive(AsChangeset, Deserialize, Default, Debug, Clone)]
#[diesel(table_name = crate::database::schema::ingredient_properties)]
pub struct IngredientPropertyChanges {
    pub value: Option<f64>,
}

impl IngredientPropertyChanges {
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::ingredient_categories)]
pub struct IngredientCategory {
    pub id: IngredientCategoryId,
    pub name: String,
}

#[derive(AsChangeset, Deserialize, Default, Debug, Clone)]
#[diesel(table_name = crate::database::schema::ingredient_categories)]
pub struct IngredientCategoryChanges {
    pub name: Option<String>,
}

impl IngredientCategoryChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}

#[derive(
    Associations, Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq,
)]
#[diesel(belongs_to(Ingredient))]
#[diesel(belongs_to(IngredientCategory))]
#[diesel(table_name = crate::database::schema::ingredient_category_mappings)]
pub struct IngredientCategoryMapping {
    pub id: IngredientCategoryMappingId,
    pub ingredient_id: IngredientId,
    pub ingredient_category_id: IngredientCategoryId,
}

#[derive(Insertable, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::database::schema::ingredient_category_mappings)]
pub struct NewIngredientCategoryMapping {
    pub ingredient_id: IngredientId,
    #[serde(alias = "category_id")]
    pub ingredient_category_id: IngredientCategoryId,
}

#[derive(AsChangeset, Deserialize, Default, Debug, Clone)]
#[diesel(table_name = crate::database::schema::ingredient_category_mappings)]
pub struct IngredientCategoryMappingChanges {
    pub ingredient_id: Option<IngredientId>,
    #[serde(alias = "category_id")]
    pub ingredient_category_id: Option<IngredientCategoryId>,
}

impl IngredientCategoryMappingChanges {
    pub fn is_empty(&self) -> bool {
        self.ingredient_id.is_none() && self.ingredient_category_id.is_none()
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::dishes)]
pub struct Dish {
    pub id: DishId,
    pub name: String,
}

#[derive(Insertable, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::database::schema::dishes)]
pub struct NewDish {
    pub name: String,
}

#[derive(AsChangeset, Deserialize, Default, Debug, Clone)]
#[diesel(table_name = crate::database::schema::dishes)]
pub struct DishChanges {
    pub name: Option<String>,
}

impl DishChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::meals)]
pub struct Meal {
    pub id: MealId,
    pub timestamp_utc: i64,
    pub tz_offs_min: i32,
}

#[derive(Insertable, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::database::schema::meals)]
pub struct NewMeal {
    pub timestamp_utc: i64,
    pub tz_offs_min: i32,
}

#[derive(AsChangeset, Deserialize, Default, Debug, Clone)]
#[diesel(table_name = crate::database::schema::meals)]
pub struct MealChanges {
    pub timestamp_utc: Option<i64>,
    pub tz_offs_min: Option<i32>,
}

impl MealChanges {
    pub fn is_empty(&self) -> bool {
        self.timestamp_utc.is_none() && self.tz_offs_min.is_none()
    }
}

/// One instance of a dish eaten as part of a meal.
#[derive(
    Associations, Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq,
)]
#[diesel(belongs_to(Meal))]
#[diesel(belongs_to(Dish))]
#[diesel(table_name = crate::database::schema::meal_dishes)]
pub struct MealDish {
    pub id: MealDishId,
    pub meal_id: MealId,
    pub dish_id: DishId,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::database::schema::meal_dishes)]
pub struct NewMealDish {
    pub meal_id: MealId,
    pub dish_id: DishId,
}

#[derive(AsChangeset, Deserialize, Default, Debug, Clone)]
#[diesel(table_name = crate::database::schema::meal_dishes)]
pub struct MealDishChanges {
    pub dish_id: Option<DishId>,
}

impl MealDishChanges {
    pub fn is_empty(&self) -> bool {
        self.dish_id.is_none()
    }
}

#[derive(
    Debug, Display, EnumIter, Hash, Copy, Clone, PartialEq, Eq, DbEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[display("mass")]
    Mass,
    #[display("volume")]
    #[serde(alias = "ml")]
    Volume,
    #[display("pieces")]
    Pieces,
}

#[derive(
    Associations, Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq,
)]
#[diesel(belongs_to(MealDish))]
#[diesel(belongs_to(Ingredient))]
#[diesel(table_name = crate::database::schema::meal_dish_ingredients)]
pub struct MealDishIngredient {
    pub id: MealDishIngredientId,
    pub meal_dish_id: MealDishId,
    pub ingredient_id: IngredientId,
    pub quantity: Option<f64>,
    pub unit: Option<Unit>,
}

#[derive(Insertable, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::database::schema::meal_dish_ingredients)]
pub struct NewMealDishIngredient {
    pub meal_dish_id: MealDishId,
    pub ingredient_id: IngredientId,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<Unit>,
}

#[derive(AsChangeset, Deserialize, Default, Debug, Clone)]
#[diesel(table_name = crate::database::schema::meal_dish_ingredients)]
pub struct MealDishIngredientChanges {
    pub ingredient_id: Option<IngredientId>,
    #[serde(default, deserialize_with = "double_option")]
    pub quantity: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub unit: Option<Option<Unit>>,
}

impl MealDishIngredientChanges {
    pub fn is_empty(&self) -> bool {
        self.ingredient_id.is_none() && self.quantity.is_none() && self.unit.is_none()
    }
}

#[test]
fn partial_update_distinguishes_null_from_missing() {
    let changes: IngredientChanges =
        serde_json::from_str(r#"{"fully_entered": true, "serving_size_ml": null}"#).unwrap();
    assert_eq!(changes.fully_entered, Some(true));
    assert_eq!(changes.serving_size_ml, Some(None));
    assert_eq!(changes.serving_size_g, None);
    assert!(changes.name.is_none());
    assert!(!changes.is_empty());

    let changes: IngredientChanges = serde_json::from_str("{}").unwrap();
    assert!(changes.is_empty());
}

#[test]
fn unit_names() {
    let units: Vec<Unit> = serde_json::from_str(r#"["mass", "volume", "ml", "pieces"]"#).unwrap();
    assert_eq!(
        units,
        vec![Unit::Mass, Unit::Volume, Unit::Volume, Unit::Pieces]
    );
    assert!(serde_json::from_str::<Unit>(r#""cups""#).is_err());

    use strum::IntoEnumIterator as _;
    let names: Vec<_> = Unit::iter().map(|u| u.to_string()).collect();
    assert_eq!(names, ["mass", "volume", "pieces"]);
}

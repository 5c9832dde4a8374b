// Copyright 2023 Remi Bernotavicius

use super::check_name;
use super::ingredients::find_ingredient;
use crate::database;
use crate::database::models::{
    Ingredient, IngredientCategory, IngredientCategoryChanges, IngredientCategoryId,
    IngredientCategoryMapping, IngredientCategoryMappingChanges, IngredientCategoryMappingId,
    IngredientId, NewIngredientCategoryMapping,
};
use crate::database::schema::{ingredient_categories, ingredient_category_mappings, ingredients};
use crate::error::{Error, OrNotFound as _, Result};
use crate::nutrition::category_fully_entered;
use diesel::prelude::OptionalExtension as _;
use diesel::BelongingToDsl as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A category can be created from an ingredient, in which case it is named after it and the
/// ingredient is mapped to it right away.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CreateIngredientCategory {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ingredient_id: Option<IngredientId>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct IngredientCategoryView {
    #[serde(flatten)]
    pub category: IngredientCategory,
    pub fully_entered: bool,
    /// Only filled in when reading a single category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mappings: Option<Vec<IngredientCategoryMapping>>,
}

pub fn find_ingredient_category(
    conn: &mut database::Connection,
    category_id: IngredientCategoryId,
) -> Result<IngredientCategory> {
    ingredient_categories::table
        .find(category_id)
        .select(IngredientCategory::as_select())
        .first(conn)
        .optional()?
        .or_not_found("ingredient category", category_id)
}

fn mapped_ingredients(
    conn: &mut database::Connection,
    category_id: IngredientCategoryId,
) -> Result<Vec<Ingredient>> {
    Ok(ingredient_category_mappings::table
        .inner_join(ingredients::table)
        .filter(ingredient_category_mappings::ingredient_category_id.eq(category_id))
        .select(Ingredient::as_select())
        .load(conn)?)
}

pub fn add_ingredient_category(
    conn: &mut database::Connection,
    new_category: CreateIngredientCategory,
) -> Result<IngredientCategoryView> {
    let seed = new_category
        .ingredient_id
        .map(|seed_id| find_ingredient(conn, seed_id))
        .transpose()?;
    let name = match (new_category.name, &seed) {
        (Some(name), _) => name,
        (None, Some(seed)) => seed.name.clone(),
        (None, None) => {
            return Err(Error::validation(
                "an ingredient category needs a name or an ingredient to be named after",
            ))
        }
    };
    check_name("ingredient category", &name)?;

    let category = diesel::insert_into(ingredient_categories::table)
        .values(ingredient_categories::name.eq(&name))
        .returning(IngredientCategory::as_returning())
        .get_result(conn)?;
    log::info!("added ingredient category {} {:?}", category.id, category.name);

    if let Some(seed) = &seed {
        add_ingredient_category_mapping(
            conn,
            NewIngredientCategoryMapping {
                ingredient_id: seed.id,
                ingredient_category_id: category.id,
            },
        )?;
    }
    get_ingredient_category(conn, category.id)
}

pub fn list_ingredient_categories(
    conn: &mut database::Connection,
) -> Result<Vec<IngredientCategoryView>> {
    let categories = ingredient_categories::table
        .select(IngredientCategory::as_select())
        .order(ingredient_categories::id)
        .load(conn)?;

    let mut members: HashMap<IngredientCategoryId, Vec<Ingredient>> = HashMap::new();
    let mapped: Vec<(IngredientCategoryId, Ingredient)> = ingredient_category_mappings::table
        .inner_join(ingredients::table)
        .select((
            ingredient_category_mappings::ingredient_category_id,
            Ingredient::as_select(),
        ))
        .load(conn)?;
    for (category_id, ingredient) in mapped {
        members.entry(category_id).or_default().push(ingredient);
    }

    Ok(categories
        .into_iter()
        .map(|category| IngredientCategoryView {
            fully_entered: category_fully_entered(members.get(&category.id).into_iter().flatten()),
            category,
            mappings: None,
        })
        .collect())
}

pub fn get_ingredient_category(
    conn: &mut database::Connection,
    category_id: IngredientCategoryId,
) -> Result<IngredientCategoryView> {
    let category = find_ingredient_category(conn, category_id)?;
    let mappings = IngredientCategoryMapping::belonging_to(&category)
        .select(IngredientCategoryMapping::as_select())
        .order(ingredient_category_mappings::id)
        .load(conn)?;
    let fully_entered = category_fully_entered(&mapped_ingredients(conn, category_id)?);

    Ok(IngredientCategoryView {
        category,
        fully_entered,
        mappings: Some(mappings),
    })
}

pub fn update_ingredient_category(
    conn: &mut database::Connection,
    category_id: IngredientCategoryId,
    changes: IngredientCategoryChanges,
) -> Result<()> {
    find_ingredient_category(conn, category_id)?;
    if let Some(name) = &changes.name {
        check_name("ingredient category", name)?;
    }
    if changes.is_empty() {
        return Ok(());
    }

    diesel::update(ingredient_categories::table.find(category_id))
        .set(&changes)
        .execute(conn)?;
    log::info!("updated ingredient category {category_id}");
    Ok(())
}

pub fn find_ingredient_category_mapping(
    conn: &mut database::Connection,
    mapping_id: IngredientCategoryMappingId,
) -> Result<IngredientCategoryMapping> {
    ingredient_category_mappings::table
        .find(mapping_id)
        .select(IngredientCategoryMapping::as_select())
        .first(conn)
        .optional()?
        .or_not_found("ingredient category mapping", mapping_id)
}

/// Checks both ends of a mapping exist and that no other mapping links them already.
fn check_mapping(
    conn: &mut database::Connection,
    ingredient_id: IngredientId,
    category_id: IngredientCategoryId,
    ignore: Option<IngredientCategoryMappingId>,
) -> Result<()> {
    find_ingredient(conn, ingredient_id)?;
    find_ingredient_category(conn, category_id)?;

    let existing = ingredient_category_mappings::table
        .filter(ingredient_category_mappings::ingredient_id.eq(ingredient_id))
        .filter(ingredient_category_mappings::ingredient_category_id.eq(category_id))
        .select(ingredient_category_mappings::id)
        .first::<IngredientCategoryMappingId>(conn)
        .optional()?;
    match existing {
        Some(existing) if Some(existing) != ignore => Err(Error::validation(format!(
            "ingredient {ingredient_id} is already in ingredient category {category_id}"
        ))),
        _ => Ok(()),
    }
}

pub fn add_ingredient_category_mapping(
    conn: &mut database::Connection,
    new_mapping: NewIngredientCategoryMapping,
) -> Result<IngredientCategoryMapping> {
    check_mapping(
        conn,
        new_mapping.ingredient_id,
        new_mapping.ingredient_category_id,
        None,
    )?;

    let mapping = diesel::insert_into(ingredient_category_mappings::table)
        .values(&new_mapping)
        .returning(IngredientCategoryMapping::as_returning())
        .get_result(conn)?;
    log::info!(
        "added ingredient category mapping {} (ingredient {}, category {})",
        mapping.id,
        mapping.ingredient_id,
        mapping.ingredient_category_id
    );
    Ok(mapping)
}

pub fn list_ingredient_category_mappings(
    conn: &mut database::Connection,
) -> Result<Vec<IngredientCategoryMapping>> {
    Ok(ingredient_category_mappings::table
        .select(IngredientCategoryMapping::as_select())
        .order(ingredient_category_mappings::id)
        .load(conn)?)
}

pub fn update_ingredient_category_mapping(
    conn: &mut database::Connection,
    mapping_id: IngredientCategoryMappingId,
    changes: IngredientCategoryMappingChanges,
) -> Result<()> {
    let mapping = find_ingredient_category_mapping(conn, mapping_id)?;
    if changes.is_empty() {
        return Ok(());
    }
    check_mapping(
        conn,
        changes.ingredient_id.unwrap_or(mapping.ingredient_id),
        changes
            .ingredient_category_id
            .unwrap_or(mapping.ingredient_category_id),
        Some(mapping_id),
    )?;

    diesel::update(ingredient_category_mappings::table.find(mapping_id))
        .set(&changes)
        .execute(conn)?;
    log::info!("updated ingredient category mapping {mapping_id}");
    Ok(())
}

#[cfg(test)]
fn add_test_mapping(
    conn: &mut database::Connection,
    ingredient_id: IngredientId,
    ingredient_category_id: IngredientCategoryId,
) -> IngredientCategoryMapping {
    add_ingredient_category_mapping(
        conn,
        NewIngredientCategoryMapping {
            ingredient_id,
            ingredient_category_id,
        },
    )
    .unwrap()
}

#[test]
fn category_seeded_from_ingredient() {
    use super::ingredients::{add_test_ingredient, get_ingredient};

    let mut conn = database::in_memory();
    let bread = add_test_ingredient(&mut conn, "bread", 51.0, 0.0, 2.0);
    let bagel = add_test_ingredient(&mut conn, "bagel", 0.0, 0.0, 0.0);

    let bread_category = add_ingredient_category(
        &mut conn,
        CreateIngredientCategory {
            name: None,
            ingredient_id: Some(bread.id),
        },
    )
    .unwrap();
    assert_eq!(bread_category.category.name, "bread");
    add_test_mapping(&mut conn, bagel.id, bread_category.category.id);

    let category = get_ingredient_category(&mut conn, bread_category.category.id).unwrap();
    let members: Vec<_> = category
        .mappings
        .unwrap()
        .iter()
        .map(|m| m.ingredient_id)
        .collect();
    assert_eq!(members, [bread.id, bagel.id]);

    let bread_view = get_ingredient(&mut conn, bread.id).unwrap();
    assert_eq!(bread_view.category_mappings.len(), 1);
    assert_eq!(
        bread_view.category_mappings[0].ingredient_category_id,
        bread_category.category.id
    );

    let res = add_ingredient_category(&mut conn, CreateIngredientCategory::default());
    assert!(matches!(res, Err(Error::Validation(_))));
    let res = add_ingredient_category_mapping(
        &mut conn,
        NewIngredientCategoryMapping {
            ingredient_id: bagel.id,
            ingredient_category_id: bread_category.category.id,
        },
    );
    assert!(matches!(res, Err(Error::Validation(_))));
}

#[test]
fn category_completeness_follows_mappings() {
    use super::cascade::delete_ingredient_category_mapping;
    use super::ingredients::{add_test_ingredient, update_ingredient};
    use crate::database::models::IngredientChanges;

    let mut conn = database::in_memory();
    let category = add_ingredient_category(
        &mut conn,
        CreateIngredientCategory {
            name: Some("test category w/ typo".into()),
            ingredient_id: None,
        },
    )
    .unwrap();
    let category_id = category.category.id;
    assert!(category.fully_entered);
    assert_eq!(category.mappings, Some(vec![]));

    update_ingredient_category(
        &mut conn,
        category_id,
        IngredientCategoryChanges {
            name: Some("test category".into()),
        },
    )
    .unwrap();

    let bagel = add_test_ingredient(&mut conn, "bagel", 0.0, 0.0, 0.0);
    let mapping = add_test_mapping(&mut conn, bagel.id, category_id);
    assert!(!get_ingredient_category(&mut conn, category_id).unwrap().fully_entered);

    update_ingredient(
        &mut conn,
        bagel.id,
        IngredientChanges {
            fully_entered: Some(true),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(get_ingredient_category(&mut conn, category_id).unwrap().fully_entered);

    update_ingredient(
        &mut conn,
        bagel.id,
        IngredientChanges {
            fully_entered: Some(false),
            ..Default::default()
        },
    )
    .unwrap();
    let listed = list_ingredient_categories(&mut conn).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].category.name, "test category");
    assert!(!listed[0].fully_entered);
    assert_eq!(listed[0].mappings, None);

    delete_ingredient_category_mapping(&mut conn, mapping.id).unwrap();
    assert!(get_ingredient_category(&mut conn, category_id).unwrap().fully_entered);
    assert!(find_ingredient(&mut conn, bagel.id).is_ok());
}

#[test]
fn move_mapping() {
    let mut conn = database::in_memory();
    let egg = super::ingredients::add_test_ingredient(&mut conn, "egg", 50.0, 0.0, 1.0);
    let named = |conn: &mut database::Connection, name: &str| {
        add_ingredient_category(
            conn,
            CreateIngredientCategory {
                name: Some(name.into()),
                ingredient_id: None,
            },
        )
        .unwrap()
        .category
        .id
    };
    let breakfast = named(&mut conn, "breakfast");
    let protein = named(&mut conn, "protein");
    let in_breakfast = add_test_mapping(&mut conn, egg.id, breakfast);
    add_test_mapping(&mut conn, egg.id, protein);

    let res = update_ingredient_category_mapping(
        &mut conn,
        in_breakfast.id,
        IngredientCategoryMappingChanges {
            ingredient_id: None,
            ingredient_category_id: Some(protein),
        },
    );
    assert!(matches!(res, Err(Error::Validation(_))));

    let snacks = named(&mut conn, "snacks");
    update_ingredient_category_mapping(
        &mut conn,
        in_breakfast.id,
        IngredientCategoryMappingChanges {
            ingredient_id: None,
            ingredient_category_id: Some(snacks),
        },
    )
    .unwrap();
    let moved = find_ingredient_category_mapping(&mut conn, in_breakfast.id).unwrap();
    assert_eq!(moved.ingredient_category_id, snacks);
    assert_eq!(list_ingredient_category_mappings(&mut conn).unwrap().len(), 2);
}

// Copyright 2023 Remi Bernotavicius

use super::check_name;
use crate::database;
use crate::database::models::{Dish, DishChanges, DishId, NewDish};
use crate::error::{OrNotFound as _, Result};
use diesel::prelude::OptionalExtension as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

pub fn find_dish(conn: &mut database::Connection, dish_id: DishId) -> Result<Dish> {
    use database::schema::dishes::dsl::*;

    dishes
        .find(dish_id)
        .select(Dish::as_select())
        .first(conn)
        .optional()?
        .or_not_found("dish", dish_id)
}

pub fn add_dish(conn: &mut database::Connection, new_dish: NewDish) -> Result<Dish> {
    use database::schema::dishes::dsl::*;
    use diesel::insert_into;

    check_name("dish", &new_dish.name)?;
    let dish = insert_into(dishes)
        .values(&new_dish)
        .returning(Dish::as_returning())
        .get_result(conn)?;
    log::info!("added dish {} {:?}", dish.id, dish.name);
    Ok(dish)
}

pub fn list_dishes(conn: &mut database::Connection) -> Result<Vec<Dish>> {
    use database::schema::dishes::dsl::*;

    Ok(dishes.select(Dish::as_select()).order(id).load(conn)?)
}

pub fn update_dish(
    conn: &mut database::Connection,
    dish_id: DishId,
    changes: DishChanges,
) -> Result<()> {
    use database::schema::dishes::dsl::*;
    use diesel::update;

    find_dish(conn, dish_id)?;
    if let Some(new_name) = &changes.name {
        check_name("dish", new_name)?;
    }
    if changes.is_empty() {
        return Ok(());
    }

    update(dishes.find(dish_id)).set(&changes).execute(conn)?;
    log::info!("updated dish {dish_id}");
    Ok(())
}

#[test]
fn rename_dish() {
    let mut conn = database::in_memory();
    let egg_on_bread = add_dish(
        &mut conn,
        NewDish {
            name: "egg on bread".into(),
        },
    )
    .unwrap();
    let bread_and_cheese = add_dish(
        &mut conn,
        NewDish {
            name: "bread and cheese".into(),
        },
    )
    .unwrap();

    update_dish(
        &mut conn,
        bread_and_cheese.id,
        DishChanges {
            name: Some("breadd and cheese".into()),
        },
    )
    .unwrap();

    let names: Vec<_> = list_dishes(&mut conn)
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, ["egg on bread", "breadd and cheese"]);
    assert_eq!(find_dish(&mut conn, egg_on_bread.id).unwrap(), egg_on_bread);
}

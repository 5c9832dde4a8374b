// Copyright 2023 Remi Bernotavicius

use super::check_name;
use crate::database;
use crate::database::models::{NewProperty, Property, PropertyChanges, PropertyId};
use crate::error::{Error, OrNotFound as _, Result};
use diesel::prelude::OptionalExtension as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

pub fn find_property(conn: &mut database::Connection, property_id: PropertyId) -> Result<Property> {
    use database::schema::properties::dsl::*;

    properties
        .find(property_id)
        .select(Property::as_select())
        .first(conn)
        .optional()?
        .or_not_found("property", property_id)
}

/// Properties form a forest. Giving `child` the parent `new_parent` must not make `child` its
/// own ancestor.
fn check_parent(
    conn: &mut database::Connection,
    child: PropertyId,
    new_parent: PropertyId,
) -> Result<()> {
    let mut ancestor = Some(new_parent);
    while let Some(current) = ancestor {
        if current == child {
            return Err(Error::validation(format!(
                "property {new_parent} can't become the parent of property {child}, \
                 it would create a cycle"
            )));
        }
        ancestor = find_property(conn, current)?.parent_id;
    }
    Ok(())
}

pub fn add_property(conn: &mut database::Connection, new_property: NewProperty) -> Result<Property> {
    use database::schema::properties::dsl::*;
    use diesel::insert_into;

    check_name("property", &new_property.name)?;
    if let Some(parent) = new_property.parent_id {
        find_property(conn, parent)?;
    }

    let property = insert_into(properties)
        .values(&new_property)
        .returning(Property::as_returning())
        .get_result(conn)?;
    log::info!("added property {} {:?}", property.id, property.name);
    Ok(property)
}

pub fn list_properties(conn: &mut database::Connection) -> Result<Vec<Property>> {
    use database::schema::properties::dsl::*;

    Ok(properties
        .select(Property::as_select())
        .order(id)
        .load(conn)?)
}

pub fn update_property(
    conn: &mut database::Connection,
    property_id: PropertyId,
    changes: PropertyChanges,
) -> Result<()> {
    use database::schema::properties::dsl::*;
    use diesel::update;

    find_property(conn, property_id)?;
    if let Some(new_name) = &changes.name {
        check_name("property", new_name)?;
    }
    if let Some(Some(new_parent)) = changes.parent_id {
        check_parent(conn, property_id, new_parent)?;
    }
    if changes.is_empty() {
        return Ok(());
    }

    update(properties.find(property_id))
        .set(&changes)
        .execute(conn)?;
    log::info!("updated property {property_id}");
    Ok(())
}

#[cfg(test)]
pub fn add_test_property(
    conn: &mut database::Connection,
    name: &str,
    parent_id: Option<PropertyId>,
) -> Property {
    add_property(
        conn,
        NewProperty {
            name: name.into(),
            parent_id,
        },
    )
    .unwrap()
}

#[test]
fn property_forest() {
    let mut conn = database::in_memory();
    let fat = add_test_property(&mut conn, "fat", None);
    let saturated = add_test_property(&mut conn, "saturated fat", Some(fat.id));
    let trans = add_test_property(&mut conn, "trans fat", Some(saturated.id));

    let res = add_property(
        &mut conn,
        NewProperty {
            name: "orphan".into(),
            parent_id: Some(PropertyId::from(99)),
        },
    );
    assert!(matches!(res, Err(Error::NotFound { entity: "property", .. })));

    for (child, parent) in [(fat.id, trans.id), (fat.id, fat.id), (saturated.id, trans.id)] {
        let res = update_property(
            &mut conn,
            child,
            PropertyChanges {
                parent_id: Some(Some(parent)),
                ..Default::default()
            },
        );
        assert!(matches!(res, Err(Error::Validation(_))), "{child} -> {parent}");
    }

    update_property(
        &mut conn,
        trans.id,
        PropertyChanges {
            name: Some("trans fats".into()),
            parent_id: Some(Some(fat.id)),
        },
    )
    .unwrap();
    update_property(
        &mut conn,
        saturated.id,
        PropertyChanges {
            parent_id: Some(None),
            ..Default::default()
        },
    )
    .unwrap();

    let all = list_properties(&mut conn).unwrap();
    assert_eq!(
        all,
        vec![
            fat.clone(),
            Property {
                parent_id: None,
                ..saturated
            },
            Property {
                id: trans.id,
                name: "trans fats".into(),
                parent_id: Some(fat.id),
            },
        ]
    );
}

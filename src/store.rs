// Copyright 2023 Remi Bernotavicius

//! Create/read/update operations for every entity kind. Deletion and its cascades live in
//! [`cascade`]. Callers are expected to run each operation inside a single transaction.

use crate::error::{Error, Result};

pub mod cascade;
pub mod categories;
pub mod dishes;
pub mod ingredients;
pub mod meals;
pub mod properties;

fn check_name(entity: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation(format!("{entity} name must not be empty")));
    }
    Ok(())
}

/// Serving sizes, quantities and property values are amounts of something, so they can't be
/// negative.
fn check_amount(field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() => Err(Error::validation(format!("{field} must be a number"))),
        Some(v) if v < 0.0 => Err(Error::validation(format!(
            "{field} must not be negative"
        ))),
        _ => Ok(()),
    }
}

#[test]
fn amounts() {
    assert!(check_amount("quantity", None).is_ok());
    assert!(check_amount("quantity", Some(0.0)).is_ok());
    assert!(check_amount("quantity", Some(2.5)).is_ok());
    assert!(matches!(
        check_amount("quantity", Some(-1.0)),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        check_amount("quantity", Some(f64::NAN)),
        Err(Error::Validation(_))
    ));
    assert!(matches!(check_name("dish", "  "), Err(Error::Validation(_))));
}

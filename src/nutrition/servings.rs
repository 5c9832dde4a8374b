// Copyright 2023 Remi Bernotavicius

use crate::database::models::{Ingredient, Unit};

/// How much of an ingredient makes up one serving, per unit kind. `None` or zero means the
/// ingredient can't be measured in that unit yet.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ServingSizes {
    pub mass: Option<f64>,
    pub volume: Option<f64>,
    pub pieces: Option<f64>,
}

impl From<&Ingredient> for ServingSizes {
    fn from(i: &Ingredient) -> Self {
        Self {
            mass: i.serving_size_g,
            volume: i.serving_size_ml,
            pieces: i.serving_size_pieces,
        }
    }
}

impl ServingSizes {
    pub fn for_unit(&self, unit: Unit) -> Option<f64> {
        match unit {
            Unit::Mass => self.mass,
            Unit::Volume => self.volume,
            Unit::Pieces => self.pieces,
        }
    }
}

/// Number of servings eaten. Anything that can't be resolved (no quantity, no unit, or no
/// serving size for the unit) counts as zero servings instead of failing.
pub fn servings(sizes: &ServingSizes, quantity: Option<f64>, unit: Option<Unit>) -> f64 {
    let (Some(quantity), Some(unit)) = (quantity, unit) else {
        return 0.0;
    };
    match sizes.for_unit(unit) {
        Some(size) if size > 0.0 => quantity / size,
        _ => 0.0,
    }
}

#[test]
fn servings_per_unit() {
    let egg = ServingSizes {
        mass: Some(50.0),
        volume: None,
        pieces: Some(1.0),
    };
    assert_eq!(servings(&egg, Some(100.0), Some(Unit::Mass)), 2.0);
    assert_eq!(servings(&egg, Some(2.0), Some(Unit::Pieces)), 2.0);
    assert_eq!(servings(&egg, Some(25.0), Some(Unit::Mass)), 0.5);

    let bread = ServingSizes {
        mass: Some(51.0),
        volume: Some(0.0),
        pieces: Some(2.0),
    };
    assert_eq!(servings(&bread, Some(2.0), Some(Unit::Pieces)), 1.0);

    let milk = ServingSizes {
        mass: None,
        volume: Some(125.0),
        pieces: None,
    };
    assert_eq!(servings(&milk, Some(250.0), Some(Unit::Volume)), 2.0);
    assert_eq!(servings(&milk, Some(62.5), Some(Unit::Volume)), 0.5);
}

#[test]
fn unresolvable_servings_are_zero() {
    let sizes = ServingSizes {
        mass: Some(28.0),
        volume: Some(0.0),
        pieces: None,
    };
    assert_eq!(servings(&sizes, Some(10.0), Some(Unit::Volume)), 0.0);
    assert_eq!(servings(&sizes, Some(10.0), Some(Unit::Pieces)), 0.0);
    assert_eq!(servings(&sizes, None, Some(Unit::Mass)), 0.0);
    assert_eq!(servings(&sizes, Some(10.0), None), 0.0);

    use strum::IntoEnumIterator as _;
    for unit in Unit::iter() {
        assert_eq!(servings(&ServingSizes::default(), Some(1.0), Some(unit)), 0.0);
    }
}

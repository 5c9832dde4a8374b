// Copyright 2023 Remi Bernotavicius

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("{0}")]
    ReferentialConflict(String),
    #[error("storage failure: {0}")]
    Storage(#[from] diesel::result::Error),
    #[error("storage failure: database lock poisoned")]
    LockPoisoned,
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(entity: &'static str, id: impl Into<i32>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Turns a missing row from `.optional()` into a [`Error::NotFound`].
pub trait OrNotFound<T> {
    fn or_not_found(self, entity: &'static str, id: impl Into<i32>) -> Result<T>;
}

impl<T> OrNotFound<T> for Option<T> {
    fn or_not_found(self, entity: &'static str, id: impl Into<i32>) -> Result<T> {
        self.ok_or_else(|| Error::not_found(entity, id))
    }
}

#[test]
fn messages() {
    use crate::database::models::MealId;

    assert_eq!(
        Error::not_found("meal", MealId::from(3)).to_string(),
        "meal 3 not found"
    );
    assert_eq!(
        Error::validation("quantity must not be negative").to_string(),
        "invalid input: quantity must not be negative"
    );
    assert!(matches!(
        None::<()>.or_not_found("dish", 7),
        Err(Error::NotFound {
            entity: "dish",
            id: 7
        })
    ));
}

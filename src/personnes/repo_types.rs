use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Width of the `firstname` and `lastname` columns (`VARCHAR(50)`).
pub const NAME_MAX_LEN: usize = 50;

/// Person record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Person {
    pub id: i64,                     // generated by storage, never reassigned
    pub firstname: String,
    pub lastname: String,
    pub age: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Values handed to `PersonRepository::save`.
/// `id: None` inserts a new row, `Some(id)` overwrites that row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonDraft {
    pub id: Option<i64>,
    pub firstname: String,
    pub lastname: String,
    pub age: i32,
}

impl PersonDraft {
    pub fn new(firstname: impl Into<String>, lastname: impl Into<String>, age: i32) -> Self {
        Self {
            id: None,
            firstname: firstname.into(),
            lastname: lastname.into(),
            age,
        }
    }

    pub fn with_id(mut self, id: Option<i64>) -> Self {
        self.id = id;
        self
    }
}

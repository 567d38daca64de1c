use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::RepoError;
use crate::personnes::repo::{PersonRepository, RepoResult};
use crate::personnes::repo_types::{Person, PersonDraft, NAME_MAX_LEN};

/// Process-local repository, selected with `DATABASE_URL=memory://`.
///
/// Rejects names wider than the `VARCHAR(50)` columns the way Postgres does,
/// so writes that fail there fail here too.
#[derive(Default)]
pub struct MemoryPersonRepository {
    inner: RwLock<Table>,
}

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Person>,
}

impl MemoryPersonRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersonRepository for MemoryPersonRepository {
    async fn find(&self, id: i64) -> RepoResult<Option<Person>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn find_all(&self) -> RepoResult<Vec<Person>> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn find_in_age_interval(&self, age_min: i32, age_max: i32) -> RepoResult<Vec<Person>> {
        let table = self.inner.read().await;
        let mut rows: Vec<Person> = table
            .rows
            .values()
            .filter(|p| p.age >= age_min && p.age <= age_max)
            .cloned()
            .collect();
        rows.sort_by_key(|p| (p.age, p.id));
        Ok(rows)
    }

    async fn find_by_firstname(&self, firstname: &str) -> RepoResult<Vec<Person>> {
        let table = self.inner.read().await;
        let mut rows: Vec<Person> = table
            .rows
            .values()
            .filter(|p| p.firstname == firstname)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.age.cmp(&a.age).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn find_page(&self, limit: i64, offset: i64) -> RepoResult<Vec<Person>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let offset = usize::try_from(offset).unwrap_or(0);
        Ok(self
            .inner
            .read()
            .await
            .rows
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> RepoResult<i64> {
        Ok(self.inner.read().await.rows.len() as i64)
    }

    async fn save(&self, draft: PersonDraft) -> RepoResult<Person> {
        check_width("firstname", &draft.firstname)?;
        check_width("lastname", &draft.lastname)?;
        let now = OffsetDateTime::now_utc();
        let mut table = self.inner.write().await;
        match draft.id {
            None => {
                table.last_id += 1;
                let person = Person {
                    id: table.last_id,
                    firstname: draft.firstname,
                    lastname: draft.lastname,
                    age: draft.age,
                    created_at: now,
                    updated_at: now,
                };
                table.rows.insert(person.id, person.clone());
                Ok(person)
            }
            Some(id) => {
                let person = table.rows.get_mut(&id).ok_or(RepoError::NotFound(id))?;
                person.firstname = draft.firstname;
                person.lastname = draft.lastname;
                person.age = draft.age;
                person.updated_at = now;
                Ok(person.clone())
            }
        }
    }

    async fn remove(&self, id: i64) -> RepoResult<bool> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }
}

fn check_width(field: &'static str, value: &str) -> RepoResult<()> {
    if value.chars().count() > NAME_MAX_LEN {
        return Err(RepoError::TooLong {
            field,
            max: NAME_MAX_LEN,
        });
    }
    Ok(())
}

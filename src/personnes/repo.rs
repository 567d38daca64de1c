use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::RepoError;
use crate::personnes::repo_types::{Person, PersonDraft};

pub type RepoResult<T> = Result<T, RepoError>;

/// Read queries and writes over the `personne` table.
#[async_trait]
pub trait PersonRepository: Send + Sync {
    async fn find(&self, id: i64) -> RepoResult<Option<Person>>;
    async fn find_all(&self) -> RepoResult<Vec<Person>>;
    /// Inclusive on both bounds.
    async fn find_in_age_interval(&self, age_min: i32, age_max: i32) -> RepoResult<Vec<Person>>;
    /// Exact match, oldest first.
    async fn find_by_firstname(&self, firstname: &str) -> RepoResult<Vec<Person>>;
    async fn find_page(&self, limit: i64, offset: i64) -> RepoResult<Vec<Person>>;
    async fn count(&self) -> RepoResult<i64>;
    /// Inserts when `draft.id` is `None`, otherwise updates the row in place.
    async fn save(&self, draft: PersonDraft) -> RepoResult<Person>;
    /// Returns `false` when there was nothing to delete.
    async fn remove(&self, id: i64) -> RepoResult<bool>;
}

#[derive(Clone)]
pub struct PgPersonRepository {
    db: PgPool,
}

impl PgPersonRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PersonRepository for PgPersonRepository {
    async fn find(&self, id: i64) -> RepoResult<Option<Person>> {
        let person = sqlx::query_as::<_, Person>(
            r#"
            SELECT id, firstname, lastname, age, created_at, updated_at
            FROM personne
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(person)
    }

    async fn find_all(&self) -> RepoResult<Vec<Person>> {
        let rows = sqlx::query_as::<_, Person>(
            r#"
            SELECT id, firstname, lastname, age, created_at, updated_at
            FROM personne
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_in_age_interval(&self, age_min: i32, age_max: i32) -> RepoResult<Vec<Person>> {
        let rows = sqlx::query_as::<_, Person>(
            r#"
            SELECT id, firstname, lastname, age, created_at, updated_at
            FROM personne
            WHERE age >= $1 AND age <= $2
            ORDER BY age, id
            "#,
        )
        .bind(age_min)
        .bind(age_max)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_firstname(&self, firstname: &str) -> RepoResult<Vec<Person>> {
        let rows = sqlx::query_as::<_, Person>(
            r#"
            SELECT id, firstname, lastname, age, created_at, updated_at
            FROM personne
            WHERE firstname = $1
            ORDER BY age DESC, id
            "#,
        )
        .bind(firstname)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_page(&self, limit: i64, offset: i64) -> RepoResult<Vec<Person>> {
        let rows = sqlx::query_as::<_, Person>(
            r#"
            SELECT id, firstname, lastname, age, created_at, updated_at
            FROM personne
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn count(&self) -> RepoResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM personne"#)
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }

    async fn save(&self, draft: PersonDraft) -> RepoResult<Person> {
        match draft.id {
            None => {
                let person = sqlx::query_as::<_, Person>(
                    r#"
                    INSERT INTO personne (firstname, lastname, age)
                    VALUES ($1, $2, $3)
                    RETURNING id, firstname, lastname, age, created_at, updated_at
                    "#,
                )
                .bind(&draft.firstname)
                .bind(&draft.lastname)
                .bind(draft.age)
                .fetch_one(&self.db)
                .await?;
                Ok(person)
            }
            Some(id) => sqlx::query_as::<_, Person>(
                r#"
                UPDATE personne
                SET firstname = $2, lastname = $3, age = $4, updated_at = now()
                WHERE id = $1
                RETURNING id, firstname, lastname, age, created_at, updated_at
                "#,
            )
            .bind(id)
            .bind(&draft.firstname)
            .bind(&draft.lastname)
            .bind(draft.age)
            .fetch_optional(&self.db)
            .await?
            .ok_or(RepoError::NotFound(id)),
        }
    }

    async fn remove(&self, id: i64) -> RepoResult<bool> {
        let done = sqlx::query(r#"DELETE FROM personne WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

use tracing::info;

use crate::error::RepoError;
use crate::events::PersonEvent;
use crate::personnes::repo_types::{Person, PersonDraft};
use crate::state::AppState;

/// Pagination metadata handed to the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page: i64,
    pub per_page: i64,
    pub page_count: i64,
}

impl PageInfo {
    /// Clamps `page` and `per_page` to at least 1.
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let per_page = per_page.max(1);
        Self {
            page: page.max(1),
            per_page,
            page_count: page_count(total, per_page),
        }
    }

    /// Saturates instead of overflowing; a huge offset is just past the end.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// `ceil(total / per_page)`
pub fn page_count(total: i64, per_page: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    total / per_page + i64::from(total % per_page != 0)
}

pub async fn fetch_page(
    state: &AppState,
    page: i64,
    per_page: i64,
) -> Result<(Vec<Person>, PageInfo), RepoError> {
    let total = state.repo.count().await?;
    let info = PageInfo::new(page, per_page, total);
    let persons = state.repo.find_page(info.per_page, info.offset()).await?;
    Ok((persons, info))
}

pub struct Saved {
    pub person: Person,
    pub created: bool,
}

/// Upserts `draft` onto `existing` (or a new row when `None`).
/// Only a creation dispatches `PersonEvent::Added`.
pub async fn save_person(
    state: &AppState,
    existing: Option<&Person>,
    draft: PersonDraft,
) -> Result<Saved, RepoError> {
    let created = existing.is_none();
    let person = state
        .repo
        .save(draft.with_id(existing.map(|p| p.id)))
        .await?;

    if created {
        info!(person_id = person.id, "person created");
        state.events.dispatch(&PersonEvent::Added(person.clone()));
    } else {
        info!(person_id = person.id, "person updated");
    }
    Ok(Saved { person, created })
}

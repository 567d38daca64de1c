pub mod dto;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

/// Prefix under which `router()` is nested.
pub const BASE_PATH: &str = "/personne";

/// Where every write ends up: the first page of the paged list.
pub fn page_url() -> String {
    format!("{BASE_PATH}/page")
}

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}

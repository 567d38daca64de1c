use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Failures reported by a `PersonRepository` backend.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("person {0} does not exist")]
    NotFound(i64),
    #[error("{field} is longer than {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Anything a handler cannot deal with locally. Rendered as a bare 500 page.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(crate::views::error_page(
                "Une erreur interne est survenue, veuillez réessayer plus tard.",
            )),
        )
            .into_response()
    }
}

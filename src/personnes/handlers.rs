use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    error::AppError,
    flash::FlashBag,
    personnes::{
        dto::{FormErrors, PageParams, PersonForm},
        page_url,
        repo_types::{Person, PersonDraft},
        services::{fetch_page, save_person},
        BASE_PATH,
    },
    state::AppState,
    views,
};

const NOT_FOUND_MESSAGE: &str = "La personne n'existe pas";

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(list_all))
        .route("/age/:age_min/:age_max", get(list_by_age))
        .route("/firstname/:firstname", get(list_by_firstname))
        .route("/page", get(list_first_page))
        .route("/page/:page", get(list_paged))
        .route("/page/:page/:nb", get(list_paged))
        .route("/:id", get(detail))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/add", get(show_add_form).post(submit_add_form))
        .route("/edit", get(show_new_form).post(submit_new_form))
        .route("/edit/:id", get(show_edit_form).post(submit_edit_form))
        .route("/delete/:id", get(delete))
        .route("/update/:id/:firstname/:lastname/:age", get(direct_update))
}

// --- listing ---

#[instrument(skip(state, flash))]
pub async fn list_all(
    State(state): State<AppState>,
    mut flash: FlashBag,
) -> Result<Response, AppError> {
    let persons = state.repo.find_all().await?;
    let shown = flash.take();
    Ok((flash, Html(views::index_page(&shown, &persons, None))).into_response())
}

#[instrument(skip(state, flash))]
pub async fn list_by_age(
    State(state): State<AppState>,
    mut flash: FlashBag,
    Path((age_min, age_max)): Path<(i32, i32)>,
) -> Result<Response, AppError> {
    let persons = state.repo.find_in_age_interval(age_min, age_max).await?;
    let shown = flash.take();
    Ok((
        flash,
        Html(views::age_page(&shown, &persons, age_min, age_max)),
    )
        .into_response())
}

#[instrument(skip(state, flash))]
pub async fn list_by_firstname(
    State(state): State<AppState>,
    mut flash: FlashBag,
    Path(firstname): Path<String>,
) -> Result<Response, AppError> {
    let persons = state.repo.find_by_firstname(&firstname).await?;
    let shown = flash.take();
    Ok((flash, Html(views::index_page(&shown, &persons, None))).into_response())
}

#[instrument(skip(state, flash))]
pub async fn list_first_page(
    State(state): State<AppState>,
    flash: FlashBag,
) -> Result<Response, AppError> {
    render_page(state, flash, PageParams::default()).await
}

#[instrument(skip(state, flash))]
pub async fn list_paged(
    State(state): State<AppState>,
    flash: FlashBag,
    Path(params): Path<PageParams>,
) -> Result<Response, AppError> {
    render_page(state, flash, params).await
}

async fn render_page(
    state: AppState,
    mut flash: FlashBag,
    params: PageParams,
) -> Result<Response, AppError> {
    let per_page = params.nb.unwrap_or(state.config.page_size);
    let (persons, info) = fetch_page(&state, params.page, per_page).await?;
    let shown = flash.take();
    Ok((
        flash,
        Html(views::index_page(&shown, &persons, Some(&info))),
    )
        .into_response())
}

#[instrument(skip(state, flash))]
pub async fn detail(
    State(state): State<AppState>,
    mut flash: FlashBag,
    Path(id): Path<u64>,
) -> Result<Response, AppError> {
    let person = find_person(&state, id).await?;
    if person.is_none() {
        warn!(%id, "detail of unknown person");
        flash.error(NOT_FOUND_MESSAGE);
    }
    let shown = flash.take();
    Ok((flash, Html(views::detail_page(&shown, person.as_ref()))).into_response())
}

// --- create / edit ---

#[instrument(skip(flash))]
pub async fn show_add_form(mut flash: FlashBag) -> Response {
    let shown = flash.take();
    let page = views::form_page(
        &shown,
        "Ajouter une personne",
        &add_url(),
        &PersonForm::default(),
        &FormErrors::new(),
    );
    (flash, Html(page)).into_response()
}

#[instrument(skip(state, flash, form))]
pub async fn submit_add_form(
    State(state): State<AppState>,
    mut flash: FlashBag,
    Form(form): Form<PersonForm>,
) -> Result<Response, AppError> {
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(invalid_form(flash, "Ajouter une personne", &add_url(), &form, &errors));
        }
    };

    let saved = save_person(&state, None, draft).await?;
    flash.success(format!("{} ajoutée avec succès", saved.person.lastname));
    Ok((flash, Redirect::to(&page_url())).into_response())
}

#[instrument(skip(state, flash))]
pub async fn show_new_form(
    State(state): State<AppState>,
    flash: FlashBag,
) -> Result<Response, AppError> {
    render_edit_form(state, flash, None).await
}

#[instrument(skip(state, flash))]
pub async fn show_edit_form(
    State(state): State<AppState>,
    flash: FlashBag,
    Path(id): Path<u64>,
) -> Result<Response, AppError> {
    render_edit_form(state, flash, Some(id)).await
}

#[instrument(skip(state, flash, form))]
pub async fn submit_new_form(
    State(state): State<AppState>,
    flash: FlashBag,
    Form(form): Form<PersonForm>,
) -> Result<Response, AppError> {
    upsert(state, flash, None, form).await
}

#[instrument(skip(state, flash, form))]
pub async fn submit_edit_form(
    State(state): State<AppState>,
    flash: FlashBag,
    Path(id): Path<u64>,
    Form(form): Form<PersonForm>,
) -> Result<Response, AppError> {
    upsert(state, flash, Some(id), form).await
}

/// `id` of `None` or 0 never matches a row, so it always means "new".
async fn load_existing(state: &AppState, id: Option<u64>) -> Result<Option<Person>, AppError> {
    match id {
        Some(id) if id > 0 => find_person(state, id).await,
        _ => Ok(None),
    }
}

async fn render_edit_form(
    state: AppState,
    mut flash: FlashBag,
    id: Option<u64>,
) -> Result<Response, AppError> {
    let existing = load_existing(&state, id).await?;
    let form = existing.as_ref().map(PersonForm::from).unwrap_or_default();
    let shown = flash.take();
    let page = views::form_page(
        &shown,
        edit_title(existing.as_ref()),
        &edit_url(existing.as_ref()),
        &form,
        &FormErrors::new(),
    );
    Ok((flash, Html(page)).into_response())
}

async fn upsert(
    state: AppState,
    mut flash: FlashBag,
    id: Option<u64>,
    form: PersonForm,
) -> Result<Response, AppError> {
    let existing = load_existing(&state, id).await?;
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(invalid_form(
                flash,
                edit_title(existing.as_ref()),
                &edit_url(existing.as_ref()),
                &form,
                &errors,
            ));
        }
    };

    let saved = save_person(&state, existing.as_ref(), draft).await?;
    let message = if saved.created {
        " a été ajouté avec succès"
    } else {
        " a été mis à jour avec succès"
    };
    flash.success(format!("{}{}", saved.person.lastname, message));
    Ok((flash, Redirect::to(&page_url())).into_response())
}

/// Route ids are unsigned, so `/-3` is rejected by the extractor.
/// Ids past the storage range simply match nothing.
async fn find_person(state: &AppState, id: u64) -> Result<Option<Person>, AppError> {
    match i64::try_from(id) {
        Ok(id) => Ok(state.repo.find(id).await?),
        Err(_) => Ok(None),
    }
}

fn invalid_form(
    mut flash: FlashBag,
    title: &str,
    action: &str,
    form: &PersonForm,
    errors: &FormErrors,
) -> Response {
    info!(fields = ?errors.keys().collect::<Vec<_>>(), "form rejected");
    let shown = flash.take();
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        flash,
        Html(views::form_page(&shown, title, action, form, errors)),
    )
        .into_response()
}

fn add_url() -> String {
    format!("{BASE_PATH}/add")
}

fn edit_url(existing: Option<&Person>) -> String {
    match existing {
        Some(p) => format!("{BASE_PATH}/edit/{}", p.id),
        None => format!("{BASE_PATH}/edit"),
    }
}

fn edit_title(existing: Option<&Person>) -> &'static str {
    match existing {
        Some(_) => "Modifier une personne",
        None => "Ajouter une personne",
    }
}

// --- delete / direct update ---

#[instrument(skip(state, flash))]
pub async fn delete(
    State(state): State<AppState>,
    mut flash: FlashBag,
    Path(id): Path<u64>,
) -> Result<Response, AppError> {
    match find_person(&state, id).await? {
        Some(person) => {
            state.repo.remove(person.id).await?;
            info!(person_id = person.id, "person deleted");
            flash.success("Suppression réussie");
        }
        None => {
            warn!(%id, "delete of unknown person");
            flash.error(NOT_FOUND_MESSAGE);
        }
    }
    Ok((flash, Redirect::to(&page_url())).into_response())
}

#[instrument(skip(state, flash))]
pub async fn direct_update(
    State(state): State<AppState>,
    mut flash: FlashBag,
    Path((id, firstname, lastname, age)): Path<(u64, String, String, i32)>,
) -> Result<Response, AppError> {
    match find_person(&state, id).await? {
        Some(person) => {
            let draft = PersonDraft::new(firstname, lastname, age);
            save_person(&state, Some(&person), draft).await?;
            flash.success("Mise à jour réussie");
        }
        None => {
            warn!(%id, "update of unknown person");
            flash.error(NOT_FOUND_MESSAGE);
        }
    }
    Ok((flash, Redirect::to(&page_url())).into_response())
}

use crate::models::{CreateSeries, CreateSermon, UpdateSeries, UpdateSermon, User};
use crate::services::validation::{user_message, ValidationError};
use crate::services::{auth, series, sermons, uploads};
use crate::web::error::AppResult;
use crate::web::extractors::CurrentUser;
use crate::web::handlers::api::SermonQuery;
use crate::web::state::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::Context;

const UPLOADS_PER_PAGE: usize = 60;

fn make_admin_context(state: &AppState, user: &User) -> Context {
    let mut ctx = Context::new();
    ctx.insert("site", &state.config.site);
    ctx.insert("user", user);
    ctx.insert("version", env!("CARGO_PKG_VERSION"));
    ctx.insert("error", &Option::<String>::None);
    ctx
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Converts a failed save into a message for the form, or passes real failures through.
fn form_error(err: anyhow::Error) -> AppResult<String> {
    match user_message(&err) {
        Some(message) => Ok(message),
        None => Err(err.into()),
    }
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Html<String>> {
    let sermon_count = sermons::count_sermons(&state.db)?;
    let all_series = series::list_series(&state.db)?;
    let latest = sermons::latest_sermon(&state.db)?;
    let users = auth::list_users(&state.db)?;

    let mut ctx = make_admin_context(&state, &user);
    ctx.insert("sermon_count", &sermon_count);
    ctx.insert("series_count", &all_series.len());
    ctx.insert("latest_sermon", &latest);
    ctx.insert("users", &users);

    let html = state.templates.render("admin/dashboard.html", &ctx)?;
    Ok(Html(html))
}

// Sermons

pub async fn sermons_index(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SermonQuery>,
) -> AppResult<Response> {
    let config = &state.config.sermons;
    let (filters, cursor, limit) = match query.parse(config.max_page_size, config.max_page_size) {
        Ok(parsed) => parsed,
        Err(message) => return Ok((StatusCode::BAD_REQUEST, message).into_response()),
    };
    let page = sermons::list_sermons(&state.db, &filters, cursor.as_ref(), limit)?;

    let mut ctx = make_admin_context(&state, &user);
    ctx.insert("sermons", &page.sermons);
    ctx.insert("next_cursor", &page.next_cursor);
    ctx.insert("search", filters.search.as_deref().unwrap_or(""));

    let html = state.templates.render("admin/sermons.html", &ctx)?;
    Ok(Html(html).into_response())
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SermonForm {
    title: String,
    #[serde(default)]
    slug: String,
    date: String,
    video_url: String,
    #[serde(default)]
    series_id: String,
    #[serde(default)]
    book: String,
    #[serde(default)]
    pastor: String,
}

impl SermonForm {
    fn series_id(&self) -> Result<Option<i64>, ValidationError> {
        optional(&self.series_id)
            .map(|v| {
                v.parse()
                    .map_err(|_| ValidationError::new("Selected series does not exist."))
            })
            .transpose()
    }
}

fn render_sermon_form(
    state: &AppState,
    user: &User,
    form: &SermonForm,
    sermon_id: Option<i64>,
    error: Option<&str>,
) -> AppResult<Response> {
    let all_series = series::list_series(&state.db)?;

    let mut ctx = make_admin_context(state, user);
    ctx.insert("form", form);
    ctx.insert("sermon_id", &sermon_id);
    ctx.insert("all_series", &all_series);
    ctx.insert("error", &error);

    let html = state.templates.render("admin/sermon_form.html", &ctx)?;
    let status = if error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    Ok((status, Html(html)).into_response())
}

pub async fn new_sermon(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Response> {
    let form = SermonForm {
        date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        ..Default::default()
    };
    render_sermon_form(&state, &user, &form, None, None)
}

pub async fn create_sermon(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<SermonForm>,
) -> AppResult<Response> {
    let series_id = match form.series_id() {
        Ok(id) => id,
        Err(e) => return render_sermon_form(&state, &user, &form, None, Some(&e.0)),
    };
    let input = CreateSermon {
        title: form.title.clone(),
        slug: optional(&form.slug),
        date: form.date.clone(),
        video_url: form.video_url.clone(),
        series_id,
        book: optional(&form.book),
        pastor: optional(&form.pastor),
    };

    match sermons::create_sermon(&state.db, input) {
        Ok(id) => {
            tracing::info!(sermon_id = id, user_id = user.id, "Sermon created");
            Ok(Redirect::to("/admin/sermons").into_response())
        }
        Err(e) => {
            let message = form_error(e)?;
            render_sermon_form(&state, &user, &form, None, Some(&message))
        }
    }
}

pub async fn edit_sermon(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let Some(existing) = sermons::get_sermon(&state.db, id)? else {
        return Ok((StatusCode::NOT_FOUND, "Sermon not found").into_response());
    };
    let s = existing.sermon;
    let form = SermonForm {
        title: s.title,
        slug: s.slug,
        date: s.date,
        video_url: s.video_url,
        series_id: s.series_id.map(|v| v.to_string()).unwrap_or_default(),
        book: s.book.unwrap_or_default(),
        pastor: s.pastor.unwrap_or_default(),
    };
    render_sermon_form(&state, &user, &form, Some(id), None)
}

pub async fn update_sermon(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<SermonForm>,
) -> AppResult<Response> {
    if sermons::get_sermon(&state.db, id)?.is_none() {
        return Ok((StatusCode::NOT_FOUND, "Sermon not found").into_response());
    }

    let series_id = match form.series_id() {
        Ok(id) => id,
        Err(e) => return render_sermon_form(&state, &user, &form, Some(id), Some(&e.0)),
    };
    let input = UpdateSermon {
        title: Some(form.title.clone()),
        slug: optional(&form.slug),
        date: Some(form.date.clone()),
        video_url: Some(form.video_url.clone()),
        series_id: Some(series_id),
        book: Some(optional(&form.book)),
        pastor: Some(optional(&form.pastor)),
    };

    match sermons::update_sermon(&state.db, id, input) {
        Ok(()) => {
            tracing::info!(sermon_id = id, user_id = user.id, "Sermon updated");
            Ok(Redirect::to("/admin/sermons").into_response())
        }
        Err(e) => {
            let message = form_error(e)?;
            render_sermon_form(&state, &user, &form, Some(id), Some(&message))
        }
    }
}

pub async fn delete_sermon(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    sermons::delete_sermon(&state.db, id)?;
    tracing::info!(sermon_id = id, user_id = user.id, "Sermon deleted");
    Ok(Redirect::to("/admin/sermons").into_response())
}

// Series

pub async fn series_index(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Html<String>> {
    let all_series = series::list_series(&state.db)?;

    let mut ctx = make_admin_context(&state, &user);
    ctx.insert("series", &all_series);

    let html = state.templates.render("admin/series.html", &ctx)?;
    Ok(Html(html))
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SeriesForm {
    title: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    thumbnail_url: String,
    #[serde(default)]
    background_url: String,
}

fn render_series_form(
    state: &AppState,
    user: &User,
    form: &SeriesForm,
    series_id: Option<i64>,
    error: Option<&str>,
) -> AppResult<Response> {
    let images = uploads::list_uploads(&state.db, UPLOADS_PER_PAGE, 0)?;
    let image_urls: Vec<String> = images.iter().map(|u| u.url()).collect();

    let mut ctx = make_admin_context(state, user);
    ctx.insert("form", form);
    ctx.insert("series_id", &series_id);
    ctx.insert("image_urls", &image_urls);
    ctx.insert("error", &error);

    let html = state.templates.render("admin/series_form.html", &ctx)?;
    let status = if error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    Ok((status, Html(html)).into_response())
}

pub async fn new_series(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Response> {
    render_series_form(&state, &user, &SeriesForm::default(), None, None)
}

pub async fn create_series(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<SeriesForm>,
) -> AppResult<Response> {
    let input = CreateSeries {
        title: form.title.clone(),
        slug: optional(&form.slug),
        thumbnail_url: optional(&form.thumbnail_url),
        background_url: optional(&form.background_url),
    };

    match series::create_series(&state.db, input) {
        Ok(id) => {
            tracing::info!(series_id = id, user_id = user.id, "Series created");
            Ok(Redirect::to("/admin/series").into_response())
        }
        Err(e) => {
            let message = form_error(e)?;
            render_series_form(&state, &user, &form, None, Some(&message))
        }
    }
}

pub async fn edit_series(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let Some(existing) = series::get_series(&state.db, id)? else {
        return Ok((StatusCode::NOT_FOUND, "Series not found").into_response());
    };
    let form = SeriesForm {
        title: existing.title,
        slug: existing.slug,
        thumbnail_url: existing.thumbnail_url.unwrap_or_default(),
        background_url: existing.background_url.unwrap_or_default(),
    };
    render_series_form(&state, &user, &form, Some(id), None)
}

pub async fn update_series(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<SeriesForm>,
) -> AppResult<Response> {
    if series::get_series(&state.db, id)?.is_none() {
        return Ok((StatusCode::NOT_FOUND, "Series not found").into_response());
    }

    let input = UpdateSeries {
        title: Some(form.title.clone()),
        slug: optional(&form.slug),
        thumbnail_url: Some(optional(&form.thumbnail_url)),
        background_url: Some(optional(&form.background_url)),
    };

    match series::update_series(&state.db, id, input) {
        Ok(()) => {
            tracing::info!(series_id = id, user_id = user.id, "Series updated");
            Ok(Redirect::to("/admin/series").into_response())
        }
        Err(e) => {
            let message = form_error(e)?;
            render_series_form(&state, &user, &form, Some(id), Some(&message))
        }
    }
}

pub async fn delete_series(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    series::delete_series(&state.db, id)?;
    tracing::info!(series_id = id, user_id = user.id, "Series deleted");
    Ok(Redirect::to("/admin/series").into_response())
}

// Uploads

#[derive(Debug, Deserialize)]
pub struct UploadsQuery {
    #[serde(default)]
    page: usize,
}

fn render_uploads(
    state: &AppState,
    user: &User,
    page: usize,
    error: Option<&str>,
) -> AppResult<Response> {
    let items = uploads::list_uploads(&state.db, UPLOADS_PER_PAGE + 1, page * UPLOADS_PER_PAGE)?;
    let has_more = items.len() > UPLOADS_PER_PAGE;
    let items: Vec<_> = items.into_iter().take(UPLOADS_PER_PAGE).collect();

    let mut ctx = make_admin_context(state, user);
    ctx.insert("uploads", &items);
    ctx.insert("page", &page);
    ctx.insert("has_more", &has_more);
    ctx.insert("error", &error);

    let html = state.templates.render("admin/uploads.html", &ctx)?;
    let status = if error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    Ok((status, Html(html)).into_response())
}

pub async fn uploads_index(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<UploadsQuery>,
) -> AppResult<Response> {
    render_uploads(&state, &user, query.page, None)
}

pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Response> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await?;

        if let Err(e) = uploads::save_image(
            &state.db,
            &state.upload_dir,
            state.config.uploads.max_bytes,
            &name,
            &data,
            Some(user.id),
        ) {
            let message = form_error(e)?;
            return render_uploads(&state, &user, 0, Some(&message));
        }
    }

    Ok(Redirect::to("/admin/uploads").into_response())
}

pub async fn delete_upload(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    uploads::delete_upload(&state.db, &state.upload_dir, id)?;
    tracing::info!(upload_id = id, user_id = user.id, "Upload deleted");
    Ok(Redirect::to("/admin/uploads").into_response())
}

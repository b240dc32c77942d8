use crate::services::{sermons, series, uploads};
use crate::web::error::AppResult;
use crate::web::handlers::api::SermonQuery;
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use std::sync::Arc;
use tera::Context;

fn make_context(state: &AppState, page: &str) -> Context {
    let mut ctx = Context::new();
    ctx.insert("site", &state.config.site);
    ctx.insert("page", page);
    ctx
}

/// Form pages carry their render time so too-fast submissions can be spotted.
fn make_form_context(state: &AppState, page: &str, form: &str) -> Context {
    let mut ctx = make_context(state, page);
    ctx.insert("form_kind", form);
    ctx.insert("rendered_at", &chrono::Utc::now().timestamp_millis());
    ctx
}

fn render(state: &AppState, template: &str, ctx: &Context) -> AppResult<Response> {
    let html = state.templates.render(template, ctx)?;
    Ok(Html(html).into_response())
}

fn not_found_page(state: &AppState) -> AppResult<Response> {
    let ctx = make_context(state, "404");
    let html = state.templates.render("public/404.html", &ctx)?;
    Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
}

/// Turns a YouTube or Vimeo watch link into its embeddable player URL.
pub fn embed_url(video_url: &str) -> Option<String> {
    let url = url::Url::parse(video_url).ok()?;
    let host = url.host_str()?.trim_start_matches("www.");
    match host {
        "youtube.com" | "m.youtube.com" => {
            if let Some(id) = url.path().strip_prefix("/live/") {
                return Some(format!("https://www.youtube.com/embed/{}", id));
            }
            if url.path().starts_with("/embed/") {
                return Some(video_url.to_string());
            }
            url.query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| format!("https://www.youtube.com/embed/{}", v))
        }
        "youtu.be" => {
            let id = url.path().trim_start_matches('/');
            (!id.is_empty()).then(|| format!("https://www.youtube.com/embed/{}", id))
        }
        "vimeo.com" => {
            let id = url.path().trim_start_matches('/');
            (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
                .then(|| format!("https://player.vimeo.com/video/{}", id))
        }
        "player.vimeo.com" => Some(video_url.to_string()),
        _ => None,
    }
}

pub async fn home(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let latest_sermon = sermons::latest_sermon(&state.db)?;
    let latest_series = series::latest_series(&state.db)?;

    let mut ctx = make_context(&state, "home");
    ctx.insert("latest_sermon", &latest_sermon);
    ctx.insert(
        "latest_embed",
        &latest_sermon
            .as_ref()
            .and_then(|s| embed_url(&s.sermon.video_url)),
    );
    ctx.insert("latest_series", &latest_series);
    render(&state, "public/home.html", &ctx)
}

pub async fn about(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    render(&state, "public/about.html", &make_context(&state, "about"))
}

pub async fn visit(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let ctx = make_form_context(&state, "visit", "plan-a-visit");
    render(&state, "public/visit.html", &ctx)
}

pub async fn events(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    render(&state, "public/events.html", &make_context(&state, "events"))
}

pub async fn give(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    render(&state, "public/give.html", &make_context(&state, "give"))
}

pub async fn contact(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let ctx = make_form_context(&state, "contact", "contact");
    render(&state, "public/contact.html", &ctx)
}

pub async fn get_involved(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let ctx = make_form_context(&state, "get-involved", "get-involved");
    render(&state, "public/get_involved.html", &ctx)
}

/// First page of the sermon archive; further pages load from `/api/sermons`.
pub async fn watch(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SermonQuery>,
) -> AppResult<Response> {
    let config = &state.config.sermons;
    let (filters, cursor, limit) = match query.parse(config.page_size, config.max_page_size) {
        Ok(parsed) => parsed,
        Err(message) => return Ok((StatusCode::BAD_REQUEST, message).into_response()),
    };
    let page = sermons::list_sermons(&state.db, &filters, cursor.as_ref(), limit)?;
    let options = sermons::filter_options(&state.db)?;

    let mut ctx = make_context(&state, "watch");
    ctx.insert("sermons", &page.sermons);
    ctx.insert("next_cursor", &page.next_cursor);
    ctx.insert("options", &options);
    ctx.insert("search", filters.search.as_deref().unwrap_or(""));
    ctx.insert("series_id", &filters.series_id);
    ctx.insert("book", &filters.book);
    ctx.insert("pastor", &filters.pastor);
    ctx.insert("year", &filters.year);
    render(&state, "public/watch.html", &ctx)
}

pub async fn sermon(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    match sermons::get_sermon_by_slug(&state.db, &slug)? {
        Some(sermon) => {
            let mut ctx = make_context(&state, "watch");
            ctx.insert("embed_url", &embed_url(&sermon.sermon.video_url));
            ctx.insert("sermon", &sermon);
            render(&state, "public/sermon.html", &ctx)
        }
        None => not_found_page(&state),
    }
}

pub async fn series_page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    match series::get_series_by_slug(&state.db, &slug)? {
        Some(s) => {
            let sermons = sermons::list_sermons_in_series(&state.db, s.id)?;
            let mut ctx = make_context(&state, "watch");
            ctx.insert("series", &s);
            ctx.insert("sermons", &sermons);
            render(&state, "public/series.html", &ctx)
        }
        None => not_found_page(&state),
    }
}

pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Ok(StatusCode::BAD_REQUEST.into_response());
    }

    let Some(upload) = uploads::get_upload_by_filename(&state.db, &filename)? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let path = state.upload_dir.join(&upload.filename);
    let content = match tokio::fs::read(&path).await {
        Ok(c) => c,
        Err(_) => return Ok(StatusCode::NOT_FOUND.into_response()),
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
        ],
        content,
    )
        .into_response())
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn fallback(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    not_found_page(&state)
}

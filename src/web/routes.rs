use super::handlers;
use super::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Slack on top of the image size limit for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::public::home))
        .route("/about", get(handlers::public::about))
        .route("/visit", get(handlers::public::visit))
        .route("/events", get(handlers::public::events))
        .route("/watch", get(handlers::public::watch))
        .route("/watch/:slug", get(handlers::public::sermon))
        .route("/series/:slug", get(handlers::public::series_page))
        .route("/give", get(handlers::public::give))
        .route("/contact", get(handlers::public::contact))
        .route("/get-involved", get(handlers::public::get_involved))
        .route("/media/:filename", get(handlers::public::serve_media))
        .route("/health", get(handlers::public::health))
}

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sermons", get(handlers::api::list_sermons))
        .route("/api/forms/:kind", post(handlers::api::submit_form))
}

pub fn admin_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/login", get(handlers::auth::login_form))
        .route("/admin/login", post(handlers::auth::login))
        .route("/admin/logout", post(handlers::auth::logout))
        .route("/admin", get(handlers::admin::dashboard))
        .route("/admin/sermons", get(handlers::admin::sermons_index))
        .route("/admin/sermons", post(handlers::admin::create_sermon))
        .route("/admin/sermons/new", get(handlers::admin::new_sermon))
        .route("/admin/sermons/:id/edit", get(handlers::admin::edit_sermon))
        .route("/admin/sermons/:id", post(handlers::admin::update_sermon))
        .route(
            "/admin/sermons/:id/delete",
            post(handlers::admin::delete_sermon),
        )
        .route("/admin/series", get(handlers::admin::series_index))
        .route("/admin/series", post(handlers::admin::create_series))
        .route("/admin/series/new", get(handlers::admin::new_series))
        .route("/admin/series/:id/edit", get(handlers::admin::edit_series))
        .route("/admin/series/:id", post(handlers::admin::update_series))
        .route(
            "/admin/series/:id/delete",
            post(handlers::admin::delete_series),
        )
        .route("/admin/uploads", get(handlers::admin::uploads_index))
        .route(
            "/admin/uploads",
            post(handlers::admin::upload_image)
                .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD)),
        )
        .route(
            "/admin/uploads/:id/delete",
            post(handlers::admin::delete_upload),
        )
}

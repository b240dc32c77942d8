use crate::models::{FormKind, FormResponse, FormSubmission, SermonCursor, SermonFilters};
use crate::services::sermons;
use crate::services::validation::parse_date;
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::Form;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SermonQuery {
    pub search: Option<String>,
    pub series_id: Option<String>,
    pub book: Option<String>,
    pub pastor: Option<String>,
    pub year: Option<String>,
    pub cursor_date: Option<String>,
    pub cursor_id: Option<String>,
    pub limit: Option<String>,
}

fn bad_request(message: &str) -> Response {
    let body = serde_json::json!({
        "error": "Bad Request",
        "message": message,
    });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(value: &Option<String>, name: &str) -> Result<Option<T>, String> {
    match non_empty(value) {
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| format!("{} must be a number", name)),
        None => Ok(None),
    }
}

impl SermonQuery {
    /// Splits the query string into filters, an optional cursor and a page size.
    pub fn parse(
        &self,
        default_limit: usize,
        max_limit: usize,
    ) -> Result<(SermonFilters, Option<SermonCursor>, usize), String> {
        let filters = SermonFilters {
            search: non_empty(&self.search).map(String::from),
            series_id: parse_number(&self.series_id, "seriesId")?,
            book: non_empty(&self.book).map(String::from),
            pastor: non_empty(&self.pastor).map(String::from),
            year: parse_number(&self.year, "year")?,
        };

        let cursor = match (non_empty(&self.cursor_date), parse_number::<i64>(&self.cursor_id, "cursorId")?) {
            (Some(date), Some(id)) => {
                let date = parse_date(date).map_err(|e| format!("cursorDate: {}", e))?;
                Some(SermonCursor {
                    date: date.format("%Y-%m-%d").to_string(),
                    id,
                })
            }
            (None, None) => None,
            _ => return Err("cursorDate and cursorId must be provided together".to_string()),
        };

        let limit = parse_number::<usize>(&self.limit, "limit")?
            .unwrap_or(default_limit)
            .clamp(1, max_limit);

        Ok((filters, cursor, limit))
    }
}

/// GET /api/sermons
pub async fn list_sermons(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SermonQuery>,
) -> Response {
    let config = &state.config.sermons;
    let (filters, cursor, limit) = match query.parse(config.page_size, config.max_page_size) {
        Ok(parsed) => parsed,
        Err(message) => return bad_request(&message),
    };

    match sermons::list_sermons(&state.db, &filters, cursor.as_ref(), limit) {
        Ok(page) => Json(page).into_response(),
        Err(e) => {
            tracing::error!("API list_sermons error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Internal server error"})),
            )
                .into_response()
        }
    }
}

/// POST /api/forms/:kind
pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Form(submission): Form<FormSubmission>,
) -> Response {
    let Ok(kind) = kind.parse::<FormKind>() else {
        let body = serde_json::json!({"error": "Not Found", "message": "Unknown form"});
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    };

    let response: FormResponse = state.forms.submit(kind, submission).await;
    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(response)).into_response()
}

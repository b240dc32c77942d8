use crate::models::User;
use crate::services::auth;
use crate::web::error::AppResult;
use crate::web::extractors::SESSION_COOKIE;
use crate::web::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use tera::Context;
use time::Duration;

fn login_page(state: &AppState, error: Option<&str>, email: &str) -> AppResult<Html<String>> {
    let mut ctx = Context::new();
    ctx.insert("site", &state.config.site);
    ctx.insert("user", &Option::<User>::None);
    ctx.insert("error", &error);
    ctx.insert("email", email);
    Ok(Html(state.templates.render("admin/login.html", &ctx)?))
}

pub async fn login_form(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    Ok(login_page(&state, None, "")?.into_response())
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let key = form.email.trim().to_lowercase();
    if !state.login_limiter.check(&key) {
        tracing::warn!(email = %key, "Login locked out after repeated failures");
        let html = login_page(&state, Some("Too many attempts. Try again later."), &form.email)?;
        return Ok((StatusCode::TOO_MANY_REQUESTS, html).into_response());
    }

    match auth::authenticate(&state.db, &form.email, &form.password)? {
        Some(user) => {
            state.login_limiter.clear(&key);
            let days = state.config.auth.session_days()?;
            let token = auth::create_session(&state.db, user.id, days)?;
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(Duration::days(days))
                .build();
            tracing::info!(user_id = user.id, "Admin signed in");

            Ok((jar.add(cookie), Redirect::to("/admin")).into_response())
        }
        None => {
            state.login_limiter.record_attempt(&key);
            let html = login_page(&state, Some("Invalid email or password"), &form.email)?;
            Ok((StatusCode::UNAUTHORIZED, html).into_response())
        }
    }
}

pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = auth::delete_session(&state.db, cookie.value()) {
            tracing::warn!("Failed to delete session: {}", e);
        }
    }

    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build();

    Ok((jar.remove(cookie), Redirect::to("/admin/login")).into_response())
}

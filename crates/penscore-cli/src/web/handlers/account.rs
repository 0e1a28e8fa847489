use axum::extract::{Form, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;
use tracing::info;

use penscore_core::auth;

use crate::web::error::AppResult;
use crate::web::pages;
use crate::web::session::{redirect_with_cookie, MaybeUser, SessionId};
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn home(MaybeUser(user): MaybeUser) -> Html<String> {
    pages::home(user.as_ref())
}

pub async fn register_page() -> Html<String> {
    pages::register_form()
}

pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Redirect> {
    auth::register(&state.db, &form.name, &form.email, &form.password).await?;
    Ok(Redirect::to("/login"))
}

pub async fn login_page() -> Html<String> {
    pages::login_form()
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let user = auth::login(&state.db, &form.email, &form.password).await?;
    info!("User {} logged in", user.id);

    let cookie = state.login(&user);
    Ok(redirect_with_cookie("/", &cookie))
}

pub async fn logout(State(state): State<AppState>, SessionId(id): SessionId) -> impl IntoResponse {
    let cookie = state.logout(id);
    redirect_with_cookie("/", &cookie)
}

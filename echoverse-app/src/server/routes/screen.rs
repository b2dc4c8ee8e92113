use crate::{
    render::render_screen,
    server::{Result, ServerError, ServerRouter, json::Json, session::Session},
    state::ViewState,
};
use axum::{Router, response::Html};
use axum_extra::{
    extract::CookieJar,
    routing::{RouterExt, TypedPath},
};
use serde::Deserialize;

pub fn routes() -> ServerRouter {
    Router::new().typed_get(show_screen).typed_get(show_state)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/", rejection(ServerError))]
struct ScreenPath();

async fn show_screen(
    ScreenPath(): ScreenPath,
    Session { jar, controller }: Session,
) -> Result<(CookieJar, Html<String>)> {
    let html = render_screen(&controller.snapshot())?;

    Ok((jar, Html(html)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/state", rejection(ServerError))]
struct StatePath();

async fn show_state(
    StatePath(): StatePath,
    Session { jar, controller }: Session,
) -> (CookieJar, Json<ViewState>) {
    (jar, Json(controller.snapshot()))
}

use crate::server::{Result, ServerError, ServerRouter, session::Session};
use axum::{Router, response::Redirect};
use axum_extra::{
    extract::CookieJar,
    routing::{RouterExt, TypedPath},
};
use serde::Deserialize;

pub fn routes() -> ServerRouter {
    Router::new().typed_post(open_panel).typed_post(close_panel)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/panel/open", rejection(ServerError))]
struct OpenPanelPath();

async fn open_panel(
    OpenPanelPath(): OpenPanelPath,
    Session { jar, controller }: Session,
) -> Result<(CookieJar, Redirect)> {
    controller.open_panel()?;

    Ok((jar, Redirect::to("/")))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/panel/close", rejection(ServerError))]
struct ClosePanelPath();

async fn close_panel(
    ClosePanelPath(): ClosePanelPath,
    Session { jar, controller }: Session,
) -> Result<(CookieJar, Redirect)> {
    controller.close_panel()?;

    Ok((jar, Redirect::to("/")))
}

use crate::server::{Result, ServerError, ServerRouter, session::Session};
use axum::{Router, response::Redirect};
use axum_extra::{
    extract::CookieJar,
    routing::{RouterExt, TypedPath},
};
use serde::Deserialize;

pub fn routes() -> ServerRouter {
    Router::new().typed_post(dismiss_notification)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/notifications/{id}/dismiss", rejection(ServerError))]
struct DismissNotificationPath {
    id: u64,
}

async fn dismiss_notification(
    DismissNotificationPath { id }: DismissNotificationPath,
    Session { jar, controller }: Session,
) -> Result<(CookieJar, Redirect)> {
    controller.dismiss_notification(id)?;

    Ok((jar, Redirect::to("/")))
}

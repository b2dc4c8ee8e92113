use crate::server::ServerRouter;
use axum::Router;

mod notifications;
mod panel;
mod posts;
mod screen;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(screen::routes())
        .merge(panel::routes())
        .merge(posts::routes())
        .merge(notifications::routes())
}

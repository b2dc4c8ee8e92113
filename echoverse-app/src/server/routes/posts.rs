use crate::{
    controller::ControllerHandle,
    server::{Result, ServerError, ServerRouter, form::Form, session::Session},
    state::SubmitOutcome,
};
use axum::{Router, response::Redirect};
use axum_extra::{
    extract::CookieJar,
    routing::{RouterExt, TypedPath},
};
use echoverse_common::model::draft::{Draft, DraftField};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

/// Longest a publishing visitor waits for the refreshed list before being sent back to it.
const REFRESH_WAIT: Duration = Duration::from_secs(5);

pub fn routes() -> ServerRouter {
    Router::new().typed_post(submit_post).typed_post(save_draft)
}

/// Fields left out of the form count as empty.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(default)]
struct DraftForm {
    title: String,
    content: String,
    author: String,
}

impl From<DraftForm> for Draft {
    fn from(form: DraftForm) -> Self {
        Self {
            title: form.title,
            content: form.content,
            author: form.author,
        }
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct SubmitPostPath();

async fn submit_post(
    SubmitPostPath(): SubmitPostPath,
    Session { jar, controller }: Session,
    Form(form): Form<DraftForm>,
) -> Result<(CookieJar, Redirect)> {
    match controller.submit(form.into()).await? {
        SubmitOutcome::Published => {
            info!("Post published");
            wait_for_refresh(&controller).await?;
        }
        SubmitOutcome::Rejected(err) => info!(missing = ?err.missing(), "Draft rejected"),
        SubmitOutcome::Failed(reason) => info!(%reason, "Publishing failed"),
        SubmitOutcome::Busy => info!("Submission ignored, another one is in flight"),
    }

    Ok((jar, Redirect::to("/")))
}

/// Lets the redirect land on a list that already contains the new post.
async fn wait_for_refresh(controller: &ControllerHandle) -> Result<()> {
    match tokio::time::timeout(REFRESH_WAIT, controller.refreshed()).await {
        Ok(refreshed) => {
            refreshed?;
        }
        Err(_) => warn!("Refreshed posts not ready in time, the screen will reload"),
    }

    Ok(())
}

/// Only the fields present in the form are changed.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct DraftEditForm {
    title: Option<String>,
    content: Option<String>,
    author: Option<String>,
}

impl DraftEditForm {
    fn into_edits(self) -> impl Iterator<Item = (DraftField, String)> {
        [
            (DraftField::Title, self.title),
            (DraftField::Content, self.content),
            (DraftField::Author, self.author),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|value| (field, value)))
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/draft", rejection(ServerError))]
struct SaveDraftPath();

async fn save_draft(
    SaveDraftPath(): SaveDraftPath,
    Session { jar, controller }: Session,
    Form(form): Form<DraftEditForm>,
) -> Result<(CookieJar, Redirect)> {
    for (field, value) in form.into_edits() {
        controller.edit_draft(field, value)?;
    }

    Ok((jar, Redirect::to("/")))
}

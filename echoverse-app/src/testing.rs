use crate::{controller::ControllerHandle, state::ViewState};
use echoverse_client::{
    client::{ClientError, Result},
    service::PostService,
};
use echoverse_common::model::post::{CreatePost, Post};
use std::{
    sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    time::Duration,
};
use tokio::sync::Mutex;

/// In-memory backing service that assigns ids and timestamps like the real one.
#[derive(Default)]
pub struct FakeService {
    pub posts: Mutex<Vec<Post>>,
    pub created: Mutex<Vec<CreatePost>>,
    pub fetches: AtomicUsize,
    pub fail_create: AtomicBool,
    /// Delay before every fetch answers, in milliseconds.
    pub fetch_delay_ms: AtomicU64,
}

impl PostService for FakeService {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = self.fetch_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(self.posts.lock().await.clone())
    }

    async fn create_post(&self, post: &CreatePost) -> Result<()> {
        self.created.lock().await.push(post.clone());
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }

        let mut posts = self.posts.lock().await;
        let id = format!("id-{}", posts.len());
        posts.push(Post {
            id: id.into(),
            title: post.title.clone(),
            content: post.content.clone(),
            author: post.author.clone(),
            created_at: "2024-03-05T10:00:00.000Z".into(),
            updated_at: "2024-03-05T10:00:00.000Z".into(),
        });
        Ok(())
    }
}

/// Waits until the published state satisfies `done`.
pub async fn wait_for(handle: &ControllerHandle, done: impl Fn(&ViewState) -> bool) -> ViewState {
    let mut state = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async move {
        state.wait_for(|state| done(state)).await.unwrap().clone()
    })
    .await
    .expect("state did not settle in time")
}

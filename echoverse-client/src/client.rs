use crate::service::PostService;
use echoverse_common::model::post::{CreatePost, Post};
use reqwest::{Response, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid backend url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Request to the backing service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Backing service replied with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Response of the backing service could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Talks to the backing service over HTTP.
#[derive(Clone, Debug)]
pub struct HttpPostService {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpPostService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self> {
        // A trailing slash keeps `join` from replacing the last path segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|err| ClientError::InvalidUrl {
            url: base_url.to_owned(),
            reason: err.to_string(),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: normalized,
                reason: "not usable as a base url".to_owned(),
            });
        }

        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                reason: err.to_string(),
            })
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

impl PostService for HttpPostService {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let url = self.endpoint("posts")?;
        let response = check_status(self.http.get(url).send().await?).await?;
        let body = response.bytes().await?;
        let posts: Vec<Post> = serde_json::from_slice(&body)?;

        debug!(count = posts.len(), "Fetched posts");
        Ok(posts)
    }

    async fn create_post(&self, post: &CreatePost) -> Result<()> {
        let url = self.endpoint("create")?;
        let response = check_status(self.http.post(url).json(post).send().await?).await?;
        let body = response.text().await?;

        debug!(%body, "Post created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        client::{ClientError, HttpPostService},
        service::PostService,
    };
    use axum::{
        Json, Router,
        extract::State,
        http::StatusCode,
        routing::{get, post},
    };
    use echoverse_common::model::post::CreatePost;
    use serde_json::{Value, json};
    use std::{sync::Arc, time::Duration};
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct Backend {
        posts: Arc<Mutex<Vec<Value>>>,
        created: Arc<Mutex<Vec<Value>>>,
    }

    async fn list(State(backend): State<Backend>) -> Json<Vec<Value>> {
        Json(backend.posts.lock().await.clone())
    }

    async fn create(
        State(backend): State<Backend>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        backend.created.lock().await.push(body.clone());

        let mut posts = backend.posts.lock().await;
        let mut stored = body;
        stored["_id"] = json!(format!("id-{}", posts.len()));
        stored["createdAt"] = json!("2024-03-05T10:00:00.000Z");
        stored["updatedAt"] = json!("2024-03-05T10:00:00.000Z");
        posts.push(stored.clone());

        (StatusCode::CREATED, Json(stored))
    }

    async fn start_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        format!("http://{addr}")
    }

    async fn start_store() -> (Backend, HttpPostService) {
        let backend = Backend::default();
        let router = Router::new()
            .route("/posts", get(list))
            .route("/create", post(create))
            .with_state(backend.clone());

        let base_url = start_backend(router).await;
        let service = HttpPostService::new(&base_url, Duration::from_secs(5)).unwrap();
        (backend, service)
    }

    fn create_post(title: &str) -> CreatePost {
        CreatePost {
            title: title.into(),
            content: "Line one\nLine two".into(),
            author: "Ada".into(),
        }
    }

    #[tokio::test]
    async fn empty_collection() {
        let (_, service) = start_store().await;
        assert!(service.fetch_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_sends_exactly_the_draft_fields() {
        let (backend, service) = start_store().await;

        service.create_post(&create_post("Hello")).await.unwrap();

        let created = backend.created.lock().await;
        assert_eq!(
            *created,
            [json!({ "title": "Hello", "content": "Line one\nLine two", "author": "Ada" })]
        );
    }

    #[tokio::test]
    async fn created_post_is_listed() {
        let (_, service) = start_store().await;

        service.create_post(&create_post("First")).await.unwrap();
        service.create_post(&create_post("Second")).await.unwrap();

        let posts = service.fetch_posts().await.unwrap();
        let titles: Vec<_> = posts.iter().map(|post| post.title.as_str()).collect();
        assert_eq!(titles, ["First", "Second"]);
        assert_eq!(posts[0].id.get(), "id-0");
        assert_eq!(posts[0].content, "Line one\nLine two");
        assert_eq!(posts[0].author, "Ada");
    }

    #[tokio::test]
    async fn base_url_with_path_prefix() {
        let backend = Backend::default();
        let router = Router::new().nest(
            "/api",
            Router::new()
                .route("/posts", get(list))
                .with_state(backend),
        );
        let base_url = start_backend(router).await;

        let service = HttpPostService::new(&format!("{base_url}/api/"), Duration::from_secs(5))
            .unwrap();
        assert!(service.fetch_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let router = Router::new()
            .route(
                "/posts",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "db down") }),
            )
            .route(
                "/create",
                post(|| async { (StatusCode::BAD_REQUEST, "missing title") }),
            );
        let base_url = start_backend(router).await;
        let service = HttpPostService::new(&base_url, Duration::from_secs(5)).unwrap();

        match service.fetch_posts().await.unwrap_err() {
            ClientError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "db down");
            }
            err => panic!("unexpected error: {err}"),
        }

        match service.create_post(&create_post("x")).await.unwrap_err() {
            ClientError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "missing title");
            }
            err => panic!("unexpected error: {err}"),
        }
    }

    #[tokio::test]
    async fn malformed_collection_is_a_decode_error() {
        let router = Router::new().route("/posts", get(|| async { "{\"posts\": []}" }));
        let base_url = start_backend(router).await;
        let service = HttpPostService::new(&base_url, Duration::from_secs(5)).unwrap();

        assert!(matches!(
            service.fetch_posts().await.unwrap_err(),
            ClientError::Decode(_)
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service =
            HttpPostService::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            service.fetch_posts().await.unwrap_err(),
            ClientError::Transport(_)
        ));
    }

    #[test]
    fn invalid_base_url() {
        assert!(matches!(
            HttpPostService::new("not a url", Duration::from_secs(1)).unwrap_err(),
            ClientError::InvalidUrl { .. }
        ));
    }
}

use crate::client::Result;
use echoverse_common::model::post::{CreatePost, Post};

/// The backing service that stores posts.
///
/// Implemented over HTTP by [`crate::client::HttpPostService`]; tests substitute their own.
pub trait PostService: Send + Sync + 'static {
    /// Reads the whole post collection in the order the service returns it.
    fn fetch_posts(&self) -> impl Future<Output = Result<Vec<Post>>> + Send;

    /// Stores a new post. Resolves once the service has acknowledged it.
    fn create_post(&self, post: &CreatePost) -> impl Future<Output = Result<()>> + Send;
}

use crate::state::{Notification, ViewState};
use askama::Template;
use echoverse_common::{
    model::{draft::Draft, post::Post},
    util::format_long_date,
};
use tracing::debug;

/// `1 post`, `0 posts`, `7 posts`
#[must_use]
pub fn count_label(count: usize) -> String {
    let noun = if count == 1 { "post" } else { "posts" };
    format!("{count} {noun}")
}

pub struct PostCard<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub date: String,
    pub content: &'a str,
}

impl<'a> From<&'a Post> for PostCard<'a> {
    fn from(post: &'a Post) -> Self {
        let date = format_long_date(&post.created_at).unwrap_or_else(|err| {
            debug!(id = %post.id, error = %err, "Showing raw creation timestamp");
            post.created_at.clone()
        });

        Self {
            title: &post.title,
            author: &post.author,
            date,
            content: &post.content,
        }
    }
}

pub enum Listing<'a> {
    Loading,
    Empty,
    Cards(Vec<PostCard<'a>>),
}

impl<'a> From<&'a ViewState> for Listing<'a> {
    fn from(state: &'a ViewState) -> Self {
        if state.loading {
            Listing::Loading
        } else if state.posts.is_empty() {
            Listing::Empty
        } else {
            Listing::Cards(state.posts.iter().map(PostCard::from).collect())
        }
    }
}

#[derive(Template)]
#[template(path = "screen.html")]
struct ScreenTemplate<'a> {
    count_label: String,
    listing: Listing<'a>,
    /// Reload the page until the outstanding fetch has been applied.
    refreshing: bool,
    panel_open: bool,
    submitting: bool,
    draft: &'a Draft,
    notifications: &'a [Notification],
}

pub fn render_screen(state: &ViewState) -> askama::Result<String> {
    ScreenTemplate {
        count_label: count_label(state.posts.len()),
        listing: Listing::from(state),
        refreshing: state.refreshing(),
        panel_open: state.panel_open,
        submitting: state.submitting,
        draft: &state.draft,
        notifications: &state.notifications,
    }
    .render()
}

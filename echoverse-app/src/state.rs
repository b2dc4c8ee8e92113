//! View state of the blog screen and the transitions between its states.
//!
//! [`ViewState::apply`] is the only way the state changes. It never performs I/O itself;
//! whatever has to happen outside the state is returned as a list of [`Effect`]s for the
//! controller to carry out. Results of that work come back in as further [`Event`]s.

use echoverse_client::client::ClientError;
use echoverse_common::model::{
    draft::{Draft, DraftField, DraftValidationError},
    post::{CreatePost, Post},
};
use serde::Serialize;
use tracing::{debug, warn};

pub const PUBLISHED_MESSAGE: &str = "Blog post published";
pub const BUSY_MESSAGE: &str = "Your previous post is still being published";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

impl NotificationLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationLevel::Success => "success",
            NotificationLevel::Error => "error",
        }
    }
}

/// A short lived message shown on top of the screen.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct ViewState {
    /// In the order the backing service returned them.
    pub posts: Vec<Post>,
    pub loading: bool,
    pub submitting: bool,
    pub panel_open: bool,
    /// Bumped after every confirmed creation. Each change schedules one refetch.
    pub refresh_counter: u64,
    pub draft: Draft,
    pub notifications: Vec<Notification>,
    #[serde(skip)]
    latest_fetch: u64,
    #[serde(skip)]
    settled_fetch: u64,
    #[serde(skip)]
    next_notification_id: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            loading: true,
            submitting: false,
            panel_open: false,
            refresh_counter: 0,
            draft: Draft::default(),
            notifications: Vec::new(),
            latest_fetch: 0,
            settled_fetch: 0,
            next_notification_id: 0,
        }
    }
}

#[derive(Debug)]
pub enum Event {
    /// The screen became active and needs its first listing.
    Mounted,
    PanelOpened,
    /// The panel was dismissed without submitting.
    PanelClosed,
    DraftEdited {
        field: DraftField,
        value: String,
    },
    /// The form was submitted with these values.
    Submitted(Draft),
    FetchSettled {
        seq: u64,
        result: Result<Vec<Post>, ClientError>,
    },
    CreateSettled(Result<(), ClientError>),
    NotificationDismissed(u64),
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum SubmitOutcome {
    Published,
    Rejected(DraftValidationError),
    Failed(String),
    /// Another submission is still in flight.
    Busy,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Effect {
    /// Read the post collection and report back with the same sequence number.
    Fetch { seq: u64 },
    Create(CreatePost),
    ExpireNotification { id: u64 },
    ReportSubmission(SubmitOutcome),
}

impl ViewState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number of the most recently issued fetch, `0` before the first one.
    #[must_use]
    pub fn latest_fetch(&self) -> u64 {
        self.latest_fetch
    }

    /// Whether the shown posts may still change because a fetch is outstanding.
    #[must_use]
    pub fn refreshing(&self) -> bool {
        self.loading || self.settled_fetch != self.latest_fetch
    }

    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        let mut effects = Vec::new();

        match event {
            Event::Mounted => self.activate_fetch(&mut effects),
            Event::PanelOpened => self.panel_open = true,
            Event::PanelClosed => {
                if self.submitting {
                    debug!("Ignoring panel close while a submission is in flight");
                } else {
                    self.panel_open = false;
                    self.draft = Draft::default();
                }
            }
            Event::DraftEdited { field, value } => self.draft.set(field, value),
            Event::Submitted(draft) => self.submit(draft, &mut effects),
            Event::FetchSettled { seq, result } => self.settle_fetch(seq, result),
            Event::CreateSettled(result) => self.settle_create(result, &mut effects),
            Event::NotificationDismissed(id) => {
                self.notifications.retain(|notification| notification.id != id);
            }
        }

        effects
    }

    fn activate_fetch(&mut self, effects: &mut Vec<Effect>) {
        self.latest_fetch += 1;
        effects.push(Effect::Fetch {
            seq: self.latest_fetch,
        });
    }

    fn refresh(&mut self, effects: &mut Vec<Effect>) {
        self.refresh_counter += 1;
        self.activate_fetch(effects);
    }

    fn notify(&mut self, level: NotificationLevel, message: String, effects: &mut Vec<Effect>) {
        let id = self.next_notification_id;
        self.next_notification_id += 1;

        self.notifications.push(Notification { id, level, message });
        effects.push(Effect::ExpireNotification { id });
    }

    fn submit(&mut self, draft: Draft, effects: &mut Vec<Effect>) {
        if self.submitting {
            self.notify(NotificationLevel::Error, BUSY_MESSAGE.to_owned(), effects);
            effects.push(Effect::ReportSubmission(SubmitOutcome::Busy));
            return;
        }

        self.draft = draft;
        match self.draft.validate() {
            Ok(create) => {
                self.submitting = true;
                effects.push(Effect::Create(create));
            }
            Err(err) => {
                debug!(missing = ?err.missing(), "Rejected incomplete draft");
                self.notify(NotificationLevel::Error, err.to_string(), effects);
                effects.push(Effect::ReportSubmission(SubmitOutcome::Rejected(err)));
            }
        }
    }

    fn settle_fetch(&mut self, seq: u64, result: Result<Vec<Post>, ClientError>) {
        if seq != self.latest_fetch {
            debug!(seq, latest = self.latest_fetch, "Discarding stale fetch result");
            return;
        }

        self.loading = false;
        self.settled_fetch = seq;
        match result {
            Ok(posts) => self.posts = posts,
            Err(err) => warn!(error = %err, "Fetching posts failed, keeping previous posts"),
        }
    }

    fn settle_create(&mut self, result: Result<(), ClientError>, effects: &mut Vec<Effect>) {
        if !self.submitting {
            debug!("Ignoring create result without a pending submission");
            return;
        }
        self.submitting = false;

        match result {
            Ok(()) => {
                self.panel_open = false;
                self.refresh(effects);
                self.notify(
                    NotificationLevel::Success,
                    PUBLISHED_MESSAGE.to_owned(),
                    effects,
                );
                effects.push(Effect::ReportSubmission(SubmitOutcome::Published));
            }
            Err(err) => {
                warn!(error = %err, "Creating post failed");
                let message = format!("Could not publish post: {err}");
                self.notify(NotificationLevel::Error, message.clone(), effects);
                effects.push(Effect::ReportSubmission(SubmitOutcome::Failed(message)));
            }
        }
    }
}

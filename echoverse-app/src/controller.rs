use crate::state::{Effect, Event, SubmitOutcome, ViewState};
use echoverse_client::service::PostService;
use echoverse_common::model::{
    draft::{Draft, DraftField},
    post::CreatePost,
};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The screen controller is no longer running")]
pub struct ControllerGone;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct ControllerConfig {
    pub notification_ttl: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            notification_ttl: Duration::from_secs(4),
        }
    }
}

#[derive(Debug)]
enum Message {
    Apply(Event),
    Submit {
        draft: Draft,
        reply: oneshot::Sender<SubmitOutcome>,
    },
}

/// Cheap to clone access to a running [`Controller`].
#[derive(Clone, Debug)]
pub struct ControllerHandle {
    messages: mpsc::UnboundedSender<Message>,
    state: watch::Receiver<ViewState>,
}

impl ControllerHandle {
    fn send(&self, message: Message) -> Result<(), ControllerGone> {
        self.messages.send(message).map_err(|_| ControllerGone)
    }

    pub fn open_panel(&self) -> Result<(), ControllerGone> {
        self.send(Message::Apply(Event::PanelOpened))
    }

    pub fn close_panel(&self) -> Result<(), ControllerGone> {
        self.send(Message::Apply(Event::PanelClosed))
    }

    pub fn edit_draft(&self, field: DraftField, value: String) -> Result<(), ControllerGone> {
        self.send(Message::Apply(Event::DraftEdited { field, value }))
    }

    pub fn dismiss_notification(&self, id: u64) -> Result<(), ControllerGone> {
        self.send(Message::Apply(Event::NotificationDismissed(id)))
    }

    /// Submits the form and waits until the submission is rejected, published or failed.
    pub async fn submit(&self, draft: Draft) -> Result<SubmitOutcome, ControllerGone> {
        let (reply, outcome) = oneshot::channel();
        self.send(Message::Submit { draft, reply })?;
        outcome.await.map_err(|_| ControllerGone)
    }

    /// Waits until no fetch is outstanding and returns that state.
    ///
    /// A snapshot taken right after publishing would still show the old posts.
    pub async fn refreshed(&self) -> Result<ViewState, ControllerGone> {
        let mut state = self.subscribe();
        let settled = state
            .wait_for(|state| !state.refreshing())
            .await
            .map_err(|_| ControllerGone)?;
        Ok(settled.clone())
    }

    #[must_use]
    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.clone()
    }
}

/// Owns the [`ViewState`] of the screen.
///
/// Every mutation goes through this one task. Requests to the backing service run as
/// separate tasks and report back through the same message channel.
pub struct Controller<S> {
    service: Arc<S>,
    config: ControllerConfig,
    state: ViewState,
    published: watch::Sender<ViewState>,
    messages: mpsc::UnboundedSender<Message>,
    pending_submit: Option<oneshot::Sender<SubmitOutcome>>,
}

impl<S: PostService> Controller<S> {
    /// Starts the controller. It runs until `shutdown` is cancelled.
    pub fn spawn(
        service: Arc<S>,
        config: ControllerConfig,
        shutdown: CancellationToken,
    ) -> (ControllerHandle, JoinHandle<()>) {
        let (messages, inbox) = mpsc::unbounded_channel();
        let (published, state) = watch::channel(ViewState::new());

        let handle = ControllerHandle {
            messages: messages.clone(),
            state,
        };
        let controller = Self {
            service,
            config,
            state: ViewState::new(),
            published,
            messages,
            pending_submit: None,
        };

        let task = tokio::spawn(controller.run(inbox, shutdown));
        (handle, task)
    }

    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Message>, shutdown: CancellationToken) {
        self.handle(Message::Apply(Event::Mounted));

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                message = inbox.recv() => match message {
                    Some(message) => self.handle(message),
                    None => break,
                },
            }
        }

        info!("Screen controller stopped");
    }

    fn handle(&mut self, message: Message) {
        let (event, reply) = match message {
            Message::Apply(event) => (event, None),
            Message::Submit { draft, reply } => (Event::Submitted(draft), Some(reply)),
        };

        debug!(?event, "Applying event");
        let effects = self.state.apply(event);
        self.published.send_replace(self.state.clone());

        self.perform(effects, reply);
    }

    fn perform(&mut self, effects: Vec<Effect>, mut reply: Option<oneshot::Sender<SubmitOutcome>>) {
        for effect in effects {
            match effect {
                Effect::Fetch { seq } => self.spawn_fetch(seq),
                Effect::Create(post) => {
                    self.pending_submit = reply.take();
                    self.spawn_create(post);
                }
                Effect::ExpireNotification { id } => self.spawn_expiry(id),
                Effect::ReportSubmission(outcome) => {
                    debug!(?outcome, "Submission settled");
                    if let Some(reply) = reply.take().or_else(|| self.pending_submit.take()) {
                        // The submitter may have stopped waiting.
                        let _ = reply.send(outcome);
                    }
                }
            }
        }
    }

    fn spawn_fetch(&self, seq: u64) {
        let service = Arc::clone(&self.service);
        let messages = self.messages.clone();

        tokio::spawn(async move {
            let result = service.fetch_posts().await;
            if messages
                .send(Message::Apply(Event::FetchSettled { seq, result }))
                .is_err()
            {
                debug!(seq, "Controller stopped before fetch settled");
            }
        });
    }

    fn spawn_create(&self, post: CreatePost) {
        let service = Arc::clone(&self.service);
        let messages = self.messages.clone();

        tokio::spawn(async move {
            let result = service.create_post(&post).await;
            if messages
                .send(Message::Apply(Event::CreateSettled(result)))
                .is_err()
            {
                debug!("Controller stopped before create settled");
            }
        });
    }

    fn spawn_expiry(&self, id: u64) {
        let ttl = self.config.notification_ttl;
        let messages = self.messages.clone();

        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            // Nothing to expire once the controller is gone.
            let _ = messages.send(Message::Apply(Event::NotificationDismissed(id)));
        });
    }
}

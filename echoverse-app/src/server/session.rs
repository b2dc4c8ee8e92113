//! Per-visitor screens.
//!
//! Every visitor gets their own [`ControllerHandle`], found again through a session cookie.
//! Sessions that have not been used for a while are stopped and forgotten.

use crate::{
    controller::ControllerHandle,
    server::{ServerError, ServerState},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const SESSION_COOKIE: &str = "echoverse_session";

type SpawnController = dyn Fn(CancellationToken) -> ControllerHandle + Send + Sync;

struct SessionEntry {
    controller: ControllerHandle,
    shutdown: CancellationToken,
    last_seen: Instant,
}

pub struct Sessions {
    spawn: Box<SpawnController>,
    idle_timeout: Duration,
    shutdown: CancellationToken,
    entries: Mutex<HashMap<String, SessionEntry>>,
}

impl std::fmt::Debug for Sessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sessions")
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

impl Sessions {
    /// `spawn` starts the controller of a new session. It has to stop once the given token
    /// is cancelled. All of them are cancelled together with `shutdown`.
    #[must_use]
    pub fn new(
        spawn: impl Fn(CancellationToken) -> ControllerHandle + Send + Sync + 'static,
        idle_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            spawn: Box::new(spawn),
            idle_timeout,
            shutdown,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Finds the controller for the session named in `jar`, starting a new session if there
    /// is none. The returned jar carries the cookie of a newly started session.
    pub async fn resolve(&self, jar: CookieJar) -> (CookieJar, ControllerHandle) {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        entries.retain(|id, entry| {
            let alive = now.duration_since(entry.last_seen) < self.idle_timeout;
            if !alive {
                debug!(session = %id, "Evicting idle session");
                entry.shutdown.cancel();
            }
            alive
        });

        if let Some(entry) = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| entries.get_mut(cookie.value()))
        {
            entry.last_seen = now;
            return (jar, entry.controller.clone());
        }

        let id = format!("{:032x}", rand::random::<u128>());
        let shutdown = self.shutdown.child_token();
        let controller = (self.spawn)(shutdown.clone());
        info!(session = %id, "Started session");

        entries.insert(
            id.clone(),
            SessionEntry {
                controller: controller.clone(),
                shutdown,
                last_seen: now,
            },
        );

        let cookie = Cookie::build((SESSION_COOKIE, id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        (jar.add(cookie), controller)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// The screen of the visitor making the request.
///
/// `jar` has to be part of the response so a new visitor keeps their session.
#[derive(Debug)]
pub struct Session {
    pub jar: CookieJar,
    pub controller: ControllerHandle,
}

impl<S> FromRequestParts<S> for Session
where
    ServerState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let sessions = Arc::clone(&ServerState::from_ref(state).sessions);
        let (jar, controller) = sessions.resolve(jar).await;

        Ok(Self { jar, controller })
    }
}

use echoverse_app::{
    config::Env,
    controller::{Controller, ControllerConfig},
    server::{self, ServerState, session::Sessions},
};
use echoverse_client::client::{ClientError, HttpPostService};
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error setting up the backend client: {0}")]
    Client(#[from] ClientError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "echoverse_app=debug,\
                echoverse_client=debug,\
                echoverse_common=debug,\
                tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                error!(error = %err, "Could not listen for ctrl-c");
            }
            info!("Shutting down");
            shutdown.cancel();
        }
        () = shutdown.cancelled() => {}
    }
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let service = HttpPostService::new(&env.backend_url, env.request_timeout())?;
    info!(backend = %service.base_url(), "Using backing service");

    let service = Arc::new(service);
    let config = ControllerConfig {
        notification_ttl: env.notification_ttl(),
    };
    let shutdown = CancellationToken::new();
    let sessions = Sessions::new(
        move |session_shutdown| {
            Controller::spawn(Arc::clone(&service), config, session_shutdown).0
        },
        env.session_idle(),
        shutdown.clone(),
    );

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::routes()
        .with_state(ServerState {
            sessions: Arc::new(sessions),
        })
        .layer(tracing_layer);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Serving blog screen");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .map_err(InitError::TcpServe);

    shutdown.cancel();
    served
}

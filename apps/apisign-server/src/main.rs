//! apisign server - echo service protected by request signatures.
//!
//! Every request must carry a valid signature for the configured credential.
//! Authenticated requests are answered with their own body, and the response
//! body is signed so clients can verify it.
//!
//! # Usage
//!
//! ```text
//! APISIGN_ACCESS_KEY=ak APISIGN_SECRET_KEY=sk apisign-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `127.0.0.1:8080` | Bind address |
//! | `APISIGN_ACCESS_KEY` | *(required)* | Access key identifier |
//! | `APISIGN_SECRET_KEY` | *(required)* | Shared secret |
//! | `APISIGN_EXPIRY_SECONDS` | `3600` | Request expiry window, `<= 0` disables it |
//! | `APISIGN_SIGN_RESPONSES` | `true` | Sign response bodies |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use apisign_auth::{Signer, SignerConfig};
use apisign_http::{EchoHandler, SignatureHttpConfig, SignatureService};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Process settings that do not concern signing.
struct ServerSettings {
    listen: SocketAddr,
    log_level: String,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        let listen = std::env::var("GATEWAY_LISTEN").unwrap_or_else(|_| DEFAULT_LISTEN.to_owned());
        let listen = listen
            .parse()
            .with_context(|| format!("GATEWAY_LISTEN is not a socket address: {listen}"))?;
        let log_level =
            std::env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_owned());
        Ok(Self { listen, log_level })
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `LOG_LEVEL`.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)
            .with_context(|| format!("LOG_LEVEL is not a valid filter: {log_level}"))?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Serve one accepted connection until it closes or the server drains.
fn spawn_connection(
    http: &HttpConnBuilder<TokioExecutor>,
    graceful: &GracefulShutdown,
    service: SignatureService<EchoHandler>,
    stream: TcpStream,
    peer: SocketAddr,
) {
    let conn = http.serve_connection(TokioIo::new(stream), service).into_owned();
    let conn = graceful.watch(conn);
    tokio::spawn(async move {
        match conn.await {
            Ok(()) => debug!(%peer, "connection closed"),
            Err(e) => warn!(%peer, error = %e, "connection failed"),
        }
    });
}

/// Accept signed-API connections until Ctrl-C, then wait for open ones.
async fn serve(listener: TcpListener, service: SignatureService<EchoHandler>) -> Result<()> {
    let http = HttpConnBuilder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();
    let mut ctrl_c = std::pin::pin!(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    spawn_connection(&http, &graceful, service.clone(), stream, peer);
                }
                Err(e) => warn!(error = %e, "accept failed"),
            },
            signal = &mut ctrl_c => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("Ctrl-C received, no longer accepting connections");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("open connections drained");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = ServerSettings::from_env()?;
    init_tracing(&settings.log_level)?;

    let config = SignerConfig::from_env().context("failed to load signer configuration")?;
    info!(
        access_key = %config.access_key,
        expiry_seconds = config.expiry_seconds,
        sign_responses = config.sign_responses,
        "loaded signer configuration",
    );

    let http_config = SignatureHttpConfig {
        sign_responses: config.sign_responses,
    };
    let service = SignatureService::new(
        Arc::new(EchoHandler),
        Signer::new(config.credential()),
        http_config,
    );

    let listener = TcpListener::bind(settings.listen)
        .await
        .with_context(|| format!("failed to bind to {}", settings.listen))?;
    info!(addr = %settings.listen, version = VERSION, "apisign server listening");

    serve(listener, service).await
}

//! Connection-level HTTP serving with a bounded graceful stop.
//!
//! The accept loop runs on its own task and every connection is served on a
//! task tracked in a `JoinSet`. Once the stop channel flips, the listener is
//! dropped, each connection is asked to finish its in-flight request, and the
//! loop waits up to the idle timeout before aborting whatever is left.
//!
//! Accept failures that only concern one peer are skipped. Running out of
//! file descriptors backs off for [`ACCEPT_BACKOFF`] and retries. Anything
//! else ends the loop, draining open connections the same way.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder;
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),
    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("in-flight requests did not finish within {0:?}; remaining connections were closed")]
    ShutdownTimedOut(Duration),
}

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// Time allowed for a client to send the request head.
    pub read_timeout: Duration,
    /// Grace period for in-flight requests once shutdown starts.
    pub idle_timeout: Duration,
}

/// Pause after an accept failure caused by descriptor or buffer exhaustion.
pub const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

pub async fn accept_loop(
    listener: TcpListener,
    router: Router,
    opts: ServerOptions,
    mut stop: watch::Receiver<bool>,
) -> Result<(), ServeError> {
    let mut builder = Builder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(opts.read_timeout);

    // Connections stop on this rather than on `stop` so a fatal accept error
    // drains them the same way a shutdown does
    let (drain_tx, drain_rx) = watch::channel(false);
    let mut connections = JoinSet::new();
    let mut fatal = None;

    loop {
        tokio::select! {
            _ = stop.changed() => break,
            accepted = listener.accept() => {
                let (stream, remote_addr) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => match classify_accept_error(&e) {
                        AcceptFailure::Connection => {
                            tracing::debug!(error = ?e, "accept_failed_transient");
                            continue;
                        }
                        AcceptFailure::Exhausted => {
                            tracing::error!(
                                error = ?e,
                                open_connections = connections.len(),
                                backoff_ms = ACCEPT_BACKOFF.as_millis() as u64,
                                "accept_failed_resources_exhausted"
                            );
                            tokio::select! {
                                _ = stop.changed() => break,
                                _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                            }
                            continue;
                        }
                        AcceptFailure::Fatal => {
                            tracing::error!(error = ?e, "accept_failed");
                            fatal = Some(e);
                            break;
                        }
                    },
                };
                connections.spawn(serve_connection(
                    stream,
                    remote_addr,
                    router.clone(),
                    builder.clone(),
                    drain_rx.clone(),
                ));
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    // No new connections from here on
    drop(listener);
    let _ = drain_tx.send(true);
    tracing::info!(
        in_flight = connections.len(),
        grace_secs = opts.idle_timeout.as_secs_f64(),
        "draining_connections"
    );

    let drained = tokio::time::timeout(opts.idle_timeout, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        tracing::warn!(
            remaining = connections.len(),
            "shutdown_timeout_closing_connections"
        );
        connections.shutdown().await;
    }

    match (fatal, drained) {
        (Some(e), _) => Err(ServeError::Accept(e)),
        (None, Ok(())) => Ok(()),
        (None, Err(_)) => Err(ServeError::ShutdownTimedOut(opts.idle_timeout)),
    }
}

async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    router: Router,
    builder: Builder<TokioExecutor>,
    mut stop: watch::Receiver<bool>,
) {
    let service = TowerToHyperService::new(router);
    let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
    let mut conn = std::pin::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                tracing::debug!(%remote_addr, error = ?e, "connection_error");
            }
            return;
        }
        _ = stop.changed() => {}
    }

    // Finish the in-flight request, then close instead of keeping alive
    conn.as_mut().graceful_shutdown();
    if let Err(e) = conn.as_mut().await {
        tracing::debug!(%remote_addr, error = ?e, "connection_error_during_shutdown");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcceptFailure {
    /// Only the pending connection is affected; accept the next one.
    Connection,
    /// Out of descriptors or buffers. Retrying right away would spin, so
    /// back off until open connections release some.
    Exhausted,
    Fatal,
}

fn classify_accept_error(e: &io::Error) -> AcceptFailure {
    match e.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock => AcceptFailure::Connection,
        io::ErrorKind::OutOfMemory => AcceptFailure::Exhausted,
        _ if is_resource_exhaustion(e) => AcceptFailure::Exhausted,
        _ => AcceptFailure::Fatal,
    }
}

#[cfg(unix)]
fn is_resource_exhaustion(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM)
    )
}

#[cfg(not(unix))]
fn is_resource_exhaustion(_e: &io::Error) -> bool {
    false
}

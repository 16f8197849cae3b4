use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use crate::bootstrap::app_context::{AppContext, AppServices};
use crate::bootstrap::config::Config;
use crate::bootstrap::server::{self, ServerOptions};
use crate::bootstrap::shutdown;
use crate::infrastructure::db;
use crate::infrastructure::db::repositories::book_repository_sqlx::SqlxBookRepository;
use crate::infrastructure::db::repositories::health_repository_sqlx::SqlxHealthRepository;
use crate::presentation::http::books::BookModule;
use crate::presentation::http::health::HealthModule;
use crate::presentation::http::openapi::OpenApiModule;
use crate::presentation::http::{HttpModule, middleware};

pub use crate::bootstrap::server::ServeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constructed,
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Constructed => "constructed",
            Phase::Running => "running",
            Phase::ShuttingDown => "shutting_down",
            Phase::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Composition root: owns the per-domain use cases and drives the server
/// lifecycle.
pub struct App {
    ctx: AppContext,
    phase: watch::Sender<Phase>,
}

impl App {
    /// Connects to the database and wires repositories into use cases.
    pub async fn new(cfg: Config) -> anyhow::Result<Self> {
        let pool = db::connect_pool(&cfg.database_url, cfg.db_max_connections).await?;
        if cfg.run_migrations {
            db::migrate(&pool).await?;
            info!("migrations_applied");
        }

        let services = AppServices::new(
            Arc::new(SqlxHealthRepository::new(pool.clone())),
            Arc::new(SqlxBookRepository::new(pool)),
        );
        Ok(Self::from_services(cfg, services))
    }

    pub fn from_services(cfg: Config, services: AppServices) -> Self {
        let (phase, _) = watch::channel(Phase::Constructed);
        Self {
            ctx: AppContext::new(cfg, services),
            phase,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Observe lifecycle transitions; subscribe before calling `run`/`serve`.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    pub fn modules(&self) -> Vec<Box<dyn HttpModule>> {
        vec![
            Box::new(HealthModule::new(self.ctx.health_uc())),
            Box::new(BookModule::new(self.ctx.book_uc())),
            Box::new(OpenApiModule),
        ]
    }

    /// Binds the configured address and serves until SIGINT/SIGTERM.
    pub async fn run(self, version: &str) -> Result<(), ServeError> {
        let addr = self.ctx.cfg.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServeError::Bind { addr, source })?;
        self.serve(listener, version, shutdown::signal()).await
    }

    /// Serves on `listener` until `shutdown` completes, then stops within the
    /// idle timeout.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        version: &str,
        shutdown: F,
    ) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send,
    {
        let cfg = &self.ctx.cfg;
        info!(version, "api_version");
        match listener.local_addr() {
            Ok(addr) => info!(%addr, "serving"),
            Err(e) => error!(error = ?e, "local_addr_unavailable"),
        }

        let mut router = Router::new();
        for module in self.modules() {
            for endpoint in module.endpoints() {
                info!(
                    module = module.name(),
                    method = endpoint.method,
                    path = endpoint.path,
                    "route_registered"
                );
            }
            router = module.register(router);
        }
        let router = middleware::apply(router, cfg);

        let opts = ServerOptions {
            read_timeout: cfg.read_timeout(),
            idle_timeout: cfg.idle_timeout(),
        };
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut server = tokio::spawn(server::accept_loop(listener, router, opts, stop_rx));
        self.transition(Phase::Running);

        let mut shutdown = std::pin::pin!(shutdown);
        tokio::select! {
            res = &mut server => {
                // The accept loop only returns on its own after a fatal error
                self.transition(Phase::Stopped);
                let res = res.map_err(ServeError::from).and_then(|r| r);
                if let Err(e) = &res {
                    error!(error = %e, "server_failed");
                }
                return res;
            }
            _ = &mut shutdown => {}
        }

        self.transition(Phase::ShuttingDown);
        let _ = stop_tx.send(true);
        let res = server.await.map_err(ServeError::from).and_then(|r| r);
        self.transition(Phase::Stopped);
        res
    }

    fn transition(&self, next: Phase) {
        let prev = self.phase.send_replace(next);
        info!(from = %prev, to = %next, "lifecycle_transition");
    }
}

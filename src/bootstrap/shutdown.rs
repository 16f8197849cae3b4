use tokio::signal;

/// Completes once the process receives an interrupt (Ctrl+C / SIGINT) or,
/// on unix, SIGTERM.
///
/// If a handler cannot be registered the failure is logged and that signal
/// is ignored rather than treated as a shutdown request.
pub async fn signal() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = ?e, "failed_to_listen_for_interrupt");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "failed_to_register_sigterm_handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => tracing::info!("interrupt_received"),
        _ = terminate => tracing::info!("terminate_received"),
    }
}

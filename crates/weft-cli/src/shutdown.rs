//! Signal handling for a running job.

use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_SHUTDOWN;

/// Exit code used when a second signal interrupts a cancelling job.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Cancels `token` on the first SIGINT or SIGTERM.
///
/// Cancellation lets the runner finish its terminal update; a second signal
/// exits the process without waiting for it.
pub async fn cancel_on_signal(token: CancellationToken) {
    let signal = wait_for_signal().await;
    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        signal,
        "Received signal, cancelling job"
    );
    token.cancel();

    let signal = wait_for_signal().await;
    tracing::warn!(
        target: TRACING_TARGET_SHUTDOWN,
        signal,
        "Received second signal, exiting without waiting for the job"
    );
    std::process::exit(INTERRUPTED_EXIT_CODE);
}

/// Waits for SIGINT/Ctrl+C or SIGTERM and returns the signal name.
async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!(
                target: TRACING_TARGET_SHUTDOWN,
                error = %e,
                "Failed to install Ctrl+C handler"
            );
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_SHUTDOWN,
                    error = %e,
                    "Failed to install SIGTERM handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    }
}

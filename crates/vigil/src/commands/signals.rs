use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use vigil_core::VisibilityTracker;

/// Wait for SIGINT/Ctrl-C (or SIGTERM on unix), then cancel `token`.
pub async fn wait_for_shutdown_signal(token: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {
                        info!(event = "cli.watch.signal_received", signal = "SIGINT");
                    }
                    _ = sigterm.recv() => {
                        info!(event = "cli.watch.signal_received", signal = "SIGTERM");
                    }
                }
            }
            Err(e) => {
                warn!(event = "cli.watch.sigterm_unavailable", error = %e);
                ctrl_c.await.ok();
                info!(event = "cli.watch.signal_received", signal = "SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!(event = "cli.watch.signal_received", signal = "SIGINT");
    }

    token.cancel();
}

/// Map SIGUSR1 to Hidden and SIGUSR2 to Visible until `shutdown` fires.
#[cfg(unix)]
pub async fn forward_visibility_signals(visibility: VisibilityTracker, shutdown: CancellationToken) {
    use tokio::signal::unix::{SignalKind, signal};
    use vigil_core::VisibilityState;

    let (mut hide, mut show) = match (
        signal(SignalKind::user_defined1()),
        signal(SignalKind::user_defined2()),
    ) {
        (Ok(hide), Ok(show)) => (hide, show),
        (Err(e), _) | (_, Err(e)) => {
            warn!(event = "cli.watch.visibility_signals_unavailable", error = %e);
            return;
        }
    };

    loop {
        let state = tokio::select! {
            _ = shutdown.cancelled() => return,
            Some(()) = hide.recv() => VisibilityState::Hidden,
            Some(()) = show.recv() => VisibilityState::Visible,
            else => return,
        };
        if visibility.set(state) {
            info!(event = "cli.watch.visibility_changed", visibility = %state);
        }
    }
}

#[cfg(not(unix))]
pub async fn forward_visibility_signals(_visibility: VisibilityTracker, shutdown: CancellationToken) {
    shutdown.cancelled().await;
}

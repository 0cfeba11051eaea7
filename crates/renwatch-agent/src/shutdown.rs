// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling for graceful shutdown.
//!
//! The first SIGTERM or SIGINT (Ctrl+C) cancels the returned
//! [`CancellationToken`]. A second one exits the process immediately with
//! status 130.

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Exit status used when a second signal forces the process down.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled on the first signal.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        info!(signal, "initiating graceful shutdown");
        token_clone.cancel();

        let signal = wait_for_signal().await;
        error!(signal, "second signal received, exiting immediately");
        std::process::exit(FORCED_EXIT_CODE);
    });

    token
}

/// Wait for the next SIGINT or SIGTERM and return its name.
async fn wait_for_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    name = ctrl_c() => name,
                    _ = sigterm.recv() => "SIGTERM",
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler; listening for Ctrl+C only");
                ctrl_c().await
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await
    }
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        // Without any signal source, never resolve.
        std::future::pending::<()>().await;
    }
    "SIGINT"
}

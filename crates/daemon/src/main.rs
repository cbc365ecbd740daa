// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fdd: the flightdeck control-plane daemon.

use fd_daemon::{bridge, config::DaemonConfig, http, state::AppContext, sweep};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Grace period between cancelling in-flight work and closing streams.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn config_path() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    std::env::var("FD_CONFIG").ok().map(PathBuf::from)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = DaemonConfig::load(config_path().as_deref())?;

    let log_dir = config.state_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let (file_writer, _log_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "fdd.log"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("info")
        }))
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    std::fs::create_dir_all(config.buffer_root())?;
    let listen_addr = config.listen_addr.clone();
    let context = AppContext::build(config);

    // Background machinery: bus→stream bridge, sweepers, scheduler workers,
    // dispatcher loop
    let bridge_task = tokio::spawn(bridge::run_event_bridge(
        context.bus.clone(),
        context.streams.clone(),
        context.cancel.clone(),
    ));
    let sweep_task = tokio::spawn(sweep::run_sweepers(
        context.gate.clone(),
        context.lifecycle.clone(),
        Duration::from_millis(context.config.sweep_interval_ms),
        context.cancel.clone(),
    ));
    let worker_tasks = context.scheduler.spawn_workers();
    let dispatcher_task =
        tokio::spawn(context.dispatcher.clone().run(context.cancel.clone()));

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(addr = %listen_addr, "control plane listening");

    let shutdown_cancel = context.cancel.clone();
    axum::serve(listener, http::router(context.clone()))
        .with_graceful_shutdown(async move {
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::select! {
                _ = ctrl_c => tracing::info!("interrupt received"),
                _ = shutdown_cancel.cancelled() => {}
            }
        })
        .await?;

    // Shutdown: stop leasing, cancel in-flight handles, wait out the grace
    // period, then close every stream
    tracing::info!("shutting down");
    context.cancel.cancel();
    let drain = async {
        for task in worker_tasks {
            let _ = task.await;
        }
        let _ = dispatcher_task.await;
        let _ = sweep_task.await;
        let _ = bridge_task.await;
    };
    if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
        tracing::warn!("grace period elapsed with tasks still running");
    }
    context.streams.shutdown();
    tracing::info!("stopped");
    Ok(())
}

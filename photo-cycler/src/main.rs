/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use photo_cycler::config::{Overrides, Settings};
use photo_cycler::server;
use photo_cycler::thing::{PhotoCyclerThing, ThingConfig};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Photo cycler web thing.
///
/// Example:
///   photo-cycler ./photos ./static --rate 10 --port 8888
#[derive(Debug, Parser)]
#[command(
    name = "photo-cycler",
    about = "Web thing which cycles through a directory of photos",
    long_about = None,
)]
struct Cli {
    /// Directory to pick photos (*.jpg, *.jpeg) from.
    photos_path: PathBuf,

    /// Directory served under /static; current.jpg is published here.
    static_path: PathBuf,

    /// HTTP port [default: 8888].
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Initial cycle rate in seconds [default: 5].
    #[arg(short = 'r', long = "rate")]
    rate: Option<f64>,

    /// Thing title [default: "Photo Cycler"].
    #[arg(short = 'n', long = "name")]
    name: Option<String>,

    /// Seed for photo selection (reproducible order).
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Optional YAML settings file (port, rate, name, seed).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // ── Resolve configuration ─────────────────────────────────────────────────
    let overrides = Overrides {
        port: cli.port,
        rate: cli.rate,
        name: cli.name,
        seed: cli.seed,
    };
    let settings = match Settings::resolve(
        &cli.photos_path,
        &cli.static_path,
        cli.config.as_deref(),
        overrides,
    ) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{:#}", anyhow::Error::from(e));
            process::exit(1);
        }
    };

    info!(
        photos = %settings.photos_dir.display(),
        static_dir = %settings.static_dir.display(),
        port = settings.port,
        rate_secs = settings.rate_secs,
        title = %settings.title,
        "Configuration"
    );

    if let Err(e) = run(settings).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(settings: Settings) -> Result<()> {
    let thing = Arc::new(
        PhotoCyclerThing::new(ThingConfig {
            title: settings.title.clone(),
            photos_dir: settings.photos_dir.clone(),
            publication_dir: settings.static_dir.clone(),
            rate_secs: settings.rate_secs,
            seed: settings.seed,
        })
        .context("Failed to create photo cycler thing")?,
    );

    let app = server::router(Arc::clone(&thing), &settings.static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    thing.shutdown();
    info!("Photo cycler stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        // Without a signal handler, run until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

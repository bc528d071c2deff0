// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! HTTP host for Mirror UI sessions.
//! Browsers POST JSON messages to `/sync`; each host session runs one life
//! cycle at a time and gets the rendered operations back.

mod demo;
mod http;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use clap::Parser;
use mirror_app_core::config::ConfigService;
use mirror_app_core::prefs::{HostPrefs, HOST_PREFS_KEY};
use mirror_config_fs::FsConfigStore;
use mirror_render::{Application, RendererRegistry};
use mirror_session::{LifeCycleHandler, RequestSynchronizer, SessionHandle, SessionStore};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mirror UI sync server")]
struct Args {
    /// TCP listener for browser clients; overrides the saved preference
    #[arg(long)]
    listen: Option<SocketAddr>,
    /// Skip text-selection updates for hidden widgets
    #[arg(long)]
    gate_text_selection: bool,
    /// Directory holding preference files (defaults to the platform config dir)
    #[arg(long)]
    config_dir: Option<PathBuf>,
    /// TLS certificate (PEM). If provided, key must also be provided.
    #[arg(long)]
    tls_cert: Option<PathBuf>,
    /// TLS private key (PEM). If provided, cert must also be provided.
    #[arg(long)]
    tls_key: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let prefs = load_prefs(&args).context("load host preferences")?;
    let listen: SocketAddr = match args.listen {
        Some(addr) => addr,
        None => prefs
            .listen
            .parse()
            .with_context(|| format!("invalid listen address {:?}", prefs.listen))?,
    };

    let handler = LifeCycleHandler::new(
        RendererRegistry::with_defaults(),
        prefs.render,
        |_session: &SessionHandle| -> Box<dyn Application> { Box::<demo::Demo>::default() },
    );
    let sync = Arc::new(RequestSynchronizer::new(
        Arc::new(SessionStore::new()),
        handler,
    ));
    let app = http::router(sync);

    let handle = Handle::new();
    // graceful shutdown on Ctrl+C
    let shutdown = handle.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(?err, "failed to install ctrl-c handler");
            return;
        }
        shutdown.shutdown();
    });

    match (args.tls_cert, args.tls_key) {
        (Some(cert), Some(key)) => {
            let tls_config = RustlsConfig::from_pem_file(cert, key)
                .await
                .context("load tls config")?;
            info!("mirror server listening (TLS) on {listen}");
            axum_server::bind_rustls(listen, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        (None, None) => {
            info!("mirror server listening on {listen}");
            axum_server::bind(listen)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        _ => {
            return Err(anyhow!(
                "must provide both --tls-cert and --tls-key or neither"
            ))
        }
    }

    Ok(())
}

/// Saved prefs (written with defaults on first run) with command-line overrides.
fn load_prefs(args: &Args) -> Result<HostPrefs> {
    let store = match &args.config_dir {
        Some(dir) => FsConfigStore::at(dir)?,
        None => FsConfigStore::new()?,
    };
    let base = store.base().to_path_buf();
    let (mut prefs, created) =
        ConfigService::new(store).load_or_init::<HostPrefs>(HOST_PREFS_KEY)?;
    if created {
        info!(dir = %base.display(), "wrote default host preferences");
    }
    if args.gate_text_selection {
        prefs.render.gate_text_selection_on_visibility = true;
    }
    Ok(prefs)
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use warden_backend::{
    config::{Settings, StorageBackend},
    router::create_router,
    store::{CredentialStore, FlatFileCredentialStore, MemoryCredentialStore},
    AppState,
};

#[derive(Parser, Debug)]
#[command(name = "warden-server")]
#[command(version, about = "Session login gate with role-based page guards", long_about = None)]
struct Cli {
    /// Path to a TOML, YAML or JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Skip creating the configured seed accounts
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(cli.config.as_deref())?;
    if let Some(host) = cli.host.clone() {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    init_tracing(&settings);

    match settings.storage.backend {
        StorageBackend::Memory => {
            warn!("using the in-memory credential store; accounts are lost on restart");
            run(MemoryCredentialStore::new(), settings, &cli).await
        },
        StorageBackend::File => {
            let store = FlatFileCredentialStore::open(&settings.storage.path)
                .await
                .with_context(|| {
                    format!("opening credential store in {}", settings.storage.path.display())
                })?;
            info!(path = %store.path().display(), "using flat-file credential store");
            run(store, settings, &cli).await
        },
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.to_ascii_lowercase()));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    if settings.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run<S: CredentialStore + 'static>(
    store: S,
    settings: Settings,
    cli: &Cli,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(store, &settings)?);

    if cli.no_seed {
        info!("seed provisioning skipped");
    } else {
        let report = state.provision().await.context("provisioning seed accounts")?;
        info!(
            created = report.created.len(),
            existing = report.existing.len(),
            "seed accounts ready"
        );
    }

    let cleanup = state.sessions.spawn_cleanup(settings.cleanup_interval());

    let app = create_router(state);
    let listener = TcpListener::bind((settings.server.host.as_str(), settings.server.port))
        .await
        .with_context(|| {
            format!("binding {}:{}", settings.server.host, settings.server.port)
        })?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.abort();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}

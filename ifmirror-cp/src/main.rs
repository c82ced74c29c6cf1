use anyhow::Context;
use clap::Parser;
use ifmirror_cp::api::{ApiServer, ApiService, MsgTable};
use ifmirror_cp::audit::PairAuditLogger;
use ifmirror_cp::config::{Cli, Config};
use ifmirror_cp::dataplane::{PhyInterface, TapBackend};
use ifmirror_cp::manager::PairManager;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    let socket = cli.socket.unwrap_or_else(|| config.socket.clone());

    let phys: Vec<PhyInterface> = config
        .interfaces
        .iter()
        .map(|entry| PhyInterface {
            id: entry.id,
            name: entry.name.clone(),
        })
        .collect();
    info!(
        interfaces = phys.len(),
        msg_id_base = config.msg_id_base,
        "starting ifmirror control plane"
    );

    let backend = TapBackend::new(phys);
    let mut manager = PairManager::new(Box::new(backend), PairAuditLogger::new());
    if !config.default_netns.is_empty() {
        manager.set_default_ns(&config.default_netns);
    }

    let service = ApiService::new(MsgTable::new(config.msg_id_base), manager);

    if let Some(parent) = socket.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let server = ApiServer::bind(&socket, service).context("binding control socket")?;

    let mut sigint = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;

    server
        .serve(async move {
            tokio::select! {
                _ = sigint.recv() => info!("received SIGINT, shutting down"),
                _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            }
        })
        .await
        .context("control server failed")?;

    info!("server stopped");
    Ok(())
}

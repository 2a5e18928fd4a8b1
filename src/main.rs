use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pr_builder::config::AppConfig;
use pr_builder::handlers::{NotifierConfig, Orchestrator};
use pr_builder::services::Services;
use pr_builder::webhooks;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pr_builder=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pull request builder");

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(
        "Configuration loaded (project: {}, region: {}, enforce approval: {})",
        config.codebuild_project_name, config.region, config.enforce_approval
    );

    let services = Services::http(&config.endpoints);

    // Resolved once, before any event is served.
    let notifier_config = match &config.source_email_param {
        Some(source_param) => {
            let resolved = NotifierConfig::resolve(
                services.parameters.as_ref(),
                source_param,
                config.cc_email_param.as_deref(),
            )
            .await
            .context("Committer notifier is misconfigured")?;
            info!("Committer notifier enabled, sending from {}", resolved.source_email);
            Some(resolved)
        }
        None => {
            info!("Committer notifier disabled (SOURCE_EMAIL_ADDR_PARAM not set)");
            None
        }
    };

    let orchestrator = Arc::new(Orchestrator::new(&config, services, notifier_config));
    let app = webhooks::router(orchestrator);

    let host: std::net::IpAddr = config
        .server_host
        .parse()
        .with_context(|| format!("Invalid SERVER_HOST: {}", config.server_host))?;
    let addr = SocketAddr::from((host, config.server_port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

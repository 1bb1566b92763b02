//! netops-web: Main Entry Point

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use netops_chat::{AgentFactory, ChatService};
use netops_core::config::load_environment;
use netops_core::{EnvCredentialProvider, Settings};
use netops_llm::{LlmProvider, OpenAiClient};
use netops_web::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = load_environment();

    tracing_subscriber::registry()
        .with(fmt::layer().compact())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,netops_web=debug")),
        )
        .init();

    match env_file {
        Some(env_file) => env_file.log(),
        None => warn!("No environment file found, using process environment only"),
    }

    let settings = Settings::from_env().context("invalid configuration")?;
    let provider: Arc<dyn LlmProvider> =
        Arc::new(OpenAiClient::from_env(&settings.llm).context("completion model client")?);
    info!("LLM Provider: {} ({})", provider.name(), provider.model());

    let provider_name = provider.name().to_string();
    let model = provider.model().to_string();
    let port = settings.port;

    let factory = AgentFactory::new(settings, Arc::new(EnvCredentialProvider), provider);
    let state = Arc::new(AppState::new(ChatService::new(factory), provider_name, model));
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        },
    }
}

use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use invoker_agent::Agent;
use invoker_bedrock::BedrockClient;
use invoker_server::telemetry::init_logging;
use invoker_server::{router, AppState, ServerConfig};
use invoker_tools::{builtin_toolset, parse_timezone, CurrentTime};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::parse();
    init_logging(&config.log_level, config.log_json);

    parse_timezone(&config.default_timezone)
        .with_context(|| format!("DEFAULT_TIMEZONE={}", config.default_timezone))?;

    let model = BedrockClient::new(config.bedrock_config())?;
    let tools =
        builtin_toolset(CurrentTime::new().with_default_timezone(&config.default_timezone))?;

    let mut builder = Agent::builder(Arc::new(model))
        .tools(tools)
        .max_steps(config.max_steps);
    if let Some(prompt) = &config.system_prompt {
        builder = builder.system_prompt(prompt);
    }
    let agent = builder.build()?;

    let app = router(AppState::new(Arc::new(agent)), config.body_limit);
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, model_id = %config.model_id, region = %config.region, "invoker-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("invoker-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

//! queuebot - speaker queue and moderation bot.

use queuebot::bot::BotController;
use queuebot::config::{Config, validate};
use queuebot::platform::discord;
use queuebot::queue::{QueueStore, SharedQueue};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Inbound events buffered between the gateway and the controller.
const EVENT_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "queuebot.toml".to_string());

    let mut config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Ok(token) = std::env::var("QUEUEBOT_TOKEN")
        && !token.is_empty()
    {
        config.discord.token = token;
    }

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "Refusing to start with {} configuration error(s)",
            errors.len()
        ));
    }

    info!(
        server = %config.community.server,
        queue = %config.queue.name,
        speaker_channel = %config.community.speaker_channel,
        "Starting queuebot"
    );

    let queue = SharedQueue::load(QueueStore::new(&config.queue.path)).await;

    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let (mut client, handle) = discord::build(&config.discord.token, events_tx).await?;

    let bot = BotController::new(
        Arc::new(handle),
        queue,
        config.community.clone(),
        config.queue.clone(),
    );

    let controller = {
        let bot = Arc::clone(&bot);
        tokio::spawn(async move { bot.run(events_rx).await })
    };

    // Translate process signals into a clean quit
    {
        let bot = Arc::clone(&bot);
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            bot.quit().await;
        });
    }

    if let Err(e) = client.start().await {
        error!(error = %e, "Gateway client stopped with an error");
    }

    bot.shutdown_token().cancel();
    controller.await?;
    info!("queuebot stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

use lingua_console::config::Config;
use lingua_console::logging::init_tracing;
use lingua_console::tui;
use lingua_console::ConsoleClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    let _log_guard = init_tracing(&config.log_level, &config.log_dir);

    tracing::info!(
        backend_url = %config.backend_url,
        timeout_ms = config.request_timeout.as_millis() as u64,
        "console starting"
    );

    let client = ConsoleClient::new(&config);
    if let Err(err) = tui::run(client).await {
        tracing::error!(error = %err, "console exited with an error");
        return Err(err);
    }

    tracing::info!("console stopped");
    Ok(())
}

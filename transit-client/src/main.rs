use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transit_client::config::AppConfig;
use transit_client::startup::App;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();
    info!(data_dir = %config.data_dir.display(), "Starting transit client");

    let mut app = match App::start(config) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "Failed to create HTTP client");
            std::process::exit(1);
        }
    };

    tokio::select! {
        report = app.startup_report() => {
            if let Some(report) = report {
                info!(
                    routes = app.repository().catalog().len(),
                    reminders = report.successes,
                    failed = report.failures.len(),
                    "Startup complete"
                );
            }
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
            }
        }
        _ = tokio::signal::ctrl_c() => {}
    }

    info!("Ctrl-C received, shutting down...");
    app.shutdown().await;
}

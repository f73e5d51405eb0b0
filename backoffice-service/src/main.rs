use backoffice_service::config::BackofficeConfig;
use backoffice_service::services::metrics::init_metrics;
use backoffice_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = BackofficeConfig::load()?;

    init_tracing(
        "backoffice-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );
    init_metrics();

    tracing::info!(
        port = config.common.port,
        store = ?config.store,
        "Starting backoffice-service"
    );

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}

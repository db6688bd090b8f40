use nila_oidc_logout::prelude::*;
use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DemoAppConfig {
    logging: Option<LoggingConfig>,
    logout: LogoutConfig,
    algorithm: Algorithm,
    signing_key: SigningKeyConfig,
    #[serde(default)]
    front_channel_logout_urls: Vec<String>,
    #[serde(default)]
    back_channel_logouts: Vec<BackChannelLogoutModel>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // --- Load Configuration from YAML (early, for the log level) ---
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/logout_config.yaml".to_string());
    let config_str = fs::read_to_string(&config_path)
        .map_err(|e| format!("Failed to read config file {}: {}", config_path, e))?;
    let app_config: DemoAppConfig = serde_yaml::from_str(&config_str)
        .map_err(|e| format!("Failed to parse YAML config from {}: {}", config_path, e))?;

    // RUST_LOG wins over the configured level.
    let level = app_config
        .logging
        .as_ref()
        .and_then(|l| l.level.clone())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    app_config.logout.validate()?;
    let signer = JwtLogoutTokenSigner::new(app_config.algorithm, &app_config.signing_key)?;
    if let Some(jwks) = signer.get_public_jwks() {
        tracing::info!("Relying parties can verify logout tokens with: {}", jwks);
    }
    let dispatcher = BackChannelLogoutDispatcher::new(&app_config.logout, Arc::new(signer))?;

    // The front-channel page the browser would receive.
    let page = FrontChannelHtmlRenderer::response(&app_config.front_channel_logout_urls)?;
    tracing::info!(status = %page.status(), "Front-channel logout page:\n{}", page.body());

    // Back-channel: wait for the report here so it can be printed.
    let report = dispatcher.dispatch(app_config.back_channel_logouts).await;
    for outcome in report.outcomes() {
        match &outcome.result {
            Ok(()) => println!("{:<12} {:<48} delivered ({} attempt(s))", outcome.client_id, outcome.logout_uri, outcome.attempts),
            Err(failure) => println!("{:<12} {:<48} FAILED: {}", outcome.client_id, outcome.logout_uri, failure),
        }
    }
    println!("{} delivered, {} failed", report.succeeded(), report.failed());
    Ok(())
}

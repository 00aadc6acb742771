//! `llmdesk gateway`: start the HTTP front-end.

use llmdesk_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("llmdesk Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Users:     {}", config.auth.credentials.len());

    llmdesk_gateway::start(config).await?;

    Ok(())
}

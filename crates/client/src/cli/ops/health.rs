use std::time::Duration;

use clap::Args;
use reqwest::Client;

use client::config::ConfigError;

/// Probe the relay's status endpoints
#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Health check failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = HealthError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let relay_url = ctx
            .settings()?
            .relay_url
            .ok_or(ConfigError::Missing("relay_url"))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HealthError::Failed(e.to_string()))?;

        let mut lines = vec![format!("Relay ({}):", relay_url)];
        for probe in ["livez", "readyz"] {
            let url = relay_url
                .join(&format!("_status/{}", probe))
                .map_err(|e| HealthError::Failed(e.to_string()))?;
            let status = match client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => "OK".to_string(),
                Ok(resp) => format!("UNHEALTHY ({})", resp.status()),
                Err(_) => "NOT REACHABLE".to_string(),
            };
            lines.push(format!("  {:<7} {}", format!("{}:", probe), status));
        }

        Ok(lines.join("\n"))
    }
}

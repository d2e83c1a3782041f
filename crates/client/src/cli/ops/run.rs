use clap::Args;

use client::config::ConfigError;
use client::{Orchestrator, Strategy, StrategyReport};

/// Time each retrieval strategy
#[derive(Args, Debug, Clone)]
pub struct Run {
    /// Strategies to run, in order (default: all)
    #[arg(long = "strategy", value_enum)]
    pub strategies: Vec<Strategy>,

    /// Timed runs per strategy
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub runs: u32,

    /// Print reports as a JSON array
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("failed to encode reports: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{failed} of {total} runs failed\n{report}")]
    Failed {
        failed: usize,
        total: usize,
        report: String,
    },
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Run {
    type Error = RunError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = ctx.config()?;
        let orchestrator = Orchestrator::new(
            config.endpoints,
            config.channels,
            config.asset,
            config.request_timeout,
        )?;

        let strategies = if self.strategies.is_empty() {
            Strategy::ALL.to_vec()
        } else {
            self.strategies.clone()
        };
        let reports = orchestrator.run_all(&strategies, self.runs).await;
        let report = self.render(&reports)?;

        let failed = reports.iter().filter(|r| !r.is_success()).count();
        if failed > 0 {
            return Err(RunError::Failed {
                failed,
                total: reports.len(),
                report,
            });
        }
        Ok(report)
    }
}

impl Run {
    fn render(&self, reports: &[StrategyReport]) -> Result<String, serde_json::Error> {
        if self.json {
            return serde_json::to_string_pretty(reports);
        }
        Ok(reports
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

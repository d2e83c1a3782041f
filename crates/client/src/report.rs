use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::orchestrator::StrategyError;
use crate::strategy::Strategy;

/// Result of one timed run of one strategy
#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub strategy: Strategy,
    pub run: u32,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// A failed run never carries a timing
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success { elapsed_ms: f64, bytes: usize },
    Failure { error_kind: String, message: String },
}

impl StrategyReport {
    pub fn success(strategy: Strategy, run: u32, elapsed: Duration, bytes: usize) -> Self {
        Self {
            strategy,
            run,
            outcome: Outcome::Success {
                elapsed_ms: elapsed.as_secs_f64() * 1000.0,
                bytes,
            },
        }
    }

    pub fn failure(strategy: Strategy, run: u32, error: &StrategyError) -> Self {
        Self {
            strategy,
            run,
            outcome: Outcome::Failure {
                error_kind: error.kind().to_string(),
                message: error.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }
}

impl fmt::Display for StrategyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Success { elapsed_ms, bytes } => write!(
                f,
                "{}: {:.3} milliseconds ({} bytes)",
                self.strategy, elapsed_ms, bytes
            ),
            Outcome::Failure {
                error_kind,
                message,
            } => write!(f, "{}: FAILED {}: {}", self.strategy, error_kind, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use common::protocol::RejectKind;

    use super::*;

    #[test]
    fn test_success_report() {
        let report = StrategyReport::success(Strategy::VpnCdn, 0, Duration::from_millis(42), 10);
        assert!(report.is_success());
        assert_eq!(report.to_string(), "vpn-cdn: 42.000 milliseconds (10 bytes)");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["strategy"], "vpn-cdn");
        assert_eq!(json["status"], "success");
        assert_eq!(json["bytes"], 10);
    }

    #[test]
    fn test_failure_report_has_no_timing() {
        let error = StrategyError::Rejected(RejectKind::Decryption);
        let report = StrategyReport::failure(Strategy::Indirection, 2, &error);
        assert!(!report.is_success());
        assert_eq!(
            report.to_string(),
            "indirection: FAILED rejected: relay rejected the request: decryption"
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["error_kind"], "rejected");
        assert!(json.get("elapsed_ms").is_none());
    }
}

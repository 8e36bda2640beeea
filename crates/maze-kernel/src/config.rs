//! Configuration types for exploration runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level exploration configuration.
///
/// Every field has a default, so a partial JSON document is enough.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    /// Per-agent decision loop settings
    pub agent: AgentConfig,

    /// Run-level settings for the experiment driver
    pub run: RunConfig,
}

/// Settings for one explorer agent's decision loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Reservation attempts per iteration before giving up and turning
    pub max_frontier_attempts: usize,

    /// Pause between iterations (milliseconds)
    pub step_delay_ms: u64,

    /// Left turns tried when aligning with the next path step
    pub max_alignment_turns: usize,

    /// Seed for the random fallback turns. Derived from the agent id when absent.
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_frontier_attempts: 8,
            step_delay_ms: 10,
            max_alignment_turns: 4,
            seed: None,
        }
    }
}

impl AgentConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

/// Settings for a whole multi-agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of agents (one crawler each)
    pub agents: usize,

    /// Deadline for every agent loop (seconds)
    pub duration_secs: u64,

    /// Interval between progress reports (milliseconds, 0 is treated as 1)
    pub report_interval_ms: u64,

    /// Simulated latency added to every crawler call (milliseconds)
    pub crawler_latency_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            agents: 3,
            duration_secs: 60,
            report_interval_ms: 1000,
            crawler_latency_ms: 0,
        }
    }
}

impl RunConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Progress report period; never zero.
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExplorationConfig::default();
        assert_eq!(config.agent.max_frontier_attempts, 8);
        assert_eq!(config.agent.max_alignment_turns, 4);
        assert_eq!(config.agent.step_delay(), Duration::from_millis(10));
        assert_eq!(config.run.duration(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ExplorationConfig =
            serde_json::from_str(r#"{ "agent": { "seed": 42 }, "run": { "agents": 5 } }"#).unwrap();
        assert_eq!(config.agent.seed, Some(42));
        assert_eq!(config.agent.max_frontier_attempts, 8);
        assert_eq!(config.run.agents, 5);
        assert_eq!(config.run.report_interval_ms, 1000);
    }

    #[test]
    fn test_zero_report_interval_is_clamped() {
        let config: ExplorationConfig =
            serde_json::from_str(r#"{ "run": { "report_interval_ms": 0 } }"#).unwrap();
        assert_eq!(config.run.report_interval(), Duration::from_millis(1));
    }
}

//! Results collection and output for exploration runs.
//!
//! Captures:
//! - Map coverage against the labyrinth's ground truth
//! - Coordinator counters (observations, reservations)
//! - Per-agent reports and failures
//! - Progress samples taken at every report interval

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use maze_kernel::{AgentId, AgentReport, CoordinatorStats, ExplorationConfig};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of shared knowledge taken by the progress reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSample {
    /// Milliseconds since the run started
    pub elapsed_ms: u64,
    pub known_cells: usize,
    pub frontiers: usize,
    pub active_reservations: usize,
}

/// An agent whose loop ended with an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFailure {
    pub agent: AgentId,
    pub error: String,
}

/// Results from a single exploration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub run_id: Uuid,
    /// Configuration the run used, after CLI overrides
    pub config: ExplorationConfig,
    /// Maze file name, or "demo"
    pub maze: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Cells recorded in the shared map at the end
    pub known_cells: usize,
    /// Room and door cells recorded in the shared map
    pub open_cells_discovered: usize,
    /// Room and door cells in the labyrinth
    pub open_cells_total: usize,
    /// `open_cells_discovered / open_cells_total`
    pub coverage: f64,
    pub frontiers_remaining: usize,
    /// Recorded cells whose kind differs from the labyrinth
    pub contradictions: usize,
    pub coordinator: CoordinatorStats,
    pub agents: Vec<AgentReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agent_errors: Vec<AgentFailure>,
    pub progress: Vec<ProgressSample>,
}

impl ExperimentResult {
    /// Whether every open cell of the labyrinth made it into the map.
    pub fn fully_explored(&self) -> bool {
        self.open_cells_discovered >= self.open_cells_total
    }

    /// Save results to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing results to {}", path.display()))?;
        Ok(())
    }

    /// Load results from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading results from {}", path.display()))?;
        let result = serde_json::from_str(&json)
            .with_context(|| format!("parsing results in {}", path.display()))?;
        Ok(result)
    }
}

/// Fraction of open cells discovered; 1.0 for a labyrinth without any.
pub fn coverage(discovered: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    discovered as f64 / total as f64
}

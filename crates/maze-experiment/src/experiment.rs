//! Experiment runner: one coordinator, one agent per crawler, shared deadline.
//!
//! ```text
//! ExperimentRunner::run
//!   ├─ MapCoordinator::spawn(&mut runtime) (actor in a fresh runtime)
//!   ├─ N × tokio::spawn(agent.run(..))    (one task per crawler)
//!   ├─ reporter: every interval sample known cells / frontiers
//!   ├─ join_all(agents)
//!   ├─ coordinator.shutdown()             (drains queued observations)
//!   └─ runtime.shutdown_all()
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use acton_reactive::prelude::*;
use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use maze_kernel::{
    AgentId, AgentReport, CellKind, ExplorationConfig, ExplorerAgent, Inventory, MapCoordinator,
    MapSnapshot, Position, frontiers_of,
};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::labyrinth::Labyrinth;
use crate::results::{AgentFailure, ExperimentResult, ProgressSample, coverage};

/// Runs exploration experiments over one labyrinth.
pub struct ExperimentRunner {
    labyrinth: Labyrinth,
    maze_name: String,
    config: ExplorationConfig,
    duration: Duration,
}

impl ExperimentRunner {
    pub fn new(labyrinth: Labyrinth, maze_name: impl Into<String>, config: ExplorationConfig) -> Self {
        let duration = config.run.duration();
        Self {
            labyrinth,
            maze_name: maze_name.into(),
            config,
            duration,
        }
    }

    /// Override the agent deadline with a finer-grained duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn config(&self) -> &ExplorationConfig {
        &self.config
    }

    /// Agent ids are `local-1`, `local-2`, ...
    pub fn agent_id(index: usize) -> AgentId {
        AgentId::new(format!("local-{}", index + 1))
    }

    /// Run every agent until the deadline passes or `cancel` fires.
    ///
    /// Agent failures are recorded in the result rather than aborting the
    /// run; the remaining agents keep exploring.
    pub async fn run(&self, cancel: CancellationToken) -> Result<ExperimentResult> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        let agent_count = self.config.run.agents;

        info!(
            run_id = %run_id,
            maze = %self.maze_name,
            agents = agent_count,
            duration_ms = self.duration.as_millis() as u64,
            "Starting exploration run"
        );

        let mut runtime = ActonApp::launch_async().await;
        let coordinator = Arc::new(MapCoordinator::spawn(&mut runtime).await);
        let latency = Duration::from_millis(self.config.run.crawler_latency_ms);

        let mut ids = Vec::with_capacity(agent_count);
        let mut handles = Vec::with_capacity(agent_count);
        for i in 0..agent_count {
            let id = Self::agent_id(i);
            let bag = Inventory::new();
            let crawler = self.labyrinth.new_crawler(bag.clone(), latency);

            let mut agent_config = self.config.agent.clone();
            agent_config.seed = self.config.agent.seed.map(|s| s.wrapping_add(i as u64));

            let mut agent = ExplorerAgent::new(
                id.clone(),
                crawler,
                bag,
                Arc::clone(&coordinator),
                agent_config,
            );
            let duration = self.duration;
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move { agent.run(duration, cancel).await }));
            ids.push(id);
        }

        let mut progress = Vec::new();
        let mut ticker = tokio::time::interval(self.config.run.report_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick fires immediately
        ticker.tick().await;

        let agents_done = join_all(handles);
        tokio::pin!(agents_done);
        let outcomes = loop {
            tokio::select! {
                outcomes = &mut agents_done => break outcomes,
                _ = ticker.tick() => {
                    let sample = sample_progress(&coordinator, clock).await;
                    info!(
                        elapsed_ms = sample.elapsed_ms,
                        known = sample.known_cells,
                        frontiers = sample.frontiers,
                        reserved = sample.active_reservations,
                        "Progress"
                    );
                    progress.push(sample);
                }
            }
        };

        let mut agents: Vec<AgentReport> = Vec::with_capacity(agent_count);
        let mut agent_errors = Vec::new();
        for (id, outcome) in ids.into_iter().zip(outcomes) {
            match outcome {
                Ok(Ok(report)) => agents.push(report),
                Ok(Err(e)) => agent_errors.push(AgentFailure {
                    agent: id,
                    error: format!("{e:#}"),
                }),
                Err(join_error) => {
                    warn!(agent = %id, error = %join_error, "Agent task failed");
                    agent_errors.push(AgentFailure {
                        agent: id,
                        error: join_error.to_string(),
                    });
                }
            }
        }

        if let Err(e) = coordinator.shutdown().await {
            let _ = runtime.shutdown_all().await;
            return Err(e);
        }

        let snapshot = coordinator.snapshot();
        let open_cells_discovered = snapshot.values().filter(|k| k.is_open()).count();
        let open_cells_total = self.labyrinth.open_cells();
        let stats = coordinator.stats().await;
        let _ = runtime.shutdown_all().await;
        let contradictions = self.contradictions(&snapshot);
        for (p, recorded, actual) in &contradictions {
            warn!(position = %p, recorded = %recorded, actual = %actual, "Map disagrees with labyrinth");
        }
        let ended_at = Utc::now();

        let result = ExperimentResult {
            run_id,
            config: self.config.clone(),
            maze: self.maze_name.clone(),
            started_at,
            ended_at,
            duration_ms: clock.elapsed().as_millis() as u64,
            known_cells: snapshot.len(),
            open_cells_discovered,
            open_cells_total,
            coverage: coverage(open_cells_discovered, open_cells_total),
            frontiers_remaining: frontiers_of(&snapshot).len(),
            contradictions: contradictions.len(),
            coordinator: stats,
            agents,
            agent_errors,
            progress,
        };

        info!(
            run_id = %run_id,
            known = result.known_cells,
            open = result.open_cells_discovered,
            total_open = result.open_cells_total,
            frontiers = result.frontiers_remaining,
            "Exploration run finished"
        );

        Ok(result)
    }

    /// Cells of the shared map that disagree with the labyrinth.
    ///
    /// Each entry is `(position, recorded, actual)`, row-major.
    pub fn contradictions(&self, snapshot: &MapSnapshot) -> Vec<(Position, CellKind, CellKind)> {
        let mut wrong: Vec<_> = snapshot
            .iter()
            .filter_map(|(&p, &recorded)| {
                let actual = self.labyrinth.kind_at(p);
                (recorded != actual).then_some((p, recorded, actual))
            })
            .collect();
        wrong.sort_by_key(|(p, _, _)| (p.y, p.x));
        wrong
    }
}

async fn sample_progress(coordinator: &MapCoordinator, clock: Instant) -> ProgressSample {
    let snapshot = coordinator.snapshot();
    ProgressSample {
        elapsed_ms: clock.elapsed().as_millis() as u64,
        known_cells: snapshot.len(),
        frontiers: frontiers_of(&snapshot).len(),
        active_reservations: coordinator.reservations().await.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_ids_start_at_one() {
        assert_eq!(ExperimentRunner::agent_id(0).as_str(), "local-1");
        assert_eq!(ExperimentRunner::agent_id(2).as_str(), "local-3");
    }

    #[tokio::test]
    async fn test_zero_agents_finishes_with_empty_map() {
        let mut config = ExplorationConfig::default();
        config.run.agents = 0;
        let runner = ExperimentRunner::new(Labyrinth::demo().unwrap(), "demo", config)
            .with_duration(Duration::from_millis(50));

        let result = runner.run(CancellationToken::new()).await.unwrap();
        assert!(result.agents.is_empty());
        assert_eq!(result.known_cells, 0);
        assert_eq!(result.coordinator.published, 0);
    }
}

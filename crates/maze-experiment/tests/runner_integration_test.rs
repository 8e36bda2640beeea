//! Integration tests for full exploration runs.
//!
//! Runs real agents over in-process labyrinths and checks:
//! - the shared map never contradicts the labyrinth
//! - small labyrinths get fully explored
//! - keys carried by agents open doors
//! - cancellation ends a long run promptly
//! - every observation is applied before the result is built
//! - a zero report interval is treated as the shortest one

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use maze_experiment::{ExperimentRunner, Labyrinth};
use maze_kernel::ExplorationConfig;

fn fast_config(agents: usize) -> ExplorationConfig {
    let mut config = ExplorationConfig::default();
    config.run.agents = agents;
    config.run.report_interval_ms = 100;
    config.agent.step_delay_ms = 1;
    config.agent.seed = Some(7);
    config
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_demo_run_never_contradicts_labyrinth() {
    let runner = ExperimentRunner::new(Labyrinth::demo().unwrap(), "demo", fast_config(3))
        .with_duration(Duration::from_millis(1500));

    let result = runner.run(CancellationToken::new()).await.unwrap();

    assert_eq!(result.agents.len(), 3);
    assert!(result.agent_errors.is_empty());
    assert_eq!(result.contradictions, 0);
    assert!(result.known_cells > 0);
    assert!(result.coverage > 0.0);
    assert_eq!(result.coordinator.published, result.coordinator.applied);
    assert_eq!(result.coordinator.active_reservations, 0);
    assert!(!result.progress.is_empty());
}

#[tokio::test]
async fn test_single_corridor_is_fully_explored() {
    let labyrinth = Labyrinth::parse("+----+\n|x   |\n+----+\n").unwrap();
    let runner = ExperimentRunner::new(labyrinth, "corridor", fast_config(1))
        .with_duration(Duration::from_millis(800));

    let result = runner.run(CancellationToken::new()).await.unwrap();

    assert_eq!(result.open_cells_total, 4);
    assert!(result.fully_explored(), "discovered {}", result.open_cells_discovered);
    assert_eq!(result.contradictions, 0);
}

#[tokio::test]
async fn test_key_behind_start_opens_door() {
    // the only way past the door is to fetch the key first
    let labyrinth = Labyrinth::parse("+------+\n|kx/   |\n+------+\n").unwrap();
    let runner = ExperimentRunner::new(labyrinth, "key-door", fast_config(1))
        .with_duration(Duration::from_millis(1500));

    let result = runner.run(CancellationToken::new()).await.unwrap();

    assert_eq!(result.agents[0].items_collected, 1);
    assert!(result.fully_explored(), "discovered {}", result.open_cells_discovered);
    assert_eq!(result.contradictions, 0);
}

#[tokio::test]
async fn test_cancellation_ends_long_run() {
    let runner = ExperimentRunner::new(Labyrinth::demo().unwrap(), "demo", fast_config(2));
    assert_eq!(runner.config().run.duration_secs, 60);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(5), runner.run(cancel))
        .await
        .expect("run ignored cancellation")
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(result.agents.len(), 2);
}

#[tokio::test]
async fn test_latency_slows_but_does_not_break_exploration() {
    let mut config = fast_config(2);
    config.run.crawler_latency_ms = 2;
    let labyrinth = Labyrinth::parse("+---+\n|x  |\n|   |\n+---+\n").unwrap();
    let runner = ExperimentRunner::new(labyrinth, "room", config)
        .with_duration(Duration::from_millis(1000));

    let result = runner.run(CancellationToken::new()).await.unwrap();

    assert!(result.open_cells_discovered >= 2);
    assert_eq!(result.contradictions, 0);
}

#[tokio::test]
async fn test_zero_report_interval_does_not_panic() {
    let mut config = fast_config(1);
    config.run.report_interval_ms = 0;
    let labyrinth = Labyrinth::parse("+----+\n|x   |\n+----+\n").unwrap();
    let runner = ExperimentRunner::new(labyrinth, "corridor", config)
        .with_duration(Duration::from_millis(100));

    let result = runner.run(CancellationToken::new()).await.unwrap();

    assert_eq!(result.agents.len(), 1);
    assert_eq!(result.contradictions, 0);
    assert!(!result.progress.is_empty());
}

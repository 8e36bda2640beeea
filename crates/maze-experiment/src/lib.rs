//! Maze Experiment: multi-crawler exploration runs over an in-process labyrinth.
//!
//! The labyrinth stands in for a crawler server: it owns the ground-truth
//! tiles and hands out [`GridCrawler`]s that the kernel's explorer agents
//! drive. The runner wires one coordinator to N agents and collects an
//! [`ExperimentResult`].

pub mod crawler;
pub mod experiment;
pub mod labyrinth;
pub mod results;

pub use crawler::GridCrawler;
pub use experiment::ExperimentRunner;
pub use labyrinth::{DEMO_MAZE, Labyrinth};
pub use results::{AgentFailure, ExperimentResult, ProgressSample};

//! PanoNav Deterministic Simulation Harness
//!
//! Runs full navigation sessions against a procedural street world, with
//! every source of non-determinism under control:
//! - **Time**: virtual clock, advanced by backoff sleeps and agent steps
//! - **Randomness**: teleport samples and move choices from one 64-bit seed
//! - **Provider**: fault injection for outages and failing lookups
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                ScenarioRunner                 │
//! │   ┌──────────────┐        ┌────────────────┐  │
//! │   │  NavSession  │◄──────►│  SimProvider   │  │
//! │   │ (panonav_core)│       │  (faults)      │  │
//! │   └──────▲───────┘        └───────▲────────┘  │
//! │          │                        │           │
//! │   ┌──────┴───────┐        ┌───────┴────────┐  │
//! │   │  SimContext  │        │  StreetWorld   │  │
//! │   │ (clock, rng) │        │ (seeded grid)  │  │
//! │   └──────────────┘        └────────────────┘  │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use panonav_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42)
//!     .with_steps(100)
//!     .run(ScenarioId::RandomWalk)
//!     .await;
//! assert!(result.passed);
//! ```

mod context;
mod exporter;
mod provider;
mod runner;
mod scripted;
mod world;
pub mod scenarios;

pub use context::SimContext;
pub use exporter::{StepKind, TraceExport, TraceFrame};
pub use provider::{ProviderStats, SimProvider};
pub use runner::{check_observation, ScenarioError, ScenarioResult, ScenarioRunner};
pub use scripted::ScriptedProvider;
pub use world::{NodeKey, StreetWorld, WorldConfig, WorldLink};

//! JSON exporter for observation traces.
//!
//! Writes every observation a scenario produced, together with the rendered
//! move panel, so a run can be inspected or replayed offline.

use panonav_core::{render_moves, MovePanel, Observation};
use serde::Serialize;
use std::fs::File;
use std::io::Write;

/// What happened at a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Teleport,
    Move,
}

/// A single observation in the trace.
#[derive(Debug, Clone, Serialize)]
pub struct TraceFrame {
    /// Step index within the run
    pub step: u64,

    /// Virtual time in seconds
    pub time_sec: f64,

    pub kind: StepKind,

    /// The agent-facing observation
    pub observation: Observation,

    /// Button labels, or the dead-end notice
    pub panel: Vec<String>,
}

impl TraceFrame {
    pub fn new(step: u64, time_sec: f64, kind: StepKind, observation: Observation) -> Self {
        let panel = match render_moves(&observation) {
            MovePanel::DeadEnd => vec![MovePanel::DeadEnd.to_string()],
            MovePanel::Moves(buttons) => buttons.iter().map(|b| b.label()).collect(),
        };
        Self {
            step,
            time_sec,
            kind,
            observation,
            panel,
        }
    }
}

/// Complete trace export.
#[derive(Debug, Clone, Serialize)]
pub struct TraceExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Virtual duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<TraceFrame>,

    /// Final result
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl TraceExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: TraceFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

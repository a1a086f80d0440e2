//! Scenario runner - drives navigation sessions through simulated worlds.

use crate::context::SimContext;
use crate::exporter::{StepKind, TraceExport, TraceFrame};
use crate::provider::SimProvider;
use crate::scenarios::ScenarioId;
use crate::world::WorldConfig;

use panonav_core::{
    LocatorConfig, NavSession, Observation, RetryPolicy, SessionConfig, SessionStats,
};
use panonav_env::{NavContext, NavError, PanoId, SessionId};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Virtual time the agent spends on each step.
const STEP_TIME: Duration = Duration::from_millis(500);

/// Lookups failed by the provider in the outage scenario.
const OUTAGE_FAILURES: u32 = 3;

/// Why a scenario run failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScenarioError {
    #[error("step {step}: {source}")]
    Nav {
        step: u64,
        #[source]
        source: NavError,
    },

    #[error("step {step}: invariant violated: {reason}")]
    Invariant { step: u64, reason: String },

    #[error("step {step}: landed on {landed:?}, wanted {wanted}")]
    WrongTarget {
        step: u64,
        landed: Option<PanoId>,
        wanted: PanoId,
    },

    #[error("gave up after {attempts} attempts, budget was {budget}")]
    BudgetMismatch { attempts: u32, budget: u32 },

    #[error("{0}")]
    Expectation(String),
}

impl ScenarioError {
    fn nav(step: u64) -> impl FnOnce(NavError) -> Self {
        move |source| ScenarioError::Nav { step, source }
    }
}

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Observations checked
    pub steps: u64,

    /// Session counters at the end of the run
    pub stats: SessionStats,

    /// Final virtual time in seconds
    pub final_time_secs: f64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Every observation produced
    pub trace: TraceExport,
}

/// Runs navigation scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Walk length
    steps: u64,

    /// Locator budget (None = scenario default)
    max_attempts: Option<u32>,
}

type SimSession = NavSession<SimContext, SimProvider>;

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            steps: 200,
            max_attempts: None,
        }
    }

    /// Sets the walk length.
    pub fn with_steps(mut self, steps: u64) -> Self {
        self.steps = steps;
        self
    }

    /// Bounds every teleport to `max_attempts` lookups.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Runs a scenario and returns the result.
    pub async fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let world_seed = self.seed.wrapping_mul(0x9e3779b97f4a7c15);
        let context = SimContext::shared(self.seed);
        let mut trace = TraceExport::new(scenario.name(), self.seed);

        let (world, retry) = match scenario {
            ScenarioId::RandomWalk | ScenarioId::ProviderOutage => {
                (WorldConfig::default(), self.retry(RetryPolicy::unbounded()))
            }
            ScenarioId::DeadEndRecovery => (
                WorldConfig::default().with_closed_rate(0.55),
                self.retry(RetryPolicy::unbounded()),
            ),
            ScenarioId::SparseCoverage => (
                WorldConfig::default().with_coverage(0.02),
                self.retry(RetryPolicy::bounded(25)).with_exponential_backoff(
                    Duration::from_millis(50),
                    Duration::from_secs(2),
                    true,
                ),
            ),
        };

        let provider = SimProvider::shared(world.with_seed(world_seed));
        let config = SessionConfig::default()
            .with_name(format!("sim-{}", scenario.name()))
            .with_locator(LocatorConfig::default().with_retry(retry));
        let mut session = NavSession::with_id(
            SessionId::from_seed(self.seed),
            context.clone(),
            provider.clone(),
            config,
        );

        let outcome = match scenario {
            ScenarioId::RandomWalk => {
                self.walk(&mut session, &context, &mut trace, self.steps)
                    .await
            }
            ScenarioId::DeadEndRecovery => {
                self.run_dead_ends(&mut session, &context, &mut trace)
                    .await
            }
            ScenarioId::SparseCoverage => {
                self.run_sparse(&mut session, &context, &mut trace, retry)
                    .await
            }
            ScenarioId::ProviderOutage => {
                self.run_outage(&mut session, &context, &provider, &mut trace)
                    .await
            }
        };

        let failure_reason = match outcome {
            Ok(()) => None,
            Err(e) => {
                warn!("{} failed: {}", scenario.name(), e);
                Some(e.to_string())
            }
        };
        let passed = failure_reason.is_none();
        trace.finalize(passed, failure_reason.clone());

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed,
            steps: trace.frames.len() as u64,
            stats: session.stats().clone(),
            final_time_secs: context.now().as_secs_f64(),
            failure_reason,
            trace,
        }
    }

    fn retry(&self, default: RetryPolicy) -> RetryPolicy {
        match self.max_attempts {
            Some(max) => RetryPolicy {
                max_attempts: Some(max.max(1)),
                ..default
            },
            None => default,
        }
    }

    /// Teleports, then takes `steps` random moves, teleporting out of dead ends.
    async fn walk(
        &self,
        session: &mut SimSession,
        context: &SimContext,
        trace: &mut TraceExport,
        steps: u64,
    ) -> Result<(), ScenarioError> {
        session.teleport().await.map_err(ScenarioError::nav(0))?;
        let mut kind = StepKind::Teleport;

        for step in 0..steps {
            let observation = session
                .observation()
                .cloned()
                .ok_or_else(|| ScenarioError::Expectation("no observation after commit".into()))?;
            check_observation(&observation)
                .map_err(|reason| ScenarioError::Invariant { step, reason })?;
            trace.add_frame(TraceFrame::new(
                step,
                context.now().as_secs_f64(),
                kind,
                observation.clone(),
            ));
            context.advance_time(STEP_TIME);

            let Some(choice) = context.pick(observation.moves.len()) else {
                debug!("step {}: dead end at {}, teleporting", step, observation.node_id);
                session.teleport().await.map_err(ScenarioError::nav(step))?;
                kind = StepKind::Teleport;
                continue;
            };

            let chosen = &observation.moves[choice];
            session
                .take_move(chosen)
                .await
                .map_err(ScenarioError::nav(step))?;

            let landed = session.viewpoint().map(|vp| vp.node_id.clone());
            if landed.as_ref() != Some(&chosen.target_node_id) {
                return Err(ScenarioError::WrongTarget {
                    step,
                    landed,
                    wanted: chosen.target_node_id.clone(),
                });
            }
            kind = StepKind::Move;
        }
        Ok(())
    }

    /// A walk through a world full of closed streets must hit a dead end
    /// and teleport out of it.
    async fn run_dead_ends(
        &self,
        session: &mut SimSession,
        context: &SimContext,
        trace: &mut TraceExport,
    ) -> Result<(), ScenarioError> {
        self.walk(session, context, trace, self.steps).await?;

        let stats = session.stats();
        if stats.dead_ends == 0 {
            return Err(ScenarioError::Expectation(format!(
                "no dead end reached in {} steps",
                self.steps
            )));
        }
        info!(
            "recovered from {} dead ends with {} teleports",
            stats.dead_ends, stats.teleports
        );
        Ok(())
    }

    /// Bounded teleports over a mostly empty globe: every attempt must
    /// either land or give up with exactly the configured budget.
    async fn run_sparse(
        &self,
        session: &mut SimSession,
        context: &SimContext,
        trace: &mut TraceExport,
        retry: RetryPolicy,
    ) -> Result<(), ScenarioError> {
        let budget = retry.max_attempts.unwrap_or(u32::MAX);
        let mut landed = 0u64;
        let mut exhausted = 0u64;

        for round in 0..3u64 {
            let started = context.now();
            match session.teleport().await {
                Ok(_) => {
                    landed += 1;
                    if let Some(observation) = session.observation().cloned() {
                        check_observation(&observation).map_err(|reason| {
                            ScenarioError::Invariant {
                                step: round,
                                reason,
                            }
                        })?;
                        trace.add_frame(TraceFrame::new(
                            round,
                            context.now().as_secs_f64(),
                            StepKind::Teleport,
                            observation,
                        ));
                    }
                }
                Err(NavError::RetriesExhausted { attempts }) => {
                    if attempts != budget {
                        return Err(ScenarioError::BudgetMismatch { attempts, budget });
                    }
                    debug!(
                        "round {}: gave up after {} attempts, {:.2}s backing off",
                        round,
                        attempts,
                        (context.now() - started).as_secs_f64()
                    );
                    exhausted += 1;
                }
                Err(e) => return Err(ScenarioError::nav(round)(e)),
            }
        }

        info!("sparse coverage: {} landed, {} exhausted", landed, exhausted);
        Ok(())
    }

    /// The first lookups fail; the error must reach the caller untouched,
    /// and the session must work once the provider recovers.
    async fn run_outage(
        &self,
        session: &mut SimSession,
        context: &SimContext,
        provider: &SimProvider,
        trace: &mut TraceExport,
    ) -> Result<(), ScenarioError> {
        provider.fail_next_lookups(OUTAGE_FAILURES);

        for attempt in 0..u64::from(OUTAGE_FAILURES) {
            match session.teleport().await {
                Err(e) if e.is_transient() => debug!("outage attempt {}: {}", attempt, e),
                Err(e) => return Err(ScenarioError::nav(attempt)(e)),
                Ok(vp) => {
                    return Err(ScenarioError::Expectation(format!(
                        "teleported to {} during outage",
                        vp.node_id
                    )))
                }
            }
            if session.viewpoint().is_some() {
                return Err(ScenarioError::Expectation(
                    "viewpoint committed during outage".into(),
                ));
            }
        }

        self.walk(session, context, trace, (self.steps / 4).max(1))
            .await
    }
}

/// Checks the invariants every observation must hold.
pub fn check_observation(observation: &Observation) -> Result<(), String> {
    if !(0.0..360.0).contains(&observation.heading) {
        return Err(format!("heading {} outside [0, 360)", observation.heading));
    }
    if !observation.coordinate.is_valid() {
        return Err(format!("coordinate {} off the globe", observation.coordinate));
    }
    if observation.moves.iter().any(|m| !m.heading.is_finite()) {
        return Err("non-finite move heading".to_string());
    }
    if observation
        .moves
        .windows(2)
        .any(|w| w[0].heading > w[1].heading)
    {
        return Err("moves not sorted by heading".to_string());
    }

    let json = observation.to_json().map_err(|e| e.to_string())?;
    if json.contains("description") || json.contains("Avenue") || json.contains(" St") {
        return Err(format!("label leaked into observation: {}", json));
    }
    Ok(())
}

//! Navigation scenarios for deterministic simulation.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// NAV-001: Teleport, then walk random moves through a typical world
    RandomWalk,

    /// NAV-002: Sparse imagery, walks that keep hitting dead ends
    DeadEndRecovery,

    /// NAV-003: Almost all ocean, bounded retries with backoff
    SparseCoverage,

    /// NAV-004: Provider fails the first lookups, then recovers
    ProviderOutage,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::RandomWalk,
            ScenarioId::DeadEndRecovery,
            ScenarioId::SparseCoverage,
            ScenarioId::ProviderOutage,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::RandomWalk => "random_walk",
            ScenarioId::DeadEndRecovery => "dead_end_recovery",
            ScenarioId::SparseCoverage => "sparse_coverage",
            ScenarioId::ProviderOutage => "provider_outage",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::RandomWalk => "Teleport and walk random moves, checking every observation",
            ScenarioId::DeadEndRecovery => "55% of street positions closed; teleport out of every dead end",
            ScenarioId::SparseCoverage => "2% coverage with bounded retries and exponential backoff",
            ScenarioId::ProviderOutage => "First 3 lookups fail; error must surface, then recover",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random_walk" | "randomwalk" | "nav-001" => Ok(ScenarioId::RandomWalk),
            "dead_end_recovery" | "deadendrecovery" | "dead_end" | "nav-002" => {
                Ok(ScenarioId::DeadEndRecovery)
            }
            "sparse_coverage" | "sparsecoverage" | "sparse" | "nav-003" => {
                Ok(ScenarioId::SparseCoverage)
            }
            "provider_outage" | "provideroutage" | "outage" | "nav-004" => {
                Ok(ScenarioId::ProviderOutage)
            }
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

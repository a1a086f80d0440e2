//! Navigation Session - the agent's single source of truth.
//!
//! A session owns the active [`Viewpoint`] and the [`Observation`] derived
//! from it. Every teleport or move goes through one commit step:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          NavSession                           │
//! │                                                               │
//! │  teleport() ──► Locator ──► set_viewpoint(id, pov 0/0) ──┐    │
//! │                                                          ▼    │
//! │  execute_move(id, h) ──► set_viewpoint(id, pov h/0) ──► commit│
//! │                                                          │    │
//! │  refresh() ─────────────────────────────────────────────►│    │
//! │                                                          ▼    │
//! │              links(id) ──► build_observation ──► watch::Sender│
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Several sessions may share one provider and context; each keeps its own
//! viewpoint. Operations take `&mut self`, so one session never has two
//! requests in flight.

use crate::locator::{Locator, LocatorConfig};
use crate::observation::{build_observation, MoveAffordance, Observation, Viewpoint};
use panonav_env::{NavContext, NavError, PanoId, PanoramaProvider, Pov, SessionId};

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Configuration for a navigation session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session's logical name, shown in log prefixes
    pub name: String,

    /// Locator settings used by `teleport`
    pub locator: LocatorConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "panonav-session".to_string(),
            locator: LocatorConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_locator(mut self, locator: LocatorConfig) -> Self {
        self.locator = locator;
        self
    }
}

/// Counters kept per session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Successful teleports
    pub teleports: u64,

    /// Provider lookups spent on teleports
    pub lookup_attempts: u64,

    /// Successful moves
    pub moves: u64,

    /// Observations that had no moves
    pub dead_ends: u64,
}

/// A navigation session over a panorama provider.
///
/// Generic over the context and provider implementations,
/// allowing the same session code to run against a live service
/// or a simulated world.
pub struct NavSession<Ctx, P>
where
    Ctx: NavContext,
    P: PanoramaProvider,
{
    /// Session identifier
    pub session_id: SessionId,

    /// Provider handle
    provider: Arc<P>,

    /// Teleport engine
    locator: Locator<Ctx, P>,

    /// Configuration
    config: SessionConfig,

    /// Active viewpoint (None until the first teleport or move)
    viewpoint: Option<Viewpoint>,

    /// Latest observation, also published to subscribers
    observation: Option<Observation>,
    observation_tx: watch::Sender<Option<Observation>>,

    stats: SessionStats,
}

impl<Ctx, P> NavSession<Ctx, P>
where
    Ctx: NavContext,
    P: PanoramaProvider,
{
    /// Creates a new session with a random id.
    pub fn new(context: Arc<Ctx>, provider: Arc<P>, config: SessionConfig) -> Self {
        Self::with_id(SessionId::new(), context, provider, config)
    }

    /// Creates a new session with a given id (for simulation).
    pub fn with_id(
        session_id: SessionId,
        context: Arc<Ctx>,
        provider: Arc<P>,
        config: SessionConfig,
    ) -> Self {
        let locator = Locator::new(context, provider.clone(), config.locator.clone());
        let (observation_tx, _) = watch::channel(None);

        Self {
            session_id,
            provider,
            locator,
            config,
            viewpoint: None,
            observation: None,
            observation_tx,
            stats: SessionStats::default(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn viewpoint(&self) -> Option<&Viewpoint> {
        self.viewpoint.as_ref()
    }

    pub fn observation(&self) -> Option<&Observation> {
        self.observation.as_ref()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Subscribes to observation updates.
    ///
    /// The receiver always holds the most recent observation; intermediate
    /// ones are skipped if the consumer falls behind.
    pub fn subscribe(&self) -> watch::Receiver<Option<Observation>> {
        self.observation_tx.subscribe()
    }

    /// Jumps to a random panorama, facing north.
    pub async fn teleport(&mut self) -> Result<Viewpoint, NavError> {
        let located = self.locator.locate().await?;

        let location = self
            .provider
            .set_viewpoint(&located.viewpoint.node_id, Pov::level(0.0))
            .await?;
        debug!(
            "[{}/{}] provider settled on {} (requested {})",
            self.config.name, self.session_id, location.pano, located.viewpoint.node_id
        );

        let observation = self.observe(&located.viewpoint).await?;
        self.stats.teleports += 1;
        self.stats.lookup_attempts += u64::from(located.attempts);
        Ok(self.commit(located.viewpoint, observation))
    }

    /// Moves to `target` facing `heading`, pitch 0.
    ///
    /// The target is not checked against the current moves; the provider
    /// decides whether it exists.
    pub async fn execute_move(&mut self, target: &PanoId, heading: f64) -> Result<Viewpoint, NavError> {
        let location = self.provider.set_viewpoint(target, Pov::level(heading)).await?;
        debug!(
            "[{}/{}] moved to {} heading {:.1}",
            self.config.name, self.session_id, location.pano, heading
        );

        let viewpoint = Viewpoint::new(location.pano, location.coordinate, heading);
        let observation = self.observe(&viewpoint).await?;
        self.stats.moves += 1;
        Ok(self.commit(viewpoint, observation))
    }

    /// Follows one of the current observation's moves.
    pub async fn take_move(&mut self, affordance: &MoveAffordance) -> Result<Viewpoint, NavError> {
        self.execute_move(&affordance.target_node_id, affordance.heading)
            .await
    }

    /// Rebuilds the observation for the current viewpoint, e.g. after the
    /// provider reports that the links changed.
    pub async fn refresh(&mut self) -> Result<Observation, NavError> {
        let viewpoint = self
            .viewpoint
            .clone()
            .ok_or_else(|| NavError::invalid("no active viewpoint"))?;
        let observation = self.observe(&viewpoint).await?;
        self.commit(viewpoint, observation.clone());
        Ok(observation)
    }

    /// Fetches links and builds the observation without touching state.
    async fn observe(&self, viewpoint: &Viewpoint) -> Result<Observation, NavError> {
        viewpoint.validate()?;
        let links = self.provider.links(&viewpoint.node_id).await?;
        Ok(build_observation(viewpoint, &links))
    }

    /// Replaces viewpoint and observation together and publishes the update.
    fn commit(&mut self, viewpoint: Viewpoint, observation: Observation) -> Viewpoint {
        if observation.is_dead_end() {
            self.stats.dead_ends += 1;
            info!(
                "[{}/{}] dead end at {}",
                self.config.name, self.session_id, observation.node_id
            );
        }

        self.viewpoint = Some(viewpoint.clone());
        self.observation = Some(observation.clone());
        self.observation_tx.send_replace(Some(observation));
        viewpoint
    }
}

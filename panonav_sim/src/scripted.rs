//! Scripted provider - replays a fixed sequence of lookup outcomes.
//!
//! Useful when a test needs exact control over what the locator sees,
//! e.g. "not found once, then found at (12.3, 45.6)".

use async_trait::async_trait;
use panonav_env::{
    Coordinate, LookupOutcome, NavError, PanoId, PanoramaLocation, PanoramaProvider, Pov, RawLink,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A hand-written panorama graph plus a queue of lookup answers.
///
/// Once the queue is empty every lookup answers `NotFound`.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<LookupOutcome, NavError>>>,
    nodes: HashMap<PanoId, (Coordinate, Vec<RawLink>)>,
    lookups: Mutex<Vec<(Coordinate, f64)>>,
    views: Mutex<Vec<(PanoId, Pov)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a zero-results answer.
    pub fn then_not_found(self) -> Self {
        self.push(Ok(LookupOutcome::NotFound))
    }

    /// Queues a hit. The panorama is also added to the graph (no links)
    /// unless it is already there.
    pub fn then_found(mut self, pano: &str, coordinate: Coordinate) -> Self {
        let id = PanoId::from(pano);
        self.nodes
            .entry(id.clone())
            .or_insert_with(|| (coordinate, Vec::new()));
        self.push(Ok(LookupOutcome::Found(PanoramaLocation::new(id, coordinate))))
    }

    /// Queues a provider failure.
    pub fn then_fail(self, error: NavError) -> Self {
        self.push(Err(error))
    }

    /// Adds or replaces a panorama and its links.
    pub fn with_node(mut self, pano: &str, coordinate: Coordinate, links: Vec<RawLink>) -> Self {
        self.nodes.insert(PanoId::from(pano), (coordinate, links));
        self
    }

    /// Every lookup made so far (center, radius).
    pub fn lookups(&self) -> Vec<(Coordinate, f64)> {
        self.lookups.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Every viewpoint change accepted so far.
    pub fn views(&self) -> Vec<(PanoId, Pov)> {
        self.views.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push(self, answer: Result<LookupOutcome, NavError>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(answer);
        self
    }
}

#[async_trait]
impl PanoramaProvider for ScriptedProvider {
    async fn lookup(&self, center: Coordinate, radius_m: f64) -> Result<LookupOutcome, NavError> {
        self.lookups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((center, radius_m));
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(Ok(LookupOutcome::NotFound))
    }

    async fn links(&self, pano: &PanoId) -> Result<Vec<RawLink>, NavError> {
        self.nodes
            .get(pano)
            .map(|(_, links)| links.clone())
            .ok_or_else(|| NavError::unknown(pano))
    }

    async fn set_viewpoint(&self, pano: &PanoId, pov: Pov) -> Result<PanoramaLocation, NavError> {
        let (coordinate, _) = self.nodes.get(pano).ok_or_else(|| NavError::unknown(pano))?;
        self.views
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((pano.clone(), pov));
        Ok(PanoramaLocation::new(pano.clone(), *coordinate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;
    use panonav_core::{
        render_moves, LocatorConfig, NavSession, RetryPolicy, SessionConfig, Viewpoint,
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn test_not_found_then_found_settles_after_one_retry() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .then_not_found()
                .then_found("X", Coordinate::new(12.3, 45.6)),
        );
        let mut session = NavSession::new(
            SimContext::shared(5),
            provider.clone(),
            SessionConfig::default(),
        );

        let viewpoint = session.teleport().await.unwrap();
        assert_eq!(viewpoint, Viewpoint::new("X", Coordinate::new(12.3, 45.6), 0.0));
        assert_eq!(provider.lookups().len(), 2);
        assert!(provider.lookups().iter().all(|(_, r)| *r == 500.0));
        assert_eq!(provider.views(), vec![(PanoId::from("X"), Pov::level(0.0))]);

        // no links: a dead end, rendered as such
        let observation = session.observation().unwrap();
        assert!(observation.is_dead_end());
        assert!(render_moves(observation).is_dead_end());
    }

    #[tokio::test]
    async fn test_redacted_walk() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .then_found("A", Coordinate::new(40.7580, -73.9855))
                .with_node(
                    "A",
                    Coordinate::new(40.7580, -73.9855),
                    vec![
                        RawLink::new(208.0, "B").with_description("Broadway"),
                        RawLink::new(28.0, "C").with_description("7th Ave"),
                    ],
                )
                .with_node(
                    "B",
                    Coordinate::new(40.7576, -73.9858),
                    vec![RawLink::new(28.0, "A").with_description("Broadway")],
                ),
        );
        let mut session = NavSession::new(
            SimContext::shared(1),
            provider.clone(),
            SessionConfig::default(),
        );

        session.teleport().await.unwrap();
        let json = session.observation().unwrap().to_json_pretty().unwrap();
        assert!(!json.contains("Broadway"));
        assert!(!json.contains("7th Ave"));

        let south = session.observation().unwrap().moves[1].clone();
        assert_eq!(south.target_node_id, PanoId::from("B"));
        session.take_move(&south).await.unwrap();

        let observation = session.observation().unwrap();
        assert_eq!(observation.node_id, PanoId::from("B"));
        assert_eq!(observation.heading, 208.0);
        assert_eq!(observation.moves.len(), 1);
        assert_eq!(provider.views()[1], (PanoId::from("B"), Pov::level(208.0)));
    }

    #[tokio::test]
    async fn test_bounded_session_gives_up() {
        let provider = Arc::new(ScriptedProvider::new().then_not_found().then_not_found());
        let config = SessionConfig::default()
            .with_locator(LocatorConfig::default().with_retry(RetryPolicy::bounded(4)));
        let mut session = NavSession::new(SimContext::shared(2), provider.clone(), config);

        let err = session.teleport().await.unwrap_err();
        assert_eq!(err, NavError::RetriesExhausted { attempts: 4 });
        assert_eq!(provider.lookups().len(), 4);
    }

    #[tokio::test]
    async fn test_scripted_failure_surfaces() {
        let provider = Arc::new(
            ScriptedProvider::new().then_fail(NavError::unavailable("network down")),
        );
        let mut session = NavSession::new(SimContext::shared(3), provider, SessionConfig::default());

        let err = session.teleport().await.unwrap_err();
        assert_eq!(err, NavError::LookupUnavailable("network down".to_string()));
    }
}

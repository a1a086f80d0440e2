//! Simulated panorama provider with fault injection.

use crate::world::{NodeKey, StreetWorld, WorldConfig};

use async_trait::async_trait;
use panonav_env::{
    Coordinate, LookupOutcome, NavError, PanoId, PanoramaLocation, PanoramaProvider, Pov, RawLink,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Counters kept by the simulated provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderStats {
    /// Lookups answered (found or not)
    pub lookups: u64,

    /// Lookups that found nothing
    pub not_found: u64,

    /// Requests failed by fault injection
    pub injected_failures: u64,

    /// Viewpoint changes accepted
    pub viewpoint_changes: u64,
}

/// Injected faults.
#[derive(Debug, Default)]
struct Faults {
    /// While set, every request fails
    outage: bool,

    /// Number of upcoming lookups to fail
    fail_next_lookups: u32,
}

/// Mutable provider state behind one lock.
#[derive(Debug, Default)]
struct ProviderState {
    /// Every id handed out so far, so callers can come back to it
    known: HashMap<PanoId, NodeKey>,

    /// What the viewer currently shows
    current: Option<(PanoId, Pov)>,

    faults: Faults,
    stats: ProviderStats,
}

/// Panorama provider serving a [`StreetWorld`].
///
/// Ids are only accepted after the provider has handed them out through a
/// lookup or a link, the way a real service only knows ids it issued.
pub struct SimProvider {
    world: StreetWorld,
    state: Mutex<ProviderState>,
}

impl SimProvider {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            world: StreetWorld::new(config),
            state: Mutex::new(ProviderState::default()),
        }
    }

    /// Creates an Arc-wrapped provider for sharing.
    pub fn shared(config: WorldConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn world(&self) -> &StreetWorld {
        &self.world
    }

    /// Starts or ends a full outage.
    pub fn set_outage(&self, outage: bool) {
        self.state().faults.outage = outage;
    }

    /// Fails the next `count` lookups with `LookupUnavailable`.
    pub fn fail_next_lookups(&self, count: u32) {
        self.state().faults.fail_next_lookups = count;
    }

    pub fn stats(&self) -> ProviderStats {
        self.state().stats.clone()
    }

    /// Panorama and point of view the viewer is showing.
    pub fn current_view(&self) -> Option<(PanoId, Pov)> {
        self.state().current.clone()
    }

    fn state(&self) -> MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_outage(state: &mut ProviderState) -> Result<(), NavError> {
        if state.faults.outage {
            state.stats.injected_failures += 1;
            return Err(NavError::unavailable("simulated outage"));
        }
        Ok(())
    }

    fn resolve(state: &ProviderState, pano: &PanoId) -> Result<NodeKey, NavError> {
        state
            .known
            .get(pano)
            .copied()
            .ok_or_else(|| NavError::unknown(pano))
    }
}

#[async_trait]
impl PanoramaProvider for SimProvider {
    async fn lookup(&self, center: Coordinate, radius_m: f64) -> Result<LookupOutcome, NavError> {
        let mut state = self.state();
        Self::check_outage(&mut state)?;
        if state.faults.fail_next_lookups > 0 {
            state.faults.fail_next_lookups -= 1;
            state.stats.injected_failures += 1;
            return Err(NavError::unavailable("simulated lookup failure"));
        }

        state.stats.lookups += 1;
        match self.world.nearest(center, radius_m) {
            Some((key, coordinate)) => {
                let pano = self.world.pano_id(&key);
                state.known.insert(pano.clone(), key);
                Ok(LookupOutcome::Found(PanoramaLocation::new(pano, coordinate)))
            }
            None => {
                state.stats.not_found += 1;
                Ok(LookupOutcome::NotFound)
            }
        }
    }

    async fn links(&self, pano: &PanoId) -> Result<Vec<RawLink>, NavError> {
        let mut state = self.state();
        Self::check_outage(&mut state)?;
        let key = Self::resolve(&state, pano)?;

        let links = self
            .world
            .links(&key)
            .into_iter()
            .map(|link| {
                let id = self.world.pano_id(&link.to);
                state.known.insert(id.clone(), link.to);
                RawLink::new(link.heading, id).with_description(link.label)
            })
            .collect();
        Ok(links)
    }

    async fn set_viewpoint(&self, pano: &PanoId, pov: Pov) -> Result<PanoramaLocation, NavError> {
        let mut state = self.state();
        Self::check_outage(&mut state)?;
        let key = Self::resolve(&state, pano)?;

        state.current = Some((pano.clone(), pov));
        state.stats.viewpoint_changes += 1;
        Ok(PanoramaLocation::new(pano.clone(), self.world.coordinate(&key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense() -> SimProvider {
        SimProvider::new(WorldConfig::default().with_coverage(1.0).with_closed_rate(0.0))
    }

    fn tokyo() -> Coordinate {
        Coordinate::new(35.6595, 139.7005)
    }

    async fn found(provider: &SimProvider) -> PanoramaLocation {
        match provider.lookup(tokyo(), 500.0).await.unwrap() {
            LookupOutcome::Found(location) => location,
            LookupOutcome::NotFound => panic!("dense world should have imagery"),
        }
    }

    #[tokio::test]
    async fn test_lookup_then_links_carry_labels() {
        let provider = dense();
        let location = found(&provider).await;

        let links = provider.links(&location.pano).await.unwrap();
        assert!(!links.is_empty());
        assert!(links.iter().all(|l| l.description.is_some()));
    }

    #[tokio::test]
    async fn test_unknown_id_rejected() {
        let provider = dense();
        let err = provider
            .set_viewpoint(&PanoId::from("not-issued"), Pov::level(0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, NavError::UnknownPanorama(_)));
    }

    #[tokio::test]
    async fn test_link_targets_become_known() {
        let provider = dense();
        let location = found(&provider).await;
        let link = provider.links(&location.pano).await.unwrap().remove(0);

        let next = provider
            .set_viewpoint(&link.pano, Pov::level(link.heading))
            .await
            .unwrap();
        assert_eq!(next.pano, link.pano);
        assert_eq!(provider.current_view(), Some((link.pano, Pov::level(link.heading))));
    }

    #[tokio::test]
    async fn test_fail_next_lookups() {
        let provider = dense();
        provider.fail_next_lookups(2);

        for _ in 0..2 {
            let err = provider.lookup(tokyo(), 500.0).await.unwrap_err();
            assert!(err.is_transient());
        }
        assert!(provider.lookup(tokyo(), 500.0).await.unwrap().is_found());
        assert_eq!(provider.stats().injected_failures, 2);
        assert_eq!(provider.stats().lookups, 1);
    }

    #[tokio::test]
    async fn test_outage_blocks_everything() {
        let provider = dense();
        let location = found(&provider).await;

        provider.set_outage(true);
        assert!(provider.lookup(tokyo(), 500.0).await.is_err());
        assert!(provider.links(&location.pano).await.is_err());
        assert!(provider.set_viewpoint(&location.pano, Pov::level(0.0)).await.is_err());

        provider.set_outage(false);
        assert!(provider.links(&location.pano).await.is_ok());
    }

    #[tokio::test]
    async fn test_ocean_counts_not_found() {
        let provider = SimProvider::new(WorldConfig::default().with_coverage(0.0));
        let outcome = provider.lookup(tokyo(), 500.0).await.unwrap();
        assert!(!outcome.is_found());
        assert_eq!(provider.stats().not_found, 1);
    }
}

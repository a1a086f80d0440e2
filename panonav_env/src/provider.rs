//! Panorama provider abstraction.

use async_trait::async_trait;
use crate::error::NavError;
use crate::types::{Coordinate, LookupOutcome, PanoId, PanoramaLocation, Pov, RawLink};
use std::sync::Arc;

/// The capabilities PanoNav needs from an external street-imagery service.
///
/// # Implementations
///
/// - **Production**: an adapter over the mapping service's API
/// - **Simulation**: `SimProvider` (procedural world) and
///   `ScriptedProvider` (fixed outcome sequences)
///
/// # Flow
///
/// ```text
/// Locator                    Provider                   Session
///   |-- lookup(pt, r) ------->|                           |
///   |<- Found(loc) / NotFound-|                           |
///   |                         |<-- set_viewpoint(id, pov)-|
///   |                         |--- PanoramaLocation ----->|
///   |                         |<-- links(id) -------------|
///   |                         |--- [RawLink] ------------>|-- build_observation
/// ```
#[async_trait]
pub trait PanoramaProvider: Send + Sync + 'static {
    /// Searches for a panorama within `radius_m` metres of `center`.
    ///
    /// # Returns
    /// * `Ok(Found(location))` - the nearest panorama's canonical id and position
    /// * `Ok(NotFound)` - zero results
    /// * `Err(NavError::LookupUnavailable)` - the service failed to answer
    async fn lookup(&self, center: Coordinate, radius_m: f64) -> Result<LookupOutcome, NavError>;

    /// Returns the navigable links of a panorama, labels included.
    ///
    /// An empty vector is a dead end, not an error.
    async fn links(&self, pano: &PanoId) -> Result<Vec<RawLink>, NavError>;

    /// Points the viewer at `pano` with the given point of view.
    ///
    /// # Returns
    /// The canonical location the provider settled on, or
    /// `Err(NavError::UnknownPanorama)` if it rejects the id.
    async fn set_viewpoint(&self, pano: &PanoId, pov: Pov) -> Result<PanoramaLocation, NavError>;
}

#[async_trait]
impl<P: PanoramaProvider + ?Sized> PanoramaProvider for Arc<P> {
    async fn lookup(&self, center: Coordinate, radius_m: f64) -> Result<LookupOutcome, NavError> {
        (**self).lookup(center, radius_m).await
    }

    async fn links(&self, pano: &PanoId) -> Result<Vec<RawLink>, NavError> {
        (**self).links(pano).await
    }

    async fn set_viewpoint(&self, pano: &PanoId, pov: Pov) -> Result<PanoramaLocation, NavError> {
        (**self).set_viewpoint(pano, pov).await
    }
}

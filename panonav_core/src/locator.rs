//! Locator - random teleport with a configurable retry policy.
//!
//! The locator samples a uniformly random point on the globe and asks the
//! provider for a panorama within the search radius. Zero results are not an
//! error: the locator resamples and asks again.
//!
//! # Retry policy
//!
//! ```text
//! attempt 1: sample ─► lookup ─► NotFound ─► [backoff(1)] ─┐
//! attempt 2: sample ─► lookup ─► NotFound ─► [backoff(2)] ─┤
//!    ...                                                   │
//! attempt k: sample ─► lookup ─► Found(loc) ─► Viewpoint { loc, heading 0 }
//! ```
//!
//! The default policy never gives up and never waits, relying on panorama
//! coverage density to terminate quickly. Over open ocean it may spin for a
//! long time; bound it with [`RetryPolicy::bounded`] where that matters.

use crate::observation::Viewpoint;
use panonav_env::{Coordinate, LookupOutcome, NavContext, NavError, PanoramaProvider};

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default search radius around the sampled point, in metres.
pub const DEFAULT_SEARCH_RADIUS_M: f64 = 500.0;

/// Delay inserted between a miss and the next attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Resample immediately
    None,

    /// `min(initial * 2^(attempt - 1), max)`, optionally scaled by a
    /// uniform draw in `[0, 1)` ("full jitter")
    Exponential {
        initial: Duration,
        max: Duration,
        jitter: bool,
    },
}

/// How persistently the locator searches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum lookups before giving up (`None` = unbounded)
    pub max_attempts: Option<u32>,

    /// Delay between misses
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Retry forever, no delay.
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            backoff: Backoff::None,
        }
    }

    /// Give up after `max_attempts` lookups (at least one).
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            backoff: Backoff::None,
        }
    }

    /// Sets exponential backoff.
    pub fn with_exponential_backoff(mut self, initial: Duration, max: Duration, jitter: bool) -> Self {
        self.backoff = Backoff::Exponential { initial, max, jitter };
        self
    }

    /// Returns true once `attempts` lookups have used up the budget.
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(false, |max| attempts >= max)
    }

    pub fn is_jittered(&self) -> bool {
        matches!(self.backoff, Backoff::Exponential { jitter: true, .. })
    }

    /// Delay after the `attempt`-th miss (1-based). `unit` is a uniform draw
    /// in `[0, 1)`, used only when jitter is on.
    pub fn delay_after(&self, attempt: u32, unit: f64) -> Duration {
        match self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Exponential { initial, max, jitter } => {
                let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                let delay = initial.saturating_mul(factor).min(max);
                if jitter {
                    delay.mul_f64(unit.clamp(0.0, 1.0))
                } else {
                    delay
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Configuration for the locator.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorConfig {
    /// Search radius around each sampled point, in metres (default: 500)
    pub search_radius_m: f64,

    /// Retry policy (default: unbounded, no backoff)
    pub retry: RetryPolicy,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            search_radius_m: DEFAULT_SEARCH_RADIUS_M,
            retry: RetryPolicy::default(),
        }
    }
}

impl LocatorConfig {
    /// Sets the search radius.
    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.search_radius_m = radius_m;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Successful locate: where we landed and how many lookups it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub viewpoint: Viewpoint,
    pub attempts: u32,
}

/// Finds a random panorama through the provider.
///
/// Generic over the context and provider implementations, so the same
/// retry loop runs against a live service or a simulated world.
pub struct Locator<Ctx, P>
where
    Ctx: NavContext,
    P: PanoramaProvider,
{
    context: Arc<Ctx>,
    provider: Arc<P>,
    config: LocatorConfig,
}

impl<Ctx, P> Locator<Ctx, P>
where
    Ctx: NavContext,
    P: PanoramaProvider,
{
    pub fn new(context: Arc<Ctx>, provider: Arc<P>, config: LocatorConfig) -> Self {
        Self {
            context,
            provider,
            config,
        }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Searches until a panorama is found or the policy gives up.
    ///
    /// The returned viewpoint has heading 0. Provider failures are not
    /// retried; they propagate as-is.
    pub async fn locate(&self) -> Result<Located, NavError> {
        let radius = self.config.search_radius_m;
        let retry = self.config.retry;
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            let center = Coordinate::sample(self.context.uniform(), self.context.uniform());
            debug!("Teleport attempt {} near {}", attempts, center);

            match self.provider.lookup(center, radius).await? {
                LookupOutcome::Found(location) => {
                    info!(
                        "Teleported to {} at {} after {} attempt(s)",
                        location.pano, location.coordinate, attempts
                    );
                    return Ok(Located {
                        viewpoint: Viewpoint::new(location.pano, location.coordinate, 0.0),
                        attempts,
                    });
                }
                LookupOutcome::NotFound => {
                    debug!("Zero results, retrying...");
                    if retry.exhausted(attempts) {
                        return Err(NavError::RetriesExhausted { attempts });
                    }
                    let unit = if retry.is_jittered() { self.context.uniform() } else { 0.0 };
                    let delay = retry.delay_after(attempts, unit);
                    if !delay.is_zero() {
                        self.context.sleep(delay).await;
                    }
                }
            }
        }
    }

    /// Like [`locate`](Self::locate), returning only the viewpoint.
    pub async fn teleport(&self) -> Result<Viewpoint, NavError> {
        Ok(self.locate().await?.viewpoint)
    }
}

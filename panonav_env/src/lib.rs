//! PanoNav Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the PanoNav
//! navigator to run against a **Production** panorama provider (tokio) or a
//! **Simulated** one (seeded, virtual clock).
//!
//! # Core Concept: Capabilities, not Singletons
//!
//! The navigator never talks to a mapping widget directly. Everything it
//! needs from the outside world is behind two traits:
//! - [`PanoramaProvider`]: lookup, links, set-viewpoint
//! - [`NavContext`]: time, sleep, randomness
//!
//! By deriving all entropy from a single 64-bit seed in simulation, any
//! teleport sequence becomes reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use panonav_env::{NavContext, PanoramaProvider, LookupOutcome};
//!
//! async fn probe<Ctx: NavContext, P: PanoramaProvider>(ctx: &Ctx, provider: &P) {
//!     let center = Coordinate::sample(ctx.uniform(), ctx.uniform());
//!     match provider.lookup(center, 500.0).await {
//!         Ok(LookupOutcome::Found(location)) => println!("{}", location.pano),
//!         Ok(LookupOutcome::NotFound) => println!("ocean"),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

mod context;
mod provider;
mod types;
mod error;
mod tokio_impl;

pub use context::NavContext;
pub use provider::PanoramaProvider;
pub use types::{
    normalize_heading, Coordinate, LookupOutcome, PanoId, PanoramaLocation, Pov, RawLink,
    SessionId,
};
pub use error::NavError;
pub use tokio_impl::TokioContext;

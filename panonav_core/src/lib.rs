//! PanoNav Core - Street-panorama navigation for agents
//!
//! This library turns an external street-imagery provider into a clean,
//! text-free interface for an autonomous agent:
//! 1. **Locator**: teleports to a random panorama, retrying on empty results
//! 2. **Observation Builder**: strips labels and orders moves by heading
//! 3. **Move panel**: arrow-glyph buttons, or a dead-end notice
//!
//! Everything provider-specific lives behind `panonav_env::PanoramaProvider`.

pub mod arrow;
pub mod locator;
pub mod observation;
pub mod render;
pub mod session;

// Re-export key types for convenience
pub use arrow::{heading_to_arrow, Arrow};
pub use locator::{Backoff, Located, Locator, LocatorConfig, RetryPolicy, DEFAULT_SEARCH_RADIUS_M};
pub use observation::{build_observation, MoveAffordance, Observation, Viewpoint};
pub use render::{render_moves, MoveButton, MovePanel, DEAD_END_MESSAGE};
pub use session::{NavSession, SessionConfig, SessionStats};

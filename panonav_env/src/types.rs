//! Common types for the PanoNav environment abstraction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Normalizes a heading in degrees into `[0, 360)`.
///
/// Non-finite input maps to 0 (north).
pub fn normalize_heading(heading: f64) -> f64 {
    if !heading.is_finite() {
        return 0.0;
    }
    let h = heading.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

/// Opaque provider-assigned identifier of a panorama.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanoId(pub String);

impl PanoId {
    /// Creates a PanoId from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for PanoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PanoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for PanoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Maps two uniform draws in `[0, 1)` onto the globe.
    ///
    /// Latitude lands in `[-90, 90)`, longitude in `[-180, 180)`.
    pub fn sample(u_lat: f64, u_lng: f64) -> Self {
        Self {
            lat: u_lat * 180.0 - 90.0,
            lng: u_lng * 360.0 - 180.0,
        }
    }

    /// Returns true if both components are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Point of view sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pov {
    /// Degrees clockwise from north
    pub heading: f64,
    /// Degrees above the horizon
    pub pitch: f64,
}

impl Pov {
    /// A level point of view (pitch 0) facing `heading`.
    pub fn level(heading: f64) -> Self {
        Self { heading, pitch: 0.0 }
    }
}

/// A navigable link as reported by the provider, before redaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLink {
    /// Direction of travel in degrees
    pub heading: f64,

    /// Panorama the link leads to
    pub pano: PanoId,

    /// Human-readable label (street name etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RawLink {
    pub fn new(heading: f64, pano: impl Into<PanoId>) -> Self {
        Self {
            heading,
            pano: pano.into(),
            description: None,
        }
    }

    /// Attaches a human-readable label.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The provider's canonical answer for a panorama.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanoramaLocation {
    pub pano: PanoId,
    pub coordinate: Coordinate,
}

impl PanoramaLocation {
    pub fn new(pano: impl Into<PanoId>, coordinate: Coordinate) -> Self {
        Self {
            pano: pano.into(),
            coordinate,
        }
    }
}

/// Result of a radius lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// A panorama exists within the search radius
    Found(PanoramaLocation),
    /// Zero results
    NotFound,
}

impl LookupOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Unique identifier for a navigation session.
///
/// Uses UUID v4 for global uniqueness without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Creates a new random SessionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic SessionId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 chars for readability
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading(0.0), 0.0);
        assert_eq!(normalize_heading(360.0), 0.0);
        assert_eq!(normalize_heading(-90.0), 270.0);
        assert_eq!(normalize_heading(725.0), 5.0);
        assert_eq!(normalize_heading(f64::NAN), 0.0);
        assert_eq!(normalize_heading(f64::INFINITY), 0.0);

        let tiny = normalize_heading(-1e-20);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn test_coordinate_sample_bounds() {
        let low = Coordinate::sample(0.0, 0.0);
        assert_eq!(low, Coordinate::new(-90.0, -180.0));

        let high = Coordinate::sample(0.999_999, 0.999_999);
        assert!(high.lat < 90.0);
        assert!(high.lng < 180.0);
        assert!(high.is_valid());
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.1).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_session_id_from_seed() {
        assert_eq!(SessionId::from_seed(7), SessionId::from_seed(7));
        assert_ne!(SessionId::from_seed(7), SessionId::from_seed(8));
        assert_eq!(SessionId::from_seed(7).to_string().len(), 8);
    }

    #[test]
    fn test_raw_link_description_serde() {
        let link = RawLink::new(90.0, "abc").with_description("Main St");
        let json = serde_json::to_string(&link).unwrap();
        assert!(json.contains("Main St"));

        let bare: RawLink = serde_json::from_str(r#"{"heading":10.0,"pano":"x"}"#).unwrap();
        assert_eq!(bare.description, None);
        assert_eq!(bare.pano, PanoId::from("x"));
    }
}

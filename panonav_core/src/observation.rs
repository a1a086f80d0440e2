//! Observation Builder
//! ===================
//!
//! Turns the current viewpoint and the provider's raw links into the
//! agent-facing snapshot. Link labels never make it through: an
//! [`Observation`] carries only geometry and opaque identifiers.
//!
//! ```text
//! Viewpoint + [RawLink { heading, pano, description }]
//!          │
//!          ▼  redact, sort by heading (stable)
//! Observation { node, gps, heading, [MoveAffordance { heading, pano }] }
//! ```

use panonav_env::{normalize_heading, Coordinate, NavError, PanoId, RawLink};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// =============================================================================
// VIEWPOINT
// =============================================================================

/// The agent's current panorama, position and heading.
///
/// Replaced wholesale on every teleport or move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    pub node_id: PanoId,
    pub coordinate: Coordinate,
    /// Degrees in `[0, 360)`
    pub heading: f64,
}

impl Viewpoint {
    /// Creates a viewpoint, normalizing the heading into `[0, 360)`.
    pub fn new(node_id: impl Into<PanoId>, coordinate: Coordinate, heading: f64) -> Self {
        Self {
            node_id: node_id.into(),
            coordinate,
            heading: normalize_heading(heading),
        }
    }

    /// Checks that the viewpoint can be observed.
    pub fn validate(&self) -> Result<(), NavError> {
        if self.node_id.is_empty() {
            return Err(NavError::invalid("empty panorama id"));
        }
        if !self.coordinate.is_valid() {
            return Err(NavError::invalid(format!(
                "coordinate out of range: {}",
                self.coordinate
            )));
        }
        if !self.heading.is_finite() {
            return Err(NavError::invalid("non-finite heading"));
        }
        Ok(())
    }
}

// =============================================================================
// OBSERVATION
// =============================================================================

/// A move the agent can take from the current panorama.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveAffordance {
    pub heading: f64,
    #[serde(rename = "next_node_id")]
    pub target_node_id: PanoId,
}

impl From<&RawLink> for MoveAffordance {
    fn from(link: &RawLink) -> Self {
        Self {
            heading: link.heading,
            target_node_id: link.pano.clone(),
        }
    }
}

/// Redacted snapshot of the current viewpoint plus available moves.
///
/// Serializes to:
/// ```text
/// { "current_node_id": "...", "gps": { "lat": .., "lng": .. },
///   "current_heading": .., "available_moves": [{ "heading": .., "next_node_id": ".." }] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "current_node_id")]
    pub node_id: PanoId,

    #[serde(rename = "gps")]
    pub coordinate: Coordinate,

    #[serde(rename = "current_heading")]
    pub heading: f64,

    /// Sorted ascending by heading
    #[serde(rename = "available_moves")]
    pub moves: Vec<MoveAffordance>,
}

impl Observation {
    /// No navigable neighbours. A valid terminal state, not an error.
    pub fn is_dead_end(&self) -> bool {
        self.moves.is_empty()
    }

    /// Compact JSON.
    pub fn to_json(&self) -> Result<String, NavError> {
        serde_json::to_string(self).map_err(|e| NavError::Serialization(e.to_string()))
    }

    /// 2-space indented JSON, the format shown to the rendering collaborator.
    pub fn to_json_pretty(&self) -> Result<String, NavError> {
        serde_json::to_string_pretty(self).map_err(|e| NavError::Serialization(e.to_string()))
    }

    /// Finds the move leading to `target`, if any.
    pub fn move_to(&self, target: &PanoId) -> Option<&MoveAffordance> {
        self.moves.iter().find(|m| &m.target_node_id == target)
    }
}

/// Builds the observation for `viewpoint` from the provider's links.
///
/// Labels are dropped and moves sorted by heading. `sort_by` is stable, so
/// links with equal headings keep their provider order; NaN headings sort last.
pub fn build_observation(viewpoint: &Viewpoint, raw_links: &[RawLink]) -> Observation {
    let mut moves: Vec<MoveAffordance> = raw_links.iter().map(MoveAffordance::from).collect();
    moves.sort_by(|a, b| heading_order(a.heading, b.heading));

    Observation {
        node_id: viewpoint.node_id.clone(),
        coordinate: viewpoint.coordinate,
        heading: viewpoint.heading,
        moves,
    }
}

/// Numeric order, so `-0.0` and `0.0` compare equal. NaN goes last.
fn heading_order(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b)
        .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn viewpoint() -> Viewpoint {
        Viewpoint::new("pano-a", Coordinate::new(48.8584, 2.2945), 0.0)
    }

    fn labelled(heading: f64, pano: &str) -> RawLink {
        RawLink::new(heading, pano).with_description(format!("Avenue {}", pano))
    }

    #[test]
    fn test_viewpoint_normalizes_heading() {
        let vp = Viewpoint::new("x", Coordinate::new(0.0, 0.0), -90.0);
        assert_eq!(vp.heading, 270.0);
        let vp = Viewpoint::new("x", Coordinate::new(0.0, 0.0), 360.0);
        assert_eq!(vp.heading, 0.0);
    }

    #[test]
    fn test_viewpoint_validation() {
        assert!(viewpoint().validate().is_ok());

        let empty = Viewpoint::new("", Coordinate::new(0.0, 0.0), 0.0);
        assert!(matches!(empty.validate(), Err(NavError::InvalidViewpoint(_))));

        let off_globe = Viewpoint::new("x", Coordinate::new(91.0, 0.0), 0.0);
        assert!(matches!(off_globe.validate(), Err(NavError::InvalidViewpoint(_))));
    }

    #[test]
    fn test_moves_sorted_by_heading() {
        let links = vec![
            labelled(270.0, "w"),
            labelled(10.0, "n"),
            labelled(180.0, "s"),
            labelled(95.5, "e"),
        ];
        let obs = build_observation(&viewpoint(), &links);
        let headings: Vec<f64> = obs.moves.iter().map(|m| m.heading).collect();
        assert_eq!(headings, vec![10.0, 95.5, 180.0, 270.0]);
        assert_eq!(obs.moves[0].target_node_id, PanoId::from("n"));
    }

    #[test]
    fn test_equal_headings_keep_order() {
        let links = vec![
            labelled(90.0, "first"),
            labelled(45.0, "before"),
            labelled(90.0, "second"),
        ];
        let obs = build_observation(&viewpoint(), &links);
        let ids: Vec<&str> = obs.moves.iter().map(|m| m.target_node_id.as_str()).collect();
        assert_eq!(ids, vec!["before", "first", "second"]);
    }

    #[test]
    fn test_signed_zero_headings_keep_order() {
        let links = vec![labelled(0.0, "first"), labelled(-0.0, "second")];
        let obs = build_observation(&viewpoint(), &links);
        let ids: Vec<&str> = obs.moves.iter().map(|m| m.target_node_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_heading_order_nan_last() {
        assert_eq!(heading_order(-0.0, 0.0), Ordering::Equal);
        assert_eq!(heading_order(f64::NAN, 359.0), Ordering::Greater);
        assert_eq!(heading_order(1.0, f64::NAN), Ordering::Less);
        assert_eq!(heading_order(f64::NAN, f64::NAN), Ordering::Equal);
    }

    #[test]
    fn test_descriptions_redacted() {
        let links = vec![labelled(0.0, "n"), labelled(180.0, "s")];
        let json = build_observation(&viewpoint(), &links).to_json().unwrap();
        assert!(!json.contains("Avenue"));
        assert!(!json.contains("description"));
    }

    #[test]
    fn test_dead_end() {
        let obs = build_observation(&viewpoint(), &[]);
        assert!(obs.is_dead_end());
        assert!(obs.moves.is_empty());
    }

    #[test]
    fn test_json_field_names() {
        let obs = build_observation(&viewpoint(), &[labelled(90.0, "e")]);
        let value: serde_json::Value = serde_json::from_str(&obs.to_json().unwrap()).unwrap();

        assert_eq!(value["current_node_id"], "pano-a");
        assert_eq!(value["gps"]["lat"], 48.8584);
        assert_eq!(value["gps"]["lng"], 2.2945);
        assert_eq!(value["current_heading"], 0.0);
        assert_eq!(value["available_moves"][0]["heading"], 90.0);
        assert_eq!(value["available_moves"][0]["next_node_id"], "e");
    }

    #[test]
    fn test_pretty_json_indent() {
        let obs = build_observation(&viewpoint(), &[]);
        let pretty = obs.to_json_pretty().unwrap();
        assert!(pretty.contains("\n  \"current_node_id\": \"pano-a\""));
        assert!(pretty.contains("\"available_moves\": []"));
    }

    #[test]
    fn test_nan_heading_sorts_last() {
        let links = vec![RawLink::new(f64::NAN, "odd"), RawLink::new(10.0, "n")];
        let obs = build_observation(&viewpoint(), &links);
        assert_eq!(obs.moves[0].target_node_id, PanoId::from("n"));
        assert_eq!(obs.moves[1].target_node_id, PanoId::from("odd"));
    }

    #[test]
    fn test_move_to() {
        let obs = build_observation(&viewpoint(), &[labelled(90.0, "e")]);
        assert!(obs.move_to(&PanoId::from("e")).is_some());
        assert!(obs.move_to(&PanoId::from("nope")).is_none());
    }

    fn arb_links() -> impl Strategy<Value = Vec<RawLink>> {
        prop::collection::vec(
            (0.0f64..360.0, "[a-z]{1,6}", prop::option::of("[A-Z][a-z]{2,8} (St|Ave|Rd)")),
            0..12,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .map(|(heading, pano, description)| RawLink {
                    heading,
                    pano: PanoId::new(pano),
                    description,
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_non_decreasing(links in arb_links()) {
            let obs = build_observation(&viewpoint(), &links);
            prop_assert_eq!(obs.moves.len(), links.len());
            for pair in obs.moves.windows(2) {
                prop_assert!(pair[0].heading <= pair[1].heading);
            }
        }

        #[test]
        fn prop_idempotent(links in arb_links()) {
            let a = build_observation(&viewpoint(), &links).to_json().unwrap();
            let b = build_observation(&viewpoint(), &links).to_json().unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_no_label_survives(links in arb_links()) {
            let json = build_observation(&viewpoint(), &links).to_json().unwrap();
            prop_assert!(!json.contains("description"));
            for link in &links {
                if let Some(label) = &link.description {
                    prop_assert!(!json.contains(label.as_str()));
                }
            }
        }

        #[test]
        fn prop_stable_for_equal_headings(ids in prop::collection::vec("[a-z]{1,4}", 1..8)) {
            let links: Vec<RawLink> = ids.iter().map(|id| RawLink::new(90.0, id.as_str())).collect();
            let obs = build_observation(&viewpoint(), &links);
            let out: Vec<&str> = obs.moves.iter().map(|m| m.target_node_id.as_str()).collect();
            let expected: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
            prop_assert_eq!(out, expected);
        }
    }
}

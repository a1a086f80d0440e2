//! Move panel rendering.
//!
//! Plain-data form of the directional buttons shown next to the JSON
//! observation: one button per move, labelled with an arrow glyph and the
//! heading rounded to whole degrees.

use crate::arrow::Arrow;
use crate::observation::{MoveAffordance, Observation};
use panonav_env::PanoId;
use serde::Serialize;
use std::fmt;

/// Text shown instead of buttons when there is nowhere to go.
pub const DEAD_END_MESSAGE: &str = "Dead End. Teleport required.";

/// One clickable move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveButton {
    pub arrow: Arrow,

    /// Heading rounded to the nearest whole degree
    pub degrees: i64,

    /// Where the button leads
    pub target: PanoId,

    /// Exact heading to request when the button is pressed
    pub heading: f64,
}

impl MoveButton {
    pub fn from_move(affordance: &MoveAffordance) -> Self {
        Self {
            arrow: Arrow::from_heading(affordance.heading),
            degrees: affordance.heading.round() as i64,
            target: affordance.target_node_id.clone(),
            heading: affordance.heading,
        }
    }

    /// `"{arrow} {degrees}°"`
    pub fn label(&self) -> String {
        format!("{} {}°", self.arrow.glyph(), self.degrees)
    }
}

/// What the move list shows for an observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MovePanel {
    DeadEnd,
    Moves(Vec<MoveButton>),
}

impl MovePanel {
    pub fn is_dead_end(&self) -> bool {
        matches!(self, MovePanel::DeadEnd)
    }

    pub fn buttons(&self) -> &[MoveButton] {
        match self {
            MovePanel::DeadEnd => &[],
            MovePanel::Moves(buttons) => buttons,
        }
    }
}

impl fmt::Display for MovePanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovePanel::DeadEnd => f.write_str(DEAD_END_MESSAGE),
            MovePanel::Moves(buttons) => {
                for (i, button) in buttons.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    f.write_str(&button.label())?;
                }
                Ok(())
            }
        }
    }
}

/// Renders the move list. Buttons follow the observation's heading order.
pub fn render_moves(observation: &Observation) -> MovePanel {
    if observation.is_dead_end() {
        return MovePanel::DeadEnd;
    }
    MovePanel::Moves(observation.moves.iter().map(MoveButton::from_move).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{build_observation, Viewpoint};
    use panonav_env::{Coordinate, RawLink};

    fn observe(links: &[RawLink]) -> Observation {
        let vp = Viewpoint::new("here", Coordinate::new(35.6595, 139.7005), 0.0);
        build_observation(&vp, links)
    }

    #[test]
    fn test_dead_end_panel() {
        let panel = render_moves(&observe(&[]));
        assert!(panel.is_dead_end());
        assert!(panel.buttons().is_empty());
        assert_eq!(panel.to_string(), "Dead End. Teleport required.");
    }

    #[test]
    fn test_labels_in_heading_order() {
        let panel = render_moves(&observe(&[
            RawLink::new(268.7, "w").with_description("Dogenzaka"),
            RawLink::new(0.4, "n"),
            RawLink::new(91.2, "e"),
        ]));

        let labels: Vec<String> = panel.buttons().iter().map(MoveButton::label).collect();
        assert_eq!(labels, vec!["↑ 0°", "→ 91°", "← 269°"]);
        assert_eq!(panel.to_string(), "↑ 0°\n→ 91°\n← 269°");
    }

    #[test]
    fn test_button_keeps_exact_heading() {
        let panel = render_moves(&observe(&[RawLink::new(359.6, "n")]));
        let button = &panel.buttons()[0];
        assert_eq!(button.degrees, 360);
        assert_eq!(button.arrow, Arrow::North);
        assert_eq!(button.heading, 359.6);
        assert_eq!(button.target, PanoId::from("n"));
    }
}

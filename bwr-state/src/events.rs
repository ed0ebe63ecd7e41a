//! Events emitted by the map and chart collaborators.

use crate::action::Action;
use bwr_core::point::{LatLon, PointId, PointUpdate};

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Click on empty map: place a new point.
    Click(LatLon),
    PointDragged { id: PointId, position: LatLon },
    ReferenceDragged(LatLon),
}

impl MapEvent {
    pub fn into_action(self) -> Action {
        match self {
            MapEvent::Click(position) => Action::add_point(position, None),
            MapEvent::PointDragged { id, position } => Action::UpdateTimeSeriesPoint {
                id,
                update: PointUpdate::move_to(position),
            },
            MapEvent::ReferenceDragged(position) => Action::SetRefMarkerPosition(position),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartEvent {
    /// A sample on the chart was clicked; jump the map to its time step.
    PointClicked { index: usize },
}

impl ChartEvent {
    pub fn into_action(self) -> Action {
        match self {
            ChartEvent::PointClicked { index } => Action::SetTimeIndex(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation() {
        let position = LatLon::new(1.0, 2.0);
        assert!(matches!(
            MapEvent::Click(position).into_action(),
            Action::AddTimeSeriesPoint { position: p, name: None, .. } if p == position
        ));
        assert_eq!(
            MapEvent::ReferenceDragged(position).into_action(),
            Action::SetRefMarkerPosition(position)
        );
        assert_eq!(
            ChartEvent::PointClicked { index: 4 }.into_action(),
            Action::SetTimeIndex(4)
        );
    }
}

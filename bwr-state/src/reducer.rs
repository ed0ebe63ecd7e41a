//! The reducer: every state change goes through [`reduce`].
//!
//! All actions are total. An action naming a missing point or dataset leaves
//! the state untouched, and nothing here performs I/O.

use crate::action::Action;
use crate::state::{AppState, ReferenceSeries};
use bwr_core::point::{next_color, TimeSeriesPoint};
use log::debug;

/// Apply one action to the state.
pub fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::SetCatalog(catalog) => {
            state.catalog = catalog;
            let current_is_known = state
                .current_dataset
                .as_deref()
                .is_some_and(|id| state.catalog.contains(id));
            if !current_is_known {
                state.current_dataset = state.catalog.first_id().map(str::to_string);
                state.time_index = 0;
            }
            let catalog = &state.catalog;
            state.ref_values.retain(|id, _| catalog.contains(id));
            state.series_labels.retain(|id, _| catalog.contains(id));
            place_reference_if_unset(state);
        }
        Action::AddTimeSeriesPoint { id, position, name } => {
            if state.point(&id).is_some() {
                debug!("reducer: point id {} already taken, ignoring add", id);
                return;
            }
            let color = next_color(&state.points);
            let name = name.unwrap_or_else(|| default_point_name(&state.points));
            state
                .points
                .push(TimeSeriesPoint::new(id.clone(), name, position, color));
            state.selected_point = Some(id);
        }
        Action::RemoveTimeSeriesPoint(id) => {
            state.points.retain(|p| p.id != id);
            if state.selected_point.as_ref() == Some(&id) {
                state.selected_point = None;
            }
        }
        Action::UpdateTimeSeriesPoint { id, update } => {
            if let Some(point) = state.point_mut(&id) {
                update.apply_to(point);
            }
        }
        Action::SetPointData {
            id,
            dataset_id,
            series,
        } => {
            if let Some(point) = state.point_mut(&id) {
                point.data.insert(dataset_id, series);
            }
        }
        Action::SetSeriesLabels { dataset_id, labels } => {
            if state.catalog.contains(&dataset_id) {
                state.series_labels.insert(dataset_id, labels);
            }
        }
        Action::SetPointTrendData {
            id,
            dataset_id,
            trend,
        } => {
            if let Some(point) = state.point_mut(&id) {
                point.trends.insert(dataset_id, trend);
            }
        }
        Action::SetRefMarkerPosition(position) => {
            if position.is_valid() {
                state.ref_marker = Some(position);
            }
        }
        Action::SetCurrentDataset(dataset_id) => {
            if state.catalog.contains(&dataset_id) {
                state.current_dataset = Some(dataset_id);
                place_reference_if_unset(state);
            }
        }
        Action::SetTimeIndex(index) => state.time_index = index,
        Action::SetRefValues {
            dataset_id,
            position,
            values,
        } => {
            if state.catalog.contains(&dataset_id) {
                state
                    .ref_values
                    .insert(dataset_id, ReferenceSeries { position, values });
            }
        }
        Action::SetColormap(colormap) => state.display.colormap = colormap,
        Action::SetVmin(vmin) => {
            if vmin.is_finite() {
                state.display.vmin = vmin;
            }
        }
        Action::SetVmax(vmax) => {
            if vmax.is_finite() {
                state.display.vmax = vmax;
            }
        }
        Action::SetOpacity(opacity) => {
            if opacity.is_finite() {
                state.display.opacity = opacity.clamp(0.0, 1.0);
            }
        }
        Action::SetBasemap(basemap) => state.display.basemap = basemap,
        Action::ToggleChart => state.show_chart = !state.show_chart,
        Action::ToggleTrends => state.show_trends = !state.show_trends,
        Action::SetSelectedPoint(selection) => match selection {
            Some(id) if state.point(&id).is_none() => {}
            selection => state.selected_point = selection,
        },
    }
}

/// First "Point N" name, counting from 1, that no live point carries.
fn default_point_name(points: &[TimeSeriesPoint]) -> String {
    (1..)
        .map(|n| format!("Point {}", n))
        .find(|name| points.iter().all(|p| &p.name != name))
        .unwrap_or_default()
}

/// Put the reference marker at the current dataset's center if it has none.
fn place_reference_if_unset(state: &mut AppState) {
    if state.ref_marker.is_none() {
        state.ref_marker = state.current_entry().and_then(|entry| entry.center());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bwr_core::catalog::{Catalog, DatasetEntry};
    use bwr_core::point::{LatLon, PointId, PointUpdate, PALETTE};
    use bwr_core::trend::TrendStatistic;

    fn add(state: &mut AppState, id: &str, lat: f64, lon: f64) {
        reduce(
            state,
            Action::AddTimeSeriesPoint {
                id: PointId::from(id),
                position: LatLon::new(lat, lon),
                name: None,
            },
        );
    }

    fn catalog() -> Catalog {
        let mut a = DatasetEntry::new("A", vec!["t0".into(), "t1".into(), "t2".into()]);
        a.uses_spatial_ref = true;
        a.algorithm = Some("shift".to_string());
        a.latlon_bounds = Some([-120.0, 34.0, -118.0, 36.0]);
        let b = DatasetEntry::new("B", vec!["t0".into()]);
        [a, b].into_iter().collect()
    }

    #[test]
    fn test_add_assigns_distinct_colors_and_selects() {
        let mut state = AppState::new();
        for i in 0..PALETTE.len() {
            add(&mut state, &format!("p{}", i), i as f64, 0.0);
        }
        let mut colors: Vec<&str> = state.points.iter().map(|p| p.color.as_str()).collect();
        colors.sort();
        colors.dedup();
        assert_eq!(colors.len(), PALETTE.len());
        assert_eq!(state.selected_point, Some(PointId::from("p9")));
        assert_eq!(state.points[0].name, "Point 1");
    }

    #[test]
    fn test_freed_color_is_reused() {
        let mut state = AppState::new();
        add(&mut state, "a", 10.0, 20.0);
        add(&mut state, "b", 30.0, 40.0);
        assert_eq!(state.points[0].color, PALETTE[0]);
        assert_eq!(state.points[1].color, PALETTE[1]);

        reduce(&mut state, Action::RemoveTimeSeriesPoint(PointId::from("a")));
        add(&mut state, "c", 50.0, 60.0);
        assert_eq!(state.point(&PointId::from("c")).unwrap().color, PALETTE[0]);
    }

    #[test]
    fn test_duplicate_id_is_ignored() {
        let mut state = AppState::new();
        add(&mut state, "a", 10.0, 20.0);
        let before = state.clone();
        add(&mut state, "a", 11.0, 21.0);
        assert_eq!(state, before);
    }

    #[test]
    fn test_remove_selected_clears_selection() {
        let mut state = AppState::new();
        add(&mut state, "a", 10.0, 20.0);
        add(&mut state, "b", 30.0, 40.0);
        assert_eq!(state.selected_point, Some(PointId::from("b")));

        reduce(&mut state, Action::RemoveTimeSeriesPoint(PointId::from("b")));
        assert_eq!(state.selected_point, None);
        assert_eq!(state.points.len(), 1);
    }

    #[test]
    fn test_remove_unselected_keeps_selection() {
        let mut state = AppState::new();
        add(&mut state, "a", 10.0, 20.0);
        add(&mut state, "b", 30.0, 40.0);
        reduce(&mut state, Action::RemoveTimeSeriesPoint(PointId::from("a")));
        assert_eq!(state.selected_point, Some(PointId::from("b")));
    }

    #[test]
    fn test_missing_ids_are_no_ops() {
        let mut state = AppState::new();
        reduce(&mut state, Action::SetCatalog(catalog()));
        add(&mut state, "a", 10.0, 20.0);
        let before = state.clone();

        let ghost = PointId::from("ghost");
        reduce(&mut state, Action::RemoveTimeSeriesPoint(ghost.clone()));
        reduce(
            &mut state,
            Action::UpdateTimeSeriesPoint {
                id: ghost.clone(),
                update: PointUpdate::rename("x"),
            },
        );
        reduce(
            &mut state,
            Action::SetPointData {
                id: ghost.clone(),
                dataset_id: "A".to_string(),
                series: vec![Some(1.0)],
            },
        );
        reduce(&mut state, Action::SetSelectedPoint(Some(ghost)));
        reduce(&mut state, Action::SetCurrentDataset("nope".to_string()));
        reduce(
            &mut state,
            Action::SetRefValues {
                dataset_id: "nope".to_string(),
                position: LatLon::new(0.0, 0.0),
                values: vec![],
            },
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_update_merges_fields() {
        let mut state = AppState::new();
        add(&mut state, "a", 10.0, 20.0);
        reduce(
            &mut state,
            Action::UpdateTimeSeriesPoint {
                id: PointId::from("a"),
                update: PointUpdate::visibility(false),
            },
        );
        let point = state.point(&PointId::from("a")).unwrap();
        assert!(!point.visible);
        assert_eq!(point.position, LatLon::new(10.0, 20.0));
        assert_eq!(point.name, "Point 1");
    }

    #[test]
    fn test_set_point_data_is_per_dataset_and_idempotent() {
        let mut state = AppState::new();
        add(&mut state, "a", 10.0, 20.0);
        let set = |dataset: &str, series: Vec<Option<f64>>| Action::SetPointData {
            id: PointId::from("a"),
            dataset_id: dataset.to_string(),
            series,
        };
        reduce(&mut state, set("A", vec![Some(1.0), None]));
        reduce(&mut state, set("B", vec![Some(9.0)]));
        let once = state.clone();
        reduce(&mut state, set("B", vec![Some(9.0)]));
        assert_eq!(state, once);

        let point = state.point(&PointId::from("a")).unwrap();
        assert_eq!(point.series("A"), Some(&vec![Some(1.0), None]));
        assert_eq!(point.series("B"), Some(&vec![Some(9.0)]));
    }

    #[test]
    fn test_set_trend_keeps_other_datasets() {
        let mut state = AppState::new();
        add(&mut state, "a", 10.0, 20.0);
        let trend = TrendStatistic {
            slope: 0.1,
            intercept: 0.0,
            r_squared: 0.5,
            mm_per_year: 36.5,
        };
        for dataset in ["A", "B"] {
            reduce(
                &mut state,
                Action::SetPointTrendData {
                    id: PointId::from("a"),
                    dataset_id: dataset.to_string(),
                    trend,
                },
            );
        }
        assert_eq!(state.points[0].trends.len(), 2);
    }

    #[test]
    fn test_set_catalog_selects_first_and_places_reference() {
        let mut state = AppState::new();
        reduce(&mut state, Action::SetCatalog(catalog()));
        assert_eq!(state.current_dataset.as_deref(), Some("A"));
        assert_eq!(state.ref_marker, Some(LatLon::new(35.0, -119.0)));

        reduce(&mut state, Action::SetCurrentDataset("B".to_string()));
        reduce(&mut state, Action::SetTimeIndex(7));
        // reloading a catalog that still has B keeps the selection
        reduce(&mut state, Action::SetCatalog(catalog()));
        assert_eq!(state.current_dataset.as_deref(), Some("B"));
        assert_eq!(state.time_index, 7);
        assert_eq!(state.clamped_time_index(), 0);
    }

    #[test]
    fn test_empty_catalog_clears_dataset() {
        let mut state = AppState::new();
        reduce(&mut state, Action::SetCatalog(catalog()));
        reduce(&mut state, Action::SetCatalog(Catalog::default()));
        assert_eq!(state.current_dataset, None);
        assert_eq!(state.current_entry(), None);
        assert_eq!(state.clamped_time_index(), 0);
    }

    #[test]
    fn test_display_controls() {
        let mut state = AppState::new();
        reduce(&mut state, Action::SetOpacity(1.7));
        assert_eq!(state.display.opacity, 1.0);
        reduce(&mut state, Action::SetVmin(f64::NAN));
        assert_eq!(state.display.vmin, -0.05);
        reduce(&mut state, Action::SetVmax(3.0));
        assert_eq!(state.display.vmax, 3.0);
        reduce(&mut state, Action::ToggleTrends);
        assert!(state.show_trends);
        reduce(&mut state, Action::ToggleChart);
        assert!(!state.show_chart);
    }

    #[test]
    fn test_reference_freshness() {
        let mut state = AppState::new();
        reduce(&mut state, Action::SetCatalog(catalog()));
        let marker = state.ref_marker.unwrap();
        reduce(
            &mut state,
            Action::SetRefValues {
                dataset_id: "A".to_string(),
                position: marker,
                values: vec![Some(1.0), Some(2.0), Some(3.0)],
            },
        );
        assert!(state.reference_is_fresh("A"));

        reduce(&mut state, Action::SetRefMarkerPosition(LatLon::new(35.5, -119.5)));
        assert!(!state.reference_is_fresh("A"));
        // stale entries stay cached until refreshed, but are not served
        assert_eq!(state.reference_series("A").unwrap().len(), 3);
        assert_eq!(state.fresh_reference_series("A"), None);
    }

    #[test]
    fn test_default_names_skip_taken_ones() {
        let mut state = AppState::new();
        add(&mut state, "a", 10.0, 20.0);
        add(&mut state, "b", 30.0, 40.0);
        reduce(&mut state, Action::RemoveTimeSeriesPoint(PointId::from("a")));
        add(&mut state, "c", 50.0, 60.0);
        assert_eq!(state.point(&PointId::from("b")).unwrap().name, "Point 2");
        assert_eq!(state.point(&PointId::from("c")).unwrap().name, "Point 1");
        add(&mut state, "d", 1.0, 2.0);
        assert_eq!(state.point(&PointId::from("d")).unwrap().name, "Point 3");
    }

    #[test]
    fn test_series_labels_only_for_known_datasets() {
        let mut state = AppState::new();
        reduce(&mut state, Action::SetCatalog(catalog()));
        let labels = vec!["2020-01-01".to_string()];
        for dataset_id in ["A", "nope"] {
            reduce(
                &mut state,
                Action::SetSeriesLabels {
                    dataset_id: dataset_id.to_string(),
                    labels: labels.clone(),
                },
            );
        }
        assert_eq!(state.series_labels.get("A"), Some(&labels));
        assert!(!state.series_labels.contains_key("nope"));
    }
}

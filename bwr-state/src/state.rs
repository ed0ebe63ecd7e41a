//! The application snapshot consumed by the map and chart views.
//!
//! `AppState` is owned by an [`AppStore`](crate::store::AppStore) and is only
//! ever changed by [`reduce`](crate::reducer::reduce).

use bwr_core::catalog::{Catalog, DatasetEntry};
use bwr_core::point::{LatLon, PointId, TimeSeriesPoint};
use bwr_core::series::Series;
use std::collections::HashMap;

/// Live values of the display controls.
///
/// These are transient. When a dataset becomes current, durable values saved
/// for it replace the colormap and range.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayPreferences {
    pub colormap: String,
    pub vmin: f64,
    pub vmax: f64,
    /// Raster layer opacity in `[0, 1]`.
    pub opacity: f64,
    pub basemap: String,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            colormap: "rdbu_r".to_string(),
            vmin: -0.05,
            vmax: 0.05,
            opacity: 1.0,
            basemap: "esri_world_imagery".to_string(),
        }
    }
}

/// The reference location's series for one dataset, along with the position
/// it was fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSeries {
    pub position: LatLon,
    pub values: Series,
}

/// Single authoritative snapshot of the client.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub catalog: Catalog,
    pub current_dataset: Option<String>,
    /// Raw time index as last set. Consumers clamp it against the dataset.
    pub time_index: usize,
    /// Point registry, in insertion order.
    pub points: Vec<TimeSeriesPoint>,
    pub selected_point: Option<PointId>,
    pub ref_marker: Option<LatLon>,
    /// Reference series cache keyed by dataset id.
    pub ref_values: HashMap<String, ReferenceSeries>,
    /// Time labels of the last accepted batched response, per dataset.
    pub series_labels: HashMap<String, Vec<String>>,
    pub display: DisplayPreferences,
    pub show_chart: bool,
    pub show_trends: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Create an empty state with default display settings.
    pub fn new() -> Self {
        Self {
            catalog: Catalog::default(),
            current_dataset: None,
            time_index: 0,
            points: Vec::new(),
            selected_point: None,
            ref_marker: None,
            ref_values: HashMap::new(),
            series_labels: HashMap::new(),
            display: DisplayPreferences::default(),
            show_chart: true,
            show_trends: false,
        }
    }

    /// Catalog entry of the current dataset.
    pub fn current_entry(&self) -> Option<&DatasetEntry> {
        self.current_dataset
            .as_deref()
            .and_then(|id| self.catalog.get(id))
    }

    /// Current time index clamped to the current dataset's time axis.
    pub fn clamped_time_index(&self) -> usize {
        self.current_entry()
            .map(|entry| entry.clamp_time_index(self.time_index))
            .unwrap_or(0)
    }

    pub fn point(&self, id: &PointId) -> Option<&TimeSeriesPoint> {
        self.points.iter().find(|p| &p.id == id)
    }

    pub(crate) fn point_mut(&mut self, id: &PointId) -> Option<&mut TimeSeriesPoint> {
        self.points.iter_mut().find(|p| &p.id == id)
    }

    pub fn visible_points(&self) -> impl Iterator<Item = &TimeSeriesPoint> {
        self.points.iter().filter(|p| p.visible)
    }

    /// Cached reference series for a dataset, whatever position it was
    /// fetched for.
    pub fn reference_series(&self, dataset_id: &str) -> Option<&Series> {
        self.ref_values.get(dataset_id).map(|r| &r.values)
    }

    /// Cached reference series for a dataset, only if it was fetched for
    /// the live reference marker.
    pub fn fresh_reference_series(&self, dataset_id: &str) -> Option<&Series> {
        if self.reference_is_fresh(dataset_id) {
            self.reference_series(dataset_id)
        } else {
            None
        }
    }

    /// True if the cached reference series for a dataset matches the live
    /// reference marker.
    pub fn reference_is_fresh(&self, dataset_id: &str) -> bool {
        match (self.ref_values.get(dataset_id), self.ref_marker) {
            (Some(cached), Some(marker)) => cached.position == marker,
            _ => false,
        }
    }
}

//! Named actions accepted by the reducer.

use bwr_core::catalog::Catalog;
use bwr_core::point::{LatLon, PointId, PointUpdate};
use bwr_core::series::Series;
use bwr_core::trend::TrendStatistic;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetCatalog(Catalog),
    /// Insert and select a new point. The id is allocated by the caller so
    /// the reducer stays deterministic; see [`Action::add_point`].
    AddTimeSeriesPoint {
        id: PointId,
        position: LatLon,
        name: Option<String>,
    },
    RemoveTimeSeriesPoint(PointId),
    UpdateTimeSeriesPoint {
        id: PointId,
        update: PointUpdate,
    },
    SetPointData {
        id: PointId,
        dataset_id: String,
        series: Series,
    },
    /// Time labels that came with an accepted batched response.
    SetSeriesLabels {
        dataset_id: String,
        labels: Vec<String>,
    },
    SetPointTrendData {
        id: PointId,
        dataset_id: String,
        trend: TrendStatistic,
    },
    SetRefMarkerPosition(LatLon),
    SetCurrentDataset(String),
    SetTimeIndex(usize),
    SetRefValues {
        dataset_id: String,
        position: LatLon,
        values: Series,
    },
    SetColormap(String),
    SetVmin(f64),
    SetVmax(f64),
    SetOpacity(f64),
    SetBasemap(String),
    ToggleChart,
    ToggleTrends,
    SetSelectedPoint(Option<PointId>),
}

impl Action {
    /// `AddTimeSeriesPoint` with a freshly generated id.
    pub fn add_point(position: LatLon, name: Option<&str>) -> Self {
        Action::AddTimeSeriesPoint {
            id: PointId::generate(),
            position,
            name: name.map(str::to_string),
        }
    }
}

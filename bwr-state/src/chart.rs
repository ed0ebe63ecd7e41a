//! Payload handed to the chart collaborator.

use crate::state::AppState;
use bwr_core::point::PointId;
use bwr_core::series::Series;
use bwr_core::trend::TrendStatistic;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub point_id: PointId,
    pub label: String,
    pub data: Series,
    pub border_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendStatistic>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
    /// Clamped time index, for the "current step" marker.
    pub time_index: usize,
}

/// Build the chart payload for the current dataset.
///
/// Labels are the ones the server sent with the last accepted series, or
/// the catalog's time labels before any. Only visible points that already
/// hold a series for the dataset are included; trends are attached when
/// the trend toggle is on.
pub fn chart_data(state: &AppState) -> Option<ChartData> {
    let entry = state.current_entry()?;
    let datasets = state
        .visible_points()
        .filter_map(|point| {
            let data = point.series(&entry.id)?;
            Some(ChartDataset {
                point_id: point.id.clone(),
                label: point.name.clone(),
                data: data.clone(),
                border_color: point.color.clone(),
                trend: if state.show_trends {
                    point.trend(&entry.id).copied()
                } else {
                    None
                },
            })
        })
        .collect();
    Some(ChartData {
        labels: state
            .series_labels
            .get(&entry.id)
            .unwrap_or(&entry.time_labels)
            .clone(),
        datasets,
        time_index: state.clamped_time_index(),
    })
}

//! Payloads for the single-point and batched multi-point series endpoints.
//!
//! The server writes NaN samples as `null`, so a series is a vector of
//! optional values aligned with the dataset's time labels.

use crate::catalog::deserialize_labels;
use crate::point::{LatLon, PointId};
use crate::trend::TrendStatistic;
use serde::{Deserialize, Serialize};

pub type Series = Vec<Option<f64>>;

/// One point in a batched series request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointQuery {
    pub id: PointId,
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub color: String,
}

/// Body of `POST multi_point`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiPointRequest {
    pub points: Vec<PointQuery>,
    pub dataset_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_lat: Option<f64>,
    pub calculate_trends: bool,
}

impl MultiPointRequest {
    pub fn reference(&self) -> Option<LatLon> {
        match (self.ref_lat, self.ref_lon) {
            (Some(lat), Some(lon)) => Some(LatLon::new(lat, lon)),
            _ => None,
        }
    }
}

/// One point's entry in a batched series response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDataset {
    pub point_id: PointId,
    #[serde(default)]
    pub label: String,
    pub data: Series,
    #[serde(default)]
    pub border_color: Option<String>,
    #[serde(default)]
    pub trend: Option<TrendStatistic>,
}

/// Response of `POST multi_point`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MultiPointResponse {
    #[serde(deserialize_with = "deserialize_labels")]
    pub labels: Vec<String>,
    pub datasets: Vec<SeriesDataset>,
}

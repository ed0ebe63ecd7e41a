//! Time series points placed on the map, plus the color and id policies
//! that govern the point registry.

use crate::series::Series;
use crate::trend::TrendStatistic;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Fixed display palette for time series points.
///
/// Colors are handed out in order, skipping ones already in use. Once every
/// color is taken, assignment falls back to `PALETTE[count % PALETTE.len()]`,
/// so two live points may share a color past this size.
pub const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Length of the random part of a generated point id.
const ID_SUFFIX_LEN: usize = 6;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True if both coordinates lie within the ranges the server accepts.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lon)
    }
}

/// Parse `"lat,lon"`.
impl FromStr for LatLon {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("expected 'lat,lon', got '{}'", s))?;
        let position = LatLon::new(lat.trim().parse()?, lon.trim().parse()?);
        if !position.is_valid() {
            anyhow::bail!("position out of range: {}", s);
        }
        Ok(position)
    }
}

/// Client-generated point identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(String);

impl PointId {
    /// Time-based prefix plus a random alphanumeric suffix.
    ///
    /// Unique with high probability within one session; no guarantee across
    /// sessions.
    pub fn generate() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ID_SUFFIX_LEN)
            .map(char::from)
            .collect();
        Self(format!("{:x}-{}", Utc::now().timestamp_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PointId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-placed marker whose per-dataset series is charted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub id: PointId,
    pub name: String,
    pub position: LatLon,
    pub color: String,
    pub visible: bool,
    /// Fetched series keyed by dataset id, aligned to that dataset's labels.
    pub data: HashMap<String, Series>,
    /// Fitted trends keyed by dataset id.
    pub trends: HashMap<String, TrendStatistic>,
}

impl TimeSeriesPoint {
    pub fn new(id: PointId, name: String, position: LatLon, color: &str) -> Self {
        Self {
            id,
            name,
            position,
            color: color.to_string(),
            visible: true,
            data: HashMap::new(),
            trends: HashMap::new(),
        }
    }

    pub fn series(&self, dataset_id: &str) -> Option<&Series> {
        self.data.get(dataset_id)
    }

    pub fn trend(&self, dataset_id: &str) -> Option<&TrendStatistic> {
        self.trends.get(dataset_id)
    }
}

/// Partial update for a point. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointUpdate {
    pub name: Option<String>,
    pub position: Option<LatLon>,
    pub color: Option<String>,
    pub visible: Option<bool>,
}

impl PointUpdate {
    pub fn rename(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn move_to(position: LatLon) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    pub fn visibility(visible: bool) -> Self {
        Self {
            visible: Some(visible),
            ..Default::default()
        }
    }

    /// Shallow-merge the set fields into `point`.
    pub fn apply_to(&self, point: &mut TimeSeriesPoint) {
        if let Some(name) = &self.name {
            point.name = name.clone();
        }
        if let Some(position) = self.position {
            point.position = position;
        }
        if let Some(color) = &self.color {
            point.color = color.clone();
        }
        if let Some(visible) = self.visible {
            point.visible = visible;
        }
    }
}

/// Pick the color for a new point given the live point set.
///
/// Returns the first palette color not used by any existing point, or
/// `PALETTE[existing.len() % PALETTE.len()]` when all are taken.
pub fn next_color(existing: &[TimeSeriesPoint]) -> &'static str {
    PALETTE
        .iter()
        .find(|color| !existing.iter().any(|p| p.color == **color))
        .copied()
        .unwrap_or(PALETTE[existing.len() % PALETTE.len()])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_with_color(color: &str) -> TimeSeriesPoint {
        TimeSeriesPoint::new(
            PointId::generate(),
            "p".to_string(),
            LatLon::new(0.0, 0.0),
            color,
        )
    }

    #[test]
    fn test_next_color_skips_used() {
        assert_eq!(next_color(&[]), PALETTE[0]);
        let existing = vec![point_with_color(PALETTE[0]), point_with_color(PALETTE[2])];
        assert_eq!(next_color(&existing), PALETTE[1]);
    }

    #[test]
    fn test_next_color_reuses_freed_color() {
        let existing = vec![point_with_color(PALETTE[1])];
        assert_eq!(next_color(&existing), PALETTE[0]);
    }

    #[test]
    fn test_next_color_cycles_when_exhausted() {
        let mut existing: Vec<TimeSeriesPoint> =
            PALETTE.iter().map(|c| point_with_color(c)).collect();
        assert_eq!(next_color(&existing), PALETTE[0]);

        existing.push(point_with_color(PALETTE[0]));
        existing.push(point_with_color(PALETTE[1]));
        assert_eq!(existing.len(), 12);
        assert_eq!(next_color(&existing), PALETTE[2]);
    }

    #[test]
    fn test_generated_ids_differ() {
        let a = PointId::generate();
        let b = PointId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().contains('-'));
    }

    #[test]
    fn test_parse_latlon() {
        let p: LatLon = "10.5, -20.25".parse().unwrap();
        assert_eq!(p, LatLon::new(10.5, -20.25));
        assert!("91,0".parse::<LatLon>().is_err());
        assert!("10".parse::<LatLon>().is_err());
        assert!("a,b".parse::<LatLon>().is_err());
    }

    #[test]
    fn test_point_update_is_shallow() {
        let mut point = point_with_color(PALETTE[0]);
        point.data.insert("A".to_string(), vec![Some(1.0)]);
        PointUpdate::rename("Well 7").apply_to(&mut point);
        assert_eq!(point.name, "Well 7");
        assert_eq!(point.color, PALETTE[0]);
        assert!(point.visible);
        assert_eq!(point.series("A"), Some(&vec![Some(1.0)]));
    }
}

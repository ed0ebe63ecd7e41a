use crate::point::LatLon;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Name of the raster correction that subtracts the reference location's value.
pub const SHIFT_ALGORITHM: &str = "shift";

/// One raster group served by the `/datasets` endpoint.
///
/// Entries are read-only once the catalog is loaded. The server reports the
/// time axis as `x_values`; older configs call it `time_labels`. Both are
/// accepted, and integer labels (used when file names carry no dates) are
/// stringified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    /// Dataset id. Filled from the catalog key when the payload omits it.
    #[serde(default, alias = "name")]
    pub id: String,
    #[serde(default, alias = "x_values", deserialize_with = "deserialize_labels")]
    pub time_labels: Vec<String>,
    #[serde(default)]
    pub file_list: Vec<String>,
    #[serde(default)]
    pub mask_file_list: Vec<String>,
    #[serde(default)]
    pub mask_min_value: Option<f64>,
    /// Geographic `(left, bottom, right, top)` bounds.
    #[serde(default)]
    pub latlon_bounds: Option<[f64; 4]>,
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub nodata: Option<f64>,
    #[serde(default)]
    pub uses_spatial_ref: bool,
}

impl DatasetEntry {
    /// Create an entry with only an id and a time axis.
    pub fn new(id: &str, time_labels: Vec<String>) -> Self {
        Self {
            id: id.to_string(),
            time_labels,
            file_list: Vec::new(),
            mask_file_list: Vec::new(),
            mask_min_value: None,
            latlon_bounds: None,
            algorithm: None,
            nodata: None,
            uses_spatial_ref: false,
        }
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.time_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_labels.is_empty()
    }

    /// Clamp a time index into `[0, len - 1]`. An empty time axis clamps to 0.
    pub fn clamp_time_index(&self, time_index: usize) -> usize {
        time_index.min(self.len().saturating_sub(1))
    }

    /// Label at a time index, if the axis has one there.
    pub fn time_label(&self, time_index: usize) -> Option<&str> {
        self.time_labels.get(time_index).map(String::as_str)
    }

    pub fn file_for(&self, time_index: usize) -> Option<&str> {
        self.file_list.get(time_index).map(String::as_str)
    }

    pub fn mask_for(&self, time_index: usize) -> Option<&str> {
        self.mask_file_list.get(time_index).map(String::as_str)
    }

    /// True when raster tiles for this dataset need the reference shift.
    pub fn uses_shift(&self) -> bool {
        self.algorithm.as_deref() == Some(SHIFT_ALGORITHM)
    }

    /// Center of the geographic bounds.
    pub fn center(&self) -> Option<LatLon> {
        self.latlon_bounds.map(|[left, bottom, right, top]| LatLon {
            lat: (bottom + top) / 2.0,
            lon: (left + right) / 2.0,
        })
    }
}

/// The set of datasets available on the server, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, DatasetEntry>")]
pub struct Catalog {
    entries: BTreeMap<String, DatasetEntry>,
}

impl From<BTreeMap<String, DatasetEntry>> for Catalog {
    fn from(mut entries: BTreeMap<String, DatasetEntry>) -> Self {
        for (key, entry) in entries.iter_mut() {
            if entry.id.is_empty() {
                entry.id = key.clone();
            }
        }
        Self { entries }
    }
}

impl FromIterator<DatasetEntry> for Catalog {
    fn from_iter<T: IntoIterator<Item = DatasetEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }
}

impl Catalog {
    /// Decode the `/datasets` payload.
    pub fn from_json(body: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn get(&self, id: &str) -> Option<&DatasetEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// First dataset id in key order.
    pub fn first_id(&self) -> Option<&str> {
        self.entries.keys().next().map(String::as_str)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Text(String),
    Number(serde_json::Number),
}

/// Accept a list of string or numeric labels, stringifying numbers.
pub(crate) fn deserialize_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<RawLabel>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|label| match label {
            RawLabel::Text(s) => s,
            RawLabel::Number(n) => n.to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASETS_JSON: &str = r#"{
        "displacement": {
            "name": "displacement",
            "file_list": ["d_0.tif", "d_1.tif", "d_2.tif"],
            "x_values": ["2016-08-01", "2016-08-13", "2016-08-25"],
            "latlon_bounds": [-120.0, 34.0, -118.0, 36.0],
            "algorithm": "shift",
            "nodata": 0.0,
            "uses_spatial_ref": true
        },
        "coherence": {
            "file_list": ["c.tif"],
            "x_values": [0]
        }
    }"#;

    #[test]
    fn test_catalog_from_json() {
        let catalog = Catalog::from_json(DATASETS_JSON).unwrap();
        assert_eq!(catalog.len(), 2);

        let disp = catalog.get("displacement").unwrap();
        assert_eq!(disp.time_labels.len(), 3);
        assert!(disp.uses_shift());
        assert!(disp.uses_spatial_ref);
        assert_eq!(disp.nodata, Some(0.0));

        let coh = catalog.get("coherence").unwrap();
        assert_eq!(coh.id, "coherence", "id falls back to the catalog key");
        assert_eq!(coh.time_labels, vec!["0".to_string()]);
        assert!(!coh.uses_spatial_ref);
        assert_eq!(coh.algorithm, None);
    }

    #[test]
    fn test_time_labels_alias() {
        let catalog =
            Catalog::from_json(r#"{"A": {"time_labels": ["t0", "t1"], "uses_spatial_ref": true}}"#)
                .unwrap();
        assert_eq!(catalog.get("A").unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_catalog_is_an_error() {
        assert!(Catalog::from_json("<html>502 Bad Gateway</html>").is_err());
        assert!(Catalog::from_json(r#"{"A": {"x_values": [true]}}"#).is_err());
    }

    #[test]
    fn test_clamp_time_index() {
        let entry = DatasetEntry::new("A", vec!["t0".into(), "t1".into(), "t2".into()]);
        assert_eq!(entry.clamp_time_index(1), 1);
        assert_eq!(entry.clamp_time_index(99), 2);

        let empty = DatasetEntry::new("E", Vec::new());
        assert_eq!(empty.clamp_time_index(0), 0);
        assert_eq!(empty.clamp_time_index(5), 0);
        assert_eq!(empty.time_label(0), None);
    }

    #[test]
    fn test_center_and_first_id() {
        let catalog = Catalog::from_json(DATASETS_JSON).unwrap();
        assert_eq!(catalog.first_id(), Some("coherence"));
        let center = catalog.get("displacement").unwrap().center().unwrap();
        assert_eq!(center, LatLon { lat: 35.0, lon: -119.0 });
        assert_eq!(catalog.get("coherence").unwrap().center(), None);
    }
}

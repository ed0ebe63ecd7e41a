//! Tile manifest parameters and the decoded tilejson answer.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_ZOOM: u8 = 5;
pub const DEFAULT_MAX_ZOOM: u8 = 13;

/// Parameters for the tile manifest (`cog/tilejson.json`) request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileParams {
    /// Raster for the selected time step. `None` when the dataset has no files.
    pub url: Option<String>,
    pub mask: Option<String>,
    pub mask_min_value: Option<f64>,
    pub minzoom: u8,
    pub maxzoom: u8,
    pub colormap_name: String,
    pub rescale: (f64, f64),
    pub algorithm: Option<String>,
    /// Value subtracted by the `shift` algorithm.
    pub shift: Option<f64>,
    pub nodata: Option<f64>,
}

impl TileParams {
    /// JSON body of the `algorithm_params` query argument.
    pub fn algorithm_params(&self) -> Option<String> {
        self.shift
            .map(|shift| serde_json::json!({ "shift": shift }).to_string())
    }

    /// Flatten into query pairs, omitting unset options.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(url) = &self.url {
            pairs.push(("url", url.clone()));
        }
        if let Some(mask) = &self.mask {
            pairs.push(("mask", mask.clone()));
            if let Some(min) = self.mask_min_value {
                pairs.push(("mask_min_value", min.to_string()));
            }
        }
        pairs.push(("minzoom", self.minzoom.to_string()));
        pairs.push(("maxzoom", self.maxzoom.to_string()));
        pairs.push(("colormap_name", self.colormap_name.clone()));
        pairs.push(("rescale", format!("{},{}", self.rescale.0, self.rescale.1)));
        if let Some(algorithm) = &self.algorithm {
            pairs.push(("algorithm", algorithm.clone()));
        }
        if let Some(params) = self.algorithm_params() {
            pairs.push(("algorithm_params", params));
        }
        if let Some(nodata) = self.nodata {
            pairs.push(("nodata", nodata.to_string()));
        }
        pairs
    }
}

/// Tile manifest returned by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TileJson {
    pub tiles: Vec<String>,
    #[serde(default)]
    pub minzoom: Option<u8>,
    #[serde(default)]
    pub maxzoom: Option<u8>,
    #[serde(default)]
    pub bounds: Option<[f64; 4]>,
    #[serde(default)]
    pub center: Option<Vec<f64>>,
}

impl TileJson {
    pub fn url_template(&self) -> Option<&str> {
        self.tiles.first().map(String::as_str)
    }
}

/// What the map collaborator needs to draw the raster layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapLayer {
    pub url_template: String,
    pub opacity: f64,
}

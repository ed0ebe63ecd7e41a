//! The transport seam between the client state and a geospatial server.
//!
//! Every fetch decodes its payload at this boundary. A transport failure and
//! a malformed body are both reported as `Err`, so callers above never have
//! to inspect payload shape.

use crate::catalog::Catalog;
use crate::point::LatLon;
use crate::series::{MultiPointRequest, MultiPointResponse, Series};
use crate::tile::{TileJson, TileParams};

// Single-threaded callers only, so the futures need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait GeoSource {
    /// `GET datasets`
    async fn fetch_catalog(&self) -> anyhow::Result<Catalog>;

    /// `GET point?dataset_name&lon&lat`
    async fn fetch_point_series(&self, dataset_id: &str, position: LatLon)
        -> anyhow::Result<Series>;

    /// `POST multi_point`
    async fn fetch_multi_point(
        &self,
        request: &MultiPointRequest,
    ) -> anyhow::Result<MultiPointResponse>;

    /// Tile manifest for resolved tile parameters.
    async fn fetch_tilejson(&self, params: &TileParams) -> anyhow::Result<TileJson>;
}

//! `reqwest` client for a Bowser tile/series server.

use crate::catalog::Catalog;
use crate::point::LatLon;
use crate::series::{MultiPointRequest, MultiPointResponse, Series};
use crate::source::GeoSource;
use crate::tile::{TileJson, TileParams};
use log::{debug, info};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Connection settings for [`BowserClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// HTTP transport for catalog, series and tile manifest requests.
///
/// No retries are attempted; a failed request is reported once and the
/// caller decides what "no update" means for it.
#[derive(Debug, Clone)]
pub struct BowserClient {
    client: Client,
    base_url: String,
}

impl BowserClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// URL of the colorbar image for a colormap.
    pub fn colorbar_url(&self, colormap: &str) -> String {
        self.endpoint(&format!("colorbar/{}", colormap))
    }
}

impl GeoSource for BowserClient {
    async fn fetch_catalog(&self) -> anyhow::Result<Catalog> {
        let url = self.endpoint("datasets");
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let catalog: Catalog = response.json().await?;
        info!("Loaded catalog with {} datasets from {}", catalog.len(), url);
        Ok(catalog)
    }

    async fn fetch_point_series(
        &self,
        dataset_id: &str,
        position: LatLon,
    ) -> anyhow::Result<Series> {
        let url = self.endpoint("point");
        debug!("GET {} dataset={} at {}", url, dataset_id, position);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("dataset_name", dataset_id.to_string()),
                ("lon", position.lon.to_string()),
                ("lat", position.lat.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn fetch_multi_point(
        &self,
        request: &MultiPointRequest,
    ) -> anyhow::Result<MultiPointResponse> {
        let url = self.endpoint("multi_point");
        debug!(
            "POST {} dataset={} points={} trends={}",
            url,
            request.dataset_name,
            request.points.len(),
            request.calculate_trends
        );
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn fetch_tilejson(&self, params: &TileParams) -> anyhow::Result<TileJson> {
        let url = self.endpoint("cog/tilejson.json");
        let pairs = params.query_pairs();
        debug!("GET {} {:?}", url, pairs);
        let response = self
            .client
            .get(&url)
            .query(&pairs)
            .send()
            .await?
            .error_for_status()?;
        let tilejson: TileJson = response.json().await?;
        if tilejson.tiles.is_empty() {
            anyhow::bail!("tile manifest from {} has no tile templates", url);
        }
        Ok(tilejson)
    }
}

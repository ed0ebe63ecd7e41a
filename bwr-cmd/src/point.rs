//! `point`: one location's series, fetched without the batching layer.

use crate::{csv_output, write_series, ServerArgs};
use bwr_core::point::LatLon;
use bwr_core::source::GeoSource;
use log::info;

pub async fn run_point(
    server: &ServerArgs,
    dataset: &str,
    position: LatLon,
    output: Option<&str>,
) -> anyhow::Result<()> {
    if !position.is_valid() {
        anyhow::bail!("position {} is out of range", position);
    }
    let client = server.client()?;
    let catalog = client.fetch_catalog().await?;
    let entry = catalog
        .get(dataset)
        .ok_or_else(|| anyhow::anyhow!("dataset '{}' not found on {}", dataset, client.base_url()))?;

    let series = client.fetch_point_series(dataset, position).await?;
    if series.len() != entry.len() {
        anyhow::bail!(
            "server returned {} values for {}, catalog lists {} time steps",
            series.len(),
            dataset,
            entry.len()
        );
    }
    info!("{} values for {} at {}", series.len(), dataset, position);

    let name = position.to_string();
    let mut writer = csv_output(output)?;
    write_series(&mut writer, &entry.time_labels, &[(name.as_str(), &series)])
}

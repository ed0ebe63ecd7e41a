//! `datasets`: list the server catalog.

use crate::ServerArgs;
use bwr_core::catalog::Catalog;
use bwr_core::source::GeoSource;
use log::info;
use std::io::Write;

pub async fn run_datasets(server: &ServerArgs) -> anyhow::Result<()> {
    let client = server.client()?;
    let catalog = client.fetch_catalog().await?;
    info!("{} datasets on {}", catalog.len(), client.base_url());
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    write_catalog(&mut writer, &catalog)
}

/// One CSV row per dataset, in id order.
pub fn write_catalog<W: Write>(writer: &mut csv::Writer<W>, catalog: &Catalog) -> anyhow::Result<()> {
    writer.write_record([
        "id",
        "time_steps",
        "first",
        "last",
        "algorithm",
        "uses_spatial_ref",
    ])?;
    for entry in catalog.iter() {
        let steps = entry.len().to_string();
        let first = entry.time_labels.first().map(String::as_str).unwrap_or("");
        let last = entry.time_labels.last().map(String::as_str).unwrap_or("");
        let algorithm = entry.algorithm.as_deref().unwrap_or("");
        let uses_ref = entry.uses_spatial_ref.to_string();
        writer.write_record([
            entry.id.as_str(),
            steps.as_str(),
            first,
            last,
            algorithm,
            uses_ref.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_listing() {
        let catalog = Catalog::from_json(
            r#"{
                "vel": {"x_values": [0, 1, 2], "uses_spatial_ref": true, "algorithm": "shift"},
                "coh": {"time_labels": []}
            }"#,
        )
        .unwrap();
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_catalog(&mut writer, &catalog).unwrap();

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,time_steps,first,last,algorithm,uses_spatial_ref");
        assert_eq!(lines[1], "coh,0,,,,false");
        assert_eq!(lines[2], "vel,3,0,2,shift,true");
    }
}

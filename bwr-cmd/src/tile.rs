//! `tile`: resolve the tile URL template a map would load for one time
//! step, with stored preferences and the reference shift applied.

use crate::ServerArgs;
use bwr_core::point::LatLon;
use bwr_prefs::SqliteStore;
use bwr_state::session::Session;
use log::info;

pub async fn run_tile(
    server: &ServerArgs,
    prefs_path: &str,
    dataset: Option<&str>,
    time_index: usize,
    reference: Option<LatLon>,
) -> anyhow::Result<()> {
    let session = Session::new(server.client()?, SqliteStore::open(prefs_path)?);
    if session.load_catalog().await == 0 {
        anyhow::bail!("server has no datasets");
    }
    if let Some(dataset) = dataset {
        if !session.select_dataset(dataset).await {
            anyhow::bail!("dataset '{}' not found", dataset);
        }
    }
    if let Some(reference) = reference {
        session.move_reference(reference).await;
    }
    session.set_time_index(time_index);

    let params = session
        .tile_params()
        .ok_or_else(|| anyhow::anyhow!("no current dataset"))?;
    match params.shift {
        Some(shift) => info!("reference shift {}", shift),
        None => info!("no reference shift applied"),
    }
    info!(
        "colorbar: {}",
        session.source().colorbar_url(&params.colormap_name)
    );

    let layer = session
        .tile_layer()
        .await
        .ok_or_else(|| anyhow::anyhow!("tile manifest unavailable, see log for details"))?;
    println!("{}", layer.url_template);
    Ok(())
}

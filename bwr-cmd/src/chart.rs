//! `chart`: batched series for several locations, run through a
//! [`Session`] so reference handling and validation match the
//! interactive client.

use crate::{csv_output, write_series, ServerArgs};
use bwr_core::point::LatLon;
use bwr_core::source::GeoSource;
use bwr_prefs::{KeyValueStore, SqliteStore};
use bwr_state::action::Action;
use bwr_state::chart::ChartData;
use bwr_state::orchestrator::ApplyOutcome;
use bwr_state::session::Session;
use log::info;

/// What to plot.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub dataset: Option<String>,
    pub points: Vec<LatLon>,
    pub reference: Option<LatLon>,
    pub trends: bool,
}

pub async fn run_chart(
    server: &ServerArgs,
    prefs_path: &str,
    options: &ChartOptions,
    output: Option<&str>,
) -> anyhow::Result<()> {
    let session = Session::new(server.client()?, SqliteStore::open(prefs_path)?);
    let chart = build_chart(&session, options).await?;

    for dataset in &chart.datasets {
        if let Some(trend) = dataset.trend {
            info!(
                "{}: {:.3} mm/yr (slope {:.5}, r² {:.3})",
                dataset.label, trend.mm_per_year, trend.slope, trend.r_squared
            );
        }
    }

    let columns: Vec<(&str, &_)> = chart
        .datasets
        .iter()
        .map(|d| (d.label.as_str(), &d.data))
        .collect();
    let mut writer = csv_output(output)?;
    write_series(&mut writer, &chart.labels, &columns)
}

/// Load the catalog, place the points and fetch their series in one batch.
pub async fn build_chart<S: GeoSource, K: KeyValueStore>(
    session: &Session<S, K>,
    options: &ChartOptions,
) -> anyhow::Result<ChartData> {
    if session.load_catalog().await == 0 {
        anyhow::bail!("server has no datasets");
    }
    if let Some(dataset) = &options.dataset {
        if !session.select_dataset(dataset).await {
            anyhow::bail!("dataset '{}' not found", dataset);
        }
    }
    if let Some(bad) = options.points.iter().find(|p| !p.is_valid()) {
        anyhow::bail!("position {} is out of range", bad);
    }

    let mut actions: Vec<Action> = options
        .points
        .iter()
        .enumerate()
        .map(|(i, position)| {
            let name = format!("Point {}", i + 1);
            Action::add_point(*position, Some(name.as_str()))
        })
        .collect();
    if let Some(reference) = options.reference {
        actions.push(Action::SetRefMarkerPosition(reference));
    }
    if options.trends != session.store().read(|s| s.show_trends) {
        actions.push(Action::ToggleTrends);
    }
    session.store().dispatch_all(actions);

    match session.refresh_chart().await {
        ApplyOutcome::Applied { points } => info!("fetched series for {} points", points),
        ApplyOutcome::Idle => anyhow::bail!("nothing to fetch"),
        ApplyOutcome::Stale | ApplyOutcome::Failed => {
            anyhow::bail!("series request failed, see log for details")
        }
    }
    session
        .chart_data()
        .ok_or_else(|| anyhow::anyhow!("no current dataset"))
}

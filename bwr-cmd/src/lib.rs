//! Command implementations for the Bowser CLI.
//!
//! Each subcommand talks to a running Bowser server; `chart` and `tile`
//! drive a full [`bwr_state::session::Session`], so they see the same
//! preferences and reference handling as an interactive client.

use bwr_core::api::{BowserClient, ClientConfig, DEFAULT_BASE_URL};
use bwr_core::point::LatLon;
use bwr_core::series::Series;
use clap::{Args, Subcommand};
use std::io::Write;

pub mod chart;
pub mod datasets;
pub mod point;
pub mod prefs;
pub mod tile;

const DEFAULT_PREFS_PATH: &str = "bowser_prefs.sqlite";

/// Server connection arguments shared by the networked commands.
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Base URL of the Bowser server
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub url: String,
}

impl ServerArgs {
    pub fn client(&self) -> anyhow::Result<BowserClient> {
        BowserClient::new(ClientConfig {
            base_url: self.url.clone(),
            ..Default::default()
        })
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// List the datasets published by the server
    Datasets {
        #[command(flatten)]
        server: ServerArgs,
    },

    /// Fetch one location's time series as CSV
    Point {
        #[command(flatten)]
        server: ServerArgs,

        /// Dataset id
        #[arg(short = 'd', long)]
        dataset: String,

        /// Location as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        at: LatLon,

        /// Output CSV path (stdout if omitted)
        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// Fetch several locations' series in one request, optionally
    /// reference-corrected and with trend fits, as CSV
    Chart {
        #[command(flatten)]
        server: ServerArgs,

        /// Preference database path
        #[arg(long, default_value = DEFAULT_PREFS_PATH)]
        prefs: String,

        /// Dataset id (first dataset if omitted)
        #[arg(short = 'd', long)]
        dataset: Option<String>,

        /// Location as "lat,lon"; repeat for more points
        #[arg(short = 'p', long = "point", required = true, allow_hyphen_values = true)]
        points: Vec<LatLon>,

        /// Reference location as "lat,lon" (dataset bounds center if omitted)
        #[arg(long, allow_hyphen_values = true)]
        reference: Option<LatLon>,

        /// Ask the server for linear trend fits
        #[arg(long)]
        trends: bool,

        /// Output CSV path (stdout if omitted)
        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// Resolve the tile URL template for one time step
    Tile {
        #[command(flatten)]
        server: ServerArgs,

        /// Preference database path
        #[arg(long, default_value = DEFAULT_PREFS_PATH)]
        prefs: String,

        /// Dataset id (first dataset if omitted)
        #[arg(short = 'd', long)]
        dataset: Option<String>,

        /// Time step index, clamped to the dataset length
        #[arg(short = 't', long, default_value_t = 0)]
        time_index: usize,

        /// Reference location as "lat,lon" (dataset bounds center if omitted)
        #[arg(long, allow_hyphen_values = true)]
        reference: Option<LatLon>,
    },

    /// Inspect or edit stored per-dataset display preferences
    Prefs {
        /// Preference database path
        #[arg(long, default_value = DEFAULT_PREFS_PATH)]
        prefs: String,

        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print the stored preference for a dataset
    Get { dataset: String },

    /// Store colormap and value range for a dataset
    Set {
        dataset: String,

        #[arg(long)]
        colormap: String,

        #[arg(long, allow_hyphen_values = true)]
        vmin: f64,

        #[arg(long, allow_hyphen_values = true)]
        vmax: f64,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Datasets { server } => datasets::run_datasets(&server).await,
        Command::Point {
            server,
            dataset,
            at,
            output,
        } => point::run_point(&server, &dataset, at, output.as_deref()).await,
        Command::Chart {
            server,
            prefs,
            dataset,
            points,
            reference,
            trends,
            output,
        } => {
            let options = chart::ChartOptions {
                dataset,
                points,
                reference,
                trends,
            };
            chart::run_chart(&server, &prefs, &options, output.as_deref()).await
        }
        Command::Tile {
            server,
            prefs,
            dataset,
            time_index,
            reference,
        } => tile::run_tile(&server, &prefs, dataset.as_deref(), time_index, reference).await,
        Command::Prefs { prefs, action } => match action {
            PrefsAction::Get { dataset } => prefs::run_get(&prefs, &dataset),
            PrefsAction::Set {
                dataset,
                colormap,
                vmin,
                vmax,
            } => prefs::run_set(&prefs, &dataset, &colormap, vmin, vmax),
        },
    }
}

/// CSV writer for a file path, or stdout when no path is given.
pub(crate) fn csv_output(path: Option<&str>) -> anyhow::Result<csv::Writer<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match path {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    Ok(csv::Writer::from_writer(sink))
}

/// Write one row per time step: the label followed by each column's value.
///
/// Missing values are written as empty fields.
pub(crate) fn write_series<W: Write>(
    writer: &mut csv::Writer<W>,
    labels: &[String],
    columns: &[(&str, &Series)],
) -> anyhow::Result<()> {
    let mut header = vec!["time"];
    header.extend(columns.iter().map(|(name, _)| *name));
    writer.write_record(&header)?;

    for (i, label) in labels.iter().enumerate() {
        let mut row = vec![label.clone()];
        for (_, series) in columns {
            row.push(
                series
                    .get(i)
                    .copied()
                    .flatten()
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_series_leaves_gaps_empty() {
        let labels = vec!["20200101".to_string(), "20200113".to_string()];
        let a: Series = vec![Some(1.5), None];
        let b: Series = vec![Some(-0.25), Some(2.0)];
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_series(&mut writer, &labels, &[("Point 1", &a), ("Well", &b)]).unwrap();

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "time,Point 1,Well\n20200101,1.5,-0.25\n20200113,,2\n"
        );
    }
}

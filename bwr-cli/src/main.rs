//! Bowser CLI - browse geospatial raster time series served by a Bowser
//! server from the command line.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "bwr-cli",
    version,
    about = "Bowser raster time-series toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: bwr_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    bwr_cmd::run(cli.command).await
}

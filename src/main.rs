use clap::Parser;
use color_eyre::eyre::Result;
use wave_portal::{
    client,
    config::Cli,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _guard = telemetry::init_tracing(&cli.log_dir()?, &cli.log_level)?;
    tracing::info!("starting wave-portal client");
    let config = cli.into_config()?;
    client::run_app(&config).await
}

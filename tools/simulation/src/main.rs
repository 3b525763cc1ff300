//! `simulate [config.json] [report.json]`
//!
//! Runs every scenario and prints the JSON report, or writes it to the
//! second argument when one is given.

use anyhow::Context;
use simulation::config::SimulationConfig;
use simulation::export::{build_export, export_json, write_to_file};
use simulation::scenarios;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimulationConfig::from_file(&path)
            .with_context(|| format!("loading simulation config from {path}"))?,
        None => SimulationConfig::default(),
    };
    let output = args.next();
    info!(?config, "starting simulation");

    let (metrics, results) = scenarios::run_all(&config)
        .await
        .context("building simulation network")?;
    let export = build_export(&config, &metrics, results);
    match &output {
        Some(path) => {
            write_to_file(&export, path).with_context(|| format!("writing report to {path}"))?;
            info!(path = %path, "report written");
        }
        None => println!("{}", export_json(&export)?),
    }

    if !export.passed() {
        let failed = export.failed_scenarios().join(", ");
        error!(%failed, "simulation failed");
        anyhow::bail!("scenarios failed: {failed}");
    }
    info!(invocations = metrics.invocations, "simulation passed");
    Ok(())
}

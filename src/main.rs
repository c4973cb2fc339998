use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use mysql_csv_exporter::application::runtime::RuntimeContext;
use mysql_csv_exporter::config::{AppConfig, CliArgs};
use mysql_csv_exporter::domain::entities::RunSummary;
use mysql_csv_exporter::domain::errors::Result;
use std::process;

fn main() {
    // 1. Initialize Logging
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("csv export");

    // 2. Parse Arguments
    let args = CliArgs::parse();

    // 3. Run
    match run(&args) {
        Ok(summary) => {
            info!(
                "{}/{} tables exported into {}",
                summary.succeeded(),
                summary.reports.len(),
                summary.archive.display()
            );
            if let Some(log_file) = &summary.log_file {
                warn!(
                    "{} table(s) failed, see {}",
                    summary.failed(),
                    log_file.display()
                );
            }
        }
        Err(e) if e.is_fatal_startup() => {
            error!("Startup failed, nothing was exported: {}", e);
            process::exit(1);
        }
        Err(e) => {
            error!("Export failed: {}", e);
            process::exit(1);
        }
    }
}

fn run(args: &CliArgs) -> Result<RunSummary> {
    let config = AppConfig::load(args)?;
    let job = config.to_job()?;

    let runtime = RuntimeContext::init(&job, &config.export)?;
    let orchestrator = runtime.orchestrator(job, config.export.clone())?;
    orchestrator.run()
}

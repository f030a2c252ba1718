//! Command-line entry point: runs one simulated day and prints a JSON
//! summary.
//!
//! Configuration comes from the JSON file named by `POST_OFFICE_CONFIG` if
//! set, otherwise from the `POST_OFFICE_*` environment variables (a `.env`
//! file is honoured). Event lines are logged through `tracing`; set
//! `RUST_LOG` to adjust verbosity.

use std::collections::BTreeMap;
use std::env;
use std::fs;

use anyhow::Context;
use serde_json::json;
use tracing::info;

use post_office::config::OfficeConfig;
use post_office::core::{AppResult, Task};
use post_office::runtime::Simulation;
use post_office::util::init_tracing_with_default;

/// Environment variable naming a JSON configuration file.
const ENV_CONFIG: &str = "POST_OFFICE_CONFIG";

fn load_config() -> AppResult<OfficeConfig> {
    let _ = dotenvy::dotenv();
    match env::var(ENV_CONFIG) {
        Ok(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading configuration from {path}"))?;
            OfficeConfig::from_json_str(&raw)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("parsing configuration from {path}"))
        }
        Err(_) => OfficeConfig::from_env()
            .map_err(anyhow::Error::msg)
            .context("reading configuration from environment"),
    }
}

fn main() -> AppResult<()> {
    init_tracing_with_default("info");

    let config = load_config()?;
    let report = Simulation::new(config).run()?;

    info!(
        run_id = %report.run_id,
        elapsed_ms = %report.elapsed_ms,
        "Simulation complete"
    );

    let tasks: BTreeMap<String, usize> = Task::ALL
        .iter()
        .map(|task| (task.to_string(), report.count_of(*task)))
        .collect();
    let summary = json!({
        "run_id": report.run_id,
        "customers": report.visits.len(),
        "elapsed_ms": report.elapsed_ms,
        "peak_scale_holders": report.peak_scale_holders,
        "tasks": tasks,
        "workers": report.workers,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

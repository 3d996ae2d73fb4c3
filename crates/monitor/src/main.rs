mod config;
mod service;
mod stats;

use anyhow::Context;
use common::{setup_logging, wait_for_resource};
use config::MonitorConfig;
use service::MonitorService;
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    flag,
};
use simshm::FrameReader;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn main() -> anyhow::Result<()> {
    let config = MonitorConfig::from_env()?;
    setup_logging(config.environment);

    let shutdown = Arc::new(AtomicBool::new(false));
    flag::register(SIGTERM, Arc::clone(&shutdown))?;
    flag::register(SIGINT, Arc::clone(&shutdown))?;

    tracing::info!(?config, "Monitor starting");

    let options = config.reader_options();
    let Some(reader) = wait_for_resource(
        || FrameReader::connect(&options),
        config.poll_interval_ms,
        "Simulator shared memory",
        &shutdown,
    ) else {
        return Ok(());
    };

    let service = MonitorService::new(config, reader).context("Failed to start monitor")?;
    service.run(&shutdown)
}

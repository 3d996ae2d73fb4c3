use crate::config::MonitorConfig;
use crate::stats::FrameStats;
use anyhow::{Context, Result};
use simshm::{Frame, FrameReader, ShmError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

pub struct MonitorService {
    config: MonitorConfig,
    reader: FrameReader,
    stats: FrameStats,
}

impl MonitorService {
    pub fn new(config: MonitorConfig, reader: FrameReader) -> Result<Self> {
        if let Some(dir) = &config.snapshot_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        }

        Ok(Self {
            config,
            reader,
            stats: FrameStats::new(Instant::now()),
        })
    }

    /// Read frames until `shutdown` is raised or the session fails.
    ///
    /// The reader is closed on every exit path.
    pub fn run(mut self, shutdown: &AtomicBool) -> Result<()> {
        let _s = common::span!("monitor_run");

        if let Some(header) = self.reader.header() {
            tracing::info!(
                pid = self.reader.pid(),
                slot_count = header.slot_count,
                slot_size = header.slot_size,
                "Monitor service starting"
            );
        }

        let result = self.read_loop(shutdown);
        self.reader.close();

        tracing::info!(
            total_frames = self.stats.total_frames,
            total_malformed = self.stats.total_malformed,
            "Monitor service stopped"
        );
        result
    }

    fn read_loop(&mut self, shutdown: &AtomicBool) -> Result<()> {
        let timeout = self.config.read_timeout();
        let stats_interval = self.config.stats_interval();

        while !shutdown.load(Ordering::Relaxed) {
            match self.reader.read_frame(timeout) {
                Ok(Some(frame)) => self.handle_frame(&frame)?,
                Ok(None) => {}
                Err(e @ ShmError::MalformedSlot { .. }) => {
                    self.stats.record_malformed();
                    tracing::debug!(error = %e, "Skipped malformed slot");
                }
                Err(e) => return Err(e).context("Shared memory read failed"),
            }

            if let Some(report) = self.stats.roll(Instant::now(), stats_interval) {
                let kinds: Vec<String> = report
                    .kinds
                    .iter()
                    .map(|(kind, count)| format!("{}={}", kind.name(), count))
                    .collect();
                tracing::info!(
                    frames = report.frames,
                    fps = %format!("{:.1}", report.fps),
                    kinds = %kinds.join(","),
                    last_timestamp = self.stats.last_timestamp,
                    "Frame stats"
                );
            }
        }

        Ok(())
    }

    fn handle_frame(&mut self, frame: &Frame) -> Result<()> {
        self.stats.record(frame);

        tracing::debug!(
            width = frame.width,
            height = frame.height,
            kind = frame.image_kind.name(),
            timestamp = frame.capture_timestamp,
            "Got frame"
        );

        if self.config.output_json {
            let line = serde_json::to_string(&frame.info())?;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{line}")?;
        }

        if let Some(dir) = &self.config.snapshot_dir
            && self.stats.total_frames % self.config.snapshot_every == 0
        {
            let path = write_snapshot(dir, frame)?;
            tracing::info!(path = %path.display(), "Wrote snapshot");
        }

        Ok(())
    }
}

/// Dump `frame` as `<kind>_<timestamp>.ppm` inside `dir`.
pub fn write_snapshot(dir: &Path, frame: &Frame) -> Result<PathBuf> {
    let path = dir.join(format!(
        "{}_{}.ppm",
        frame.image_kind.name().to_lowercase(),
        frame.capture_timestamp
    ));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create snapshot {}", path.display()))?;
    frame.write_ppm(BufWriter::new(file))?;
    Ok(path)
}

//! Export pipeline: stage media, execute the compositing plan, report
//! coarse progress, and return the finished artifact.
//!
//! The pipeline is a thin state machine over an exclusively-borrowed
//! [`FfmpegEngine`]. Staged inputs and the output file are removed on
//! every exit path; cancellation additionally resets the engine's
//! storage so the next export starts from a clean slate.

use std::collections::HashMap;

use cliplab_common::{CliplabError, CliplabResult};
use cliplab_compose::{ffmpeg_args, CompositePlan};
use cliplab_timeline_model::RenderSettings;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::sync::watch;

use crate::engine::FfmpegEngine;

/// Progress share reserved for the staging phase.
const WRITING_SPAN_PCT: f64 = 10.0;
/// Progress share for the render phase; the last point is withheld
/// until the artifact has been read back.
const RENDERING_SPAN_PCT: f64 = 89.0;

/// Pipeline phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportState {
    #[default]
    Idle,
    Writing,
    Rendering,
    Done,
}

/// Finished export, ready to hand to the user.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub suggested_filename: String,
}

/// Single-flight export driver.
#[derive(Debug, Default)]
pub struct ExportPipeline {
    state: ExportState,
    percent: u8,
}

impl ExportPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Execute `plan` against `engine`, pulling media bytes from
    /// `media` (keyed by clip source).
    ///
    /// `progress` receives `(percent, status)` at coarse granularity.
    /// Flipping `cancel` to `true` kills the render outright and
    /// returns [`CliplabError::Cancelled`]; any other error leaves the
    /// pipeline back in [`ExportState::Idle`] with the engine reset and
    /// ready for retry.
    pub async fn export(
        &mut self,
        engine: &mut FfmpegEngine,
        plan: &CompositePlan,
        settings: &RenderSettings,
        media: &HashMap<String, Vec<u8>>,
        mut progress: impl FnMut(u8, &str),
        mut cancel: watch::Receiver<bool>,
    ) -> CliplabResult<ExportArtifact> {
        let result = self
            .run(engine, plan, settings, media, &mut progress, &mut cancel)
            .await;

        match &result {
            Ok(_) => {
                self.state = ExportState::Done;
                self.set_percent(100, "Export complete", &mut progress);
            }
            Err(e) => {
                if e.is_cancelled() {
                    tracing::info!("Export cancelled");
                } else {
                    tracing::error!(error = %e, "Export failed");
                }
                // Wipe whatever the aborted run left behind.
                if let Err(cleanup) = engine.terminate().await {
                    tracing::warn!(error = %cleanup, "Engine reset after failed export");
                }
                self.state = ExportState::Idle;
                self.percent = 0;
                progress(0, if e.is_cancelled() { "Export cancelled" } else { "Export failed" });
            }
        }
        result
    }

    async fn run(
        &mut self,
        engine: &mut FfmpegEngine,
        plan: &CompositePlan,
        settings: &RenderSettings,
        media: &HashMap<String, Vec<u8>>,
        progress: &mut impl FnMut(u8, &str),
        cancel: &mut watch::Receiver<bool>,
    ) -> CliplabResult<ExportArtifact> {
        if *cancel.borrow() {
            return Err(CliplabError::Cancelled);
        }
        if !engine.is_available() {
            return Err(CliplabError::unsupported(
                "ffmpeg not found in PATH; install ffmpeg to export",
            ));
        }

        self.state = ExportState::Writing;
        self.set_percent(0, "Writing media", progress);

        let input_count = plan.inputs.len();
        for (i, input) in plan.inputs.iter().enumerate() {
            if *cancel.borrow() {
                return Err(CliplabError::Cancelled);
            }
            let bytes = media.get(&input.source).ok_or_else(|| {
                CliplabError::render(format!("No media provided for source {:?}", input.source))
            })?;
            engine.write_input(&input.staged_name, bytes).await?;
            let pct = (WRITING_SPAN_PCT * (i + 1) as f64 / input_count as f64) as u8;
            self.set_percent(pct, "Writing media", progress);
        }

        self.state = ExportState::Rendering;
        self.set_percent(WRITING_SPAN_PCT as u8, "Rendering", progress);

        let output_name = format!("output.{}", settings.format.extension());
        let args = ffmpeg_args(plan, settings, &output_name);
        let render_result = self
            .run_ffmpeg(engine, &args, plan.total_duration, progress, cancel)
            .await;

        // Staged inputs are dead weight whether the render worked or not.
        for input in &plan.inputs {
            if let Err(e) = engine.remove(&input.staged_name).await {
                tracing::warn!(name = %input.staged_name, error = %e, "Staged input cleanup");
            }
        }
        render_result?;

        let bytes = engine.read_output(&output_name).await?;
        engine.remove(&output_name).await?;

        Ok(ExportArtifact {
            bytes,
            mime_type: settings.format.mime_type().to_string(),
            suggested_filename: settings.suggested_filename(chrono::Utc::now()),
        })
    }

    async fn run_ffmpeg(
        &mut self,
        engine: &mut FfmpegEngine,
        args: &[String],
        total_duration: f64,
        progress: &mut impl FnMut(u8, &str),
        cancel: &mut watch::Receiver<bool>,
    ) -> CliplabResult<()> {
        let mut child = engine.spawn_ffmpeg(args).await?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CliplabError::render("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| CliplabError::render("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut output = String::new();
            let mut reader = BufReader::new(stderr);
            match reader.read_to_string(&mut output).await {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut parser = ProgressState::default();
        let mut cancel_open = true;
        loop {
            tokio::select! {
                changed = cancel.changed(), if cancel_open => {
                    match changed {
                        Ok(()) if *cancel.borrow() => {
                            let _ = child.start_kill();
                            let _ = child.wait().await;
                            stderr_task.abort();
                            return Err(CliplabError::Cancelled);
                        }
                        Ok(()) => {}
                        Err(_) => cancel_open = false,
                    }
                }
                line = lines.next_line() => {
                    let line = line.map_err(|e| {
                        CliplabError::render(format!("Failed reading ffmpeg progress: {e}"))
                    })?;
                    let Some(line) = line else { break };
                    let trimmed = line.trim();
                    let Some((key, value)) = trimmed.split_once('=') else { continue };
                    parser.update(key, value);
                    if key == "progress" {
                        let pct = render_percent(parser.out_time_secs, total_duration, self.percent);
                        self.set_percent(pct, "Rendering", progress);
                    }
                }
            }
        }

        if !parser.complete {
            tracing::warn!("ffmpeg exited without reporting progress completion");
        }

        let status = child
            .wait()
            .await
            .map_err(|e| CliplabError::render(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .await
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(CliplabError::render(format!(
                "ffmpeg export failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }
        Ok(())
    }

    fn set_percent(&mut self, pct: u8, status: &str, progress: &mut impl FnMut(u8, &str)) {
        if pct != self.percent {
            self.percent = pct;
            progress(pct, status);
        }
    }
}

/// Percent for the rendering phase: the writing span plus the rendered
/// fraction of the render span, never regressing and never reporting
/// completion before the artifact is in hand.
fn render_percent(out_time_secs: f64, total_duration: f64, last: u8) -> u8 {
    let frac = if total_duration <= 0.0 {
        0.0
    } else {
        (out_time_secs / total_duration).clamp(0.0, 1.0)
    };
    let pct = (WRITING_SPAN_PCT + RENDERING_SPAN_PCT * frac) as u8;
    pct.min(99).max(last)
}

/// Incremental parser for ffmpeg's `-progress pipe:1` key/value stream.
#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            "out_time_ms" => {
                if let Ok(ms) = value.parse::<f64>() {
                    self.out_time_secs = ms / 1_000_000.0;
                }
            }
            "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "out_time" => {
                if let Some(secs) = parse_clock_time(value) {
                    self.out_time_secs = secs;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

/// Parse ffmpeg's `HH:MM:SS.micros` clock format.
fn parse_clock_time(value: &str) -> Option<f64> {
    let mut parts = value.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

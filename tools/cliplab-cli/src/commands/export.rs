//! Render a timeline to a video file.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use cliplab_compose::plan;
use cliplab_render_engine::{ExportPipeline, FfmpegEngine};
use tokio::sync::watch;

use crate::timeline;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    path: PathBuf,
    output: Option<PathBuf>,
    format: String,
    quality: String,
    speed: String,
    scale: f64,
    fps: u32,
) -> anyhow::Result<()> {
    let timeline = timeline::load(&path)?;
    let settings = timeline::resolve_settings(
        &timeline,
        &format,
        Some(&quality),
        Some(&speed),
        scale,
        Some(fps),
    )?;

    let plan = plan(&timeline.clips, &settings);

    // Clip sources are media paths relative to the timeline file.
    let base_dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let mut media = HashMap::new();
    for input in &plan.inputs {
        let media_path = base_dir.join(&input.source);
        let bytes = std::fs::read(&media_path)
            .with_context(|| format!("Failed to read media: {}", media_path.display()))?;
        media.insert(input.source.clone(), bytes);
    }

    println!("Exporting timeline: {}", path.display());
    println!(
        "  Resolution: {}x{} @{}fps",
        settings.output_width(),
        settings.output_height(),
        settings.frame_rate
    );
    println!("  Duration: {:.2}s", plan.total_duration);

    // Ctrl-C aborts the render and cleans up.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let mut engine = FfmpegEngine::new();
    let mut pipeline = ExportPipeline::new();
    let artifact = pipeline
        .export(
            &mut engine,
            &plan,
            &settings,
            &media,
            |percent, status| {
                print!("\r  {status}: {percent:>3}%  ");
                let _ = std::io::stdout().flush();
            },
            cancel_rx,
        )
        .await;

    println!();
    let artifact = match artifact {
        Ok(artifact) => artifact,
        Err(e) if e.is_cancelled() => {
            println!("Export cancelled.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let output_path = output.unwrap_or_else(|| PathBuf::from(&artifact.suggested_filename));
    std::fs::write(&output_path, &artifact.bytes)
        .with_context(|| format!("Failed to write output: {}", output_path.display()))?;

    println!(
        "Export complete: {} ({} bytes, {})",
        output_path.display(),
        artifact.bytes.len(),
        artifact.mime_type,
    );
    Ok(())
}

//! Timeline file loading and settings parsing shared by the commands.

use std::path::Path;

use anyhow::Context;
use cliplab_timeline_model::{Clip, EncoderSpeed, OutputFormat, QualityPreset, RenderSettings};
use serde::Deserialize;

/// On-disk timeline: a clip list plus optional render settings. Clip
/// `source` fields are media paths resolved relative to this file.
#[derive(Debug, Deserialize)]
pub struct TimelineFile {
    pub clips: Vec<Clip>,
    #[serde(default)]
    pub settings: Option<RenderSettings>,
}

pub fn load(path: &Path) -> anyhow::Result<TimelineFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read timeline file: {}", path.display()))?;
    let timeline: TimelineFile = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid timeline file: {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        clips = timeline.clips.len(),
        "Loaded timeline"
    );
    Ok(timeline)
}

pub fn parse_format(format: &str) -> anyhow::Result<OutputFormat> {
    match format {
        "mp4" => Ok(OutputFormat::Mp4),
        "webm" => Ok(OutputFormat::Webm),
        _ => Err(anyhow::anyhow!("Unknown format: {format}. Use: mp4, webm")),
    }
}

pub fn parse_quality(quality: &str) -> anyhow::Result<QualityPreset> {
    match quality {
        "draft" => Ok(QualityPreset::Draft),
        "standard" => Ok(QualityPreset::Standard),
        "high" => Ok(QualityPreset::High),
        _ => Err(anyhow::anyhow!(
            "Unknown quality: {quality}. Use: draft, standard, high"
        )),
    }
}

pub fn parse_speed(speed: &str) -> anyhow::Result<EncoderSpeed> {
    match speed {
        "ultrafast" => Ok(EncoderSpeed::Ultrafast),
        "fast" => Ok(EncoderSpeed::Fast),
        "medium" => Ok(EncoderSpeed::Medium),
        "slow" => Ok(EncoderSpeed::Slow),
        _ => Err(anyhow::anyhow!(
            "Unknown speed: {speed}. Use: ultrafast, fast, medium, slow"
        )),
    }
}

/// Merge timeline-embedded settings with command-line overrides.
pub fn resolve_settings(
    timeline: &TimelineFile,
    format: &str,
    quality: Option<&str>,
    speed: Option<&str>,
    scale: f64,
    fps: Option<u32>,
) -> anyhow::Result<RenderSettings> {
    let mut settings = timeline.settings.clone().unwrap_or_default();
    settings.format = parse_format(format)?;
    settings.scale = scale;
    if let Some(quality) = quality {
        settings.quality = parse_quality(quality)?;
    }
    if let Some(speed) = speed {
        settings.speed_preset = parse_speed(speed)?;
    }
    if let Some(fps) = fps {
        settings.frame_rate = fps;
    }
    Ok(settings)
}

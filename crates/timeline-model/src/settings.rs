//! Export render settings: container, resolution, frame rate, quality.

use serde::{Deserialize, Serialize};

/// Settings consumed by the compositing planner and export pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Output container format.
    pub format: OutputFormat,

    /// Canvas resolution the clip transforms are expressed in.
    pub canvas_width: u32,
    pub canvas_height: u32,

    /// Resolution multiplier applied to the canvas size.
    pub scale: f64,

    /// Output frame rate.
    pub frame_rate: u32,

    /// Named quality preset mapping to an encoder CRF value.
    pub quality: QualityPreset,

    /// Encoder speed preset.
    pub speed_preset: EncoderSpeed,
}

/// Output video container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Widely compatible container: H.264 video + AAC audio.
    Mp4,
    /// Royalty-free open container: VP9 video + Opus audio.
    Webm,
}

/// Named quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Draft,
    #[default]
    Standard,
    High,
}

/// Encoder speed preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncoderSpeed {
    Ultrafast,
    Fast,
    #[default]
    Medium,
    Slow,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Webm => "webm",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "video/mp4",
            OutputFormat::Webm => "video/webm",
        }
    }

    /// Video codec passed to the encoder.
    pub fn video_codec(self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "libx264",
            OutputFormat::Webm => "libvpx-vp9",
        }
    }

    /// Audio codec passed to the encoder.
    pub fn audio_codec(self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "aac",
            OutputFormat::Webm => "libopus",
        }
    }
}

impl QualityPreset {
    /// Constant-rate-factor value for the encoder.
    pub fn crf(self) -> u32 {
        match self {
            QualityPreset::Draft => 28,
            QualityPreset::Standard => 23,
            QualityPreset::High => 18,
        }
    }
}

impl EncoderSpeed {
    pub fn as_str(self) -> &'static str {
        match self {
            EncoderSpeed::Ultrafast => "ultrafast",
            EncoderSpeed::Fast => "fast",
            EncoderSpeed::Medium => "medium",
            EncoderSpeed::Slow => "slow",
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Mp4,
            canvas_width: 1920,
            canvas_height: 1080,
            scale: 1.0,
            frame_rate: 30,
            quality: QualityPreset::Standard,
            speed_preset: EncoderSpeed::Medium,
        }
    }
}

impl RenderSettings {
    /// Output width in pixels, rounded down to an even value for the
    /// yuv420p pixel format.
    pub fn output_width(&self) -> u32 {
        even(self.canvas_width as f64 * self.scale)
    }

    /// Output height in pixels, rounded down to an even value.
    pub fn output_height(&self) -> u32 {
        even(self.canvas_height as f64 * self.scale)
    }

    /// Suggested download filename encoding a timestamp and extension.
    pub fn suggested_filename(&self, now: chrono::DateTime<chrono::Utc>) -> String {
        format!(
            "export-{}.{}",
            now.format("%Y%m%d-%H%M%S"),
            self.format.extension()
        )
    }
}

fn even(v: f64) -> u32 {
    let px = v.round().max(2.0) as u32;
    px - (px % 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_resolution_scales_and_stays_even() {
        let settings = RenderSettings {
            canvas_width: 1280,
            canvas_height: 720,
            scale: 1.5,
            ..Default::default()
        };
        assert_eq!(settings.output_width(), 1920);
        assert_eq!(settings.output_height(), 1080);

        let odd = RenderSettings {
            canvas_width: 333,
            canvas_height: 333,
            scale: 1.0,
            ..Default::default()
        };
        assert_eq!(odd.output_width() % 2, 0);
    }

    #[test]
    fn test_codec_pairs_match_container() {
        assert_eq!(OutputFormat::Mp4.video_codec(), "libx264");
        assert_eq!(OutputFormat::Mp4.audio_codec(), "aac");
        assert_eq!(OutputFormat::Webm.video_codec(), "libvpx-vp9");
        assert_eq!(OutputFormat::Webm.audio_codec(), "libopus");
    }

    #[test]
    fn test_quality_maps_to_crf() {
        assert_eq!(QualityPreset::Draft.crf(), 28);
        assert_eq!(QualityPreset::Standard.crf(), 23);
        assert_eq!(QualityPreset::High.crf(), 18);
    }

    #[test]
    fn test_suggested_filename_has_timestamp_and_extension() {
        let settings = RenderSettings {
            format: OutputFormat::Webm,
            ..Default::default()
        };
        let now = chrono::DateTime::parse_from_rfc3339("2026-03-01T12:30:45Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        assert_eq!(
            settings.suggested_filename(now),
            "export-20260301-123045.webm"
        );
    }
}

//! Compositing planner: frozen clip list -> static filter graph.
//!
//! The planner is a pure function with no I/O and no knowledge of the
//! execution engine. Every timing and transform decision is baked into
//! static filter expressions ahead of time; the produced graph has no
//! runtime branching, so a one-shot batch render reproduces the preview
//! at every instant.

use cliplab_timeline_model::{AssetKind, Clip, RenderSettings};
use serde::{Deserialize, Serialize};

use crate::graph::{Filter, FilterChain, FilterGraph};

/// Exports are never shorter than one second.
pub const MIN_TOTAL_DURATION_SECS: f64 = 1.0;

/// Floor for fade ramp lengths; a zero-length afade is a no-op.
pub const MIN_FADE_SECS: f64 = 0.01;

const AUDIO_SAMPLE_RATE: u32 = 48_000;

/// One staged media input referenced by the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanInput {
    /// Input index; the graph references streams as `{index}:v` /
    /// `{index}:a`, and the pipeline stages bytes under `staged_name`.
    pub index: usize,

    /// Clip instance this input belongs to.
    pub clip_id: String,

    /// Source URL or handle the caller must supply bytes for.
    pub source: String,

    /// Media kind of the staged bytes.
    pub kind: AssetKind,

    /// Stable filename in the engine's addressable storage.
    pub staged_name: String,

    /// Whether the input must be looped (still images become
    /// infinite-duration single-frame streams).
    pub loop_input: bool,
}

/// A complete, deterministic compositing plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositePlan {
    pub graph: FilterGraph,
    pub inputs: Vec<PlanInput>,
    /// Label of the canonical composite video stream.
    pub video_out: String,
    /// Label of the mixed audio stream.
    pub audio_out: String,
    /// Export duration in seconds.
    pub total_duration: f64,
}

/// Build the compositing plan for a frozen clip list.
pub fn plan(clips: &[Clip], settings: &RenderSettings) -> CompositePlan {
    // Degenerate clips must not emit filter expressions.
    let retained: Vec<&Clip> = clips.iter().filter(|c| c.duration > 0.0).collect();
    if retained.len() != clips.len() {
        tracing::warn!(
            skipped = clips.len() - retained.len(),
            "Skipping zero-duration clips from the compositing plan"
        );
    }

    let total_duration = retained
        .iter()
        .map(|c| c.end_time())
        .fold(0.0f64, f64::max)
        .max(MIN_TOTAL_DURATION_SECS);

    let inputs: Vec<PlanInput> = retained
        .iter()
        .enumerate()
        .map(|(index, clip)| PlanInput {
            index,
            clip_id: clip.id.clone(),
            source: clip.source.clone(),
            kind: clip.kind,
            staged_name: format!("input-{index}.{}", clip.kind.file_extension()),
            loop_input: clip.kind == AssetKind::Image,
        })
        .collect();

    let mut graph = FilterGraph::default();

    // Base canvas: solid color at export resolution for the whole export.
    let mut base = FilterChain::new(vec![], vec!["base".to_string()]);
    base.push(
        Filter::new("color")
            .arg("c", "black")
            .arg(
                "s",
                format!("{}x{}", settings.output_width(), settings.output_height()),
            )
            .arg("r", settings.frame_rate)
            .arg("d", total_duration),
    );
    graph.push(base);

    let video_out = plan_visual_layers(&mut graph, &retained, settings);
    let audio_out = plan_audio_mix(&mut graph, &retained, total_duration);

    CompositePlan {
        graph,
        inputs,
        video_out,
        audio_out,
        total_duration,
    }
}

/// Layer visual clips onto the base canvas, layer-descending so lower
/// layer numbers end up on top. Returns the composite output label.
fn plan_visual_layers(
    graph: &mut FilterGraph,
    retained: &[&Clip],
    settings: &RenderSettings,
) -> String {
    let mut visual: Vec<(usize, &Clip)> = retained
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind.is_visual())
        .map(|(i, c)| (i, *c))
        .collect();
    // Stable sort keeps insertion order for equal layers.
    visual.sort_by(|a, b| b.1.layer.cmp(&a.1.layer));

    let scale = settings.scale;
    let mut composite = "base".to_string();

    for (ordinal, (index, clip)) in visual.iter().enumerate() {
        let label = format!("v{index}");
        let mut chain = FilterChain::new(vec![format!("{index}:v")], vec![label.clone()]);

        // Source sub-chain: trim to the clip's source window and reset
        // timestamps to zero. Image inputs are looped single frames,
        // so they are bounded by duration alone.
        if clip.kind == AssetKind::Image {
            chain.push(Filter::new("trim").arg("duration", clip.duration));
        } else {
            chain.push(
                Filter::new("trim")
                    .arg("start", clip.source_offset)
                    .arg("end", clip.source_offset + clip.duration),
            );
        }
        chain.push(Filter::new("setpts").value("PTS-STARTPTS"));

        // Spatial transform in export pixels.
        let w = (clip.transform.width * scale).round().max(2.0) as i64;
        let h = (clip.transform.height * scale).round().max(2.0) as i64;
        chain.push(Filter::new("scale").arg("w", w).arg("h", h));

        let rotated = clip.transform.rotation_degrees.abs() > f64::EPSILON;
        let translucent = clip.opacity < 1.0;
        if rotated || translucent {
            chain.push(Filter::new("format").arg("pix_fmts", "rgba"));
        }
        if rotated {
            let radians = clip.transform.rotation_degrees.to_radians();
            chain.push(
                Filter::new("rotate")
                    .arg("a", radians)
                    .arg("ow", format!("rotw({radians})"))
                    .arg("oh", format!("roth({radians})"))
                    .arg("c", "none"),
            );
        }
        if translucent {
            chain.push(Filter::new("colorchannelmixer").arg("aa", clip.opacity));
        }

        // Align the sub-chain with the global timeline.
        if clip.start_time > 0.0 {
            chain.push(Filter::new("setpts").value(format!("PTS+{}/TB", clip.start_time)));
        }
        graph.push(chain);

        // Overlay gated to the clip's half-open visibility window.
        let next = format!("ov{ordinal}");
        let mut overlay = FilterChain::new(vec![composite.clone(), label], vec![next.clone()]);
        overlay.push(
            Filter::new("overlay")
                .arg("x", (clip.transform.x * scale).round() as i64)
                .arg("y", (clip.transform.y * scale).round() as i64)
                .arg(
                    "enable",
                    format!(
                        "'gte(t,{})*lt(t,{})'",
                        clip.start_time,
                        clip.end_time()
                    ),
                ),
        );
        graph.push(overlay);
        composite = next;
    }

    composite
}

/// Trim, shape, delay, and mix every audio-bearing clip in original
/// (not z) order. Returns the mixed output label.
fn plan_audio_mix(graph: &mut FilterGraph, retained: &[&Clip], total_duration: f64) -> String {
    let audio: Vec<(usize, &Clip)> = retained
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind.has_audio())
        .map(|(i, c)| (i, *c))
        .collect();

    if audio.is_empty() {
        let mut silence = FilterChain::new(vec![], vec!["aout".to_string()]);
        silence.push(
            Filter::new("anullsrc")
                .arg("channel_layout", "stereo")
                .arg("sample_rate", AUDIO_SAMPLE_RATE),
        );
        silence.push(Filter::new("atrim").arg("duration", total_duration));
        graph.push(silence);
        return "aout".to_string();
    }

    let mut labels = Vec::with_capacity(audio.len());
    for (index, clip) in &audio {
        let label = format!("a{index}");
        let mut chain = FilterChain::new(vec![format!("{index}:a")], vec![label.clone()]);

        chain.push(
            Filter::new("atrim")
                .arg("start", clip.source_offset)
                .arg("end", clip.source_offset + clip.duration),
        );
        chain.push(Filter::new("asetpts").value("PTS-STARTPTS"));
        chain.push(Filter::new("volume").arg("volume", clip.volume));

        let (fade_in, fade_out) = clip.clamped_fades();
        let fade_in = fade_in.max(MIN_FADE_SECS);
        let fade_out = fade_out.max(MIN_FADE_SECS);
        chain.push(
            Filter::new("afade")
                .arg("t", "in")
                .arg("st", 0)
                .arg("d", fade_in),
        );
        chain.push(
            Filter::new("afade")
                .arg("t", "out")
                .arg("st", clip.duration - fade_out)
                .arg("d", fade_out),
        );

        // Identical delay on both stereo channels.
        let delay_ms = (clip.start_time * 1000.0).round() as i64;
        chain.push(Filter::new("adelay").value(format!("{delay_ms}|{delay_ms}")));

        graph.push(chain);
        labels.push(label);
    }

    let mut mix = FilterChain::new(labels, vec!["aout".to_string()]);
    mix.push(
        Filter::new("amix")
            .arg("inputs", audio.len())
            .arg("duration", "longest")
            .arg("dropout_transition", 0),
    );
    graph.push(mix);
    "aout".to_string()
}

/// Full ffmpeg argument vector for executing a plan against staged
/// inputs, writing `output_name` in the engine's storage.
pub fn ffmpeg_args(
    plan: &CompositePlan,
    settings: &RenderSettings,
    output_name: &str,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-nostats".into(),
        "-progress".into(),
        "pipe:1".into(),
    ];

    for input in &plan.inputs {
        if input.loop_input {
            args.push("-loop".into());
            args.push("1".into());
        }
        args.push("-i".into());
        args.push(input.staged_name.clone());
    }

    args.push("-filter_complex".into());
    args.push(plan.graph.render());
    args.push("-map".into());
    args.push(format!("[{}]", plan.video_out));
    args.push("-map".into());
    args.push(format!("[{}]", plan.audio_out));
    args.push("-r".into());
    args.push(settings.frame_rate.to_string());
    args.push("-t".into());
    args.push(format!("{:.6}", plan.total_duration));
    args.push("-pix_fmt".into());
    args.push("yuv420p".into());

    args.push("-c:v".into());
    args.push(settings.format.video_codec().into());
    args.push("-crf".into());
    args.push(settings.quality.crf().to_string());
    match settings.format {
        cliplab_timeline_model::OutputFormat::Mp4 => {
            args.push("-preset".into());
            args.push(settings.speed_preset.as_str().into());
            args.push("-movflags".into());
            args.push("+faststart".into());
            args.push("-c:a".into());
            args.push(settings.format.audio_codec().into());
            args.push("-b:a".into());
            args.push("192k".into());
        }
        cliplab_timeline_model::OutputFormat::Webm => {
            // VP9 CRF mode requires an explicit zero target bitrate.
            args.push("-b:v".into());
            args.push("0".into());
            args.push("-cpu-used".into());
            args.push(vp9_cpu_used(settings.speed_preset).to_string());
            args.push("-row-mt".into());
            args.push("1".into());
            args.push("-c:a".into());
            args.push(settings.format.audio_codec().into());
            args.push("-b:a".into());
            args.push("128k".into());
        }
    }

    args.push(output_name.into());
    args
}

fn vp9_cpu_used(speed: cliplab_timeline_model::EncoderSpeed) -> u32 {
    use cliplab_timeline_model::EncoderSpeed;
    match speed {
        EncoderSpeed::Ultrafast => 5,
        EncoderSpeed::Fast => 4,
        EncoderSpeed::Medium => 2,
        EncoderSpeed::Slow => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliplab_timeline_model::{EncoderSpeed, OutputFormat, QualityPreset, Transform};

    fn settings() -> RenderSettings {
        RenderSettings {
            format: OutputFormat::Mp4,
            canvas_width: 1920,
            canvas_height: 1080,
            scale: 1.0,
            frame_rate: 30,
            quality: QualityPreset::Standard,
            speed_preset: EncoderSpeed::Medium,
        }
    }

    fn make_clip(id: &str, kind: AssetKind, start: f64, duration: f64) -> Clip {
        Clip {
            id: id.to_string(),
            kind,
            source: format!("sources/{id}"),
            start_time: start,
            duration,
            source_offset: 0.0,
            source_duration: duration + 60.0,
            layer: 0,
            transform: Transform {
                x: 100.0,
                y: 50.0,
                width: 640.0,
                height: 360.0,
                rotation_degrees: 0.0,
            },
            opacity: 1.0,
            volume: 1.0,
            fade_in: 0.0,
            fade_out: 0.0,
        }
    }

    #[test]
    fn plan_empty_timeline_is_one_second_of_silent_canvas() {
        let plan = plan(&[], &settings());

        assert!((plan.total_duration - 1.0).abs() < 1e-9);
        assert_eq!(plan.video_out, "base");
        assert!(plan.inputs.is_empty());

        let base = plan.graph.producer_of("base").unwrap();
        let color = base.find("color").unwrap();
        assert_eq!(color.get("s"), Some("1920x1080"));
        assert_eq!(color.get("d"), Some("1"));

        let silence = plan.graph.producer_of("aout").unwrap();
        assert!(silence.find("anullsrc").is_some());
        assert_eq!(silence.find("atrim").unwrap().get("duration"), Some("1"));
    }

    #[test]
    fn plan_image_clip_gate_is_half_open() {
        let clip = make_clip("img.png", AssetKind::Image, 2.0, 3.0);
        let plan = plan(&[clip], &settings());

        let overlay_chain = plan.graph.producer_of("ov0").unwrap();
        let overlay = overlay_chain.find("overlay").unwrap();
        assert_eq!(overlay.get("enable"), Some("'gte(t,2)*lt(t,5)'"));
        assert_eq!(overlay.get("x"), Some("100"));
        assert_eq!(overlay.get("y"), Some("50"));
        assert_eq!(plan.video_out, "ov0");

        // Image sources loop and are bounded by duration alone.
        assert!(plan.inputs[0].loop_input);
        let source = plan.graph.producer_of("v0").unwrap();
        assert_eq!(source.find("trim").unwrap().get("duration"), Some("3"));
    }

    #[test]
    fn plan_layers_composite_background_first() {
        let mut top = make_clip("top.mp4", AssetKind::Video, 0.0, 4.0);
        top.layer = 0;
        let mut background = make_clip("bg.mp4", AssetKind::Video, 0.0, 4.0);
        background.layer = 5;
        let plan = plan(&[top.clone(), background], &settings());

        // Higher layer number is composited first, so the lower number
        // ends up on top of the stack.
        let first = plan.graph.producer_of("ov0").unwrap();
        assert_eq!(first.inputs, vec!["base".to_string(), "v1".to_string()]);
        let second = plan.graph.producer_of("ov1").unwrap();
        assert_eq!(second.inputs, vec!["ov0".to_string(), "v0".to_string()]);
        assert_eq!(plan.video_out, "ov1");
    }

    #[test]
    fn plan_trims_respect_source_offset() {
        let mut clip = make_clip("a.mp4", AssetKind::Video, 1.0, 4.0);
        clip.source_offset = 2.5;
        let plan = plan(&[clip], &settings());

        let video = plan.graph.producer_of("v0").unwrap();
        let trim = video.find("trim").unwrap();
        assert_eq!(trim.get("start"), Some("2.5"));
        assert_eq!(trim.get("end"), Some("6.5"));

        let audio = plan.graph.producer_of("a0").unwrap();
        let atrim = audio.find("atrim").unwrap();
        assert_eq!(atrim.get("start"), Some("2.5"));
        assert_eq!(atrim.get("end"), Some("6.5"));
    }

    #[test]
    fn plan_audio_chain_shapes_volume_fades_and_delay() {
        let mut clip = make_clip("vo.mp3", AssetKind::Audio, 2.0, 5.0);
        clip.volume = 0.5;
        clip.fade_in = 0.5;
        clip.fade_out = 1.0;
        let plan = plan(&[clip], &settings());

        let audio = plan.graph.producer_of("a0").unwrap();
        assert_eq!(audio.find("volume").unwrap().get("volume"), Some("0.5"));

        let fades: Vec<&Filter> = audio.filters.iter().filter(|f| f.name == "afade").collect();
        assert_eq!(fades.len(), 2);
        assert_eq!(fades[0].get("t"), Some("in"));
        assert_eq!(fades[0].get("d"), Some("0.5"));
        assert_eq!(fades[1].get("t"), Some("out"));
        assert_eq!(fades[1].get("st"), Some("4"));
        assert_eq!(fades[1].get("d"), Some("1"));

        let rendered = plan.graph.render();
        assert!(rendered.contains("adelay=2000|2000"));

        let mix = plan.graph.producer_of("aout").unwrap();
        assert_eq!(mix.find("amix").unwrap().get("inputs"), Some("1"));
    }

    #[test]
    fn plan_zero_fade_gets_epsilon_ramp() {
        let clip = make_clip("a.mp4", AssetKind::Video, 0.0, 5.0);
        let plan = plan(&[clip], &settings());
        let audio = plan.graph.producer_of("a0").unwrap();
        let fade_in = audio.filters.iter().find(|f| f.name == "afade").unwrap();
        assert_eq!(fade_in.get("d"), Some("0.01"));
    }

    #[test]
    fn plan_overlong_fades_clamp_to_half_duration() {
        let mut clip = make_clip("a.mp4", AssetKind::Video, 0.0, 2.0);
        clip.fade_in = 5.0;
        clip.fade_out = 5.0;
        let plan = plan(&[clip], &settings());
        let audio = plan.graph.producer_of("a0").unwrap();
        let fades: Vec<&Filter> = audio.filters.iter().filter(|f| f.name == "afade").collect();
        assert_eq!(fades[0].get("d"), Some("1"));
        assert_eq!(fades[1].get("st"), Some("1"));
    }

    #[test]
    fn plan_skips_degenerate_clips() {
        let mut degenerate = make_clip("bad.mp4", AssetKind::Video, 0.0, 0.0);
        degenerate.duration = 0.0;
        let good = make_clip("good.mp4", AssetKind::Video, 0.0, 3.0);
        let plan = plan(&[degenerate, good], &settings());

        assert_eq!(plan.inputs.len(), 1);
        assert_eq!(plan.inputs[0].clip_id, "good.mp4");
        assert!((plan.total_duration - 3.0).abs() < 1e-9);
    }

    #[test]
    fn plan_rotation_and_opacity_are_conditional() {
        let plain = make_clip("plain.mp4", AssetKind::Video, 0.0, 3.0);
        let graph = plan(&[plain], &settings()).graph;
        let chain = graph.producer_of("v0").unwrap();
        assert!(chain.find("rotate").is_none());
        assert!(chain.find("colorchannelmixer").is_none());
        assert!(chain.find("format").is_none());

        let mut fancy = make_clip("fancy.mp4", AssetKind::Video, 0.0, 3.0);
        fancy.transform.rotation_degrees = 90.0;
        fancy.opacity = 0.5;
        let graph = plan(&[fancy], &settings()).graph;
        let chain = graph.producer_of("v0").unwrap();
        assert!(chain.find("format").is_some());
        let rotate = chain.find("rotate").unwrap();
        assert_eq!(rotate.get("c"), Some("none"));
        assert_eq!(
            chain.find("colorchannelmixer").unwrap().get("aa"),
            Some("0.5")
        );
    }

    #[test]
    fn plan_scale_factor_scales_geometry() {
        let clip = make_clip("a.mp4", AssetKind::Video, 0.0, 2.0);
        let half = RenderSettings {
            scale: 0.5,
            ..settings()
        };
        let plan = plan(&[clip], &half);

        let base = plan.graph.producer_of("base").unwrap();
        assert_eq!(base.find("color").unwrap().get("s"), Some("960x540"));

        let chain = plan.graph.producer_of("v0").unwrap();
        let scale = chain.find("scale").unwrap();
        assert_eq!(scale.get("w"), Some("320"));
        assert_eq!(scale.get("h"), Some("180"));

        let overlay = plan.graph.producer_of("ov0").unwrap().find("overlay").unwrap();
        assert_eq!(overlay.get("x"), Some("50"));
        assert_eq!(overlay.get("y"), Some("25"));
    }

    #[test]
    fn ffmpeg_args_mp4_and_webm_codec_pairs() {
        let clip = make_clip("img.png", AssetKind::Image, 0.0, 2.0);
        let mp4 = settings();
        let p = plan(std::slice::from_ref(&clip), &mp4);
        let args = ffmpeg_args(&p, &mp4, "output.mp4");

        assert_eq!(args[0], "-y");
        let loop_pos = args.iter().position(|a| a == "-loop").unwrap();
        assert_eq!(args[loop_pos + 2], "-i");
        assert_eq!(args[loop_pos + 3], "input-0.png");
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"aac".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
        assert!(args.contains(&"[ov0]".to_string()));
        assert_eq!(args.last().unwrap(), "output.mp4");

        let webm = RenderSettings {
            format: OutputFormat::Webm,
            ..settings()
        };
        let p = plan(std::slice::from_ref(&clip), &webm);
        let args = ffmpeg_args(&p, &webm, "output.webm");
        assert!(args.contains(&"libvpx-vp9".to_string()));
        assert!(args.contains(&"libopus".to_string()));
        assert!(!args.contains(&"-preset".to_string()));
    }
}

//! Build and print the compositing plan without rendering.

use std::path::PathBuf;

use cliplab_compose::{ffmpeg_args, plan};

use crate::timeline;

pub fn run(path: PathBuf, format: String, scale: f64, json: bool) -> anyhow::Result<()> {
    let timeline = timeline::load(&path)?;
    let settings = timeline::resolve_settings(&timeline, &format, None, None, scale, None)?;

    let plan = plan(&timeline.clips, &settings);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Compositing plan for: {}", path.display());
    println!("  Duration: {:.2}s", plan.total_duration);
    println!("  Inputs:");
    for input in &plan.inputs {
        println!(
            "    [{}] {} -> {}{}",
            input.index,
            input.source,
            input.staged_name,
            if input.loop_input { " (looped)" } else { "" },
        );
    }
    println!("  Outputs: [{}] video, [{}] audio", plan.video_out, plan.audio_out);
    println!();
    println!("Filter graph:");
    println!("  {}", plan.graph.render());
    println!();
    println!("ffmpeg arguments:");
    let output_name = format!("output.{}", settings.format.extension());
    println!("  {}", ffmpeg_args(&plan, &settings, &output_name).join(" "));

    Ok(())
}

//! Show timeline information.

use std::path::PathBuf;

use crate::timeline;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let timeline = timeline::load(&path)?;

    println!("Timeline: {}", path.display());
    println!("  Clips: {}", timeline.clips.len());

    let duration = timeline
        .clips
        .iter()
        .map(|c| c.end_time())
        .fold(0.0f64, f64::max);
    println!("  Duration: {duration:.2}s");

    if let Some(settings) = &timeline.settings {
        println!(
            "  Settings: {}x{} @{}fps, {:?}/{:?}",
            settings.output_width(),
            settings.output_height(),
            settings.frame_rate,
            settings.format,
            settings.quality,
        );
    }

    let mut clips: Vec<_> = timeline.clips.iter().collect();
    clips.sort_by(|a, b| {
        a.layer
            .cmp(&b.layer)
            .then(a.start_time.total_cmp(&b.start_time))
    });
    for clip in clips {
        println!(
            "  [layer {:>2}] {:>7.2}s..{:<7.2}s {:?} {} ({})",
            clip.layer,
            clip.start_time,
            clip.end_time(),
            clip.kind,
            clip.id,
            clip.source,
        );
    }

    Ok(())
}

//! Check system capabilities.

use cliplab_render_engine::FfmpegEngine;

pub fn run() -> anyhow::Result<()> {
    println!("Cliplab System Check");
    println!("{}", "=".repeat(50));

    let engine = FfmpegEngine::new();
    if engine.is_available() {
        println!("[OK] ffmpeg found in PATH");
    } else {
        println!("[FAIL] ffmpeg not found in PATH; exports will not work");
    }
    println!(
        "[OK] Engine staging directory: {}",
        engine.staging_dir().display()
    );

    let config = cliplab_common::config::AppConfig::load();
    println!("[OK] Configuration loaded");
    println!("     Exports directory: {}", config.exports_dir.display());
    println!(
        "     Render defaults: {} @{}fps, quality {}",
        config.render.format, config.render.frame_rate, config.render.quality
    );
    println!("     Remote render service: {}", config.render.remote_base_url);

    Ok(())
}

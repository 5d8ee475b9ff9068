//! Owned handle over the ffmpeg execution engine and its addressable
//! staging storage.
//!
//! The engine is exclusive-owner: every operation takes `&mut self`, so
//! at most one export can drive it at a time. The staging directory is
//! created lazily on first write and recreated from scratch by
//! [`FfmpegEngine::terminate`], which is the recovery path after a
//! cancelled or wedged render.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use cliplab_common::{CliplabError, CliplabResult};
use tokio::process::{Child, Command};

/// Handle to the ffmpeg binary plus a private staging directory for
/// input and output files.
#[derive(Debug)]
pub struct FfmpegEngine {
    staging_dir: PathBuf,
}

impl FfmpegEngine {
    pub fn new() -> Self {
        static INSTANCE: AtomicU64 = AtomicU64::new(0);
        let n = INSTANCE.fetch_add(1, Ordering::Relaxed);
        let staging_dir = std::env::temp_dir().join(format!(
            "cliplab-engine-{}-{n}",
            std::process::id()
        ));
        Self { staging_dir }
    }

    /// Whether ffmpeg is reachable on PATH.
    pub fn is_available(&self) -> bool {
        command_exists("ffmpeg")
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Absolute path of a staged file.
    pub fn path_of(&self, name: &str) -> CliplabResult<PathBuf> {
        // Staged names are flat; a separator would escape the staging dir.
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(CliplabError::render(format!(
                "Invalid staged file name: {name:?}"
            )));
        }
        Ok(self.staging_dir.join(name))
    }

    /// Write media bytes into staging storage under `name`.
    pub async fn write_input(&mut self, name: &str, bytes: &[u8]) -> CliplabResult<()> {
        let path = self.path_of(name)?;
        tokio::fs::create_dir_all(&self.staging_dir).await?;
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(name, len = bytes.len(), "Staged engine input");
        Ok(())
    }

    /// Read a file back out of staging storage.
    pub async fn read_output(&mut self, name: &str) -> CliplabResult<Vec<u8>> {
        let path = self.path_of(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CliplabError::FileNotFound { path })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a staged file. Missing files are not an error; cleanup
    /// paths call this unconditionally.
    pub async fn remove(&mut self, name: &str) -> CliplabResult<()> {
        let path = self.path_of(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Spawn ffmpeg with the given arguments, rooted in the staging
    /// directory, with progress on stdout and diagnostics on stderr.
    pub async fn spawn_ffmpeg(&mut self, args: &[String]) -> CliplabResult<Child> {
        tokio::fs::create_dir_all(&self.staging_dir).await?;
        tracing::debug!(?args, "Spawning ffmpeg");
        Command::new("ffmpeg")
            .args(args)
            .current_dir(&self.staging_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CliplabError::render(format!("Failed to start ffmpeg: {e}")))
    }

    /// Wipe staging storage and recreate it empty. Used after cancel
    /// and after failures that may have left partial files behind; the
    /// engine is immediately ready for the next export.
    pub async fn terminate(&mut self) -> CliplabResult<()> {
        match tokio::fs::remove_dir_all(&self.staging_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tokio::fs::create_dir_all(&self.staging_dir).await?;
        tracing::info!(dir = %self.staging_dir.display(), "Engine storage reset");
        Ok(())
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FfmpegEngine {
    fn drop(&mut self) {
        // Last-resort cleanup; the async paths normally empty this.
        let _ = std::fs::remove_dir_all(&self.staging_dir);
    }
}

fn command_exists(binary: &str) -> bool {
    std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn staging_roundtrip_and_removal() {
        let mut engine = FfmpegEngine::new();
        engine.write_input("input-0.mp4", b"fake media").await.unwrap();
        assert_eq!(
            engine.read_output("input-0.mp4").await.unwrap(),
            b"fake media"
        );

        engine.remove("input-0.mp4").await.unwrap();
        assert!(matches!(
            engine.read_output("input-0.mp4").await,
            Err(CliplabError::FileNotFound { .. })
        ));

        // Removing again is fine.
        engine.remove("input-0.mp4").await.unwrap();
        engine.terminate().await.unwrap();
    }

    #[tokio::test]
    async fn terminate_leaves_a_fresh_empty_store() {
        let mut engine = FfmpegEngine::new();
        engine.write_input("a.mp4", b"x").await.unwrap();
        engine.write_input("b.mp4", b"y").await.unwrap();

        engine.terminate().await.unwrap();
        assert!(matches!(
            engine.read_output("a.mp4").await,
            Err(CliplabError::FileNotFound { .. })
        ));

        // Usable again without any further setup.
        engine.write_input("c.mp4", b"z").await.unwrap();
        assert_eq!(engine.read_output("c.mp4").await.unwrap(), b"z");
        engine.terminate().await.unwrap();
    }

    #[test]
    fn path_of_rejects_traversal() {
        let engine = FfmpegEngine::new();
        assert!(engine.path_of("../escape.mp4").is_err());
        assert!(engine.path_of("dir/file.mp4").is_err());
        assert!(engine.path_of("").is_err());
        assert!(engine.path_of("input-3.png").is_ok());
    }
}

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

/// Destination for rendered audio files.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Writes `audio` under `file_name` and returns the full location.
    async fn write(&self, file_name: &str, audio: &[u8]) -> std::io::Result<PathBuf>;
}

/// Writes artifacts into a local directory.
#[derive(Debug, Clone)]
pub struct FsArtifactSink {
    dir: PathBuf,
}

impl FsArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArtifactSink for FsArtifactSink {
    async fn write(&self, file_name: &str, audio: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, audio).await?;
        debug!(path = %path.display(), bytes = audio.len(), "Wrote audio artifact");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsArtifactSink::new(dir.path());
        let path = sink.write("tts-abc.mp3", b"ID3audio").await.unwrap();
        assert_eq!(path, dir.path().join("tts-abc.mp3"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"ID3audio");
    }

    #[tokio::test]
    async fn test_fs_sink_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsArtifactSink::new(dir.path().join("missing"));
        assert!(sink.write("tts-abc.mp3", b"x").await.is_err());
    }
}

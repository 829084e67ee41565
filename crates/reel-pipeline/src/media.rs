//! Materialization of fetched media as locally served files.

use std::path::{Path, PathBuf};

use reel_models::ShotId;
use tracing::debug;

use crate::error::PipelineResult;

/// Writes generated videos into a directory served under `url_prefix`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a shot's video and return its public URL.
    ///
    /// The request token is part of the file name so a superseded request
    /// never overwrites a newer file.
    pub async fn store_video(&self, shot_id: &ShotId, token: u64, bytes: &[u8]) -> PipelineResult<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = format!("{}-{}.mp4", sanitize(shot_id.as_str()), token);
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        debug!(path = %path.display(), size = bytes.len(), "Stored video");
        Ok(format!("{}/{}", self.url_prefix, file_name))
    }
}

/// Keep ids safe for use as a file name.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_video_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().join("media"), "/media/");

        let url = store
            .store_video(&ShotId::from_string("shot-1"), 7, b"mp4")
            .await
            .unwrap();

        assert_eq!(url, "/media/shot-1-7.mp4");
        let written = std::fs::read(dir.path().join("media").join("shot-1-7.mp4")).unwrap();
        assert_eq!(written, b"mp4");
    }

    #[test]
    fn test_sanitize_strips_path_separators() {
        assert_eq!(sanitize("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize("a1-b_2"), "a1-b_2");
    }
}

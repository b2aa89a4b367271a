use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{PresenterError, PresenterResult};

/// A finalized recording. Immutable once sealed.
#[derive(Debug, PartialEq, Eq)]
pub struct CaptureArtifact {
    bytes: Vec<u8>,
    mime_type: String,
    chunk_count: usize,
}

impl CaptureArtifact {
    /// Concatenate `chunks` in arrival order.
    pub fn seal(chunks: Vec<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        let chunk_count = chunks.len();
        let bytes = chunks.concat();
        Self {
            bytes,
            mime_type: mime_type.into(),
            chunk_count,
        }
    }

    /// Byte length.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Concatenated chunk bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Container/codec of the recording.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Number of chunks the artifact was sealed from.
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }
}

/// Reference to a published artifact, valid until revoked or superseded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArtifactUrl(String);

impl ArtifactUrl {
    /// The URL text, e.g. `blob:smartwelcome/1`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Holds published artifacts behind URLs. Publishing a new artifact revokes the previous one.
#[derive(Debug)]
pub struct ArtifactStore {
    download_name: String,
    next: u64,
    current: Option<ArtifactUrl>,
    entries: HashMap<ArtifactUrl, Arc<CaptureArtifact>>,
}

impl ArtifactStore {
    /// Create an empty store; downloads are written as `download_name`.
    pub fn new(download_name: impl Into<String>) -> Self {
        Self {
            download_name: download_name.into(),
            next: 0,
            current: None,
            entries: HashMap::new(),
        }
    }

    /// Suggested file name for downloads.
    pub fn download_name(&self) -> &str {
        &self.download_name
    }

    /// Publish `artifact`, superseding (and revoking) the current one.
    pub fn publish(&mut self, artifact: CaptureArtifact) -> ArtifactUrl {
        if let Some(prev) = self.current.take() {
            self.revoke(&prev);
        }
        self.next += 1;
        let url = ArtifactUrl(format!("blob:smartwelcome/{}", self.next));
        tracing::info!(
            url = %url,
            bytes = artifact.len(),
            chunks = artifact.chunk_count(),
            "artifact published"
        );
        self.entries.insert(url.clone(), Arc::new(artifact));
        self.current = Some(url.clone());
        url
    }

    /// The most recently published URL, unless revoked.
    pub fn current(&self) -> Option<&ArtifactUrl> {
        self.current.as_ref()
    }

    /// Artifact behind `url`, if still live.
    pub fn resolve(&self, url: &ArtifactUrl) -> Option<Arc<CaptureArtifact>> {
        self.entries.get(url).cloned()
    }

    /// Release `url`. Returns `false` if it was not live.
    pub fn revoke(&mut self, url: &ArtifactUrl) -> bool {
        if self.current.as_ref() == Some(url) {
            self.current = None;
        }
        let removed = self.entries.remove(url).is_some();
        if removed {
            tracing::debug!(url = %url, "artifact revoked");
        }
        removed
    }

    /// Release every artifact.
    pub fn clear(&mut self) {
        self.current = None;
        self.entries.clear();
    }

    /// Write the artifact behind `url` to `dir/<download_name>`.
    pub fn download(&self, url: &ArtifactUrl, dir: &Path) -> PresenterResult<PathBuf> {
        let artifact = self
            .resolve(url)
            .ok_or_else(|| PresenterError::capture(format!("artifact '{url}' was revoked")))?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
        let path = dir.join(&self.download_name);
        std::fs::write(&path, artifact.bytes())
            .with_context(|| format!("write artifact '{}'", path.display()))?;
        tracing::info!(path = %path.display(), bytes = artifact.len(), "artifact saved");
        Ok(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/artifact.rs"]
mod tests;

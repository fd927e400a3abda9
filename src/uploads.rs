use anyhow::{anyhow, Context};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUpload {
    pub column: String,
    pub file_name: String,
    pub path: String,
    pub sha256: String,
    pub byte_len: usize,
}

/// Rejects names that would escape the per-employee upload folder.
pub fn sanitize_file_name(name: &str) -> anyhow::Result<String> {
    let base = Path::new(name.trim())
        .file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("invalid upload file name: {:?}", name))?;
    if base.is_empty() || base == "." || base == ".." {
        return Err(anyhow!("invalid upload file name: {:?}", name));
    }
    Ok(base)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Bytes written beside their final name, waiting for the row update to land.
#[derive(Debug)]
pub struct StagedUpload {
    staged: PathBuf,
    target: PathBuf,
    stored: StoredUpload,
}

impl StagedUpload {
    /// Moves the staged file over its final name.
    pub fn commit(self) -> anyhow::Result<StoredUpload> {
        std::fs::rename(&self.staged, &self.target).with_context(|| {
            format!("failed to move upload to {}", self.target.to_string_lossy())
        })?;
        Ok(self.stored)
    }

    /// Removes the staged file; the final name is never touched.
    pub fn discard(self) {
        if let Err(e) = std::fs::remove_file(&self.staged) {
            tracing::warn!(
                path = %self.staged.to_string_lossy(),
                error = %e,
                "failed to remove staged upload"
            );
        }
    }
}

/// Writes the bytes next to `<root>/<euid>/<file name>` without replacing it yet.
pub fn stage_upload(
    root: &Path,
    euid: i64,
    column: &str,
    file_name: &str,
    content: &[u8],
) -> anyhow::Result<StagedUpload> {
    let name = sanitize_file_name(file_name)?;
    let dir: PathBuf = root.join(euid.to_string());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory {}", dir.to_string_lossy()))?;
    let target = dir.join(&name);
    let staged = dir.join(format!(".{}.{}.part", name, uuid::Uuid::new_v4()));
    std::fs::write(&staged, content)
        .with_context(|| format!("failed to write {}", staged.to_string_lossy()))?;
    Ok(StagedUpload {
        stored: StoredUpload {
            column: column.to_string(),
            file_name: name,
            path: target.to_string_lossy().to_string(),
            sha256: sha256_hex(content),
            byte_len: content.len(),
        },
        staged,
        target,
    })
}

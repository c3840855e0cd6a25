use crate::manifest::GeneratedFile;
use std::path::{Path, PathBuf};

/// Paths whose content differs from what is on disk, sorted.
pub fn changed_files(files: &[GeneratedFile]) -> Vec<PathBuf> {
    let mut changed: Vec<PathBuf> = files
        .iter()
        .filter(|f| std::fs::read_to_string(&f.path).ok().as_deref() != Some(f.content.as_str()))
        .map(|f| f.path.clone())
        .collect();
    changed.sort();
    changed
}

/// Write every changed file. With `check`, fail instead of writing.
pub fn write_files(files: &[GeneratedFile], check: bool) -> anyhow::Result<Vec<PathBuf>> {
    let changed = changed_files(files);
    if check {
        if !changed.is_empty() {
            anyhow::bail!(
                "{} generated file(s) are out of date: {}",
                changed.len(),
                changed
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        return Ok(changed);
    }

    for file in files.iter().filter(|f| changed.contains(&f.path)) {
        write_atomic(&file.path, &file.content)?;
        tracing::info!(path = %file.path.display(), "wrote generated file");
    }
    Ok(changed)
}

fn write_atomic(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("failed to create directory {}: {e}", parent.display()))?;
    }

    let tmp = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_extension(format!("{ext}.tmp")),
        None => path.with_extension("tmp"),
    };
    std::fs::write(&tmp, content)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| anyhow::anyhow!("failed to move {} into place: {e}", path.display()))?;
    Ok(())
}

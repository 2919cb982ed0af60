use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Create the directory if it doesn’t exist; error if a non-directory exists there.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            bail!("Path exists but is not a directory: {}", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
    }
    Ok(())
}

/// Reject `-` as an output location.
pub fn assert_not_stdout(path: &Path) -> Result<()> {
    if path == Path::new("-") {
        bail!("stdout is not supported; provide a real directory path.");
    }
    Ok(())
}

/// Make `dir` ready to receive `files`.
///
/// Without `force`, any of `files` already present is an error and nothing is
/// written.
pub fn prepare_output_dir(dir: &Path, files: &[&str], force: bool) -> Result<()> {
    assert_not_stdout(dir)?;
    ensure_dir_exists(dir)?;
    if !force {
        if let Some(existing) = files.iter().map(|f| dir.join(f)).find(|p| p.exists()) {
            bail!("Refusing to overwrite existing file: {} (use --force)", existing.display());
        }
    }
    Ok(())
}

//! Directory bookkeeping around batch runs.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{PipelineError, PipelineResult};

/// Replace `dst` with a copy of the `src` tree.
///
/// A no-op when both paths name the same directory.
pub fn duplicate_dir(src: &Path, dst: &Path) -> PipelineResult<()> {
    if !src.is_dir() {
        return Err(PipelineError::NotADirectory(src.to_path_buf()));
    }
    let src_abs = src.canonicalize().map_err(|e| PipelineError::io(src, e))?;
    if let Ok(dst_abs) = dst.canonicalize() {
        if dst_abs == src_abs {
            return Ok(());
        }
    }
    let dst_abs = absolute(dst)?;
    if dst_abs.starts_with(&src_abs) {
        return Err(PipelineError::io(
            dst,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "destination lies inside the source directory",
            ),
        ));
    }

    if dst.exists() {
        fs::remove_dir_all(dst).map_err(|e| PipelineError::io(dst, e))?;
    }
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            PipelineError::io(path, e.into())
        })?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| PipelineError::io(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| PipelineError::io(&target, e))?;
        }
    }
    debug!(src = %src.display(), dst = %dst.display(), "Duplicated directory");
    Ok(())
}

/// Create `dir` and its parents if missing.
pub fn ensure_dir(dir: &Path) -> PipelineResult<()> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))
}

/// Make `dir` an empty directory, deleting anything already there.
pub fn init_dir(dir: &Path) -> PipelineResult<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
    }
    ensure_dir(dir)
}

/// Regular files directly inside `dir`, sorted by path.
pub fn list_files(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PipelineError::NotADirectory(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))? {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// File names of [`list_files`].
pub fn list_file_names(dir: &Path) -> PipelineResult<Vec<String>> {
    Ok(list_files(dir)?
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect())
}

/// Subdirectories directly inside `dir`, sorted by path.
pub fn subdirectories(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PipelineError::NotADirectory(dir.to_path_buf()));
    }
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))? {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Absolute form of a path that may not exist yet, with its parent canonicalized.
fn absolute(path: &Path) -> PipelineResult<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| PipelineError::io(path, e))?
            .join(path)
    };
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => match parent.canonicalize() {
            Ok(parent) => Ok(parent.join(name)),
            Err(_) => Ok(path.clone()),
        },
        _ => Ok(path.clone()),
    }
}

//! Best-effort filesystem helpers for the directories the worker owns.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tack_model::ClaimedTask;
use tracing::debug;

use crate::{config::WorkerConfig, error::CoreError};

pub const TASK_FILE: &str = "task.json";

/// Remove a file or a directory tree. A missing path is not an error.
pub fn rm(path: &Path) -> io::Result<()> {
    let res = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match res {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Wipe and recreate every managed directory.
pub fn cleanup(config: &WorkerConfig) -> io::Result<()> {
    for dir in config.managed_dirs() {
        debug!(dir = %dir.display(), "resetting directory");
        rm(dir)?;
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Write the claimed task definition where the task script expects it.
pub fn write_task_definition(
    config: &WorkerConfig,
    task: &ClaimedTask,
) -> Result<PathBuf, CoreError> {
    fs::create_dir_all(&config.work_dir)?;
    let path = config.work_dir.join(TASK_FILE);
    let body = serde_json::to_vec_pretty(&task.definition)
        .map_err(|e| CoreError::Unexpected(format!("serialize task definition: {e}")))?;
    fs::write(&path, body)?;
    Ok(path)
}

/// Every regular file below `root`, keyed by its `/`-separated relative path, sorted.
///
/// A missing root yields no files. Symlinks are skipped.
pub fn collect_files(root: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut out = Vec::new();
    if !root.exists() {
        return Ok(out);
    }
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let kind = entry.file_type()?;
            let path = entry.path();
            if kind.is_dir() {
                stack.push(path);
            } else if kind.is_file() {
                let Ok(rel) = path.strip_prefix(root) else {
                    continue;
                };
                let relative = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                out.push((relative, path));
            }
        }
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

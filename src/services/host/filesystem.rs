//! Working-directory and path operations relative to the session directory.

use std::fs;
use std::path::{Component, Path, PathBuf};

use super::{HostError, HostResult};
use crate::utils::paths::expand_home;

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

/// Resolve operator input against the session directory (`~` expands to home).
pub fn resolve(base: &Path, input: &str) -> PathBuf {
    let expanded = expand_home(input.trim());
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

/// Validate and normalize a new session directory.
pub fn change_directory(current: &Path, input: &str) -> HostResult<PathBuf> {
    if input.trim().is_empty() {
        return Err(HostError::Invalid("empty path".to_string()));
    }
    let target = resolve(current, input);
    let meta = fs::metadata(&target)?;
    if !meta.is_dir() {
        return Err(HostError::Invalid(format!(
            "{} is not a directory",
            target.display()
        )));
    }
    Ok(fs::canonicalize(&target)?)
}

/// Parent of the session directory, `None` at `/`.
pub fn parent_directory(current: &Path) -> Option<PathBuf> {
    current.parent().map(Path::to_path_buf)
}

/// Entries of `dir` sorted by name.
pub fn list_directory(dir: &Path) -> HostResult<Vec<DirEntryInfo>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        entries.push(DirEntryInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: meta.is_dir(),
            size: meta.len(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Create a directory (and parents) relative to the session directory.
pub fn make_directory(base: &Path, input: &str) -> HostResult<PathBuf> {
    if input.trim().is_empty() {
        return Err(HostError::Invalid("empty directory name".to_string()));
    }
    let target = resolve(base, input);
    fs::create_dir_all(&target)?;
    Ok(target)
}

/// Remove a file or a whole directory tree.
pub fn remove_path(base: &Path, input: &str) -> HostResult<PathBuf> {
    if input.trim().is_empty() {
        return Err(HostError::Invalid("empty path".to_string()));
    }
    let target = resolve(base, input);
    if target.parent().is_none() {
        return Err(HostError::Invalid("refusing to remove /".to_string()));
    }
    let meta = fs::symlink_metadata(&target)?;
    if meta.is_dir() {
        fs::remove_dir_all(&target)?;
    } else {
        fs::remove_file(&target)?;
    }
    Ok(target)
}

/// Basename of an uploaded file's declared name; `None` if nothing usable is left.
pub fn sanitize_file_name(declared: &str) -> Option<String> {
    let normalized = declared.replace('\\', "/");
    let name = Path::new(&normalized)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .last()?;
    let name = name.trim().to_string();
    (!name.is_empty()).then_some(name)
}

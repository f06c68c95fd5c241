//! Zip Container Creation
//!
//! Packs a file or a directory tree into a single deflated zip. Entry names
//! are relative to the source's parent, so `/srv/logs` becomes `logs/...`,
//! and directories get their own `name/` marker entries. A directory can be
//! excluded from the walk, which keeps the archive from containing itself when
//! it is written inside the tree being packed.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{TransferError, TransferResult};

/// Write `source` into a new zip at `target`. Returns the number of entries.
///
/// Symlinks are skipped; any unreadable entry aborts the archive. `exclude`,
/// if it lies inside `source`, is left out together with everything below it.
pub fn create_zip_archive(
    source: &Path,
    target: &Path,
    exclude: Option<&Path>,
) -> TransferResult<usize> {
    if !source.exists() {
        return Err(TransferError::NotFound(source.to_path_buf()));
    }

    let base = source.parent().unwrap_or(source);
    let file = File::create(target)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    let dir_options = SimpleFileOptions::default().unix_permissions(0o755);
    let file_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644)
        .large_file(true);

    let skip = exclude.and_then(|dir| excluded_path(source, dir));
    let walker = WalkBuilder::new(source)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_path(|a, b| a.cmp(b))
        .filter_entry(move |entry| skip.as_deref() != Some(entry.path()))
        .build();

    let mut entries = 0usize;
    for entry in walker {
        let entry = entry.map_err(|e| TransferError::Archive(e.to_string()))?;
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_symlink() {
            tracing::debug!("[Archive] skipping symlink {}", entry.path().display());
            continue;
        }

        let name = entry_name(base, entry.path())?;
        if file_type.is_dir() {
            zip.add_directory(format!("{}/", name), dir_options)?;
        } else {
            zip.start_file(name, file_options)?;
            let mut input = File::open(entry.path())?;
            io::copy(&mut input, &mut zip)?;
        }
        entries += 1;
    }

    let mut writer = zip.finish()?;
    io::Write::flush(&mut writer)?;
    Ok(entries)
}

/// `exclude` spelled the way the walk of `source` will report it, or `None`
/// when it is outside `source`.
fn excluded_path(source: &Path, exclude: &Path) -> Option<PathBuf> {
    let source_real = source.canonicalize().ok()?;
    let exclude_real = exclude.canonicalize().ok()?;
    let rest = exclude_real.strip_prefix(&source_real).ok()?;
    if rest.as_os_str().is_empty() {
        return None;
    }
    Some(source.join(rest))
}

/// Archive-relative entry name using `/` separators.
fn entry_name(base: &Path, path: &Path) -> TransferResult<String> {
    let relative = path.strip_prefix(base).unwrap_or(path);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return Err(TransferError::Archive(format!(
            "cannot name archive entry for {}",
            path.display()
        )));
    }
    Ok(parts.join("/"))
}

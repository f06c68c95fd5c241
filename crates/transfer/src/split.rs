//! Fixed-Size Part Splitting

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{TransferError, TransferResult};

/// Split `source` into `<source>.part0`, `<source>.part1`, ... of `chunk_size`
/// bytes each; the final part holds the remainder.
///
/// Part paths are pushed into `parts` as soon as each file is created, so a
/// caller that owns `parts` can clean up after a mid-way failure.
pub fn split_file(source: &Path, chunk_size: u64, parts: &mut Vec<PathBuf>) -> TransferResult<()> {
    if chunk_size == 0 {
        return Err(TransferError::Split("chunk size must be non-zero".to_string()));
    }

    let total = source.metadata()?.len();
    let mut reader = BufReader::new(File::open(source)?);
    let mut offset = 0u64;
    let mut index = 0usize;

    while offset < total {
        let part_path = part_path(source, index);
        let file = File::create(&part_path)?;
        parts.push(part_path);

        let want = chunk_size.min(total - offset);
        let mut writer = BufWriter::new(file);
        let copied = io::copy(&mut (&mut reader).take(want), &mut writer)?;
        writer.flush()?;
        if copied != want {
            return Err(TransferError::Split(format!(
                "short read at part {}: expected {} bytes, got {}",
                index, want, copied
            )));
        }

        offset += copied;
        index += 1;
    }

    Ok(())
}

fn part_path(source: &Path, index: usize) -> PathBuf {
    let mut name = source.as_os_str().to_os_string();
    name.push(format!(".part{}", index));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_split_sizes_and_order() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("data.zip");
        let bytes: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        fs::write(&source, &bytes).unwrap();

        let mut parts = Vec::new();
        split_file(&source, 1000, &mut parts).unwrap();

        assert_eq!(parts.len(), 3);
        assert!(parts[0].to_string_lossy().ends_with("data.zip.part0"));
        assert!(parts[2].to_string_lossy().ends_with("data.zip.part2"));

        let sizes: Vec<u64> = parts.iter().map(|p| p.metadata().unwrap().len()).collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);

        let joined: Vec<u8> = parts.iter().flat_map(|p| fs::read(p).unwrap()).collect();
        assert_eq!(joined, bytes);
    }

    #[test]
    fn test_split_exact_multiple() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("even.zip");
        fs::write(&source, vec![1u8; 300]).unwrap();

        let mut parts = Vec::new();
        split_file(&source, 100, &mut parts).unwrap();
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn test_split_zero_chunk_rejected() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("x.zip");
        fs::write(&source, b"abc").unwrap();

        let mut parts = Vec::new();
        assert!(split_file(&source, 0, &mut parts).is_err());
        assert!(parts.is_empty());
    }
}

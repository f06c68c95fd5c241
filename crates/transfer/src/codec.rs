//! Chunked Transfer Codec
//!
//! `ChunkedTransfer::deliver` decides between a direct send and an
//! archive-then-split job, then pushes every piece through a `FileSink` in
//! order. A `TransferJob` owns its intermediates and removes them on drop, so
//! no exit path (success, archive failure, split failure, send failure) can
//! leave part files behind. Jobs share no state; the codec can be reused for
//! unrelated requests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::archive::create_zip_archive;
use crate::error::{TransferError, TransferResult};
use crate::split::split_file;

/// Receives the pieces of a transfer, in order.
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Send one file. `caption` is `Part <n>` (1-based) for chunked jobs.
    async fn send_file(&self, path: &Path, caption: Option<&str>) -> Result<(), String>;
}

/// Size limits for a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLimits {
    /// Regular files up to this size are sent as-is (threshold T).
    pub direct_limit: u64,
    /// Size of every part but the last (C).
    pub chunk_size: u64,
}

impl Default for TransferLimits {
    fn default() -> Self {
        Self {
            direct_limit: 20 * 1024 * 1024,
            chunk_size: 20 * 1024 * 1024,
        }
    }
}

/// What will be sent for a target.
#[derive(Debug)]
pub enum TransferPlan {
    /// Send the file itself; nothing was created on disk.
    Direct(PathBuf),
    /// Send the parts of a freshly built archive.
    Chunked(TransferJob),
}

/// Intermediates of one archive-then-split job.
#[derive(Debug)]
pub struct TransferJob {
    dir: Option<TempDir>,
    archive: PathBuf,
    parts: Vec<PathBuf>,
}

impl TransferJob {
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    pub fn parts(&self) -> &[PathBuf] {
        &self.parts
    }

    /// Remove the archive, every part and the job directory now.
    pub fn cleanup(mut self) -> std::io::Result<()> {
        self.remove_all()
    }

    fn remove_all(&mut self) -> std::io::Result<()> {
        for part in self.parts.drain(..) {
            remove_if_exists(&part)?;
        }
        remove_if_exists(&self.archive)?;
        if let Some(dir) = self.dir.take() {
            dir.close()?;
        }
        Ok(())
    }
}

impl Drop for TransferJob {
    fn drop(&mut self) {
        if let Err(e) = self.remove_all() {
            tracing::warn!(
                "[ChunkedTransfer] failed to remove intermediates of {}: {}",
                self.archive.display(),
                e
            );
        }
    }
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Outcome of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub chunked: bool,
    pub parts: usize,
}

/// Archive-then-split delivery of files and directories.
#[derive(Debug, Clone)]
pub struct ChunkedTransfer {
    limits: TransferLimits,
    work_dir: PathBuf,
}

impl ChunkedTransfer {
    /// Create a codec whose job directories are created under `work_dir`.
    pub fn new(limits: TransferLimits, work_dir: impl Into<PathBuf>) -> TransferResult<Self> {
        if limits.chunk_size == 0 {
            return Err(TransferError::InvalidLimits("chunk size must be non-zero".to_string()));
        }
        let work_dir = work_dir.into();
        std::fs::create_dir_all(&work_dir)?;
        Ok(Self { limits, work_dir })
    }

    pub fn limits(&self) -> TransferLimits {
        self.limits
    }

    /// Build the plan for `target`. Blocking: may archive a whole tree.
    pub fn prepare(&self, target: &Path) -> TransferResult<TransferPlan> {
        let meta = std::fs::metadata(target).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TransferError::NotFound(target.to_path_buf()),
            _ => TransferError::Io(e),
        })?;

        if meta.is_file() && meta.len() <= self.limits.direct_limit {
            return Ok(TransferPlan::Direct(target.to_path_buf()));
        }

        let dir = tempfile::Builder::new()
            .prefix("transfer-")
            .tempdir_in(&self.work_dir)?;
        let base_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());
        let dir_path = dir.path().to_path_buf();
        let archive = dir_path.join(format!("{}.zip", base_name));

        // The job owns the directory from here on; early returns drop it.
        let mut job = TransferJob {
            dir: Some(dir),
            archive,
            parts: Vec::new(),
        };

        // the work dir may sit inside the target tree
        let entries = create_zip_archive(target, &job.archive, Some(&dir_path))?;
        split_file(&job.archive, self.limits.chunk_size, &mut job.parts)?;

        tracing::info!(
            "[ChunkedTransfer] archived {} entries from {} into {} part(s)",
            entries,
            target.display(),
            job.parts.len()
        );

        Ok(TransferPlan::Chunked(job))
    }

    /// Deliver `target` through `sink`, cleaning up every intermediate.
    pub async fn deliver<S>(&self, target: &Path, sink: &S) -> TransferResult<TransferReport>
    where
        S: FileSink + ?Sized,
    {
        let codec = self.clone();
        let owned_target = target.to_path_buf();
        let plan = tokio::task::spawn_blocking(move || codec.prepare(&owned_target))
            .await
            .map_err(|e| TransferError::Io(std::io::Error::other(e.to_string())))??;

        match plan {
            TransferPlan::Direct(path) => {
                sink.send_file(&path, None)
                    .await
                    .map_err(|message| TransferError::Delivery { part: 1, message })?;
                Ok(TransferReport { chunked: false, parts: 1 })
            }
            TransferPlan::Chunked(job) => {
                for (i, part) in job.parts().iter().enumerate() {
                    let caption = format!("Part {}", i + 1);
                    sink.send_file(part, Some(&caption))
                        .await
                        .map_err(|message| TransferError::Delivery { part: i + 1, message })?;
                }
                let parts = job.parts().len();
                job.cleanup()?;
                Ok(TransferReport { chunked: true, parts })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(Vec<u8>, Option<String>)>>,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl FileSink for RecordingSink {
        async fn send_file(&self, path: &Path, caption: Option<&str>) -> Result<(), String> {
            let mut sent = self.sent.lock().unwrap();
            if self.fail_at == Some(sent.len() + 1) {
                return Err("network down".to_string());
            }
            sent.push((fs::read(path).unwrap(), caption.map(str::to_string)));
            Ok(())
        }
    }

    fn limits(direct: u64, chunk: u64) -> TransferLimits {
        TransferLimits {
            direct_limit: direct,
            chunk_size: chunk,
        }
    }

    fn is_empty_dir(path: &Path) -> bool {
        fs::read_dir(path).unwrap().next().is_none()
    }

    fn noisy_file(path: &Path, len: usize) {
        let mut state = 0x2545_f491u32;
        let bytes: Vec<u8> = (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect();
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_prepare_small_file_is_direct() {
        let src = tempfile::TempDir::new().unwrap();
        let work = tempfile::TempDir::new().unwrap();
        let file = src.path().join("note.txt");
        fs::write(&file, "small").unwrap();

        let codec = ChunkedTransfer::new(limits(1024, 512), work.path()).unwrap();
        match codec.prepare(&file).unwrap() {
            TransferPlan::Direct(p) => assert_eq!(p, file),
            other => panic!("expected direct plan, got {:?}", other),
        }
        assert!(is_empty_dir(work.path()));
    }

    #[test]
    fn test_prepare_directory_parts_reassemble_archive() {
        let src = tempfile::TempDir::new().unwrap();
        let work = tempfile::TempDir::new().unwrap();
        let root = src.path().join("tree");
        fs::create_dir_all(root.join("a/b")).unwrap();
        noisy_file(&root.join("a/one.bin"), 6000);
        noisy_file(&root.join("a/b/two.bin"), 5000);

        let codec = ChunkedTransfer::new(limits(1024, 1000), work.path()).unwrap();
        let job = match codec.prepare(&root).unwrap() {
            TransferPlan::Chunked(job) => job,
            other => panic!("expected chunked plan, got {:?}", other),
        };

        let archive = fs::read(job.archive()).unwrap();
        let joined: Vec<u8> = job.parts().iter().flat_map(|p| fs::read(p).unwrap()).collect();
        assert_eq!(joined, archive);
        for part in job.parts() {
            assert!(part.metadata().unwrap().len() <= 1000);
        }

        drop(job);
        assert!(is_empty_dir(work.path()));
    }

    #[test]
    fn test_prepare_tree_containing_work_dir() {
        let src = tempfile::TempDir::new().unwrap();
        let root = src.path().join("tmp");
        fs::create_dir_all(&root).unwrap();
        noisy_file(&root.join("data.bin"), 3000);

        let codec = ChunkedTransfer::new(limits(1024, 1000), root.join("jobs")).unwrap();
        let job = match codec.prepare(&root).unwrap() {
            TransferPlan::Chunked(job) => job,
            other => panic!("expected chunked plan, got {:?}", other),
        };

        let mut zip = zip::ZipArchive::new(fs::File::open(job.archive()).unwrap()).unwrap();
        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"tmp/data.bin".to_string()));
        assert!(names.contains(&"tmp/jobs/".to_string()));
        assert!(names.iter().all(|n| !n.contains("transfer-")), "{:?}", names);

        drop(job);
        assert!(is_empty_dir(&root.join("jobs")));
    }

    #[test]
    fn test_prepare_missing_target() {
        let work = tempfile::TempDir::new().unwrap();
        let codec = ChunkedTransfer::new(TransferLimits::default(), work.path()).unwrap();
        let result = codec.prepare(&work.path().join("missing"));
        assert!(matches!(result, Err(TransferError::NotFound(_))));
        assert!(is_empty_dir(work.path()));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let work = tempfile::TempDir::new().unwrap();
        assert!(ChunkedTransfer::new(limits(10, 0), work.path()).is_err());
    }

    #[tokio::test]
    async fn test_deliver_direct_file() {
        let src = tempfile::TempDir::new().unwrap();
        let work = tempfile::TempDir::new().unwrap();
        let file = src.path().join("report.txt");
        fs::write(&file, "contents").unwrap();

        let codec = ChunkedTransfer::new(limits(1024, 512), work.path()).unwrap();
        let sink = RecordingSink::default();
        let report = codec.deliver(&file, &sink).await.unwrap();

        assert_eq!(report, TransferReport { chunked: false, parts: 1 });
        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent[0].0, b"contents");
        assert_eq!(sent[0].1, None);
    }

    #[tokio::test]
    async fn test_deliver_chunked_captions_and_cleanup() {
        let src = tempfile::TempDir::new().unwrap();
        let work = tempfile::TempDir::new().unwrap();
        let file = src.path().join("video.bin");
        noisy_file(&file, 9000);

        let codec = ChunkedTransfer::new(limits(4096, 2048), work.path()).unwrap();
        let sink = RecordingSink::default();
        let report = codec.deliver(&file, &sink).await.unwrap();

        assert!(report.chunked);
        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), report.parts);
        for (i, (bytes, caption)) in sent.iter().enumerate() {
            assert!(bytes.len() <= 2048);
            assert_eq!(caption.as_deref(), Some(format!("Part {}", i + 1).as_str()));
        }
        assert!(is_empty_dir(work.path()));
    }

    #[tokio::test]
    async fn test_deliver_failure_still_cleans_up() {
        let src = tempfile::TempDir::new().unwrap();
        let work = tempfile::TempDir::new().unwrap();
        let file = src.path().join("dump.bin");
        noisy_file(&file, 9000);

        let codec = ChunkedTransfer::new(limits(1024, 1024), work.path()).unwrap();
        let sink = RecordingSink {
            fail_at: Some(2),
            ..Default::default()
        };
        let result = codec.deliver(&file, &sink).await;

        match result {
            Err(TransferError::Delivery { part, .. }) => assert_eq!(part, 2),
            other => panic!("expected delivery failure, got {:?}", other),
        }
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
        assert!(is_empty_dir(work.path()));
    }
}

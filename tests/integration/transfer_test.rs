//! File Transfer Integration Tests
//!
//! `/download` through the chunked transfer codec, inbound file uploads and
//! the `/logs` delivery, all against the recording adapter.

use std::fs;
use std::io::{Cursor, Read};

use remote_assistant::services::host::mock::MockHost;
use remote_assistant::services::remote::adapters::mock::Sent;
use remote_assistant::services::remote::types::{Attachment, AttachmentKind};

use super::harness::{files_under, join_texts, Harness, PEER};

// ============================================================================
// Helper Functions
// ============================================================================

/// Deterministic, poorly compressible bytes.
fn noise(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        })
        .collect()
}

/// Captions and concatenated bytes of every document sent.
fn reassemble(sent: &[Sent]) -> (Vec<Option<String>>, Vec<u8>) {
    let mut captions = Vec::new();
    let mut bytes = Vec::new();
    for item in sent {
        if let Sent::Document {
            caption, bytes: part, ..
        } = item
        {
            captions.push(caption.clone());
            bytes.extend_from_slice(part);
        }
    }
    (captions, bytes)
}

fn read_entry(archive: &[u8], name: &str) -> Vec<u8> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    content
}

fn document(file_id: &str, name: Option<&str>, size: u64) -> Attachment {
    Attachment {
        kind: AttachmentKind::Document,
        file_id: file_id.to_string(),
        file_name: name.map(str::to_string),
        size,
    }
}

// ============================================================================
// Download
// ============================================================================

#[tokio::test]
async fn test_small_file_is_sent_directly() {
    let mut h = Harness::start(MockHost::default()).await;
    fs::write(h.home().join("notes.txt"), b"remember the milk").unwrap();

    let sent = h.send("/download notes.txt").await;
    assert_eq!(
        sent,
        vec![Sent::Document {
            chat_id: PEER,
            file_name: "notes.txt".to_string(),
            caption: None,
            bytes: b"remember the milk".to_vec(),
        }]
    );
    h.stop().await;
}

#[tokio::test]
async fn test_large_file_is_archived_and_split() {
    let mut h = Harness::start(MockHost::default()).await;
    let payload = noise(4000);
    fs::write(h.home().join("big.bin"), &payload).unwrap();

    let sent = h.send("/download big.bin").await;
    let (captions, archive) = reassemble(&sent);

    assert!(captions.len() >= 2);
    for (i, caption) in captions.iter().enumerate() {
        assert_eq!(caption.as_deref(), Some(format!("Part {}", i + 1).as_str()));
    }
    for item in &sent {
        if let Sent::Document { bytes, .. } = item {
            assert!(bytes.len() <= 512);
        }
    }
    assert_eq!(read_entry(&archive, "big.bin"), payload);
    assert!(files_under(&h.jobs_dir()).is_empty());
    h.stop().await;
}

#[tokio::test]
async fn test_directory_is_always_archived() {
    let mut h = Harness::start(MockHost::default()).await;
    let project = h.home().join("project");
    fs::create_dir_all(project.join("src")).unwrap();
    fs::write(project.join("src/main.rs"), b"fn main() {}\n").unwrap();
    fs::write(project.join("README"), b"tiny").unwrap();

    let sent = h.send("/download project").await;
    let (captions, archive) = reassemble(&sent);

    assert!(!captions.is_empty());
    for (i, caption) in captions.iter().enumerate() {
        assert_eq!(caption.as_deref(), Some(format!("Part {}", i + 1).as_str()));
    }
    assert_eq!(read_entry(&archive, "project/src/main.rs"), b"fn main() {}\n");
    assert_eq!(read_entry(&archive, "project/README"), b"tiny");
    assert!(files_under(&h.jobs_dir()).is_empty());
    h.stop().await;
}

#[tokio::test]
async fn test_failed_part_aborts_and_cleans_up() {
    let mut h = Harness::start(MockHost::default()).await;
    fs::write(h.home().join("big.bin"), noise(4000)).unwrap();
    h.adapter.fail_document_at(1);

    let sent = h.send("/download big.bin").await;
    let (captions, _) = reassemble(&sent);
    assert_eq!(captions, vec![Some("Part 1".to_string())]);

    let text = join_texts(&sent);
    assert!(text.starts_with("❌ Transfer failed:"), "{}", text);
    assert!(text.contains("part 2"), "{}", text);
    assert!(files_under(&h.jobs_dir()).is_empty());

    // the session keeps working
    assert_eq!(h.reply("/shell true").await, "ran: true");
    h.stop().await;
}

#[tokio::test]
async fn test_missing_target() {
    let mut h = Harness::start(MockHost::default()).await;
    assert_eq!(h.reply("/download nothing-here").await, "File not found");

    h.reply("/download").await;
    assert_eq!(h.reply("still-nothing").await, "File not found");
    h.stop().await;
}

#[tokio::test]
async fn test_logs_are_delivered() {
    let mut h = Harness::start(MockHost::default()).await;
    fs::write(h.dir.path().join("agent.log"), b"INFO started\n").unwrap();

    let sent = h.send("/logs").await;
    let (captions, bytes) = reassemble(&sent);
    assert_eq!(captions, vec![None]);
    assert_eq!(bytes, b"INFO started\n");
    h.stop().await;
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload_lands_in_current_directory() {
    let mut h = Harness::start(MockHost::default()).await;
    fs::create_dir_all(h.home().join("inbox")).unwrap();
    h.adapter.register_file("f-1", b"quarterly numbers");

    let ready = h.reply("/upload inbox").await;
    assert!(ready.starts_with("📤 Send the file, it will be saved to"), "{}", ready);
    assert!(h.cwd().await.ends_with("inbox"));

    let sent = h.send_attachment(document("f-1", Some("report.csv"), 17)).await;
    assert!(join_texts(&sent).starts_with("✅ File saved:"));
    assert_eq!(
        fs::read(h.home().join("inbox/report.csv")).unwrap(),
        b"quarterly numbers"
    );
    h.stop().await;
}

#[tokio::test]
async fn test_upload_without_name_or_with_traversal() {
    let mut h = Harness::start(MockHost::default()).await;
    h.adapter.register_file("anon", b"a");
    h.adapter.register_file("sneaky", b"b");

    h.send_attachment(document("anon", None, 1)).await;
    assert_eq!(fs::read(h.home().join("upload-anon")).unwrap(), b"a");

    h.send_attachment(document("sneaky", Some("../../etc/passwd"), 1)).await;
    assert_eq!(fs::read(h.home().join("passwd")).unwrap(), b"b");
    assert!(!h.dir.path().join("etc").exists());
    h.stop().await;
}

#[tokio::test]
async fn test_image_document_sets_wallpaper() {
    let mut h = Harness::start(MockHost::default()).await;
    h.adapter.register_file("img", b"\xff\xd8\xff");

    let sent = h.send_attachment(document("img", Some("beach.JPG"), 3)).await;
    assert_eq!(join_texts(&sent), "✅ Wallpaper set");

    let calls = h.host.desktop.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("wallpaper:") && calls[0].ends_with("beach.JPG"));
    // wallpapers do not land in the working directory
    assert!(!h.home().join("beach.JPG").exists());
    h.stop().await;
}

#[tokio::test]
async fn test_failed_download_is_reported() {
    let mut h = Harness::start(MockHost::default()).await;
    let sent = h.send_attachment(document("unknown", Some("a.txt"), 1)).await;
    assert!(join_texts(&sent).starts_with("❌ Error: Failed to download file"));
    h.stop().await;
}

#[tokio::test]
async fn test_failed_upload_keeps_existing_file() {
    let mut h = Harness::start(MockHost::default()).await;
    fs::write(h.home().join("budget.xlsx"), b"original").unwrap();

    let sent = h.send_attachment(document("gone", Some("budget.xlsx"), 8)).await;
    assert!(join_texts(&sent).starts_with("❌ Error: Failed to download file"));

    assert_eq!(fs::read(h.home().join("budget.xlsx")).unwrap(), b"original");
    assert_eq!(files_under(&h.home()), vec![h.home().join("budget.xlsx")]);
    h.stop().await;
}

#[tokio::test]
async fn test_upload_replaces_existing_file() {
    let mut h = Harness::start(MockHost::default()).await;
    fs::write(h.home().join("notes.txt"), b"old").unwrap();
    h.adapter.register_file("f-2", b"new contents");

    h.send_attachment(document("f-2", Some("notes.txt"), 12)).await;
    assert_eq!(fs::read(h.home().join("notes.txt")).unwrap(), b"new contents");
    assert_eq!(files_under(&h.home()), vec![h.home().join("notes.txt")]);
    h.stop().await;
}

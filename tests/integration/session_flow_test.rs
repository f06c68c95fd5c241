//! Session Flow Integration Tests
//!
//! Drive the full gateway (routing, prompts, confirmation, credential,
//! paging) through the recording adapter.

use std::time::Duration;

use remote_assistant::services::host::mock::MockHost;
use remote_assistant::services::host::ProcessEntry;
use remote_assistant::services::remote::adapters::mock::Sent;
use remote_assistant::services::remote::session::PendingPrompt;

use super::harness::{join_texts, Harness, Options, PEER, STRANGER};

fn process(pid: u32, name: &str) -> ProcessEntry {
    ProcessEntry {
        pid,
        name: name.to_string(),
        memory_mb: 100.0,
        cpu_percent: pid as f32,
    }
}

// ============================================================================
// Prompts
// ============================================================================

#[tokio::test]
async fn test_prompt_consumes_next_text() {
    let mut h = Harness::start(MockHost::default()).await;

    assert_eq!(h.reply("/shell").await, "💻 Enter command to execute:");
    assert_eq!(h.reply("  ls -la  ").await, "ran: ls -la");

    // the prompt was used up; plain text is unknown again
    assert_eq!(
        h.reply("ls -la").await,
        "❌ Unknown command. Use /help for list."
    );
    assert_eq!(h.host.shell.requests().len(), 1);
    h.stop().await;
}

#[tokio::test]
async fn test_new_command_supersedes_prompt() {
    let mut h = Harness::start(MockHost::with_processes(vec![process(1, "firefox")])).await;

    h.reply("/kill").await;
    assert_eq!(
        h.gateway.session().lock().await.prompt(),
        PendingPrompt::AwaitingArgument(
            remote_assistant::services::remote::command_router::CommandKind::Kill
        )
    );

    h.reply("/info").await;
    assert_eq!(h.gateway.session().lock().await.prompt(), PendingPrompt::Idle);

    assert_eq!(
        h.reply("firefox").await,
        "❌ Unknown command. Use /help for list."
    );
    assert_eq!(h.host.processes.remaining().len(), 1);
    h.stop().await;
}

#[tokio::test]
async fn test_inline_argument_skips_prompt() {
    let mut h = Harness::start(MockHost::default()).await;
    assert_eq!(h.reply("/notify build finished").await, "🔔 Notification sent: build finished");
    assert_eq!(h.host.desktop.calls(), vec!["notify:build finished"]);
    assert_eq!(h.gateway.session().lock().await.prompt(), PendingPrompt::Idle);
    h.stop().await;
}

#[tokio::test]
async fn test_kill_by_name_reports_count() {
    let mut h = Harness::start(MockHost::with_processes(vec![
        process(10, "firefox"),
        process(11, "firefox"),
        process(12, "sshd"),
    ]))
    .await;

    h.reply("/kill").await;
    assert_eq!(h.reply("firefox").await, "Killed 2 processes named firefox");
    assert_eq!(h.host.processes.remaining(), vec![process(12, "sshd")]);
    h.stop().await;
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn test_stranger_cannot_touch_session() {
    let mut h = Harness::start(MockHost::default()).await;
    let home = h.cwd().await;

    h.reply("/kill").await;
    let sent = h.send_from(STRANGER, "/cd /").await;
    assert_eq!(
        sent,
        vec![Sent::Text {
            chat_id: STRANGER,
            text: "🚫 Access denied".to_string(),
        }]
    );
    h.send_from(STRANGER, "/sudo_pass stolen").await;

    let session = h.gateway.session();
    {
        let session = session.lock().await;
        assert_eq!(session.cwd(), home);
        assert!(!session.credential().is_set());
        assert!(matches!(session.prompt(), PendingPrompt::AwaitingArgument(_)));
    }

    // the operator's armed prompt still applies
    assert_eq!(h.reply("ghost").await, "Killed 0 processes named ghost");
    h.stop().await;
}

#[tokio::test]
async fn test_redelivered_message_is_ignored() {
    let mut h = Harness::start(MockHost::default()).await;
    let msg = remote_assistant::services::remote::types::IncomingRemoteMessage::text(
        PEER, 900, "/shell uptime",
    );
    assert_eq!(join_texts(&h.deliver(msg.clone()).await), "ran: uptime");
    assert!(h.deliver(msg).await.is_empty());
    assert_eq!(h.host.shell.requests().len(), 1);
    h.stop().await;
}

// ============================================================================
// Confirmation
// ============================================================================

#[tokio::test]
async fn test_power_commands_need_confirm() {
    let mut h = Harness::start(MockHost::default()).await;

    assert_eq!(h.reply("/reboot").await, "🔁 Confirm reboot: /reboot confirm");
    assert_eq!(h.reply("/reboot now").await, "🔁 Confirm reboot: /reboot confirm");
    // a confirmation request never arms a prompt
    assert_eq!(
        h.reply("confirm").await,
        "❌ Unknown command. Use /help for list."
    );
    assert!(h.host.desktop.calls().is_empty());

    assert_eq!(h.reply("/shutdown confirm").await, "⚡ Executing shutdown");
    assert_eq!(h.host.desktop.calls(), vec!["power:shutdown"]);
    h.stop().await;
}

// ============================================================================
// Credential
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_sudo_credential_expires() {
    let mut h = Harness::start_with(
        MockHost::default(),
        Options {
            credential_ttl: Duration::from_secs(60),
            ..Options::default()
        },
    )
    .await;

    assert_eq!(
        h.reply("/shell sudo whoami").await,
        "🔐 Set sudo password first with /sudo_pass"
    );

    h.reply("/sudo_pass").await;
    assert_eq!(h.reply("hunter2").await, "✅ Sudo password set");
    assert_eq!(h.reply("/shell sudo whoami").await, "ran: whoami");
    assert_eq!(
        h.host.shell.requests()[0].elevate_with.as_deref(),
        Some("hunter2")
    );

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert!(!h.gateway.session().lock().await.credential().is_set());
    assert_eq!(
        h.reply("/shell sudo whoami").await,
        "🔐 Set sudo password first with /sudo_pass"
    );
    // plain commands never need it
    assert_eq!(h.reply("/shell whoami").await, "ran: whoami");
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_new_password_restarts_expiry() {
    let mut h = Harness::start_with(
        MockHost::default(),
        Options {
            credential_ttl: Duration::from_secs(60),
            ..Options::default()
        },
    )
    .await;

    h.reply("/sudo_pass first").await;
    tokio::time::sleep(Duration::from_secs(40)).await;
    h.reply("/sudo_pass second").await;
    tokio::time::sleep(Duration::from_secs(40)).await;

    // the first password's timer must not clear the second one
    assert_eq!(h.reply("/shell sudo id").await, "ran: id");
    assert_eq!(
        h.host.shell.requests()[0].elevate_with.as_deref(),
        Some("second")
    );
    h.stop().await;
}

// ============================================================================
// Paging and reports
// ============================================================================

#[tokio::test]
async fn test_long_output_is_paged_without_loss() {
    let mut h = Harness::start_with(
        MockHost::default(),
        Options {
            max_message_length: 120,
            ..Options::default()
        },
    )
    .await;

    let output: String = (0..50).map(|i| format!("entry-{:03}\n", i)).collect();
    h.host.shell.push_response(Ok(output.clone()));
    let sent = h.send("/shell find /").await;

    assert!(sent.len() >= 5);
    let mut joined = String::new();
    for item in &sent {
        let Sent::Preformatted { chat_id, text } = item else {
            panic!("expected a preformatted page, got {:?}", item);
        };
        assert_eq!(*chat_id, PEER);
        assert!(text.len() <= 120);
        assert!(text.ends_with('\n'));
        joined.push_str(text);
    }
    assert_eq!(joined, output);
    h.stop().await;
}

#[tokio::test]
async fn test_process_table_and_top() {
    let mut h = Harness::start(MockHost::with_processes(vec![
        process(1, "init"),
        process(30, "chrome"),
        process(31, "chrome"),
        process(7, "sshd"),
    ]))
    .await;

    let table = h.reply("/ps").await;
    let chrome = table
        .lines()
        .find(|l| l.starts_with("chrome"))
        .expect("chrome row");
    assert!(chrome.ends_with("30,31"));

    let top = h.reply("/top").await;
    let rows: Vec<&str> = top.lines().skip(1).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("chrome") && rows[0].ends_with("31"));
    h.stop().await;
}

#[tokio::test]
async fn test_help_and_language() {
    let mut h = Harness::start(MockHost::default()).await;

    let help = h.reply("/help").await;
    assert!(help.starts_with("🎉 Welcome to Remote Assistant v"));
    assert!(help.contains("/sudo_pass"));
    assert!(help.contains("/sessions"));

    assert_eq!(h.reply("/language").await, "🌍 Язык изменен на: ru");
    assert_eq!(h.reply("/clear_sudo").await, "✅ Пароль sudo очищен");
    assert_eq!(h.reply("/language").await, "🌍 Language changed to: en");
    h.stop().await;
}

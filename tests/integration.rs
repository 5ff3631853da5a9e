use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const CHAT: &str = r#"{
  "chat": { "id": "chat-1", "workspace_id": "ws-1", "title": "Refund questions" },
  "messages": [
    { "id": "m1", "chat_id": "chat-1", "role": "user", "message_index": 0,
      "content": "How long do refunds take?", "created_at": "2024-05-01T10:00:00Z" },
    { "id": "m2", "chat_id": "chat-1", "role": "assistant", "message_index": 1,
      "content": "Refunds are processed within five business days.",
      "document_refs": [
        { "document_id": "doc-policy", "document_name": "refund-policy.pdf",
          "chunk_index": 2, "score": 0.91, "content_preview": "Refunds are processed within five business days." },
        { "document_id": "doc-policy", "document_name": "refund-policy.pdf",
          "chunk_index": 0, "score": 0.55, "content_preview": "This policy applies to all orders." },
        { "document_id": "doc-faq", "document_name": "faq.md",
          "chunk_index": 7, "score": 0.42, "content_preview": "Q: When will I get my money back?" }
      ] },
    { "id": "m3", "chat_id": "chat-1", "role": "user", "message_index": 2,
      "content": "And for digital goods?" },
    { "id": "m4", "chat_id": "chat-1", "role": "assistant", "message_index": 3,
      "content": "Digital goods are refunded immediately.",
      "document_refs": [
        { "document_id": "doc-digital", "chunk_index": 1, "score": 0.77 },
        { "document_id": "doc-policy", "chunk_index": 2, "score": 0.12, "content_preview": "ignored duplicate" },
        { "chunk_index": 4, "score": 0.99 }
      ] }
  ]
}"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let transcript = tmp.path().join("chat.json");
    fs::write(&transcript, CHAT).unwrap();
    (tmp, transcript)
}

fn run_cli(cwd: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_nexus-sources"))
        .current_dir(cwd)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run nexus-sources: {}", e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_sources_text_panel() {
    let (tmp, transcript) = setup_test_env();

    let (stdout, stderr, success) =
        run_cli(tmp.path(), &["sources", transcript.to_str().unwrap()]);
    assert!(success, "sources failed: stdout={}, stderr={}", stdout, stderr);

    assert!(stdout.contains("Refund questions"));
    assert!(stdout.contains("Sources (3 documents)"));
    assert!(stdout.contains("[1] refund-policy.pdf"));
    assert!(stdout.contains("[2] faq.md"));
    assert!(stdout.contains("[3] Unknown Document"));

    let first = stdout.find("[1] refund-policy.pdf").unwrap();
    let second = stdout.find("[2] faq.md").unwrap();
    let third = stdout.find("[3] Unknown Document").unwrap();
    assert!(first < second && second < third);

    assert!(stdout.contains("91.0%"));
    assert!(!stdout.contains("ignored duplicate"));
}

#[test]
fn test_sources_json() {
    let (tmp, transcript) = setup_test_env();

    let (stdout, stderr, success) = run_cli(
        tmp.path(),
        &["sources", transcript.to_str().unwrap(), "--json"],
    );
    assert!(success, "sources --json failed: {}", stderr);

    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["chat_id"], "chat-1");
    assert_eq!(value["document_count"], 3);
    assert_eq!(value["total_chunks"], 4);

    let sources = value["sources"].as_array().unwrap();
    for (i, source) in sources.iter().enumerate() {
        assert_eq!(source["citation_index"], i);
    }

    let policy = &sources[0];
    assert_eq!(policy["document_id"], "doc-policy");
    let chunks = policy["chunks"].as_array().unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0]["chunk_index"], 2);
    assert_eq!(chunks[0]["relevance_score"], 0.91);
    assert_eq!(chunks[1]["chunk_index"], 0);

    assert_eq!(value["message_map"]["m2"], serde_json::json!([0, 1]));
    assert_eq!(value["message_map"]["m4"], serde_json::json!([0, 2]));
    assert!(value["message_map"].get("m1").is_none());
    assert!(value["message_map"].get("m3").is_none());
}

#[test]
fn test_sources_json_deterministic() {
    let (tmp, transcript) = setup_test_env();
    let args = ["sources", transcript.to_str().unwrap(), "--json"];

    let (first, _, _) = run_cli(tmp.path(), &args);
    let (second, _, _) = run_cli(tmp.path(), &args);
    assert_eq!(first, second);
}

#[test]
fn test_messages_badges() {
    let (tmp, transcript) = setup_test_env();

    let (stdout, stderr, success) =
        run_cli(tmp.path(), &["messages", transcript.to_str().unwrap()]);
    assert!(success, "messages failed: {}", stderr);

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "#0 user: How long do refunds take?");
    assert!(lines[1].starts_with("#1 assistant:"));
    assert_eq!(lines[2], "    sources: [1] [2]");
    assert_eq!(lines[3], "#2 user: And for digital goods?");
    assert_eq!(lines[5], "    sources: [1] [3]");
}

#[test]
fn test_show_selects_citation() {
    let (tmp, transcript) = setup_test_env();

    let (stdout, stderr, success) =
        run_cli(tmp.path(), &["show", transcript.to_str().unwrap(), "2"]);
    assert!(success, "show failed: {}", stderr);
    assert!(stdout.starts_with("[2] faq.md"));
    assert!(stdout.contains("id: doc-faq"));
    assert!(stdout.contains("chunk 7"));
}

#[test]
fn test_show_json_reports_panel_state() {
    let (tmp, transcript) = setup_test_env();

    let (stdout, stderr, success) = run_cli(
        tmp.path(),
        &["show", transcript.to_str().unwrap(), "3", "--json"],
    );
    assert!(success, "show --json failed: {}", stderr);

    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["panel"]["is_open"], true);
    assert_eq!(value["panel"]["selected"], 2);
    assert_eq!(value["citation"]["document_id"], "doc-digital");
}

#[test]
fn test_show_out_of_range_fails() {
    let (tmp, transcript) = setup_test_env();

    let (_, stderr, success) =
        run_cli(tmp.path(), &["show", transcript.to_str().unwrap(), "9"]);
    assert!(!success);
    assert!(stderr.contains("no citation [9]"));

    let (_, stderr, success) =
        run_cli(tmp.path(), &["show", transcript.to_str().unwrap(), "0"]);
    assert!(!success);
    assert!(stderr.contains("start at 1"));
}

#[test]
fn test_empty_transcript() {
    let tmp = TempDir::new().unwrap();
    let transcript = tmp.path().join("empty.json");
    fs::write(&transcript, "[]").unwrap();

    let (stdout, _, success) = run_cli(tmp.path(), &["sources", transcript.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("No sources referenced"));
}

#[test]
fn test_missing_transcript_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_cli(tmp.path(), &["sources", "does-not-exist.json"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read transcript"));
}

#[test]
fn test_config_controls_display() {
    let (tmp, transcript) = setup_test_env();
    let config_dir = tmp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("nexus.toml"),
        r#"[display]
unknown_document_name = "(no title)"
score_decimals = 0
preview_chars = 7
"#,
    )
    .unwrap();

    // Picked up from the default ./config/nexus.toml location.
    let (stdout, stderr, success) =
        run_cli(tmp.path(), &["sources", transcript.to_str().unwrap()]);
    assert!(success, "sources failed: {}", stderr);
    assert!(stdout.contains("[3] (no title)"));
    assert!(stdout.contains("91%"));
    assert!(stdout.contains("Refunds..."));
}

#[test]
fn test_explicit_missing_config_fails() {
    let (tmp, transcript) = setup_test_env();
    let (_, stderr, success) = run_cli(
        tmp.path(),
        &[
            "--config",
            "missing.toml",
            "sources",
            transcript.to_str().unwrap(),
        ],
    );
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_invalid_config_fails() {
    let (tmp, transcript) = setup_test_env();
    let config = tmp.path().join("bad.toml");
    fs::write(&config, "[display]\npreview_chars = 0\n").unwrap();

    let (_, stderr, success) = run_cli(
        tmp.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "sources",
            transcript.to_str().unwrap(),
        ],
    );
    assert!(!success);
    assert!(stderr.contains("preview_chars"));
}

//! Command handler tests against on-disk stores and files.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use keyword_notifier::cli::{
    cmd_add_channel, cmd_add_server, cmd_config_show, cmd_list, cmd_remove, cmd_replay,
};
use keyword_notifier::config::AppConfig;
use keyword_notifier::models::{ChannelId, ServerId, UserId};
use keyword_notifier::platform::StaticDirectory;
use keyword_notifier::services::SubscriptionService;
use keyword_notifier::storage::{SqliteSubscriptionBackend, SubscriptionBackend};
use keyword_notifier::Error;
use keyword_notifier::notify::NOTIFICATION_HEADER;
use tempfile::TempDir;

const SERVER: ServerId = ServerId::new(10);
const ALICE: UserId = UserId::new(1);
const BOB: UserId = UserId::new(2);
const DEALS: ChannelId = ChannelId::new(100);

const DIRECTORY: &str = r#"
[[users]]
id = 1
name = "alice"

[[users]]
id = 2
name = "bob"

[[users]]
id = 3
name = "carol"
dms_disabled = true

[[servers]]
id = 10
name = "market"
members = [1, 2, 3]

[[servers.channels]]
id = 100
name = "deals"

[[servers.channels]]
id = 200
name = "chat"
"#;

const MESSAGES: &str = r#"# recorded traffic
{"id": 1, "author_id": 2, "author_name": "bob", "server_id": 10, "channel_id": 100, "channel_name": "deals", "content": "Big SALE on apples"}
{"id": 2, "author_id": 2, "author_name": "bob", "server_id": 10, "channel_id": 200, "channel_name": "chat", "content": "sale over there too"}
{"id": 3, "author_id": 9, "author_name": "helper", "author_is_bot": true, "server_id": 10, "channel_id": 100, "channel_name": "deals", "content": "sale"}
{"id": 4, "author_id": 1, "author_name": "alice", "server_id": 10, "channel_id": 100, "channel_name": "deals", "content": "사과는 어디서 사요?"}
"#;

fn open_store(path: &Path) -> Arc<dyn SubscriptionBackend> {
    Arc::new(SqliteSubscriptionBackend::new(path).expect("store"))
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

#[tokio::test]
async fn test_subscriptions_survive_reopening_the_store() {
    let temp = TempDir::new().expect("temp dir");
    let db = temp.path().join("data").join("keywords.db");
    let directory = StaticDirectory::from_toml_str(DIRECTORY).expect("directory");

    {
        let service = SubscriptionService::new(open_store(&db));
        let reply = cmd_add_channel(&service, &directory, ALICE, SERVER, DEALS, "sale")
            .await
            .expect("reply");
        assert_eq!(reply, "Added keyword `sale` for #deals.");
        cmd_add_server(&service, ALICE, SERVER, "사과").expect("reply");
    }

    let service = SubscriptionService::new(open_store(&db));
    let listing = cmd_list(&service, Some(&directory), ALICE, SERVER).expect("reply");
    assert_eq!(listing, "Your keywords:\n`sale` → #deals\n`사과` → GLOBAL");

    assert_eq!(
        cmd_remove(&service, ALICE, SERVER, "SALE").expect("reply"),
        "Removed `SALE` from this server (1 entries)."
    );
    assert_eq!(
        cmd_list(&service, Some(&directory), BOB, SERVER).expect("reply"),
        "You have no keywords tracked in this server."
    );
}

#[tokio::test]
async fn test_replay_transcript() {
    let temp = TempDir::new().expect("temp dir");
    let store = open_store(&temp.path().join("keywords.db"));
    let service = SubscriptionService::new(Arc::clone(&store));
    cmd_add_server(&service, ALICE, SERVER, "sale").expect("reply");
    cmd_add_server(&service, BOB, SERVER, "사과").expect("reply");
    cmd_add_server(&service, UserId::new(3), SERVER, "sale").expect("reply");

    let directory = Arc::new(StaticDirectory::from_toml_str(DIRECTORY).expect("directory"));
    let messages = write_file(&temp, "messages.jsonl", MESSAGES);

    let transcript = cmd_replay(store, directory, &messages, 8)
        .await
        .expect("replay");

    assert_eq!(transcript.matches("--- to alice (1) [sale] in market\n").count(), 2);
    assert_eq!(transcript.matches("--- to bob (2) [사과] in market\n").count(), 1);
    assert_eq!(transcript.matches(NOTIFICATION_HEADER).count(), 3);
    assert!(transcript.contains("메시지: Big SALE on apples"));
    assert!(transcript.ends_with(
        "Replayed 4 messages (1 ignored): 3 notifications sent, 2 refused."
    ));
}

#[tokio::test]
async fn test_replay_rejects_malformed_file() {
    let temp = TempDir::new().expect("temp dir");
    let store = open_store(&temp.path().join("keywords.db"));
    let directory = Arc::new(StaticDirectory::from_toml_str(DIRECTORY).expect("directory"));
    let messages = write_file(&temp, "broken.jsonl", "{\"id\": 1}\n");

    let err = cmd_replay(store, directory, &messages, 8)
        .await
        .expect_err("malformed line");
    assert!(matches!(err, Error::InvalidInput(ref m) if m.starts_with("line 1:")));
}

#[tokio::test]
async fn test_replay_missing_file() {
    let temp = TempDir::new().expect("temp dir");
    let store = open_store(&temp.path().join("keywords.db"));
    let directory = Arc::new(StaticDirectory::from_toml_str(DIRECTORY).expect("directory"));

    let err = cmd_replay(store, directory, &temp.path().join("absent.jsonl"), 8)
        .await
        .expect_err("missing file");
    assert!(matches!(err, Error::OperationFailed { .. }));
}

#[test]
fn test_directory_file_loads_from_disk() {
    let temp = TempDir::new().expect("temp dir");
    let path = write_file(&temp, "directory.toml", DIRECTORY);
    let directory = StaticDirectory::load(&path).expect("directory");
    assert_eq!(directory.server_name(SERVER), Some("market"));

    let broken = write_file(&temp, "broken.toml", "[[servers]]\nid = \"ten\"\n");
    assert!(matches!(
        StaticDirectory::load(&broken),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn test_config_file_feeds_show() {
    let temp = TempDir::new().expect("temp dir");
    let path = write_file(
        &temp,
        "config.toml",
        "db_path = \"/var/lib/kw/keywords.db\"\nmax_keywords_per_server = 25\n\n[metrics]\nenabled = true\nport = 9400\n",
    );

    let config = AppConfig::load_from_file(&path).expect("config");
    assert_eq!(config.max_keywords_per_server, 25);

    let shown = cmd_config_show(&config);
    assert!(shown.starts_with(&format!("# source: {}\n", path.display())));
    assert!(shown.contains("db_path = /var/lib/kw/keywords.db\n"));
    assert!(shown.contains("max_keywords_per_server = 25\n"));
    assert!(shown.contains("metrics.enabled = true\n"));
    assert!(shown.ends_with("metrics.port = 9400"));
}

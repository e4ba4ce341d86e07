#![cfg(unix)]

use std::sync::Arc;

use parking_lot::Mutex;

use pv_domain::FileMap;
use pv_mount::to_mount_tree;
use pv_sandbox::{HostError, HostProvider, LineSink, LocalHostProvider};

fn collector() -> (LineSink, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink_lines = lines.clone();
    let sink: LineSink = Arc::new(move |line: &str| sink_lines.lock().push(line.to_owned()));
    (sink, lines)
}

#[tokio::test]
async fn missing_runtime_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let provider = LocalHostProvider::new(dir.path(), "no-such-runtime-for-preview");
    let err = provider.acquire().await.err().unwrap();
    assert!(matches!(err, HostError::Unsupported(_)));
}

#[tokio::test]
async fn mount_replaces_tree_but_keeps_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let host = LocalHostProvider::new(dir.path(), "sh").acquire().await.unwrap();
    std::fs::create_dir_all(dir.path().join("node_modules/react")).unwrap();

    let mut files = FileMap::new();
    files.insert("package.json".into(), "{}".into());
    files.insert("app/old.tsx".into(), "old".into());
    host.mount(&to_mount_tree(&files).unwrap()).await.unwrap();
    assert!(dir.path().join("app/old.tsx").is_file());

    files.remove("app/old.tsx");
    files.insert("app/new.tsx".into(), "new".into());
    host.mount(&to_mount_tree(&files).unwrap()).await.unwrap();

    assert!(!dir.path().join("app/old.tsx").exists());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("app/new.tsx")).unwrap(),
        "new"
    );
    assert!(dir.path().join("node_modules/react").is_dir());
}

#[tokio::test]
async fn spawn_streams_lines_and_reports_exit() {
    let dir = tempfile::tempdir().unwrap();
    let host = LocalHostProvider::new(dir.path(), "sh").acquire().await.unwrap();
    let (sink, lines) = collector();

    let mut process = host
        .spawn("echo one; echo two >&2; exit 3", sink)
        .await
        .unwrap();
    let code = process.wait().await.unwrap();

    assert_eq!(code, Some(3));
    let lines = lines.lock();
    assert!(lines.contains(&"one".to_owned()));
    assert!(lines.contains(&"two".to_owned()));
}

#[tokio::test]
async fn ready_url_in_output_resolves_server_ready() {
    let dir = tempfile::tempdir().unwrap();
    let host = LocalHostProvider::new(dir.path(), "sh").acquire().await.unwrap();
    let (sink, _) = collector();

    let mut process = host
        .spawn("echo '  - Local: http://localhost:4321'; sleep 5", sink)
        .await
        .unwrap();
    let ready = host.server_ready().await.unwrap();
    assert_eq!(ready.port, 4321);
    assert_eq!(ready.url, "http://localhost:4321");

    process.kill().await.unwrap();
}

#[tokio::test]
async fn working_directory_is_the_mount_root() {
    let dir = tempfile::tempdir().unwrap();
    let host = LocalHostProvider::new(dir.path(), "sh").acquire().await.unwrap();
    let mut files = FileMap::new();
    files.insert("marker.txt".into(), "mounted".into());
    host.mount(&to_mount_tree(&files).unwrap()).await.unwrap();

    let (sink, lines) = collector();
    let mut process = host.spawn("cat marker.txt", sink).await.unwrap();
    assert_eq!(process.wait().await.unwrap(), Some(0));
    assert_eq!(lines.lock().as_slice(), ["mounted"]);
}

#[tokio::test]
async fn ready_signal_belongs_to_the_latest_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let host = LocalHostProvider::new(dir.path(), "sh").acquire().await.unwrap();

    let (first_sink, _) = collector();
    let mut first = host
        .spawn("sleep 0.2; echo 'http://localhost:4000'; sleep 5", first_sink)
        .await
        .unwrap();
    let (second_sink, _) = collector();
    let mut second = host
        .spawn("sleep 0.6; echo 'http://localhost:5000'; sleep 5", second_sink)
        .await
        .unwrap();

    let ready = host.server_ready().await.unwrap();
    assert_eq!(ready.port, 5000);

    first.kill().await.unwrap();
    second.kill().await.unwrap();
}

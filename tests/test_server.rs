use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use plinth::config::Config;
use plinth::server::shutdown::{self, ShutdownHandle};
use plinth::server::{LifecycleState, Server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Creates a fresh site root with an app shell and one hashed asset.
fn site(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("plinth-server-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("_astro")).unwrap();
    std::fs::write(dir.join("index.html"), "<html>shell</html>").unwrap();
    std::fs::write(dir.join("_astro/app.js"), "console.log(1);").unwrap();
    dir
}

fn test_config(root: PathBuf) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        root,
        ..Config::default()
    }
}

async fn start(
    cfg: Config,
) -> (
    SocketAddr,
    ShutdownHandle,
    JoinHandle<anyhow::Result<()>>,
    watch::Receiver<LifecycleState>,
) {
    let srv = Server::bind(&cfg).await.unwrap();
    let addr = srv.local_addr().unwrap();
    let state = srv.state();
    let (handle, signal) = shutdown::channel();
    let task = tokio::spawn(srv.run(signal));
    (addr, handle, task, state)
}

async fn fetch(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

fn body_of(response: &str) -> &str {
    response.split("\r\n\r\n").nth(1).unwrap_or("")
}

#[tokio::test]
async fn test_serves_index_at_root() {
    let (addr, handle, task, _) = start(test_config(site("index"))).await;

    let resp = fetch(addr, "/").await;

    assert!(resp.starts_with("HTTP/1.1 200 OK"), "{resp}");
    assert!(resp.contains("Content-Type: text/html"), "{resp}");
    assert_eq!(body_of(&resp), "<html>shell</html>");

    handle.forced();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_serves_hashed_asset_with_cache_header() {
    let (addr, handle, task, _) = start(test_config(site("asset"))).await;

    let resp = fetch(addr, "/_astro/app.js").await;

    assert!(resp.starts_with("HTTP/1.1 200 OK"), "{resp}");
    assert!(resp.contains("Content-Type: application/javascript"), "{resp}");
    assert!(
        resp.contains("Cache-Control: public, max-age=31536000, immutable"),
        "{resp}"
    );
    assert_eq!(body_of(&resp), "console.log(1);");

    handle.forced();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_missing_path_serves_app_shell() {
    let (addr, handle, task, _) = start(test_config(site("fallback"))).await;

    let resp = fetch(addr, "/does-not-exist").await;

    assert!(resp.starts_with("HTTP/1.1 200 OK"), "{resp}");
    assert!(resp.contains("Content-Type: text/html"), "{resp}");
    assert!(!resp.contains("Cache-Control"), "{resp}");
    assert_eq!(body_of(&resp), "<html>shell</html>");

    handle.forced();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_missing_path_without_fallback_is_404() {
    let mut cfg = test_config(site("no-fallback"));
    cfg.spa_fallback = false;
    let (addr, handle, task, _) = start(cfg).await;

    let resp = fetch(addr, "/does-not-exist").await;

    assert!(resp.starts_with("HTTP/1.1 404 Not Found"), "{resp}");
    assert_eq!(body_of(&resp), "404 - File not found");

    handle.forced();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_missing_index_is_404() {
    let root = site("no-index");
    std::fs::remove_file(root.join("index.html")).unwrap();
    let (addr, handle, task, _) = start(test_config(root)).await;

    let resp = fetch(addr, "/does-not-exist").await;

    assert!(resp.starts_with("HTTP/1.1 404 Not Found"), "{resp}");
    assert_eq!(body_of(&resp), "404 - File not found");

    handle.forced();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_traversal_gets_404_not_the_shell() {
    let (addr, handle, task, _) = start(test_config(site("traversal"))).await;

    let resp = fetch(addr, "/../../etc/passwd").await;

    assert!(resp.starts_with("HTTP/1.1 404 Not Found"), "{resp}");

    handle.forced();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_bind_conflict_fails() {
    let cfg = test_config(site("bind"));
    let srv = Server::bind(&cfg).await.unwrap();
    let taken = srv.local_addr().unwrap();

    let mut conflicting = test_config(site("bind2"));
    conflicting.port = taken.port();

    let err = Server::bind(&conflicting).await.unwrap_err();
    assert!(err.to_string().contains("failed to bind"), "{err:#}");
}

#[tokio::test]
async fn test_graceful_shutdown_completes_inflight_request() {
    let (addr, handle, task, state) = start(test_config(site("graceful"))).await;

    // Open a connection and send only part of a request so it is in flight
    // when the shutdown lands.
    let mut inflight = TcpStream::connect(addr).await.unwrap();
    inflight.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    handle.graceful();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // New connections are no longer served.
    match TcpStream::connect(addr).await {
        Err(_) => {}
        Ok(mut rejected) => {
            let _ = rejected
                .write_all(b"GET / HTTP/1.1\r\nHost: t\r\nConnection: close\r\n\r\n")
                .await;
            let mut buf = Vec::new();
            let n = rejected.read_to_end(&mut buf).await.unwrap_or(0);
            assert_eq!(n, 0, "connection accepted after shutdown");
        }
    }

    // The in-flight request still completes in full.
    inflight
        .write_all(b"Host: test\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut resp = String::new();
    inflight.read_to_string(&mut resp).await.unwrap();
    assert!(resp.starts_with("HTTP/1.1 200 OK"), "{resp}");
    assert_eq!(body_of(&resp), "<html>shell</html>");

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(*state.borrow(), LifecycleState::Stopped);
}

#[tokio::test]
async fn test_forced_shutdown_stops_immediately() {
    let (addr, handle, task, state) = start(test_config(site("forced"))).await;

    handle.forced();

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(*state.borrow(), LifecycleState::Stopped);

    match TcpStream::connect(addr).await {
        Err(_) => {}
        Ok(mut rejected) => {
            let mut buf = Vec::new();
            let n = rejected.read_to_end(&mut buf).await.unwrap_or(0);
            assert_eq!(n, 0, "connection accepted after shutdown");
        }
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_unreadable_file_is_500_and_server_keeps_serving() {
    use std::os::unix::fs::PermissionsExt;

    let root = site("unreadable");
    let locked = root.join("locked.txt");
    std::fs::write(&locked, "x").unwrap();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    // Under root, mode 000 files still read; there is nothing to exercise.
    if std::fs::read(&locked).is_ok() {
        return;
    }

    let (addr, handle, task, _) = start(test_config(root)).await;

    let resp = fetch(addr, "/locked.txt").await;
    assert!(
        resp.starts_with("HTTP/1.1 500 Internal Server Error"),
        "{resp}"
    );
    assert_eq!(body_of(&resp), "500 - Internal server error");

    // The failure is scoped to that request; the next connection is served.
    let resp = fetch(addr, "/").await;
    assert!(resp.starts_with("HTTP/1.1 200 OK"), "{resp}");

    handle.forced();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_slow_request_is_timed_out() {
    let mut cfg = test_config(site("slow"));
    cfg.request_timeout_secs = 1;
    let (addr, handle, task, _) = start(cfg).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();

    // No more bytes arrive; the server must close the socket, not hold it.
    let mut buf = Vec::new();
    let n = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
        .await
        .expect("connection was held open past the read timeout")
        .unwrap_or(0);
    assert_eq!(n, 0, "no response should be written for an incomplete request");

    handle.forced();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_oversized_request_is_dropped() {
    let (addr, handle, task, _) = start(test_config(site("oversized"))).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    // A stream of header bytes with no terminator; the server must cut it
    // off well before the read timeout would.
    let junk = vec![b'a'; 64 * 1024];
    let _ = stream.write_all(&junk).await;

    let mut buf = Vec::new();
    let n = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
        .await
        .expect("oversized request was not cut off")
        .unwrap_or(0);
    assert_eq!(n, 0);

    handle.forced();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unknown_extension_served_as_octet_stream() {
    let root = site("octet");
    std::fs::write(root.join("blob.dat"), "raw").unwrap();
    let (addr, handle, task, _) = start(test_config(root)).await;

    let resp = fetch(addr, "/blob.dat").await;

    assert!(resp.starts_with("HTTP/1.1 200 OK"), "{resp}");
    assert!(resp.contains("Content-Type: application/octet-stream"), "{resp}");

    handle.forced();
    task.await.unwrap().unwrap();
}

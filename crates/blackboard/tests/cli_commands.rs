#![cfg(all(unix, feature = "cli"))]

use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use blackboard_transport::TcpConnection;

fn free_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("bound listener has an address");
    addr.to_string()
}

fn spawn_listen(addr: &str, extra: &[&str]) -> Child {
    Command::new(env!("CARGO_BIN_EXE_blackboard"))
        .args(["--log-level", "error", "--format", "json", "listen", addr])
        .args(extra)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("listen command should start")
}

fn wait_for_listener(addr: &str, timeout: Duration) {
    let start = Instant::now();
    while TcpStream::connect(addr).is_err() {
        if start.elapsed() >= timeout {
            panic!("listener at {addr} never came up");
        }
        thread::sleep(Duration::from_millis(25));
    }
}

fn wait_for_exit(mut child: Child, timeout: Duration) -> Output {
    let start = Instant::now();
    loop {
        match child.try_wait().expect("child status should be readable") {
            Some(_) => break,
            None if start.elapsed() >= timeout => {
                let _ = child.kill();
                panic!("child did not exit within {timeout:?}");
            }
            None => thread::sleep(Duration::from_millis(25)),
        }
    }
    child.wait_with_output().expect("child output should be readable")
}

fn json_lines(bytes: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(bytes)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect()
}

#[test]
fn codec_prints_normalized_value() {
    let output = Command::new(env!("CARGO_BIN_EXE_blackboard"))
        .args(["--format", "json", "codec", "matrix", "2x2 1 2.0 3 4.000"])
        .output()
        .expect("codec should run");

    assert!(output.status.success());
    let lines = json_lines(&output.stdout);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["type_name"], "matrix");
    assert_eq!(lines[0]["length"], 4);
    assert_eq!(lines[0]["encoded"], "2x2 1 2 3 4");
}

#[test]
fn codec_rejects_invalid_value_with_data_invalid() {
    let output = Command::new(env!("CARGO_BIN_EXE_blackboard"))
        .args(["codec", "double[]", "1 2 nope"])
        .output()
        .expect("codec should run");

    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("decode failed"));
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_blackboard"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("blackboard {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn send_waits_for_acknowledgement() {
    let addr = free_addr();
    let child = spawn_listen(&addr, &["--ack", "--count", "1"]);
    wait_for_listener(&addr, Duration::from_secs(5));

    let output = Command::new(env!("CARGO_BIN_EXE_blackboard"))
        .args(["--log-level", "error", "--format", "json", "send", &addr])
        .args(["PING 1 @7", "--wait", "--wait-timeout", "5s"])
        .output()
        .expect("send should run");
    assert!(
        output.status.success(),
        "send failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let reply = json_lines(&output.stdout);
    assert_eq!(reply[0]["kind"], "response");
    assert_eq!(reply[0]["name"], "PING");
    assert_eq!(reply[0]["success"], true);
    assert_eq!(reply[0]["id"], 7);

    let listened = wait_for_exit(child, Duration::from_secs(10));
    assert!(listened.status.success());
    let received = json_lines(&listened.stdout);
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["kind"], "command");
    assert_eq!(received[0]["params"], "1");
    assert_eq!(received[0]["module"], "blackboard-cli");
}

#[test]
fn variables_round_trip_through_listener() {
    let addr = free_addr();
    let child = spawn_listen(&addr, &["--ack", "--count", "4", "--nul-only"]);
    wait_for_listener(&addr, Duration::from_secs(5));

    let mut conn = TcpConnection::connect(addr.as_str()).expect("client should connect");
    conn.set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout should apply");

    let mut exchange = |text: &str| {
        conn.send_text(text).expect("command should send");
        conn.read_message().expect("reply should arrive")
    };

    assert_eq!(
        exchange(r#"create_var "matrix tf 2x2 1 0 0 1" @1"#),
        r#"create_var "" 1 @1"#
    );
    assert_eq!(
        exchange(r#"write_var "matrix tf 2x2 1 2 3 4.0" @2"#),
        r#"write_var "" 1 @2"#
    );
    assert_eq!(
        exchange(r#"read_var "matrix tf" @3"#),
        r#"read_var "2x2 1 2 3 4" 1 @3"#
    );
    assert_eq!(
        exchange(r#"write_var "matrix tf 2x2 1 2 3" @4"#),
        r#"write_var "codec error: 2x2 matrix needs 4 values, found 3" 0 @4"#
    );

    let listened = wait_for_exit(child, Duration::from_secs(10));
    assert!(listened.status.success());
    assert_eq!(json_lines(&listened.stdout).len(), 4);
}

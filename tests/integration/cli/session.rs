//! `japa session` and `japa serve` as processes.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command as StdCommand, Stdio};

use predicates::prelude::*;

use crate::fixtures::cli::CliFixture;

#[test]
fn session_marks_persist_on_quit() {
    let fx = CliFixture::new();
    fx.json(&["mark", "0"]);

    fx.japa()
        .args(["session", "--local"])
        .write_stdin("5\nbogus\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown input: bogus"));

    let status = fx.json(&["status"]);
    assert_eq!(status["done_count"], 2);
}

#[test]
fn session_json_events() {
    let fx = CliFixture::new();
    fx.json(&["mark", "0"]);

    let output = fx
        .japa()
        .args(["session", "--local", "--json"])
        .write_stdin("n\n")
        .output()
        .expect("run session");
    assert!(output.status.success());

    let events: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("json event"))
        .collect();
    let first = events.first().expect("initial render");
    assert_eq!(first["event"], "render");
    assert_eq!(first["view"]["ready"], false);
    assert!(
        events
            .iter()
            .any(|e| e["event"] == "render" && e["view"]["ready"] == true)
    );
}

#[test]
fn serve_prints_address_and_stops_on_sigterm() {
    let fx = CliFixture::new();
    let mut child = fx
        .std_command()
        .args(["serve", "--listen", "127.0.0.1:0", "--json"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn serve");

    let stdout = child.stdout.take().expect("stdout");
    let mut reader = BufReader::new(stdout);
    let mut json = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).expect("read serve output") == 0 {
            break;
        }
        json.push_str(&line);
        if line.trim_end() == "}" {
            break;
        }
    }
    let serving: serde_json::Value = serde_json::from_str(&json).expect("serving json");
    let addr = serving["addr"].as_str().expect("addr").to_string();

    let mut body = String::new();
    ureq::get(&format!("http://{addr}/api/health"))
        .call()
        .expect("health")
        .into_reader()
        .read_to_string(&mut body)
        .expect("read body");
    assert!(body.contains("ok"));

    StdCommand::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .expect("send SIGTERM");
    let status = child.wait().expect("wait serve");
    assert!(status.success());
}

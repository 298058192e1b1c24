#![cfg(all(unix, feature = "cli"))]

use std::process::{Command, Output};

fn romi(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_romi"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("romi should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn decode_reference_frame_as_json() {
    let output = romi(&["--format", "json", "decode", "AA 55 03 01 02 03 03"]);

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_str(stdout(&output).trim()).expect("stdout should be JSON");
    assert_eq!(json["frame_size"], 7);
    assert_eq!(json["payload_size"], 3);
    assert_eq!(json["payload"], "01 02 03");
    assert_eq!(json["checksum"], "0x03");
    assert_eq!(json["contents"]["kind"], "unknown");
}

#[test]
fn decode_bad_checksum_returns_60() {
    let output = romi(&["--format", "json", "decode", "AA 55 03 01 02 03 04"]);

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("checksum mismatch"));
}

#[test]
fn decode_feedback_frame() {
    // Current sub-payload: left 12, right 34.
    let output = romi(&["--format", "json", "decode", "AA550406020C22", "2E"]);

    assert!(output.status.success(), "{output:?}");
    let json: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(json["contents"]["kind"], "feedback");
    assert_eq!(json["contents"]["left_current"], 12);
    assert_eq!(json["contents"]["right_current"], 34);
}

#[test]
fn encode_raw_writes_wire_bytes() {
    let output = romi(&["--format", "raw", "encode", "01 04 64 00 00 00"]);

    assert!(output.status.success());
    assert_eq!(
        output.stdout,
        vec![0xAA, 0x55, 0x06, 0x01, 0x04, 0x64, 0x00, 0x00, 0x00, 0x67]
    );
}

#[test]
fn encode_oversized_payload_returns_60() {
    let payload = "00".repeat(256);
    let output = romi(&["encode", &payload]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn drive_prints_approximated_command() {
    let output = romi(&["--format", "json", "drive", "--left", "0", "--right", "100"]);

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(json["contents"]["kind"], "drive");
    assert_eq!(json["contents"]["speed"], 100);
    assert_eq!(json["contents"]["radius"], 62);
    assert_eq!(json["frame_size"], 10);
}

#[test]
fn drive_without_speeds_is_usage_error() {
    let output = romi(&["drive"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn listen_on_missing_device_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_romi"))
        .args(["--log-level", "error", "listen", "--device"])
        .arg(format!("/tmp/romi-missing-{}", std::process::id()))
        .env_remove("ROMI_DEVICE")
        .output()
        .expect("listen should run");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("open failed"));
}

#[test]
fn clock_samples_cross_the_wrap() {
    let preload = (u32::MAX - 10_000).to_string();
    let output = romi(&[
        "--format",
        "json",
        "clock",
        "--samples",
        "3",
        "--interval",
        "10ms",
        "--preload",
        &preload,
    ]);

    assert!(output.status.success());
    let samples: Vec<serde_json::Value> = stdout(&output)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be JSON"))
        .collect();
    assert_eq!(samples.len(), 3);

    let now: Vec<u64> = samples
        .iter()
        .map(|s| s["now_ns"].as_u64().unwrap())
        .collect();
    assert!(now.windows(2).all(|w| w[0] <= w[1]), "{now:?}");
    assert_eq!(samples[2]["wraps"], 1);
}

#[test]
fn version_prints_name() {
    let output = romi(&["version"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("romi "));
}

//! Integration tests for tonewheel-cli.
//!
//! Tests run the `tonewheel` binary and check its output and the files it
//! writes.

use std::process::Command;
use tempfile::TempDir;
use tonewheel_io::{WavSpec, read_wav, read_wav_info};

/// Helper to get the path to the `tonewheel` binary built by cargo.
fn tonewheel_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tonewheel"))
}

// ---------------------------------------------------------------------------
// `tonewheel render`
// ---------------------------------------------------------------------------

#[test]
fn render_writes_requested_length() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("demo.wav");

    let output = tonewheel_bin()
        .args(["render", out.to_str().unwrap(), "--seconds", "1.5"])
        .output()
        .expect("failed to run tonewheel render");
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let info = read_wav_info(&out).unwrap();
    assert_eq!(info.spec, WavSpec::stereo(44100));
    assert_eq!(info.num_frames, 66150);

    let (samples, _) = read_wav(&out).unwrap();
    assert!(samples.iter().any(|&s| s != 0), "render is silent");
}

#[test]
fn render_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.wav");
    let b = dir.path().join("b.wav");

    for path in [&a, &b] {
        let status = tonewheel_bin()
            .args(["render", path.to_str().unwrap()])
            .args(["--session", "glass", "--seconds", "0.5"])
            .args(["--transpose-every", "100"])
            .status()
            .expect("failed to run tonewheel render");
        assert!(status.success());
    }

    assert_eq!(read_wav(&a).unwrap().0, read_wav(&b).unwrap().0);
}

#[test]
fn render_session_file_at_custom_rate() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("solo.toml");
    let out = dir.path().join("solo.wav");
    std::fs::write(
        &session,
        r#"
name = "solo"

[[tracks]]
patch = "glass"
steps = [24, 31]
step_ms = 100
"#,
    )
    .unwrap();

    let status = tonewheel_bin()
        .args(["render", out.to_str().unwrap()])
        .args(["--session", session.to_str().unwrap()])
        .args(["--seconds", "0.25", "--sample-rate", "48000"])
        .status()
        .expect("failed to run tonewheel render");
    assert!(status.success());

    let info = read_wav_info(&out).unwrap();
    assert_eq!(info.spec.sample_rate, 48000);
    assert_eq!(info.num_frames, 12000);
}

#[test]
fn render_unknown_session_fails() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("never.wav");

    let output = tonewheel_bin()
        .args(["render", out.to_str().unwrap(), "--session", "nonexistent"])
        .output()
        .expect("failed to run tonewheel render");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nonexistent"));
    assert!(!out.exists());
}

#[test]
fn render_invalid_session_fails() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("bad.toml");
    let out = dir.path().join("bad.wav");
    std::fs::write(
        &session,
        "name = \"bad\"\ndecay_shift = 30\n\n[[tracks]]\npatch = \"lead\"\nsteps = [0]\nstep_ms = 100\n",
    )
    .unwrap();

    let output = tonewheel_bin()
        .args(["render", out.to_str().unwrap()])
        .args(["--session", session.to_str().unwrap()])
        .output()
        .expect("failed to run tonewheel render");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("decay shift"));
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[test]
fn sessions_lists_factory_sessions() {
    let output = tonewheel_bin()
        .arg("sessions")
        .output()
        .expect("failed to run tonewheel sessions");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["demo", "trio", "glass"] {
        assert!(stdout.contains(name), "listing should contain '{name}'");
    }
}

#[test]
fn sessions_shows_one_as_toml() {
    let output = tonewheel_bin()
        .args(["sessions", "trio"])
        .output()
        .expect("failed to run tonewheel sessions trio");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name = \"trio\""));
    assert!(stdout.contains("patch = \"duet\""));
}

#[test]
fn patches_lists_all_patches() {
    let output = tonewheel_bin()
        .arg("patches")
        .output()
        .expect("failed to run tonewheel patches");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["lead", "bass", "duet", "glass"] {
        assert!(stdout.contains(name), "listing should contain '{name}'");
    }
}

//! Replays scripts end to end and checks the editor-side trace.

use beacon::BeaconConfig;
use beacon_bin::{commands::replay, script::Script};
use tempfile::tempdir;

fn replay_source(source: &str) -> String {
    let script = Script::parse(source).unwrap();
    let mut out = Vec::new();
    replay::run(BeaconConfig::default(), &script, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn jump_then_small_move_shows_one_beacon() {
    let trace = replay_source(
        r#"
        [[buffer]]
        name = "main.rs"
        lines = 200

        [[step]]
        action = "move"
        line = 20

        [[step]]
        action = "wait"
        ms = 50

        [[step]]
        action = "move"
        line = 25
        "#,
    );

    assert!(trace.contains("overlay#0 opened at 20:0 width 40 (Beacon)"), "{trace}");
    assert!(!trace.contains("overlay#1"), "{trace}");
    assert!(trace.contains("overlay#0 transparency 90"), "{trace}");
    assert!(trace.contains("   360ms  overlay#0 closed"), "{trace}");
    assert!(trace.ends_with("1 beacon(s) shown\n"), "{trace}");
}

#[test]
fn click_then_move_is_not_a_jump() {
    let trace = replay_source(
        r#"
        [[step]]
        action = "click"
        line = 80
        "#,
    );

    assert!(trace.contains("Left click at 80:0"), "{trace}");
    assert!(trace.contains("cursor moved to 80:0"), "{trace}");
    assert!(trace.ends_with("0 beacon(s) shown\n"), "{trace}");
}

#[test]
fn buffer_switch_and_jump_back() {
    let trace = replay_source(
        r#"
        [[buffer]]
        name = "main.rs"

        [[buffer]]
        name = "notes.md"
        lines = 10
        width = 12

        [[step]]
        action = "move"
        line = 5

        [[step]]
        action = "enter"
        buffer = "notes.md"

        [[step]]
        action = "wait"
        ms = 600

        [[step]]
        action = "jump"
        direction = "backward"
        "#,
    );

    assert!(trace.contains("entered buffer notes.md"), "{trace}");
    assert!(trace.contains("overlay#0 opened at 0:0 width 12 (Beacon)"), "{trace}");
    assert!(trace.contains("jumped Backward to 5:0"), "{trace}");
    assert!(trace.contains("overlay#1 opened at 5:0 width 40 (Beacon)"), "{trace}");
    assert!(trace.ends_with("2 beacon(s) shown\n"), "{trace}");
}

#[test]
fn small_move_after_jump_back_is_not_a_jump() {
    let trace = replay_source(
        r#"
        [[step]]
        action = "jump_to"
        line = 120

        [[step]]
        action = "wait"
        ms = 600

        [[step]]
        action = "jump"
        direction = "backward"

        [[step]]
        action = "wait"
        ms = 600

        [[step]]
        action = "move"
        line = 3
        "#,
    );

    assert!(trace.contains("overlay#0 opened at 120:0"), "{trace}");
    assert!(trace.contains("overlay#1 opened at 0:0"), "{trace}");
    assert!(!trace.contains("opened at 3:0"), "{trace}");
    assert!(trace.ends_with("2 beacon(s) shown\n"), "{trace}");
}

#[test]
fn toggle_and_closed_overlays() {
    let trace = replay_source(
        r#"
        [[step]]
        action = "show"

        [[step]]
        action = "close_overlays"

        [[step]]
        action = "toggle"

        [[step]]
        action = "show"
        "#,
    );

    assert!(trace.contains("overlay#0 destroyed by editor"), "{trace}");
    assert!(!trace.contains("overlay#0 closed"), "{trace}");
    assert!(trace.ends_with("1 beacon(s) shown\n"), "{trace}");
}

#[test]
fn loads_script_from_disk() {
    let tmp_dir = tempdir().unwrap();
    let path = tmp_dir.path().join("session.toml");
    std::fs::write(&path, "[[step]]\naction = \"show\"\n").unwrap();

    let script = Script::load(&path).unwrap();
    assert_eq!(script.steps.len(), 1);

    let missing = Script::load(&tmp_dir.path().join("missing.toml"));
    assert!(format!("{:#}", missing.unwrap_err()).contains("Failed to read script"));
}

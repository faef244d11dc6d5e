#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A 20x20 map with a wall along the top row.
fn test_map() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("map.json"), r#"{"width":20,"height":20}"#).unwrap();
    let mut ground = String::new();
    for y in 0..20 {
        let tile = if y == 0 { "1" } else { "0" };
        ground.push_str(&vec![tile; 20].join(","));
        ground.push('\n');
    }
    fs::write(dir.path().join("ground.csv"), ground).unwrap();
    dir
}

fn gridrealm() -> Command {
    Command::cargo_bin("gridrealm").unwrap()
}

#[test]
fn check_map_reports_dimensions() {
    let map = test_map();
    gridrealm()
        .args(["check-map", "--map"])
        .arg(map.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("20x20 tiles"))
        .stdout(predicate::str::contains("380 walkable"));
}

#[test]
fn check_map_warns_about_blocked_spawns() {
    let map = test_map();
    let content = map.path().join("content.json");
    fs::write(
        &content,
        r#"{
            "items": [ { "itemID": 1, "name": "Coins", "isStackable": true } ],
            "itemSpawns": [ { "itemID": 1, "position": { "x": 4, "y": 0 } } ]
        }"#,
    )
    .unwrap();
    gridrealm()
        .args(["check-map", "--map"])
        .arg(map.path())
        .arg("--content")
        .arg(&content)
        .assert()
        .success()
        .stdout(predicate::str::contains("blocked tile (4, 0)"));
}

#[test]
fn check_map_rejects_ragged_layers() {
    let map = test_map();
    fs::write(map.path().join("ground.csv"), "0,0\n0\n").unwrap();
    gridrealm()
        .args(["check-map", "--map"])
        .arg(map.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn check_map_missing_directory_fails() {
    gridrealm()
        .args(["check-map", "--map", "/nonexistent/gridrealm-map"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn simulate_prints_actor_table() {
    gridrealm()
        .args(["simulate", "--ticks", "30", "--seed", "7", "--bots", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Actors"))
        .stdout(predicate::str::contains("Man"))
        .stdout(predicate::str::contains("bot1"))
        .stdout(predicate::str::contains("frames"));
}

#[test]
fn simulate_on_loaded_map() {
    let map = test_map();
    gridrealm()
        .args(["simulate", "--ticks", "10", "--bots", "1", "--map"])
        .arg(map.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("after tick 10"));
}

#[test]
fn simulate_rejects_bad_content() {
    let dir = TempDir::new().unwrap();
    let content = dir.path().join("content.json");
    fs::write(&content, "{ not json").unwrap();
    gridrealm()
        .args(["simulate", "--content"])
        .arg(&content)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#![allow(missing_docs)]

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

fn write_edges(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("edges.csv");
    fs::write(&path, body).expect("write edges");
    path
}

#[test]
fn layout_json_reports_default_geometry() {
    let output = cargo_bin_cmd!("slotgraph")
        .args(["--format", "json", "layout"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json");
    assert_eq!(json["page_size"], 4096);
    assert_eq!(json["data_section_size"], 4080);
    assert_eq!(json["max_edges_in_ext_page"], (4080 - 12) / 8);
}

#[test]
fn load_prints_neighbors() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_edges(&dir, "src,dst\n0,1\n0,2\n2,0\n");
    let output = cargo_bin_cmd!("slotgraph")
        .args(["--format", "json", "load"])
        .arg(&path)
        .args(["--show", "0", "--show", "2"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json");
    assert_eq!(json["stats"]["vertices"], 3);
    assert_eq!(json["stats"]["small_pages"], 1);
    assert_eq!(json["pages"][0]["role"], "small");
    assert_eq!(json["neighbors"][0]["neighbors"], serde_json::json!([1, 2]));
    assert_eq!(json["neighbors"][1]["neighbors"], serde_json::json!([0]));
}

#[test]
fn load_text_summary() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_edges(&dir, "src,dst\n5,6\n");
    let output = cargo_bin_cmd!("slotgraph")
        .arg("load")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("Loaded 2 vertices and 1 edges into 1 pages"));
}

#[test]
fn gaps_fail_without_splitting() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_edges(&dir, "src,dst\n1,9\n");
    cargo_bin_cmd!("slotgraph")
        .arg("load")
        .arg(&path)
        .arg("--no-split-on-gap")
        .assert()
        .failure();
}

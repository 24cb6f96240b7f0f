// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the qpcatalog CLI commands

mod common;

use assert_cmd::Command;
use common::{write_garbage, write_png};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// qpcatalog with an isolated environment
fn qpcatalog(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("qpcatalog").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("QPCATALOG_CONFIG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn project_arg(dir: &Path) -> &str {
    dir.to_str().unwrap()
}

#[test]
fn test_create_and_info() {
    let home = TempDir::new().unwrap();
    let project = home.path().join("study");

    qpcatalog(&home)
        .args(["create", project_arg(&project)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created project: study"));
    assert!(project.join("project.qpproj").is_file());

    qpcatalog(&home)
        .args(["create", project_arg(&project)])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    let output = qpcatalog(&home)
        .args(["info", project_arg(&project), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["name"], "study");
    assert_eq!(info["images"], 0);
    assert!(info["uriPrevious"].is_null());
    assert!(info["uri"].as_str().unwrap().starts_with("file:"));
}

#[test]
fn test_info_on_missing_project_fails() {
    let home = TempDir::new().unwrap();
    qpcatalog(&home)
        .args(["info", project_arg(&home.path().join("absent"))])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open project"));
}

#[test]
fn test_classes_add_and_list() {
    let home = TempDir::new().unwrap();
    let project = home.path().join("p");
    qpcatalog(&home).args(["create", project_arg(&project)]).assert().success();

    qpcatalog(&home)
        .args(["classes", project_arg(&project), "add", "Tumor", "--color", "200,0,0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added class: Tumor (#c80000)"));

    qpcatalog(&home)
        .args([
            "classes",
            project_arg(&project),
            "add",
            "Positive",
            "--parent",
            "Tumor",
            "--alpha",
            "0.5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tumor: Positive"));

    qpcatalog(&home)
        .args(["classes", project_arg(&project), "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tumor  #c80000  alpha 1.00"))
        .stdout(predicate::str::contains("  Tumor: Positive"));

    qpcatalog(&home)
        .args(["classes", project_arg(&project), "add", "X", "--parent", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parent class not found"));

    qpcatalog(&home)
        .args(["classes", project_arg(&project), "add", "Y", "--color", "300,0,0"])
        .assert()
        .failure();
}

#[test]
fn test_add_check_and_relink() {
    let home = TempDir::new().unwrap();
    let project = home.path().join("p");
    let slides = home.path().join("slides");
    write_png(&slides, "a.png", 20, 20);
    write_png(&slides.join("batch"), "b.png", 20, 20);
    fs::write(slides.join("readme.txt"), "not an image").unwrap();

    qpcatalog(&home).args(["create", project_arg(&project)]).assert().success();

    qpcatalog(&home)
        .args([
            "add",
            project_arg(&project),
            project_arg(&slides),
            "--glob",
            "**/*.png",
            "--type",
            "brightfield-h-e",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 2 of 2 images"));

    qpcatalog(&home)
        .args(["check", project_arg(&project)])
        .assert()
        .success()
        .stdout(predicate::str::contains("All 2 images readable"));

    let moved = home.path().join("moved");
    fs::rename(&slides, &moved).unwrap();

    qpcatalog(&home)
        .args(["check", project_arg(&project)])
        .assert()
        .failure()
        .stdout(predicate::str::contains("MISSING"));

    let map = format!("{}={}", slides.display(), moved.display());
    qpcatalog(&home)
        .args(["relink", project_arg(&project), "--map", map.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Relinked 2 images"));

    qpcatalog(&home)
        .args(["check", project_arg(&project)])
        .assert()
        .success();
}

#[test]
fn test_add_reports_unsupported_files() {
    let home = TempDir::new().unwrap();
    let project = home.path().join("p");
    let slides = home.path().join("slides");
    let good = write_png(&slides, "good.png", 8, 8);
    let bad = write_garbage(&slides, "bad.png");

    qpcatalog(&home).args(["create", project_arg(&project)]).assert().success();
    qpcatalog(&home)
        .args(["add", project_arg(&project), project_arg(&good), project_arg(&bad)])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Added 1 of 2 images"))
        .stdout(predicate::str::contains(format!("Skipped {}", bad.display())))
        .stdout(predicate::str::contains("Skipped").count(1));

    // The readable image was still saved
    let output = qpcatalog(&home)
        .args(["info", project_arg(&project), "--json"])
        .output()
        .unwrap();
    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["images"], 1);
}

#[test]
fn test_config_file_sets_thumbnail_size() {
    let home = TempDir::new().unwrap();
    let project = home.path().join("p");
    let config = home.path().join("qpcatalog.toml");
    fs::write(&config, "thumbnail_size = 16\n").unwrap();
    let image = write_png(&home.path().join("slides"), "big.png", 64, 32);

    qpcatalog(&home).args(["create", project_arg(&project)]).assert().success();
    qpcatalog(&home)
        .args(["--config", project_arg(&config), "add", project_arg(&project), project_arg(&image)])
        .assert()
        .success();

    let thumbnail = project.join("data").join("1").join("thumbnail.jpg");
    assert_eq!(image::image_dimensions(thumbnail).unwrap(), (16, 8));
}

#[test]
fn test_verbose_logs_loaded_config() {
    let home = TempDir::new().unwrap();
    let project = home.path().join("p");
    qpcatalog(&home)
        .args(["-v", "create", project_arg(&project)])
        .assert()
        .success()
        .stderr(predicate::str::contains("Loaded config: thumbnail_size = 256"));
}

#[test]
fn test_completions() {
    let home = TempDir::new().unwrap();
    qpcatalog(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("qpcatalog"));
}

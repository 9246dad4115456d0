#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn rc() -> Command {
    cargo_bin_cmd!("rollcall")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rollcall.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

pub fn init(db_path: &str) {
    rc().args(["--db", db_path, "--test", "init"])
        .assert()
        .success();
}

/// Three regular members and one visitor
pub fn seed_members(db_path: &str) {
    for (code, name) in [
        ("M001", "Grace Mensah"),
        ("M002", "Kofi Boateng"),
        ("M003", "Ama Owusu"),
    ] {
        rc().args(["--db", db_path, "member", "add", code, name])
            .assert()
            .success();
    }
    rc().args(["--db", db_path, "member", "add", "V001", "Guest", "--visitor"])
        .assert()
        .success();
}

/// Fresh DB with members and a one-off "Sunday Service" on 2024-01-07
/// from 09:00 to 11:00, which gets id 1.
pub fn init_with_one_off(db_path: &str) {
    init(db_path);
    seed_members(db_path);
    rc().args([
        "--db",
        db_path,
        "service",
        "add",
        "Sunday Service",
        "--start",
        "09:00",
        "--end",
        "11:00",
        "--date",
        "2024-01-07",
    ])
    .assert()
    .success();
}

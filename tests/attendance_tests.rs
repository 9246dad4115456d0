use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;

mod common;
use common::{init_with_one_off, rc, setup_test_db, temp_out};

fn checkin(db_path: &str, code: &str, at: &str) -> assert_cmd::assert::Assert {
    rc().args(["--db", db_path, "checkin", code, "--service", "1", "--at", at])
        .assert()
}

#[test]
fn test_checkin_then_repeat() {
    let db_path = setup_test_db("checkin_repeat");
    init_with_one_off(&db_path);

    checkin(&db_path, "M001", "2024-01-07 09:05")
        .success()
        .stdout(contains("Grace Mensah checked in successfully at 2024-01-07 09:05"));

    checkin(&db_path, "M001", "2024-01-07 09:30")
        .success()
        .stdout(contains("Grace Mensah is already checked in for this service"));
}

#[test]
fn test_checkin_after_end_is_late() {
    let db_path = setup_test_db("checkin_late");
    init_with_one_off(&db_path);

    checkin(&db_path, "M002", "2024-01-07 11:15")
        .success()
        .stdout(contains("late"));

    rc().args(["--db", &db_path, "report", "1"])
        .assert()
        .success()
        .stdout(contains("Kofi Boateng"))
        .stdout(contains("late"));
}

#[test]
fn test_unknown_member_is_reported() {
    let db_path = setup_test_db("checkin_unknown");
    init_with_one_off(&db_path);

    checkin(&db_path, "M999", "2024-01-07 09:00")
        .failure()
        .stderr(contains("Member with ID M999 not found"));
}

#[test]
fn test_template_is_not_a_checkin_target() {
    let db_path = setup_test_db("checkin_template");
    init_with_one_off(&db_path);

    rc().args([
        "--db",
        &db_path,
        "service",
        "add",
        "Bible Study",
        "--start",
        "18:00",
        "--weekly",
    ])
    .assert()
    .success();

    rc().args(["--db", &db_path, "checkin", "M001", "--service", "2"])
        .assert()
        .failure()
        .stderr(contains("is a recurring service template"));
}

#[test]
fn test_close_marks_absent_once() {
    let db_path = setup_test_db("close_once");
    init_with_one_off(&db_path);

    checkin(&db_path, "M001", "2024-01-07 09:05").success();

    rc().args(["--db", &db_path, "close", "1", "--yes"])
        .assert()
        .success()
        .stdout(contains("Marked 2 member(s) absent for Sunday Service (2024-01-07)"));

    rc().args(["--db", &db_path, "close", "1", "--yes"])
        .assert()
        .success()
        .stdout(contains("already has a record"));

    // the visitor is never part of the roster
    rc().args(["--db", &db_path, "report", "1"])
        .assert()
        .success()
        .stdout(contains("Total: 3"))
        .stdout(contains("Guest").not());
}

#[test]
fn test_close_can_be_cancelled() {
    let db_path = setup_test_db("close_cancel");
    init_with_one_off(&db_path);

    rc().args(["--db", &db_path, "close", "1"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(contains("Operation cancelled"));

    rc().args(["--db", &db_path, "report", "1"])
        .assert()
        .success()
        .stdout(contains("No attendance recorded yet"));
}

#[test]
fn test_report_exports_csv_and_json() {
    let db_path = setup_test_db("report_export");
    init_with_one_off(&db_path);

    checkin(&db_path, "M001", "2024-01-07 09:05").success();
    rc().args(["--db", &db_path, "close", "1", "--yes"])
        .assert()
        .success();

    let csv_out = temp_out("report_export", "csv");
    rc().args([
        "--db", &db_path, "report", "1", "--format", "csv", "--file", &csv_out,
    ])
    .assert()
    .success()
    .stdout(contains("CSV export completed"));

    let csv = fs::read_to_string(&csv_out).unwrap();
    assert!(csv.starts_with("service_id,service,date,member_code"));
    assert!(csv.contains("M001,Grace Mensah,present,2024-01-07 09:05:00,false"));
    assert!(csv.contains("M003,Ama Owusu,absent,,true"));

    let json_out = temp_out("report_export", "json");
    rc().args([
        "--db", &db_path, "report", "1", "--format", "json", "--file", &json_out,
    ])
    .assert()
    .success();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_out).unwrap()).unwrap();
    assert_eq!(json["total_present"], 1);
    assert_eq!(json["total_absent"], 2);
    assert_eq!(json["attendances"].as_array().unwrap().len(), 3);
}

#[test]
fn test_export_requires_absolute_path() {
    let db_path = setup_test_db("report_relative");
    init_with_one_off(&db_path);
    checkin(&db_path, "M001", "2024-01-07 09:05").success();

    rc().args([
        "--db", &db_path, "report", "1", "--format", "csv", "--file", "out.csv",
    ])
    .assert()
    .failure()
    .stderr(contains("must be absolute"));
}

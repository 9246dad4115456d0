use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;
use common::{init_with_one_off, rc, setup_test_db};

#[test]
fn test_scan_checks_in_and_stops() {
    let db_path = setup_test_db("scan_success");
    init_with_one_off(&db_path);

    rc().args(["--db", &db_path, "scan", "--service", "1"])
        .write_stdin("M002\n")
        .assert()
        .success()
        .stdout(contains("Scanner ready"))
        .stdout(contains("Kofi Boateng checked in successfully"));

    rc().args(["--db", &db_path, "report", "1"])
        .assert()
        .success()
        .stdout(contains("M002"));
}

#[test]
fn test_scan_unknown_code_keeps_scanning_until_input_ends() {
    let db_path = setup_test_db("scan_unknown");
    init_with_one_off(&db_path);

    rc().args(["--db", &db_path, "scan", "--service", "1"])
        .write_stdin("  \nM404\n")
        .assert()
        .success()
        .stdout(contains("Member with ID M404 not found"))
        .stdout(contains("Scanner stopped: input closed"))
        .stdout(contains("checked in successfully").not());
}

#[test]
fn test_scan_already_checked_in() {
    let db_path = setup_test_db("scan_repeat");
    init_with_one_off(&db_path);

    rc().args([
        "--db",
        &db_path,
        "checkin",
        "M001",
        "--service",
        "1",
        "--at",
        "2024-01-07 09:01",
    ])
    .assert()
    .success();

    rc().args(["--db", &db_path, "scan", "--service", "1"])
        .write_stdin("M001\n")
        .assert()
        .success()
        .stdout(contains("Grace Mensah is already checked in for this service"));
}

#[test]
fn test_scan_refuses_templates() {
    let db_path = setup_test_db("scan_template");
    init_with_one_off(&db_path);

    rc().args([
        "--db",
        &db_path,
        "service",
        "add",
        "Midweek",
        "--start",
        "18:00",
        "--monthly",
    ])
    .assert()
    .success();

    rc().args(["--db", &db_path, "scan", "--service", "2"])
        .write_stdin("M001\n")
        .assert()
        .failure()
        .stderr(contains("Select a specific session/date"));
}

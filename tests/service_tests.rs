use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;
use common::{init, rc, setup_test_db};

fn add_weekly_template(db_path: &str) {
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
        "--weekly",
        "--anchor",
        "2024-01-07",
    ])
    .assert()
    .success()
    .stdout(contains("weekly template"));
}

#[test]
fn test_expand_one_month_of_sundays() {
    let db_path = setup_test_db("expand_sundays");
    init(&db_path);
    add_weekly_template(&db_path);

    rc().args(["--db", &db_path, "service", "expand", "1", "--months", "1"])
        .assert()
        .success()
        .stdout(contains("4 session(s) created, 0 already existed"))
        .stdout(contains("2024-01-07"))
        .stdout(contains("2024-01-28"))
        .stdout(contains("2024-02-04").not());

    // a second run reuses what exists
    rc().args(["--db", &db_path, "service", "expand", "1", "--months", "1"])
        .assert()
        .success()
        .stdout(contains("0 session(s) created, 4 already existed"));

    rc().args(["--db", &db_path, "service", "list", "--sessions", "1"])
        .assert()
        .success()
        .stdout(contains("2024-01-14"))
        .stdout(contains("session of #1"));
}

#[test]
fn test_expand_from_a_later_date() {
    let db_path = setup_test_db("expand_from");
    init(&db_path);
    add_weekly_template(&db_path);

    rc().args([
        "--db", &db_path, "service", "expand", "1", "--months", "1", "--from", "2024-03-05",
    ])
    .assert()
    .success()
    .stdout(contains("4 session(s) created, 0 already existed"))
    .stdout(contains("2024-03-10"))
    .stdout(contains("2024-03-31"))
    .stdout(contains("2024-01-07").not());
}

#[test]
fn test_add_date_rejects_times_out_of_order() {
    let db_path = setup_test_db("add_date_times");
    init(&db_path);
    add_weekly_template(&db_path);

    rc().args(["--db", &db_path, "service", "add-date", "1", "2024-02-14", "--start", "12:00"])
        .assert()
        .failure()
        .stderr(contains("End time must be later than start time"));

    rc().args(["--db", &db_path, "service", "list", "--sessions", "1"])
        .assert()
        .success()
        .stdout(contains("2024-02-14").not());
}

#[test]
fn test_update_rejects_end_before_start() {
    let db_path = setup_test_db("update_times");
    init(&db_path);
    add_weekly_template(&db_path);

    rc().args(["--db", &db_path, "service", "update", "1", "--end", "08:00"])
        .assert()
        .failure()
        .stderr(contains("End time must be later than start time"));

    rc().args(["--db", &db_path, "service", "show", "1"])
        .assert()
        .success()
        .stdout(contains("09:00 - 11:00"));
}

#[test]
fn test_add_date_rejects_duplicates() {
    let db_path = setup_test_db("add_date_dup");
    init(&db_path);
    add_weekly_template(&db_path);

    rc().args([
        "--db",
        &db_path,
        "service",
        "add-date",
        "1",
        "2024-02-14",
        "--location",
        "Chapel",
    ])
    .assert()
    .success()
    .stdout(contains("added on 2024-02-14"));

    rc().args(["--db", &db_path, "service", "add-date", "1", "2024-02-14"])
        .assert()
        .failure()
        .stderr(contains("already exists on 2024-02-14"));
}

#[test]
fn test_one_off_cannot_be_expanded() {
    let db_path = setup_test_db("expand_one_off");
    init(&db_path);

    rc().args([
        "--db",
        &db_path,
        "service",
        "add",
        "Carol Night",
        "--start",
        "19:00",
        "--date",
        "2024-12-20",
    ])
    .assert()
    .success()
    .stdout(contains("one-off"));

    rc().args(["--db", &db_path, "service", "expand", "1"])
        .assert()
        .failure()
        .stderr(contains("not a recurring template"));
}

#[test]
fn test_add_requires_a_schedule() {
    let db_path = setup_test_db("add_no_schedule");
    init(&db_path);

    rc().args([
        "--db",
        &db_path,
        "service",
        "add",
        "Prayer",
        "--start",
        "06:00",
    ])
    .assert()
    .failure();

    rc().args([
        "--db",
        &db_path,
        "service",
        "add",
        "Prayer",
        "--start",
        "06:00",
        "--end",
        "05:00",
        "--date",
        "2024-03-01",
    ])
    .assert()
    .failure()
    .stderr(contains("End time must be later than start time"));
}

#[test]
fn test_template_update_reaches_sessions() {
    let db_path = setup_test_db("update_propagates");
    init(&db_path);
    add_weekly_template(&db_path);

    rc().args(["--db", &db_path, "service", "expand", "1", "--months", "1"])
        .assert()
        .success();

    rc().args([
        "--db",
        &db_path,
        "service",
        "update",
        "1",
        "--location",
        "Main Hall",
    ])
    .assert()
    .success()
    .stdout(contains("4 session(s) updated with it"));

    rc().args(["--db", &db_path, "service", "show", "3"])
        .assert()
        .success()
        .stdout(contains("Main Hall"));
}

#[test]
fn test_delete_template_cascades() {
    let db_path = setup_test_db("delete_cascade");
    init(&db_path);
    add_weekly_template(&db_path);

    rc().args(["--db", &db_path, "service", "expand", "1", "--months", "1"])
        .assert()
        .success();

    rc().args(["--db", &db_path, "service", "del", "1", "--yes"])
        .assert()
        .success()
        .stdout(contains("has been deleted"));

    rc().args(["--db", &db_path, "service", "show", "2"])
        .assert()
        .failure()
        .stderr(contains("Service with ID 2 not found"));
}

#[test]
fn test_log_records_operations() {
    let db_path = setup_test_db("log_ops");
    init(&db_path);
    add_weekly_template(&db_path);

    rc().args(["--db", &db_path, "log", "--print"])
        .assert()
        .success()
        .stdout(contains("migration_applied"))
        .stdout(contains("service_add"));
}

mod common;
use common::Sandbox;
use predicates::str::contains;

#[test]
fn settings_update_with_stale_version_is_refused() {
    let sb = Sandbox::new("settings_cas");

    sb.cmd(&["settings", "set", "--name", "Bar Uno", "--expect", "never"])
        .assert()
        .success()
        .stdout(contains("Settings saved"));

    sb.cmd(&["settings", "set", "--name", "Bar Due", "--expect", "never"])
        .assert()
        .failure()
        .stderr(contains("modified by someone else"));

    sb.cmd(&["settings", "show"])
        .assert()
        .success()
        .stdout(contains("Bar Uno"));
}

#[test]
fn reopening_a_session_while_another_is_open_fails() {
    let sb = Sandbox::with_business("session_reopen", "T1");

    sb.cmd(&["session", "add", "ana", "2024-03-04 09:00", "2024-03-04 13:00"])
        .assert()
        .success()
        .stdout(contains("Session #1 added"));
    sb.cmd(&["session", "add", "ana", "2024-03-05 09:00", "2024-03-05 13:00"])
        .assert()
        .success();

    sb.cmd(&["session", "edit", "1", "--reopen", "--reason", "forgot"])
        .assert()
        .success()
        .stdout(contains("Session #1 updated"));

    sb.cmd(&["session", "edit", "2", "--reopen"])
        .assert()
        .failure()
        .stderr(contains("already has an open session"));
}

#[test]
fn manual_overlap_is_reported() {
    let sb = Sandbox::with_business("session_overlap", "T1");

    sb.cmd(&["session", "add", "ana", "2024-03-04 09:00", "2024-03-04 13:00"])
        .assert()
        .success();
    sb.cmd(&["session", "add", "ana", "2024-03-04 12:00", "2024-03-04 15:00"])
        .assert()
        .success()
        .stdout(contains("overlaps"));
}

#[test]
fn clock_out_before_clock_in_is_invalid() {
    let sb = Sandbox::with_business("session_order", "T1");

    sb.cmd(&["session", "add", "ana", "2024-03-04 13:00", "2024-03-04 09:00"])
        .assert()
        .failure();
}

#[test]
fn employee_with_sessions_cannot_be_deleted() {
    let sb = Sandbox::with_business("employee_del", "T1");

    sb.cmd(&["session", "add", "ana", "2024-03-04 09:00", "2024-03-04 13:00"])
        .assert()
        .success();
    sb.cmd(&["employee", "del", "ana", "--yes"])
        .assert()
        .failure()
        .stderr(contains("still owns sessions"));

    sb.cmd(&["employee", "add", "bea", "--name", "Bea"])
        .assert()
        .success();
    sb.cmd(&["employee", "del", "bea", "--yes"]).assert().success();
}

#[test]
fn audit_log_records_admin_actions() {
    let sb = Sandbox::with_business("audit_log", "T1");

    sb.cmd(&["--actor", "boss", "session", "add", "ana", "2024-03-04 09:00", "2024-03-04 13:00"])
        .assert()
        .success();
    sb.cmd(&["log", "--print"])
        .assert()
        .success()
        .stdout(contains("boss"));
}

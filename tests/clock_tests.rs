mod common;
use common::Sandbox;
use predicates::str::contains;

#[test]
fn clock_in_is_idempotent_and_clock_out_closes() {
    let sb = Sandbox::with_business("clock_idem", "T1");

    sb.cmd(&["clock", "in", "--employee", "ana", "--token", "T1"])
        .assert()
        .success()
        .stdout(contains("clocked in"));

    // second scan returns the same open session
    sb.cmd(&["clock", "in", "--employee", "ana", "--token", "T1"])
        .assert()
        .success()
        .stdout(contains("already clocked in"))
        .stdout(contains("session #1"));

    // token remembered from the previous scan
    sb.cmd(&["clock", "out", "--employee", "ana"])
        .assert()
        .success()
        .stdout(contains("clocked out"))
        .stdout(contains("session #1"));

    sb.cmd(&["clock", "out", "--employee", "ana"])
        .assert()
        .success()
        .stdout(contains("no open session"));

    sb.cmd(&["clock", "status", "--employee", "ana"])
        .assert()
        .success()
        .stdout(contains("not clocked in"));
}

#[test]
fn unconfigured_token_rejects_check_in() {
    let sb = Sandbox::new("clock_unconfigured");

    sb.cmd(&["clock", "in", "--employee", "ana", "--token", "whatever"])
        .assert()
        .failure()
        .stderr(contains("Check-in rejected"))
        .stderr(contains("QR not configured"));
}

#[test]
fn wrong_token_is_rejected_and_nothing_is_opened() {
    let sb = Sandbox::with_business("clock_wrong", "T1");

    sb.cmd(&["clock", "in", "--employee", "ana", "--token", "nope"])
        .assert()
        .failure()
        .stderr(contains("does not belong"));

    sb.cmd(&["clock", "status", "--employee", "ana"])
        .assert()
        .success()
        .stdout(contains("not clocked in"));
}

#[test]
fn token_is_read_from_scanned_url() {
    let sb = Sandbox::with_business("clock_url", "T 1");

    sb.cmd(&[
        "clock",
        "in",
        "--employee",
        "ana",
        "--url",
        "https://turnqr.local/#/employee-main?point=T%201",
    ])
    .assert()
    .success()
    .stdout(contains("clocked in"));
}

#[test]
fn forget_token_clears_the_cache() {
    let sb = Sandbox::with_business("clock_forget", "T1");

    sb.cmd(&["clock", "in", "--employee", "ana", "--token", "T1"])
        .assert()
        .success();
    sb.cmd(&["clock", "status", "--forget-token"])
        .assert()
        .success()
        .stdout(contains("cleared"));

    sb.cmd(&["clock", "out", "--employee", "ana"])
        .assert()
        .failure()
        .stderr(contains("scan the location QR code"));
}

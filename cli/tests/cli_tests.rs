use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

/// Valid target with --dry-run should print the dry-run message and exit 0.
#[test]
fn test_dry_run() {
    cargo_bin_cmd!("xssfang")
        .args(&["http://example.com", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[DRY RUN] Would scan target: http://example.com",
        ));
}

/// Dry run keeps working with the full evasion flag set.
#[test]
fn test_dry_run_with_options() {
    cargo_bin_cmd!("xssfang")
        .args(&[
            "http://example.com/?search=test",
            "--dry-run",
            "--stealth",
            "--aggressive-waf",
            "--geo-spoof",
            "-m",
            "blind",
            "--max-payloads",
            "10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[DRY RUN] Would scan target: http://example.com/?search=test",
        ));
}

/// Running with no arguments should fail (clap requires the target).
#[test]
fn test_no_args_shows_error() {
    cargo_bin_cmd!("xssfang").assert().failure();
}

/// A target that is not a URL is a setup failure: nonzero exit.
#[test]
fn test_invalid_target_url_fails() {
    cargo_bin_cmd!("xssfang")
        .args(&["not a url", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid target URL"));
}

/// Unknown scan modes are rejected by the value parser.
#[test]
fn test_invalid_mode_rejected() {
    cargo_bin_cmd!("xssfang")
        .args(&["http://example.com", "-m", "spicy", "--dry-run"])
        .assert()
        .failure();
}

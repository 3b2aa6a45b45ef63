use assert_cmd::Command;
use httptest::{matchers::*, responders, Expectation, Server};
use predicates::prelude::*;
use std::io::Write;

fn temp_wordlist(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("failed to create temp wordlist");
    file.write_all(content.as_bytes()).expect("failed to write temp wordlist");
    file
}

#[test]
fn path_fuzz_prints_matched_lines() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/admin"))
            .respond_with(responders::status_code(200)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/missing"))
            .respond_with(responders::status_code(404)),
    );

    let wordlist = temp_wordlist("admin\nmissing\n");
    let target = format!("{}$", server.url("/"));

    Command::cargo_bin("fuzzwright")
        .unwrap()
        .args(["-u", &target, "-w", wordlist.path().to_str().unwrap(), "--simple-output"])
        .assert()
        .success()
        .stdout(predicate::str::contains("200").and(predicate::str::contains("admin")))
        .stdout(predicate::str::contains("missing").not());
}

#[test]
fn missing_target_is_a_configuration_error() {
    let wordlist = temp_wordlist("admin\n");

    Command::cargo_bin("fuzzwright")
        .unwrap()
        .args(["-w", wordlist.path().to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn empty_wordlist_is_a_configuration_error() {
    let wordlist = temp_wordlist("");

    Command::cargo_bin("fuzzwright")
        .unwrap()
        .args(["-u", "http://example.invalid/$", "-w", wordlist.path().to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn match_codes_flag_restricts_matched_output() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/one"))
            .respond_with(responders::status_code(200)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/two"))
            .respond_with(responders::status_code(500)),
    );

    let wordlist = temp_wordlist("one\ntwo\n");
    let target = format!("{}$", server.url("/"));

    Command::cargo_bin("fuzzwright")
        .unwrap()
        .args([
            "-u",
            &target,
            "-w",
            wordlist.path().to_str().unwrap(),
            "-M",
            "200",
            "--simple-output",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("one"))
        .stdout(predicate::str::contains("two").not());
}

#[test]
fn report_file_is_written_in_requested_format() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/hit"))
            .respond_with(responders::status_code(200)),
    );

    let wordlist = temp_wordlist("hit\n");
    let target = format!("{}$", server.url("/"));
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("out.json");

    Command::cargo_bin("fuzzwright")
        .unwrap()
        .args([
            "-u",
            &target,
            "-w",
            wordlist.path().to_str().unwrap(),
            "-o",
            report_path.to_str().unwrap(),
            "--simple-output",
        ])
        .assert()
        .success();

    let report = std::fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("\"status\": 200"));
    assert!(report.contains("hit"));
}

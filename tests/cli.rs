//! End-to-end CLI behavior, driven against the compiled binary the way a
//! shell user would invoke it.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn vsed() -> Command {
    Command::cargo_bin("vsed").unwrap()
}

#[test]
fn substitute_via_stdin() {
    vsed()
        .arg("s/world/universe/")
        .write_stdin("hello world\n")
        .assert()
        .success()
        .stdout("hello universe\n");
}

#[test]
fn global_flag_replaces_every_occurrence() {
    vsed()
        .arg("s/a/X/g")
        .write_stdin("banana\n")
        .assert()
        .success()
        .stdout("bXnXnX\n");
}

#[test]
fn quiet_flag_suppresses_auto_print() {
    vsed()
        .args(["-n", "2p"])
        .write_stdin("one\ntwo\nthree\n")
        .assert()
        .success()
        .stdout("two\n");
}

#[test]
fn delete_by_pattern_address() {
    vsed()
        .arg("/skip/d")
        .write_stdin("keep\nskip\nkeep\n")
        .assert()
        .success()
        .stdout("keep\nkeep\n");
}

#[test]
fn repeated_expression_flags_apply_in_order() {
    vsed()
        .args(["-e", "s/a/1/", "-e", "s/b/2/"])
        .write_stdin("ab\n")
        .assert()
        .success()
        .stdout("12\n");
}

#[test]
fn malformed_script_exits_with_code_one() {
    vsed()
        .arg("s/unterminated")
        .write_stdin("anything\n")
        .assert()
        .code(1)
        .stderr(predicate::str::is_empty().not());
}

#[test]
fn missing_file_exits_with_code_two() {
    vsed()
        .args(["s/a/b/", "/no/such/file-vsed-test"])
        .assert()
        .code(2);
}

#[test]
fn one_bad_file_does_not_stop_the_rest_from_being_processed() {
    let mut good = tempfile::NamedTempFile::new().unwrap();
    writeln!(good, "hello world").unwrap();

    vsed()
        .args(["s/world/universe/", "/no/such/file-vsed-test"])
        .arg(good.path())
        .assert()
        .code(2)
        .stdout("hello universe\n");
}

#[test]
fn in_place_edit_rewrites_the_source_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "hello world").unwrap();
    let path = file.path().to_path_buf();

    vsed()
        .args(["-i", "s/world/universe/"])
        .arg(&path)
        .assert()
        .success();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "hello universe\n");
}

#[test]
fn transliterate_via_cli() {
    vsed()
        .arg("y/abc/xyz/")
        .write_stdin("cab\n")
        .assert()
        .success()
        .stdout("zxy\n");
}

#[test]
fn extended_regex_flag_enables_alternation_without_escaping() {
    vsed()
        .args(["-E", "s/cat|dog/pet/g"])
        .write_stdin("cat and dog\n")
        .assert()
        .success()
        .stdout("pet and pet\n");
}

#[test]
fn force_cpu_backend_still_produces_correct_output() {
    vsed()
        .args(["--cpu", "s/foo/bar/g"])
        .write_stdin("foo foo foo\n")
        .assert()
        .success()
        .stdout("bar bar bar\n");
}

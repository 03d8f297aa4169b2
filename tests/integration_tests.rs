use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

fn chip3() -> Command {
    let mut cmd = Command::cargo_bin("chip3").unwrap();
    cmd.env_remove("CHIP3_MAX_CYCLES").env_remove("CHIP3_TRACE");
    cmd
}

#[test]
fn runs_without_arguments() {
    chip3()
        .assert()
        .success()
        .stdout(predicate::str::contains("chip3"));
}

#[test]
fn runs_hello() {
    chip3()
        .arg("run")
        .arg("tests/files/hello.asm")
        .arg("--minimal")
        .assert()
        .success()
        .stdout("Hello\n");
}

#[test]
fn runs_path_without_subcommand() {
    chip3()
        .arg("tests/files/hello.asm")
        .assert()
        .success()
        .stdout(predicate::str::contains("Halted"))
        .stdout(predicate::str::contains("0x48"));
}

#[test]
fn prints_table_of_printout() {
    chip3()
        .arg("run")
        .arg("tests/files/countdown.asm")
        .assert()
        .success()
        .stdout(predicate::str::contains("0x03"))
        .stdout(predicate::str::contains("0x00"))
        .stdout(predicate::str::contains("NUL"));
}

#[test]
fn combines_operators() {
    chip3()
        .args(["run", "tests/files/operators.asm", "--minimal"])
        .assert()
        .success()
        .stdout("\u{fb}\u{1}\u{2}\n");
}

#[test]
fn fails_without_halt() {
    chip3()
        .args(["run", "tests/files/forever.asm", "--cycles", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not halt within 100 cycles"));
}

#[test]
fn cycle_budget_from_environment() {
    chip3()
        .args(["run", "tests/files/forever.asm"])
        .env("CHIP3_MAX_CYCLES", "37")
        .assert()
        .failure()
        .stderr(predicate::str::contains("within 37 cycles"));
}

#[test]
fn traces_every_cycle() {
    chip3()
        .args(["run", "tests/files/hello.asm", "--trace", "--minimal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CPU FETCH->FETCH2"))
        .stdout(predicate::str::contains("CPU JMP->HALT"));
}

#[test]
fn checks_valid_file() {
    chip3()
        .args(["check", "tests/files/hello.asm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no errors found"));
}

#[test]
fn reports_duplicate_label() {
    chip3()
        .args(["check", "tests/files/duplicate.asm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate label `loop`"));
}

#[test]
fn reports_unresolved_reference() {
    chip3()
        .args(["run", "tests/files/unresolved.asm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown reference `missing`"));
}

#[test]
fn dumps_memory_image() {
    chip3()
        .args(["dump", "tests/files/countdown.asm", "--minimal"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("  0   39  00100111  LD 7\n"))
        .stdout(predicate::str::contains("JMP 6"))
        .stdout(predicate::str::contains("minus_one   8"));
}

#[test]
fn compiles_then_runs_binary() {
    let dir = std::env::temp_dir().join(format!("chip3-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let dest = dir.join("hello.bin");

    chip3()
        .args(["compile", "tests/files/hello.asm"])
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved"));

    let image = fs::read(&dest).unwrap();
    assert_eq!(image.len(), 16);
    assert_eq!(&image[10..], b"Hello\0");

    chip3()
        .arg("run")
        .arg(&dest)
        .arg("--minimal")
        .assert()
        .success()
        .stdout("Hello\n");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn rejects_unknown_extension() {
    chip3()
        .args(["run", "Cargo.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown extension"));
}

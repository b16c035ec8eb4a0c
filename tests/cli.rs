// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate assert_cmd;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn sweep_runs_and_reports_a_minimum() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("grain")
        .unwrap()
        .args(&["--size", "40x40", "--outdir", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("minimum elapsed time"));
    assert!(dir.path().join("mandelbrot.png").exists());
    assert!(dir.path().join("timings.txt").exists());
    assert!(dir.path().join("time_vs_grain_size.png").exists());
}

#[test]
fn swapped_corners_are_rejected() {
    Command::cargo_bin("grain")
        .unwrap()
        .args(&["--topleft", "0.8,-1.5", "--bottomright", "-2.2,1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Bad plane window"));
}

#[test]
fn unparseable_size_is_rejected() {
    Command::cargo_bin("grain")
        .unwrap()
        .args(&["--size", "sixhundred"])
        .assert()
        .failure();
}

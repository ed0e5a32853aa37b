//! CLI smoke tests for kernel-builder.
//!
//! The toolchain and `make` are replaced by small shell scripts inside a
//! temporary kernel tree, so these run without a real kernel checkout.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

/// Get a Command for the kernel-builder binary.
fn kb_cmd() -> Command {
    cargo_bin_cmd!("kernel-builder")
}

const FAKE_CLANG: &str = r#"#!/bin/sh
echo "clang $*" >> "$(dirname "$0")/../../calls.log"
echo "clang version 17.0.6 (https://github.com/llvm/llvm-project 6009708b)" >&2
echo "Target: x86_64-unknown-linux-gnu" >&2
"#;

/// Writes `.config` on defconfig and an Image on the full build.
const FAKE_MAKE: &str = r#"#!/bin/sh
echo "make $*" >> calls.log
out=out
defconfig=
for a in "$@"; do
  case "$a" in
    O=*) out="${a#O=}" ;;
    *_defconfig) defconfig="$a" ;;
  esac
done
if [ -n "$defconfig" ]; then
  mkdir -p "$out" && echo "CONFIG_ARM64=y" > "$out/.config"
  exit 0
fi
[ -f "$out/.config" ] || { echo "*** Configuration file \"$out/.config\" not found!" >&2; exit 2; }
mkdir -p "$out/arch/arm64/boot" && printf 'kernel' > "$out/arch/arm64/boot/Image"
"#;

const FAILING_DEFCONFIG_MAKE: &str = r#"#!/bin/sh
echo "make $*" >> calls.log
echo "*** Can't find default configuration \"arch/arm64/configs/evergo_defconfig\"!" >&2
exit 2
"#;

const NO_IMAGE_MAKE: &str = r#"#!/bin/sh
echo "make $*" >> calls.log
exit 0
"#;

fn script(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Kernel tree with fake `toolchain/bin/{clang,make}`.
fn kernel_tree(make: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    script(&temp.path().join("toolchain/bin/clang"), FAKE_CLANG);
    script(&temp.path().join("toolchain/bin/make"), make);
    temp
}

fn calls(tree: &TempDir) -> String {
    fs::read_to_string(tree.path().join("calls.log")).unwrap_or_default()
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
#[serial]
fn help_flag_works() {
    kb_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--allow-dirty"));
}

#[test]
#[serial]
fn version_flag_works() {
    kb_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kernel-builder"));
}

#[test]
#[serial]
fn target_is_required() {
    kb_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--target"));
}

// =============================================================================
// Soft rejections
// =============================================================================

#[test]
#[serial]
fn unsupported_target_exits_cleanly_without_spawning() {
    let tree = kernel_tree(FAKE_MAKE);
    fs::create_dir_all(tree.path().join("out")).unwrap();

    kb_cmd()
        .current_dir(tree.path())
        .args(["--target", "other"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Please specify a valid target: evergo"));

    assert_eq!(calls(&tree), "");
    assert!(tree.path().join("out").is_dir());
}

#[test]
#[serial]
fn missing_toolchain_exits_cleanly() {
    let tree = TempDir::new().unwrap();

    kb_cmd()
        .current_dir(tree.path())
        .args(["--target", "evergo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not found"))
        .stdout(predicate::str::contains("Toolchain not found in"));

    assert!(!tree.path().join("out").exists());
}

// =============================================================================
// Builds
// =============================================================================

#[test]
#[serial]
fn full_build_reports_image_and_timing() {
    let tree = kernel_tree(FAKE_MAKE);
    let report = tree.path().join("reports/build.json");

    kb_cmd()
        .current_dir(tree.path())
        .args(["--target", "evergo", "--jobs", "3", "--report"])
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Using toolchain: clang version 17.0.6"))
        .stdout(predicate::str::contains("Running defconfig..."))
        .stdout(predicate::str::contains("Building kernel..."))
        .stdout(predicate::str::contains("Kernel build completed in"))
        .stdout(predicate::str::contains(
            "Image file generated: out/arch/arm64/boot/Image",
        ));

    let log = calls(&tree);
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(
        lines,
        vec![
            "clang -v",
            "clang -v",
            "make O=out ARCH=arm64 LLVM=1 -j3 evergo_defconfig",
            "make O=out ARCH=arm64 LLVM=1 -j3",
        ]
    );

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["target"], "evergo");
    assert_eq!(json["toolchain_version"], "clang version 17.0.6");
    assert_eq!(json["artifact_size_bytes"], 6);
    assert_eq!(json["jobs"], 3);
}

#[test]
#[serial]
fn build_root_can_be_given_with_directory_flag() {
    let tree = kernel_tree(FAKE_MAKE);

    kb_cmd()
        .args(["--target", "evergo", "-C"])
        .arg(tree.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Image file generated"));

    assert!(tree.path().join("out/arch/arm64/boot/Image").is_file());
}

#[test]
#[serial]
fn relative_report_and_config_resolve_against_build_root() {
    let tree = kernel_tree(FAKE_MAKE);
    fs::write(tree.path().join("alt.toml"), "[build]\njobs = 2\n").unwrap();
    let cwd = tempfile::tempdir().unwrap();

    kb_cmd()
        .current_dir(cwd.path())
        .args(["--target", "evergo", "--config", "alt.toml", "--report", "build.json", "-C"])
        .arg(tree.path())
        .assert()
        .success();

    assert!(!cwd.path().join("build.json").exists());
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tree.path().join("build.json")).unwrap()).unwrap();
    assert_eq!(report["jobs"], 2);
}

#[test]
#[serial]
fn stale_output_is_cleaned_unless_dirty_allowed() {
    let tree = kernel_tree(FAKE_MAKE);
    let stale = tree.path().join("out/stale.o");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "old").unwrap();

    kb_cmd()
        .current_dir(tree.path())
        .args(["--target", "evergo", "--allow-dirty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaning output directory").not());
    assert!(stale.exists());

    kb_cmd()
        .current_dir(tree.path())
        .args(["--target", "evergo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaning output directory..."));
    assert!(!stale.exists());
}

#[test]
#[serial]
fn defconfig_failure_aborts_before_build() {
    let tree = kernel_tree(FAILING_DEFCONFIG_MAKE);

    kb_cmd()
        .current_dir(tree.path())
        .args(["--target", "evergo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Command failed with error"))
        .stderr(predicate::str::contains("evergo_defconfig"))
        .stderr(predicate::str::contains("exit code 2"));

    let make_calls = calls(&tree)
        .lines()
        .filter(|line| line.starts_with("make"))
        .count();
    assert_eq!(make_calls, 1);
}

#[test]
#[serial]
fn missing_image_is_reported_without_failing() {
    let tree = kernel_tree(NO_IMAGE_MAKE);

    kb_cmd()
        .current_dir(tree.path())
        .args(["--target", "evergo"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Kernel build failed. Check logs for details.",
        ))
        .stdout(predicate::str::contains("Image file generated").not());
}

#[test]
#[serial]
fn settings_file_moves_output_dir() {
    let tree = kernel_tree(FAKE_MAKE);
    fs::write(
        tree.path().join("kernel-builder.toml"),
        "[build]\nout_dir = \"build/evergo\"\njobs = 2\n",
    )
    .unwrap();

    kb_cmd()
        .current_dir(tree.path())
        .args(["--target", "evergo"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Image file generated: build/evergo/arch/arm64/boot/Image",
        ));

    assert!(calls(&tree).contains("make O=build/evergo ARCH=arm64 LLVM=1 -j2 evergo_defconfig"));
}

#[test]
#[serial]
fn verbose_echoes_commands() {
    let tree = kernel_tree(FAKE_MAKE);

    kb_cmd()
        .current_dir(tree.path())
        .args(["--target", "evergo", "--verbose"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Execute command"))
        .stderr(predicate::str::contains("evergo_defconfig"));
}

//! End-to-end tests driving the `respack` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test context that sets up a temporary respack home and package directory
struct TestContext {
    temp_dir: TempDir,
    respack_home: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let respack_home = temp_dir.path().join(".respack");
        std::fs::create_dir_all(&respack_home).expect("failed to create respack home");
        Self {
            temp_dir,
            respack_home,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    fn respack_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_respack");
        let mut cmd = Command::new(bin_path);
        cmd.env("HOME", self.temp_dir.path());
        cmd.env("RESPACK_HOME", &self.respack_home);
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.respack_cmd()
            .args(args)
            .output()
            .expect("failed to run respack")
    }

    /// Write a manifest and pack it into `<name>.rpk`.
    fn pack(&self, file_stem: &str, manifest: &str, extra: &[&str]) -> PathBuf {
        let manifest_path = self.path(&format!("{file_stem}.toml"));
        std::fs::write(&manifest_path, manifest).expect("failed to write manifest");
        let out = self.path(&format!("{file_stem}.rpk"));

        let mut args = vec![
            "pack",
            manifest_path.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ];
        args.extend_from_slice(extra);
        let output = self.run(&args);
        assert!(output.status.success(), "pack failed: {}", stderr(&output));
        out
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    assert!(ctx.run(&["--version"]).status.success());
}

#[test]
fn test_load_in_reverse_dependency_order() {
    let ctx = TestContext::new();
    let base = ctx.pack("base", "name = \"base\"\nclass_names = [\"Base.Widget\"]\n", &[]);
    let app = ctx.pack(
        "app",
        "name = \"app\"\ndependencies = [\"base\"]\n",
        &["--compress"],
    );

    let output = ctx.run(&["load", arg(&app), arg(&base), "--strict"]);
    let out = stdout(&output);
    assert!(output.status.success(), "load failed: {}", stderr(&output));
    assert!(out.contains("waiting for base"));
    assert!(out.contains("2 registered, 0 pending"));
}

#[test]
fn test_load_directory() {
    let ctx = TestContext::new();
    let packs = ctx.path("packs");
    std::fs::create_dir(&packs).unwrap();
    ctx.pack("packs/b", "name = \"b\"\ndependencies = [\"a\"]\n", &[]);
    ctx.pack("packs/a", "name = \"a\"\n", &[]);

    let output = ctx.run(&["load", arg(&packs)]);
    assert!(output.status.success(), "load failed: {}", stderr(&output));
    assert!(stdout(&output).contains("2 registered, 0 pending"));
}

#[test]
fn test_strict_fails_on_missing_dependency() {
    let ctx = TestContext::new();
    let orphan = ctx.pack("orphan", "name = \"orphan\"\ndependencies = [\"ghost\"]\n", &[]);

    let output = ctx.run(&["load", arg(&orphan)]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("0 registered, 1 pending"));

    let output = ctx.run(&["load", arg(&orphan), "--strict"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("orphan"));
}

#[test]
fn test_strict_from_config() {
    let ctx = TestContext::new();
    let orphan = ctx.pack("orphan", "name = \"orphan\"\ndependencies = [\"ghost\"]\n", &[]);
    std::fs::write(
        ctx.respack_home.join("config.toml"),
        format!("strict = true\nsearch_paths = [{:?}]\n", arg(&orphan)),
    )
    .unwrap();

    let output = ctx.run(&["load"]);
    assert!(!output.status.success());
}

#[test]
fn test_duplicate_name_fails() {
    let ctx = TestContext::new();
    let first = ctx.pack("first", "name = \"same\"\n", &[]);
    let second = ctx.pack("second", "name = \"same\"\n", &[]);

    let output = ctx.run(&["load", arg(&first), arg(&second)]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("already been registered"));
}

#[test]
fn test_failed_promotion_is_reported_against_the_pending_package() {
    let ctx = TestContext::new();
    let waiting = ctx.pack("a-waiting", "name = \"a\"\ndependencies = [\"x\"]\n", &[]);
    let plain = ctx.pack("a-plain", "name = \"a\"\n", &[]);
    let x = ctx.pack("x", "name = \"x\"\n", &[]);

    let output = ctx.run(&["load", arg(&waiting), arg(&plain), arg(&x)]);
    let err = stderr(&output);
    assert!(output.status.success(), "load failed: {err}");
    assert!(!err.contains("Failed to load"));
    assert!(err.contains("already been registered"));
    assert!(stdout(&output).contains("2 registered, 0 pending"));

    let output = ctx.run(&["load", arg(&waiting), arg(&plain), arg(&x), "--strict"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to load once their dependencies arrived"));
}

#[test]
fn test_load_without_paths_fails() {
    let ctx = TestContext::new();
    let output = ctx.run(&["load"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("search_paths"));
}

#[test]
fn test_inspect_shows_descriptor_and_class_names() {
    let ctx = TestContext::new();
    let file = ctx.pack(
        "widgets",
        "name = \"widgets\"\ndependencies = [\"theme\"]\nclass_names = [\"ui.Button\"]\n",
        &["--compress"],
    );

    let output = ctx.run(&["inspect", arg(&file)]);
    let out = stdout(&output);
    assert!(output.status.success(), "inspect failed: {}", stderr(&output));
    assert!(out.contains("widgets"));
    assert!(out.contains("theme"));
    assert!(out.contains("Precompiled/ClassNameRecord"));
    assert!(out.contains("ui.Button"));
}

#[test]
fn test_pack_rejects_unnamed_package_with_dependencies() {
    let ctx = TestContext::new();
    let manifest = ctx.path("bad.toml");
    std::fs::write(&manifest, "dependencies = [\"a\"]\n").unwrap();
    let out = ctx.path("bad.rpk");

    let output = ctx.run(&["pack", arg(&manifest), "-o", arg(&out)]);
    assert!(!output.status.success());
    assert!(!out.exists());
}

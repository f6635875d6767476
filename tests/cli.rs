use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn wrapper(cwd: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_esphome-build"));
    cmd.current_dir(cwd).args(args).env_remove("ESPHOME_BUILD_CONFIG").env("NO_COLOR", "1");
    cmd
}

fn project() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("secrets.yaml"), "wifi_password: hunter2\n").unwrap();
    fs::create_dir_all(tmp.path().join("devices")).unwrap();
    fs::write(tmp.path().join("devices/a.yaml"), "esphome:\n  name: ${device_id}\n").unwrap();
    tmp
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn missing_marker_exits_one() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("a.yaml"), "").unwrap();
    let out = wrapper(tmp.path(), &["a.yaml", "--device-id", "kitchen"]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Could not find secrets.yaml in any parent directory."));
}

#[test]
fn missing_target_exits_one() {
    let tmp = project();
    let out = wrapper(tmp.path(), &["devices/nope.yaml", "--device-id", "kitchen"]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let root = dunce::canonicalize(tmp.path()).unwrap();
    let expected = format!("YAML file not found: {}\n", root.join("devices").join("nope.yaml").display());
    assert!(stderr(&out).ends_with(&expected), "{}", stderr(&out));
}

#[test]
fn device_id_is_required() {
    let tmp = project();
    let out = wrapper(tmp.path(), &["devices/a.yaml"]).output().unwrap();
    assert!(!out.status.success());
    assert!(stderr(&out).contains("--device-id"));
}

#[cfg(unix)]
mod fake_tool {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    const SCRIPT: &str = r#"#!/bin/sh
echo "$@" > "$ESPHOME_FAKE_LOG"
if [ -L devices/secrets.yaml ]; then echo linked >> "$ESPHOME_FAKE_LOG"; fi
if [ -n "$ESPHOME_FAKE_INTERRUPT" ]; then kill -INT "$PPID"; exec sleep 5; fi
exit "${ESPHOME_FAKE_STATUS:-0}"
"#;

    /// A directory holding an `esphome` script that logs its arguments.
    fn fake_esphome() -> (tempfile::TempDir, String) {
        let bin = tempfile::tempdir().unwrap();
        let script = bin.path().join("esphome");
        fs::write(&script, SCRIPT).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let path = format!("{}:{}", bin.path().display(), std::env::var("PATH").unwrap_or_default());
        (bin, path)
    }

    fn run(cwd: &Path, args: &[&str], status: i32) -> (Output, PathBuf, tempfile::TempDir) {
        run_with(cwd, args, &[("ESPHOME_FAKE_STATUS", &status.to_string())])
    }

    fn run_with(cwd: &Path, args: &[&str], envs: &[(&str, &str)]) -> (Output, PathBuf, tempfile::TempDir) {
        let (bin, path) = fake_esphome();
        let log = bin.path().join("calls.log");
        let out = wrapper(cwd, args)
            .env("PATH", path)
            .env("ESPHOME_FAKE_LOG", &log)
            .envs(envs.iter().copied())
            .output()
            .unwrap();
        (out, log, bin)
    }

    #[test]
    fn run_links_secrets_and_cleans_up() {
        let tmp = project();
        let (out, log, _bin) = run(tmp.path(), &["devices/a.yaml", "--device-id", "kitchen"], 0);
        assert!(out.status.success(), "{}", stderr(&out));

        let calls = fs::read_to_string(&log).unwrap();
        assert_eq!(calls, "-s device_id kitchen run devices/a.yaml\nlinked\n");
        assert!(fs::symlink_metadata(tmp.path().join("devices/secrets.yaml")).is_err());

        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(stdout.contains("Project root:"));
        assert!(stdout.contains("-s device_id kitchen run devices/a.yaml"));
    }

    #[test]
    fn compile_only_and_forwarded_args() {
        let tmp = project();
        let (out, log, _bin) = run(
            &tmp.path().join("devices"),
            &["a.yaml", "--device-id", "porch", "--compile-only", "--", "--verbose"],
            0,
        );
        assert!(out.status.success(), "{}", stderr(&out));
        let calls = fs::read_to_string(&log).unwrap();
        assert!(calls.starts_with("-s device_id porch compile devices/a.yaml --verbose\n"));
    }

    #[test]
    fn tool_failure_propagates_status_and_cleans_up() {
        let tmp = project();
        let (out, log, _bin) = run(tmp.path(), &["devices/a.yaml", "--device-id", "kitchen"], 3);
        assert_eq!(out.status.code(), Some(3));
        assert!(log.exists());
        assert!(fs::symlink_metadata(tmp.path().join("devices/secrets.yaml")).is_err());
        assert!(stderr(&out).contains("run step failed"));
    }

    #[test]
    fn interrupt_stops_tool_and_cleans_up() {
        let tmp = project();
        let (out, log, _bin) = run_with(
            tmp.path(),
            &["devices/a.yaml", "--device-id", "kitchen"],
            &[("ESPHOME_FAKE_INTERRUPT", "1")],
        );
        assert_eq!(out.status.code(), Some(130));
        assert!(stderr(&out).contains("Error: interrupted"));
        assert_eq!(fs::read_to_string(&log).unwrap(), "-s device_id kitchen run devices/a.yaml\nlinked\n");
        assert!(fs::symlink_metadata(tmp.path().join("devices/secrets.yaml")).is_err());
    }

    #[test]
    fn outside_root_never_runs_tool() {
        let tmp = project();
        let other = tempfile::tempdir().unwrap();
        let outside = other.path().join("b.yaml");
        fs::write(&outside, "").unwrap();
        let (out, log, _bin) = run(tmp.path(), &[outside.to_str().unwrap(), "--device-id", "kitchen"], 0);
        assert_eq!(out.status.code(), Some(1));
        assert!(stderr(&out).contains("Error: YAML file must be inside the project directory.\n"));
        assert!(!log.exists());
        assert!(!other.path().join("secrets.yaml").exists());
    }

    #[test]
    fn existing_local_secrets_untouched() {
        let tmp = project();
        fs::write(tmp.path().join("devices/secrets.yaml"), "local").unwrap();
        let (out, log, _bin) = run(tmp.path(), &["devices/a.yaml", "--device-id", "kitchen"], 1);
        assert_eq!(out.status.code(), Some(1));
        assert_eq!(fs::read_to_string(&log).unwrap(), "-s device_id kitchen run devices/a.yaml\n");
        assert_eq!(fs::read_to_string(tmp.path().join("devices/secrets.yaml")).unwrap(), "local");
    }

    #[test]
    fn settings_file_changes_substitution_key() {
        let tmp = project();
        let settings = tmp.path().join("wrapper.toml");
        fs::write(&settings, "[tool]\nsubstitution = \"node\"\n").unwrap();
        let (out, log, _bin) = run(
            tmp.path(),
            &["devices/a.yaml", "--device-id", "kitchen", "--config", settings.to_str().unwrap()],
            0,
        );
        assert!(out.status.success(), "{}", stderr(&out));
        assert!(fs::read_to_string(&log).unwrap().starts_with("-s node kitchen run devices/a.yaml"));
    }
}

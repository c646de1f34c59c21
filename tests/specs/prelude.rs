// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harness for black-box specs: a temporary state directory, a scripted
//! `terraform` standing in for the real one, and assertion helpers over
//! the `bbl` binary's output.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;

/// Path of the built `bbl` binary, building it on first use.
fn bbl_bin() -> &'static Path {
    static BIN: OnceLock<PathBuf> = OnceLock::new();
    BIN.get_or_init(|| {
        let path = assert_cmd::cargo::cargo_bin("bbl");
        if !path.exists() {
            let status = std::process::Command::new(env!("CARGO"))
                .args(["build", "--quiet", "-p", "bbl"])
                .status()
                .unwrap();
            assert!(status.success(), "building bbl failed");
        }
        path
    })
}

/// Answers `version`, `init`, `apply`, `output` and `destroy` like a
/// healthy terraform, logging each subcommand to `terraform.calls`.
/// `FAKE_TF_FAIL=<subcommand>` makes that subcommand write a partial
/// state and exit 1.
const FAKE_TERRAFORM: &str = r#"#!/bin/sh
echo "$1" >> "$(dirname "$0")/terraform.calls"
if [ "$1" = "$FAKE_TF_FAIL" ]; then
  echo '{"version":4,"resources":["partial"]}' > terraform.tfstate
  echo "Error: quota exceeded"
  exit 1
fi
case "$1" in
  version) echo '{"terraform_version":"1.5.7"}' ;;
  apply)
    env | grep '^TF_VAR_'
    echo '{"version":4,"resources":["network"]}' > terraform.tfstate
    ;;
  destroy) echo '{"version":4,"resources":[]}' > terraform.tfstate ;;
  output)
    cat <<'JSON'
{
  "external_ip": {"sensitive": false, "value": "35.1.2.3"},
  "network": {"sensitive": false, "value": "bbl-net"},
  "subnetwork": {"sensitive": false, "value": "bbl-subnet"},
  "internal_tag_name": {"sensitive": false, "value": "bbl-internal"},
  "internal_cidr": {"sensitive": false, "value": "10.0.0.0/24"},
  "internal_gw": {"sensitive": false, "value": "10.0.0.1"}
}
JSON
    ;;
esac
exit 0
"#;

pub const GCP_KEY: &str =
    r#"{"type":"service_account","project_id":"some-project","private_key":"gcp-private-key-material"}"#;

pub struct Env {
    tmp: TempDir,
}

impl Env {
    pub fn new() -> Self {
        let env = Self { tmp: tempfile::tempdir().unwrap() };
        let terraform = env.bin_dir().join("terraform");
        std::fs::create_dir_all(env.bin_dir()).unwrap();
        std::fs::write(&terraform, FAKE_TERRAFORM).unwrap();
        std::fs::set_permissions(&terraform, std::fs::Permissions::from_mode(0o755)).unwrap();
        env
    }

    fn bin_dir(&self) -> PathBuf {
        self.tmp.path().join("bin")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.tmp.path().join("state")
    }

    /// `bbl` pointed at this environment, with no ambient `BBL_*` settings.
    pub fn bbl(&self) -> Cmd {
        let mut cmd = assert_cmd::Command::new(bbl_bin());
        for (key, _) in std::env::vars() {
            if key.starts_with("BBL_") {
                cmd.env_remove(key);
            }
        }
        cmd.env("BBL_STATE_DIR", self.state_dir())
            .env("BBL_TERRAFORM_BINARY", self.bin_dir().join("terraform"))
            .env("NO_COLOR", "1");
        Cmd(cmd)
    }

    /// `bbl up` on gcp with complete credentials.
    pub fn gcp_up(&self) -> Cmd {
        let mut cmd = self.bbl();
        cmd.args(&["up", "--iaas", "gcp", "--name", "spec-env", "--no-director"])
            .env("BBL_GCP_SERVICE_ACCOUNT_KEY", GCP_KEY)
            .env("BBL_GCP_PROJECT_ID", "some-project")
            .env("BBL_GCP_REGION", "us-west1")
            .env("BBL_GCP_ZONE", "us-west1-a");
        cmd
    }

    /// Subcommands the fake terraform has seen, in order.
    pub fn terraform_calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.bin_dir().join("terraform.calls"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn state(&self) -> serde_json::Value {
        let raw = std::fs::read_to_string(self.state_dir().join("bbl-state.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}

pub struct Cmd(assert_cmd::Command);

impl Cmd {
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.0.args(args);
        self
    }

    pub fn env(&mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> &mut Self {
        self.0.env(key, value);
        self
    }

    pub fn stdin(&mut self, input: &str) -> &mut Self {
        self.0.write_stdin(input.to_string());
        self
    }

    fn run(&mut self) -> Output {
        let out = self.0.output().unwrap();
        Output {
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        }
    }

    pub fn passes(&mut self) -> Output {
        let out = self.run();
        assert_eq!(out.code, Some(0), "expected success\n{out}");
        out
    }

    pub fn fails_with(&mut self, code: i32) -> Output {
        let out = self.run();
        assert_eq!(out.code, Some(code), "expected exit code {code}\n{out}");
        out
    }
}

pub struct Output {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "--- stdout ---\n{}\n--- stderr ---\n{}", self.stdout, self.stderr)
    }
}

impl Output {
    pub fn stdout_has(&self, needle: &str) -> &Self {
        assert!(self.stdout.contains(needle), "stdout lacks {needle:?}\n{self}");
        self
    }

    pub fn stderr_has(&self, needle: &str) -> &Self {
        assert!(self.stderr.contains(needle), "stderr lacks {needle:?}\n{self}");
        self
    }

    pub fn lacks(&self, needle: &str) -> &Self {
        assert!(
            !self.stdout.contains(needle) && !self.stderr.contains(needle),
            "output contains {needle:?}\n{self}"
        );
        self
    }
}

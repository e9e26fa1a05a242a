//! Helm-backed workload deployer.
//!
//! Shells out to the `helm` binary. The chart repository is registered once
//! per process (`repo add --force-update`); every release is then applied
//! with `upgrade --install`, which makes repeated starts for the same release
//! converge on a single installation.
//!
//! Out of cluster, helm is pointed at the same kubeconfig the inventory
//! reads. The repository password travels over stdin, never the argv.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{DeployError, Result};
use crate::infrastructure::config::deployer::DeployerConfig;
use crate::port::{ReleaseSpec, WorkloadDeployer};

/// Deploys challenge releases from a chart repository via the helm CLI.
pub struct HelmDeployer {
    config: DeployerConfig,
    kubeconfig: Option<PathBuf>,
    repo_ready: OnceCell<()>,
}

impl HelmDeployer {
    pub fn new(config: DeployerConfig) -> Self {
        Self {
            config,
            kubeconfig: None,
            repo_ready: OnceCell::new(),
        }
    }

    /// Target the cluster described by `path` instead of helm's default.
    #[must_use]
    pub fn with_kubeconfig(mut self, path: Option<PathBuf>) -> Self {
        self.kubeconfig = path;
        self
    }

    /// Values rendered into the chart for one release.
    fn values(&self, spec: &ReleaseSpec) -> Value {
        let mut values = json!({
            "image": {
                "registry": self.config.registry,
                "repository": spec.image.repository,
                "pullPolicy": self.config.pull_policy,
                "tag": spec.image.tag,
            },
            "authorized_keys": spec.authorized_key,
        });
        if let Some(secret) = &self.config.pull_secret {
            values["imagePullSecrets"] = json!([{ "name": secret }]);
        }
        values
    }

    fn repo_add_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "repo".into(),
            "add".into(),
            "--force-update".into(),
            self.config.repo_name.clone().into(),
            self.config.repo_url.clone().into(),
        ];
        if let Some(username) = &self.config.repo_username {
            args.push("--username".into());
            args.push(username.into());
        }
        if self.config.repo_password.is_some() {
            args.push("--password-stdin".into());
        }
        args
    }

    fn upgrade_args(&self, spec: &ReleaseSpec, values_file: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "upgrade".into(),
            "--install".into(),
            spec.release.as_str().into(),
            self.config.chart_reference().into(),
            "--namespace".into(),
            spec.namespace.clone().into(),
            "--create-namespace".into(),
            "--values".into(),
            values_file.into(),
        ];
        if let Some(path) = &self.kubeconfig {
            args.push("--kubeconfig".into());
            args.push(path.into());
        }
        args
    }

    async fn run(
        &self,
        command: &'static str,
        args: Vec<OsString>,
        stdin: Option<&str>,
    ) -> Result<()> {
        let mut child = Command::new(&self.config.helm_binary)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(DeployError::Launch)?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())
                .await
                .map_err(DeployError::Launch)?;
            pipe.write_all(b"\n").await.map_err(DeployError::Launch)?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(DeployError::Launch)?;

        if !output.status.success() {
            return Err(DeployError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        debug!(command, "helm command succeeded");
        Ok(())
    }

    async fn ensure_repo(&self) -> Result<()> {
        self.repo_ready
            .get_or_try_init(|| async {
                self.run(
                    "helm repo add",
                    self.repo_add_args(),
                    self.config.repo_password.as_deref(),
                )
                .await?;
                info!(repo = %self.config.repo_name, url = %self.config.repo_url, "Chart repository registered");
                Ok::<(), crate::error::Error>(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WorkloadDeployer for HelmDeployer {
    async fn install_or_upgrade(&self, spec: &ReleaseSpec) -> Result<()> {
        self.ensure_repo().await?;

        let mut values_file = tempfile::Builder::new()
            .prefix("proctor-values-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| DeployError::Values(e.to_string()))?;
        let values = serde_json::to_vec_pretty(&self.values(spec))?;
        values_file
            .write_all(&values)
            .and_then(|()| values_file.flush())
            .map_err(|e| DeployError::Values(e.to_string()))?;

        let args = self.upgrade_args(spec, values_file.path());
        self.run("helm upgrade", args, None).await?;
        info!(
            release = %spec.release,
            namespace = %spec.namespace,
            chart = %self.config.chart_reference(),
            "Release installed or upgraded"
        );
        Ok(())
    }

    fn engine_name(&self) -> &'static str {
        "helm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttemptToken, ImageReference, ReleaseId};
    use crate::error::Error;

    fn config() -> DeployerConfig {
        DeployerConfig {
            repo_name: "ctf".into(),
            repo_url: "https://charts.example.com".into(),
            chart_name: "challenge".into(),
            ..DeployerConfig::default()
        }
    }

    fn spec() -> ReleaseSpec {
        ReleaseSpec {
            release: ReleaseId::for_attempt("a", &AttemptToken::new("t1")),
            namespace: "challenge".into(),
            image: ImageReference::new("registry.example.com/team/pwn", "v1"),
            authorized_key: "ssh-ed25519 AAAAkey".into(),
        }
    }

    #[test]
    fn values_carry_image_and_key() {
        let values = HelmDeployer::new(config()).values(&spec());
        assert_eq!(
            values,
            json!({
                "image": {
                    "registry": "registry.gitlab.com",
                    "repository": "registry.example.com/team/pwn",
                    "pullPolicy": "IfNotPresent",
                    "tag": "v1",
                },
                "imagePullSecrets": [{ "name": "docker-registry-credentials" }],
                "authorized_keys": "ssh-ed25519 AAAAkey",
            })
        );
    }

    #[test]
    fn values_omit_pull_secret_when_unset() {
        let deployer = HelmDeployer::new(DeployerConfig {
            pull_secret: None,
            ..config()
        });
        assert!(deployer.values(&spec()).get("imagePullSecrets").is_none());
    }

    #[test]
    fn upgrade_args_name_release_chart_and_namespace() {
        let args = HelmDeployer::new(config()).upgrade_args(&spec(), Path::new("/tmp/v.json"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            [
                "upgrade",
                "--install",
                "at1",
                "ctf/challenge",
                "--namespace",
                "challenge",
                "--create-namespace",
                "--values",
                "/tmp/v.json",
            ]
        );
    }

    #[test]
    fn repo_credentials_are_passed_when_present() {
        let deployer = HelmDeployer::new(DeployerConfig {
            repo_username: Some("bot".into()),
            repo_password: Some("secret".into()),
            ..config()
        });
        let args: Vec<_> = deployer
            .repo_add_args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(&args[..3], ["repo", "add", "--force-update"]);
        assert!(args.ends_with(&[
            "--username".to_string(),
            "bot".to_string(),
            "--password-stdin".to_string(),
        ]));
        assert!(!args.iter().any(|a| a.contains("secret")));
    }

    #[test]
    fn upgrade_targets_configured_kubeconfig() {
        let deployer = HelmDeployer::new(config())
            .with_kubeconfig(Some(PathBuf::from("/etc/proctor/kubeconfig")));
        let args: Vec<_> = deployer
            .upgrade_args(&spec(), Path::new("/tmp/v.json"))
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.ends_with(&[
            "--kubeconfig".to_string(),
            "/etc/proctor/kubeconfig".to_string(),
        ]));
    }

    #[cfg(unix)]
    fn fake_helm(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("helm");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn repeated_install_registers_repo_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let binary = fake_helm(
            dir.path(),
            &format!("echo \"$1 $2\" >> {}", log.display()),
        );
        let deployer = HelmDeployer::new(DeployerConfig {
            helm_binary: binary,
            ..config()
        });

        deployer.install_or_upgrade(&spec()).await.unwrap();
        deployer.install_or_upgrade(&spec()).await.unwrap();

        let calls = std::fs::read_to_string(&log).unwrap();
        let calls: Vec<_> = calls.lines().collect();
        assert_eq!(calls, ["repo add", "upgrade --install", "upgrade --install"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn repo_password_is_written_to_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let binary = fake_helm(
            dir.path(),
            &format!(
                "if [ \"$1\" = repo ]; then read pw; echo \"$* pw=$pw\" >> {log}; fi",
                log = log.display()
            ),
        );
        let deployer = HelmDeployer::new(DeployerConfig {
            helm_binary: binary,
            repo_username: Some("bot".into()),
            repo_password: Some("secret".into()),
            ..config()
        });

        deployer.install_or_upgrade(&spec()).await.unwrap();

        let calls = std::fs::read_to_string(&log).unwrap();
        assert_eq!(
            calls.trim(),
            "repo add --force-update ctf https://charts.example.com --username bot --password-stdin pw=secret"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_helm(dir.path(), "echo 'chart not found' >&2\nexit 1");
        let deployer = HelmDeployer::new(DeployerConfig {
            helm_binary: binary,
            ..config()
        });

        let err = deployer.install_or_upgrade(&spec()).await.unwrap_err();
        match err {
            Error::Deploy(DeployError::CommandFailed { command, stderr, .. }) => {
                assert_eq!(command, "helm repo add");
                assert_eq!(stderr, "chart not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_a_launch_error() {
        let deployer = HelmDeployer::new(DeployerConfig {
            helm_binary: "/nonexistent/helm".into(),
            ..config()
        });
        let err = deployer.install_or_upgrade(&spec()).await.unwrap_err();
        assert!(matches!(err, Error::Deploy(DeployError::Launch(_))));
    }
}

// ABOUTME: Shell-out to the engine's CLI binary (docker, or podman) for `run` and `login`.
// ABOUTME: Assembles arguments, logs the command, and enforces an optional timeout.

use crate::config::CliSettings;
use crate::runtime::RuntimeType;
use serde::Serialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Shell used by `run_bash` when none is given.
pub const DEFAULT_BASH: &str = "/bin/bash";

/// One `KEY VALUE` pair placed before the image in `docker run`, such as
/// `-v /tmp:/data` or `--network host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOption {
    pub key: String,
    pub value: String,
}

impl RunOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Append each option's key and value to `params`, in order.
pub fn append_options(params: &mut Vec<String>, options: &[RunOption]) {
    for option in options {
        params.push(option.key.clone());
        params.push(option.value.clone());
    }
}

/// What a CLI invocation printed and how it exited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} did not finish within {timeout:?}")]
    Timeout { binary: String, timeout: Duration },

    #[error("{binary} {command} failed ({code:?}): {stderr}")]
    Failed {
        binary: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Runner for the engine CLI.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
    timeout: Option<Duration>,
    debug: bool,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
            debug: false,
        }
    }

    /// Runner for `runtime`, with any overrides from `settings`.
    pub fn from_settings(settings: &CliSettings, runtime: RuntimeType) -> Self {
        let binary = settings
            .binary
            .clone()
            .unwrap_or_else(|| runtime.cli_binary().to_string());
        Self::new(binary)
            .timeout(settings.run_timeout)
            .debug(settings.debug)
    }

    /// Log each assembled command at info level instead of debug.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Kill invocations that run longer than `timeout`.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// `run --rm <options…> <image_params…>`
    pub fn run_args(image_params: &[String], options: &[RunOption]) -> Vec<String> {
        let mut params = vec!["run".to_string(), "--rm".to_string()];
        append_options(&mut params, options);
        params.extend(image_params.iter().cloned());
        params
    }

    /// Run a throwaway container; `image_params` is the image followed by
    /// its arguments.
    pub async fn run(
        &self,
        image_params: &[String],
        options: &[RunOption],
    ) -> Result<ProcessOutput, CliError> {
        self.run_raw(&Self::run_args(image_params, options)).await
    }

    /// Like `run`, overriding the image's entrypoint.
    pub async fn run_entrypoint(
        &self,
        entrypoint: &str,
        image_params: &[String],
        options: &[RunOption],
    ) -> Result<ProcessOutput, CliError> {
        let mut params = vec!["--entrypoint".to_string(), entrypoint.to_string()];
        params.extend(image_params.iter().cloned());
        self.run(&params, options).await
    }

    /// Run `command` through `bash -c` inside `image`.
    pub async fn run_bash(
        &self,
        image: &str,
        command: &[String],
        options: &[RunOption],
        bash_binary: &str,
    ) -> Result<ProcessOutput, CliError> {
        let mut params = vec![image.to_string(), "-c".to_string()];
        params.extend(command.iter().cloned());
        self.run_entrypoint(bash_binary, &params, options).await
    }

    /// `login --username U --password-stdin REGISTRY`; the password never
    /// appears on the command line.
    pub async fn login(
        &self,
        registry: &str,
        username: &str,
        password: &str,
    ) -> Result<ProcessOutput, CliError> {
        let args = [
            "login",
            "--username",
            username,
            "--password-stdin",
            registry,
        ];
        self.log_command(&args);

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| self.spawn_error(source))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(password.as_bytes()).await {
                // A binary that exits without reading closes the pipe first.
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                    return Err(self.spawn_error(e));
                }
                _ => {}
            }
        }

        let output = self.collect(child.wait_with_output()).await?;
        if !output.success() {
            return Err(CliError::Failed {
                binary: self.binary.clone(),
                command: "login".to_string(),
                code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Run the binary with `args` as given.
    pub async fn run_raw(&self, args: &[String]) -> Result<ProcessOutput, CliError> {
        self.log_command(args);

        let child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| self.spawn_error(source))?;

        let output = self.collect(child.wait_with_output()).await?;
        if !output.success() {
            tracing::debug!(
                "{} exited with {:?}: {}",
                self.binary,
                output.exit_code,
                output.stderr.trim()
            );
        }
        Ok(output)
    }

    async fn collect(
        &self,
        wait: impl std::future::Future<Output = std::io::Result<std::process::Output>>,
    ) -> Result<ProcessOutput, CliError> {
        let output = match self.timeout {
            // Dropping the timed-out future drops the child, which kills it.
            Some(timeout) => tokio::time::timeout(timeout, wait).await.map_err(|_| {
                CliError::Timeout {
                    binary: self.binary.clone(),
                    timeout,
                }
            })?,
            None => wait.await,
        }
        .map_err(|source| self.spawn_error(source))?;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        })
    }

    fn log_command<S: AsRef<str>>(&self, args: &[S]) {
        let line = args.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
        if self.debug {
            tracing::info!("{} {}", self.binary, line);
        } else {
            tracing::debug!("{} {}", self.binary, line);
        }
    }

    fn spawn_error(&self, source: std::io::Error) -> CliError {
        CliError::Spawn {
            binary: self.binary.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn run_args_put_options_before_image() {
        let args = DockerCli::run_args(
            &strings(&["alpine", "ls", "/"]),
            &[RunOption::new("-v", "/tmp:/data"), RunOption::new("--network", "host")],
        );
        assert_eq!(
            args,
            strings(&["run", "--rm", "-v", "/tmp:/data", "--network", "host", "alpine", "ls", "/"])
        );
    }

    #[test]
    fn from_settings_defaults_to_runtime_binary() {
        let cli = DockerCli::from_settings(&CliSettings::default(), RuntimeType::Podman);
        assert_eq!(cli.binary(), "podman");

        let settings = CliSettings {
            binary: Some("/usr/local/bin/docker".to_string()),
            ..Default::default()
        };
        let cli = DockerCli::from_settings(&settings, RuntimeType::Podman);
        assert_eq!(cli.binary(), "/usr/local/bin/docker");
    }

    // `echo` stands in for the engine binary so the assembled command is visible.
    #[tokio::test]
    async fn run_bash_assembles_entrypoint_command() {
        let cli = DockerCli::new("echo");
        let output = cli
            .run_bash(
                "alpine",
                &strings(&["ls -la"]),
                &[RunOption::new("-e", "A=1")],
                DEFAULT_BASH,
            )
            .await
            .unwrap();

        assert!(output.success());
        assert_eq!(
            output.stdout.trim(),
            "run --rm -e A=1 --entrypoint /bin/bash alpine -c ls -la"
        );
    }

    #[tokio::test]
    async fn timeout_kills_slow_command() {
        let cli = DockerCli::new("sleep").timeout(Some(Duration::from_millis(50)));
        let err = cli.run_raw(&strings(&["5"])).await.unwrap_err();
        assert!(matches!(err, CliError::Timeout { .. }));
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let cli = DockerCli::new("dockside-no-such-binary");
        let err = cli.run_raw(&strings(&["version"])).await.unwrap_err();
        assert!(matches!(err, CliError::Spawn { .. }));
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported_not_raised() {
        let output = DockerCli::new("false").run_raw(&[]).await.unwrap();
        assert_eq!(output.exit_code, Some(1));
        assert!(!output.success());
    }

    #[tokio::test]
    async fn failed_login_is_an_error() {
        let err = DockerCli::new("false")
            .login("registry.example.com", "user", "secret")
            .await
            .unwrap_err();
        match err {
            CliError::Failed { command, code, .. } => {
                assert_eq!(command, "login");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    proptest! {
        #[test]
        fn append_options_keeps_pairs_in_order(
            pairs in proptest::collection::vec(("[a-z-]{1,8}", "[a-z0-9/:=]{0,12}"), 0..8)
        ) {
            let options: Vec<RunOption> = pairs
                .iter()
                .map(|(k, v)| RunOption::new(k.clone(), v.clone()))
                .collect();
            let mut params = vec!["run".to_string()];
            append_options(&mut params, &options);

            prop_assert_eq!(params.len(), 1 + 2 * options.len());
            for (i, option) in options.iter().enumerate() {
                prop_assert_eq!(&params[1 + 2 * i], &option.key);
                prop_assert_eq!(&params[2 + 2 * i], &option.value);
            }
        }
    }
}

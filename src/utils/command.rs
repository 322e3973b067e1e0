/// Command execution utilities shared by the bootstrap steps
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Lambda layer directories prepended to the executable search path
pub const TOOL_DIRS: [&str; 3] = ["/opt/awscli", "/opt/kubectl", "/opt/helm"];

/// Result from command execution with captured output
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandOutput {
    /// Create from tokio Command output
    fn from_output(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }
}

/// Fully explicit description of one external command: program, arguments,
/// and the environment overrides layered on top of the inherited environment.
/// Nothing here mutates the process-wide environment.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

/// Tool environment handed to every external command of one invocation:
/// layer binaries on the search path and the kubeconfig location.
#[derive(Debug, Clone)]
pub struct ToolEnv {
    tool_dirs: Vec<PathBuf>,
    kubeconfig: PathBuf,
}

impl ToolEnv {
    /// Create the environment for a kubeconfig path, with the default
    /// layer directories
    pub fn new(kubeconfig: PathBuf) -> Self {
        Self {
            tool_dirs: TOOL_DIRS.iter().map(PathBuf::from).collect(),
            kubeconfig,
        }
    }

    /// Location of the generated kubeconfig
    pub fn kubeconfig_path(&self) -> &Path {
        &self.kubeconfig
    }

    /// Executable search path: layer directories first, then whatever the
    /// process inherited
    pub fn search_path(&self) -> String {
        let mut parts: Vec<String> = self
            .tool_dirs
            .iter()
            .map(|dir| dir.display().to_string())
            .collect();

        match std::env::var("PATH") {
            Ok(existing) if !existing.is_empty() => parts.push(existing),
            _ => {}
        }

        parts.join(":")
    }

    /// Environment overrides for a command invocation
    pub fn vars(&self) -> Vec<(String, String)> {
        vec![
            ("PATH".to_string(), self.search_path()),
            (
                "KUBECONFIG".to_string(),
                self.kubeconfig.display().to_string(),
            ),
        ]
    }
}

/// Builder for executing external commands with captured output
pub struct CommandBuilder {
    command: Command,
    context_msg: Option<String>,
}

impl CommandBuilder {
    /// Create a new command builder
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        let mut command = Command::new(program);
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        Self {
            command,
            context_msg: None,
        }
    }

    /// Build from an explicit invocation description
    pub fn from_invocation(invocation: &CommandInvocation) -> Self {
        Self::new(&invocation.program)
            .args(invocation.args.iter())
            .envs(invocation.env.iter().cloned())
            .context(format!("Failed to execute {}", invocation.program))
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    /// Set environment variables
    pub fn envs<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.command.envs(vars);
        self
    }

    /// Set context message for error reporting
    pub fn context<S: Into<String>>(mut self, msg: S) -> Self {
        self.context_msg = Some(msg.into());
        self
    }

    /// Execute and return raw output
    pub async fn output(mut self) -> Result<CommandOutput> {
        let output = if let Some(ctx) = &self.context_msg {
            self.command.output().await.context(ctx.clone())?
        } else {
            self.command.output().await?
        };
        Ok(CommandOutput::from_output(output))
    }
}

/// Seam between the bootstrap sequence and the operating system.
///
/// `Err` means the process could not be started at all; `Ok` with
/// `success == false` means it ran and exited non-zero.
pub trait CommandRunner {
    fn run(&self, invocation: &CommandInvocation) -> Result<CommandOutput, String>;
}

/// Production runner executing invocations through tokio
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &CommandInvocation) -> Result<CommandOutput, String> {
        let builder = CommandBuilder::from_invocation(invocation);

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                builder
                    .output()
                    .await
                    .map_err(|error| format!("failed to run {}: {error:#}", invocation.program))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_command_builder_basic() {
        // Test with a simple command that should exist on all systems
        let result = CommandBuilder::new("echo")
            .args(["test"])
            .context("Testing echo command")
            .output()
            .await;

        assert!(result.is_ok());
        let output = result.unwrap();
        assert!(output.success);
        assert!(output.stdout.contains("test"));
    }

    #[tokio::test]
    async fn test_command_builder_env() {
        let result = CommandBuilder::new("sh")
            .args(["-c", "echo $TEST_VAR"])
            .envs([("TEST_VAR".to_string(), "test_value".to_string())])
            .output()
            .await;

        assert!(result.is_ok());
        let output = result.unwrap();
        assert!(output.success);
        assert!(output.stdout.contains("test_value"));
    }

    #[test]
    fn test_tool_env_prefixes_search_path() {
        let tool_env = ToolEnv::new(PathBuf::from("/tmp/kubeconfig"));

        let search_path = tool_env.search_path();
        assert!(search_path.starts_with("/opt/awscli:/opt/kubectl:/opt/helm"));

        let inherited = std::env::var("PATH").unwrap();
        assert!(search_path.ends_with(&inherited));
    }

    #[test]
    fn test_tool_env_vars() {
        let tool_env = ToolEnv::new(PathBuf::from("/tmp/kubeconfig"));

        let vars = tool_env.vars();
        let kubeconfig = vars
            .iter()
            .find(|(name, _)| name == "KUBECONFIG")
            .map(|(_, value)| value.as_str());

        assert_eq!(kubeconfig, Some("/tmp/kubeconfig"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_system_runner_executes_invocation() {
        let invocation = CommandInvocation {
            program: "echo".to_string(),
            args: vec!["hello".to_string()],
            env: Vec::new(),
        };

        let output = SystemRunner.run(&invocation).unwrap();
        assert!(output.success);
        assert!(output.stdout.contains("hello"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_system_runner_reports_spawn_failure() {
        let invocation = CommandInvocation {
            program: "definitely-not-a-real-binary".to_string(),
            args: Vec::new(),
            env: Vec::new(),
        };

        let result = SystemRunner.run(&invocation);
        assert!(result.is_err());
    }
}

/// Two-step bootstrap sequence against the target cluster
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{BootstrapConfig, InstallFailurePolicy};
use crate::utils::command::{CommandInvocation, CommandOutput, CommandRunner, ToolEnv};

/// Failures of the bootstrap sequence
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The credential step is always fatal: without a kubeconfig the
    /// install step has nothing to talk to
    #[error("failed to update kubeconfig for cluster {cluster}: {reason}")]
    CredentialSetup { cluster: String, reason: String },

    /// Install step failure, surfaced only under the propagate policy
    #[error("install script {script} failed: {reason}")]
    InstallFailed { script: String, reason: String },
}

/// Orchestrates the credential and install commands for one invocation
pub struct ClusterBootstrapper<'a> {
    config: &'a BootstrapConfig,
    tool_env: ToolEnv,
}

impl<'a> ClusterBootstrapper<'a> {
    /// Create a bootstrapper writing credentials to the given path
    pub fn new(config: &'a BootstrapConfig, kubeconfig_path: &Path) -> Self {
        Self {
            config,
            tool_env: ToolEnv::new(kubeconfig_path.to_path_buf()),
        }
    }

    /// Run the full sequence: credentials first, install second. A
    /// credential failure stops the sequence before the install step.
    pub fn run(&self, runner: &dyn CommandRunner) -> Result<(), BootstrapError> {
        self.update_kubeconfig(runner)?;
        self.run_install_script(runner)
    }

    fn update_kubeconfig_invocation(&self) -> CommandInvocation {
        let kubeconfig = self.tool_env.kubeconfig_path().display().to_string();

        CommandInvocation {
            program: "aws".to_string(),
            args: [
                "eks",
                "update-kubeconfig",
                "--role-arn",
                &self.config.admin_role_arn,
                "--region",
                &self.config.region,
                "--name",
                &self.config.cluster_name,
                "--kubeconfig",
                &kubeconfig,
            ]
            .iter()
            .map(|arg| arg.to_string())
            .collect(),
            env: self.tool_env.vars(),
        }
    }

    /// Assume the admin role and write the kubeconfig for the cluster
    pub fn update_kubeconfig(&self, runner: &dyn CommandRunner) -> Result<(), BootstrapError> {
        info!(
            "Updating kubeconfig for cluster {} in {}",
            self.config.cluster_name, self.config.region
        );

        let credential_error = |reason: String| BootstrapError::CredentialSetup {
            cluster: self.config.cluster_name.clone(),
            reason,
        };

        let invocation = self.update_kubeconfig_invocation();
        let output = runner.run(&invocation).map_err(credential_error)?;
        if !output.success {
            return Err(credential_error(failure_reason(output)));
        }

        info!(
            "Kubeconfig written to {}",
            self.tool_env.kubeconfig_path().display()
        );
        Ok(())
    }

    /// Run the install executable with the tool environment. The outcome
    /// is reported according to the configured failure policy.
    pub fn run_install_script(&self, runner: &dyn CommandRunner) -> Result<(), BootstrapError> {
        let script = self.config.install_script.display().to_string();
        info!("Running install script {}", script);

        let invocation = CommandInvocation {
            program: script.clone(),
            args: Vec::new(),
            env: self.tool_env.vars(),
        };

        let failure = match runner.run(&invocation) {
            Ok(output) if output.success => {
                info!("Install script finished");
                return Ok(());
            }
            Ok(output) => failure_reason(output),
            Err(reason) => reason,
        };

        match self.config.install_failure_policy {
            InstallFailurePolicy::Swallow => {
                warn!("Install script {} failed, continuing: {}", script, failure);
                Ok(())
            }
            InstallFailurePolicy::Propagate => Err(BootstrapError::InstallFailed {
                script,
                reason: failure,
            }),
        }
    }
}

fn failure_reason(output: CommandOutput) -> String {
    let stderr = output.stderr.trim();
    if stderr.is_empty() {
        "exited with non-zero status".to_string()
    } else {
        stderr.to_string()
    }
}

/// Configuration for the bootstrap invoker, sourced from the function's
/// environment variables
use anyhow::Result;
use std::path::PathBuf;
use std::str::FromStr;

/// Region hosting the cluster API endpoint, set by the Lambda platform
pub const ENV_REGION: &str = "AWS_REGION";

/// ARN of the role assumed to obtain cluster-admin credentials
pub const ENV_ADMIN_ROLE: &str = "CLUSTER_ADMIN_ROLE";

/// Name of the target EKS cluster
pub const ENV_CLUSTER_NAME: &str = "CLUSTER_NAME";

/// Path of the install executable shipped with the function
pub const ENV_INSTALL_SCRIPT: &str = "LAMBDA_SOURCE_FILE";

/// Optional policy for install script failures ("swallow" or "propagate")
pub const ENV_INSTALL_FAILURE_POLICY: &str = "INSTALL_FAILURE_POLICY";

/// How a failing install script affects the reported invocation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallFailurePolicy {
    /// Log the failure and report success anyway
    #[default]
    Swallow,

    /// Fail the invocation
    Propagate,
}

impl FromStr for InstallFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "swallow" => Ok(Self::Swallow),
            "propagate" => Ok(Self::Propagate),
            other => anyhow::bail!(
                "invalid install failure policy {:?}, expected \"swallow\" or \"propagate\"",
                other
            ),
        }
    }
}

/// Per-invocation bootstrap configuration
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Target region for the cluster API endpoint
    pub region: String,

    /// Role assumed when generating the kubeconfig
    pub admin_role_arn: String,

    /// Target managed cluster
    pub cluster_name: String,

    /// Executable performing the actual cluster setup
    pub install_script: PathBuf,

    /// What a non-zero exit from the install script means for the caller
    pub install_failure_policy: InstallFailurePolicy,
}

impl BootstrapConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an injected variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .ok_or_else(|| anyhow::anyhow!("required environment variable {} is not set", name))
        };

        let install_failure_policy = match lookup(ENV_INSTALL_FAILURE_POLICY) {
            Some(raw) => raw.parse()?,
            None => InstallFailurePolicy::default(),
        };

        let config = Self {
            region: required(ENV_REGION)?,
            admin_role_arn: required(ENV_ADMIN_ROLE)?,
            cluster_name: required(ENV_CLUSTER_NAME)?,
            install_script: PathBuf::from(required(ENV_INSTALL_SCRIPT)?),
            install_failure_policy,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.region.is_empty() {
            anyhow::bail!("{} cannot be empty", ENV_REGION);
        }

        if self.cluster_name.is_empty() {
            anyhow::bail!("{} cannot be empty", ENV_CLUSTER_NAME);
        }

        if !self.admin_role_arn.starts_with("arn:") {
            anyhow::bail!(
                "{} must be a role ARN, got {:?}",
                ENV_ADMIN_ROLE,
                self.admin_role_arn
            );
        }

        if self.install_script.as_os_str().is_empty() {
            anyhow::bail!("{} cannot be empty", ENV_INSTALL_SCRIPT);
        }

        Ok(())
    }
}

/// Lambda-facing request handling
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bootstrap::{BootstrapError, ClusterBootstrapper, KubeconfigScope};
use crate::config::BootstrapConfig;
use crate::utils::command::CommandRunner;

/// Fixed body reported once the credential step has succeeded
pub const SUCCESS_BODY: &str = "Successful Lambda response";

/// Response shape expected by the invoking platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LambdaResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

/// Handle one invocation. The trigger payload is ignored; the request id
/// only scopes the kubeconfig path. A credential failure propagates to the
/// platform as an invocation failure, while the install step's outcome is
/// governed by the configured policy.
pub fn handle_bootstrap_event(
    config: &BootstrapConfig,
    request_id: &str,
    runner: &dyn CommandRunner,
) -> Result<LambdaResponse, BootstrapError> {
    info!("Start bootstrap invocation");

    let kubeconfig = KubeconfigScope::for_request(request_id);
    let bootstrapper = ClusterBootstrapper::new(config, kubeconfig.path());
    bootstrapper.run(runner)?;

    info!("End bootstrap invocation");

    Ok(LambdaResponse {
        status_code: 200,
        body: serde_json::to_string(SUCCESS_BODY).expect("response body should serialize"),
    })
}

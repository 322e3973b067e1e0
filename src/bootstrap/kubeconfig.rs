/// Scoped kubeconfig file for a single invocation
use std::path::{Path, PathBuf};
use tracing::debug;

/// Base path for generated kubeconfig files
pub const KUBECONFIG_BASE: &str = "/tmp/kubeconfig";

/// The generated kubeconfig treated as a scoped resource: the path is
/// derived from the request id so concurrent invocations sharing a warm
/// execution environment cannot race on one file, and the file is removed
/// when the scope is dropped, whatever the outcome of the sequence.
pub struct KubeconfigScope {
    path: PathBuf,
}

impl KubeconfigScope {
    /// Derive the kubeconfig path for a request. Falls back to the bare
    /// base path when the request carries no usable id.
    pub fn for_request(request_id: &str) -> Self {
        let suffix: String = request_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();

        let path = if suffix.is_empty() {
            PathBuf::from(KUBECONFIG_BASE)
        } else {
            PathBuf::from(format!("{}-{}", KUBECONFIG_BASE, suffix))
        };

        Self { path }
    }

    /// Location the credential command writes to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for KubeconfigScope {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed kubeconfig {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!(
                "Could not remove kubeconfig {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_derived_from_request_id() {
        let scope = KubeconfigScope::for_request("1234-abcd");
        assert_eq!(scope.path(), Path::new("/tmp/kubeconfig-1234-abcd"));
    }

    #[test]
    fn test_empty_request_id_uses_base_path() {
        let scope = KubeconfigScope::for_request("");
        assert_eq!(scope.path(), Path::new(KUBECONFIG_BASE));
    }

    #[test]
    fn test_unexpected_characters_are_stripped() {
        let scope = KubeconfigScope::for_request("../up!/a");
        assert_eq!(scope.path(), Path::new("/tmp/kubeconfig-upa"));
    }

    #[test]
    fn test_file_removed_on_drop() {
        let request_id = format!("scope-test-{}", std::process::id());
        let scope = KubeconfigScope::for_request(&request_id);
        let path = scope.path().to_path_buf();

        std::fs::write(&path, "apiVersion: v1").unwrap();
        assert!(path.exists());

        drop(scope);
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_without_file_is_quiet() {
        let request_id = format!("scope-missing-{}", std::process::id());
        let scope = KubeconfigScope::for_request(&request_id);
        drop(scope);
    }
}

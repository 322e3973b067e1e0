/// Cluster bootstrap sequence: credential setup, then install execution
pub mod invoker;
pub mod kubeconfig;

pub use invoker::{BootstrapError, ClusterBootstrapper};
pub use kubeconfig::KubeconfigScope;

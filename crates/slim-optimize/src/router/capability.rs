//! Installed-framework capability checks.
//!
//! The check runs in a separate Node.js process so that an incompatible
//! framework version (or one with side effects at import time) cannot take
//! the optimizer down with it. Only the exit status is observed.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::{Duration, timeout};
use tracing::{debug, warn};

/// Default timeout for the capability probe (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const PREPARED_ROUTER_CHECK: &str = "import { PreparedRegExpRouter } from 'hono/router/reg-exp-router';\n\
     if (typeof PreparedRegExpRouter !== 'function') process.exit(1);\n";

/// Read-only facts about the installed framework.
#[async_trait]
pub trait CapabilityQuery: Send + Sync {
    /// Whether the installed framework ships `PreparedRegExpRouter`.
    async fn has_prepared_router(&self) -> bool;
}

#[async_trait]
impl<C: CapabilityQuery + ?Sized> CapabilityQuery for Arc<C> {
    async fn has_prepared_router(&self) -> bool {
        (**self).has_prepared_router().await
    }
}

/// A capability answer known up front.
#[derive(Debug, Clone, Copy)]
pub struct StaticCapability {
    pub prepared_router: bool,
}

#[async_trait]
impl CapabilityQuery for StaticCapability {
    async fn has_prepared_router(&self) -> bool {
        self.prepared_router
    }
}

/// Asks a `node` process, started in the project directory, to import the
/// prepared router.
#[derive(Debug, Clone)]
pub struct NodeCapabilityProbe {
    node: PathBuf,
    project_dir: PathBuf,
    timeout_secs: u64,
}

impl NodeCapabilityProbe {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            node: PathBuf::from("node"),
            project_dir: project_dir.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_node(mut self, node: impl Into<PathBuf>) -> Self {
        self.node = node.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[async_trait]
impl CapabilityQuery for NodeCapabilityProbe {
    async fn has_prepared_router(&self) -> bool {
        let mut cmd = Command::new(&self.node);
        cmd.arg("--input-type=module")
            .arg("-e")
            .arg(PREPARED_ROUTER_CHECK)
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                debug!(error = %err, "capability probe could not start");
                return false;
            }
        };

        match timeout(Duration::from_secs(self.timeout_secs), child.wait()).await {
            Ok(Ok(status)) => {
                debug!(%status, "capability probe finished");
                status.success()
            }
            Ok(Err(err)) => {
                debug!(error = %err, "capability probe failed");
                false
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout_secs,
                    "capability probe timed out, assuming no prepared router"
                );
                let _ = child.kill().await;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_runtime_counts_as_absent() {
        let probe = NodeCapabilityProbe::new(std::env::temp_dir())
            .with_node("/nonexistent/slim-test-node");
        assert!(!probe.has_prepared_router().await);
    }

    #[tokio::test]
    async fn test_static_capability() {
        let yes: Arc<dyn CapabilityQuery> = Arc::new(StaticCapability {
            prepared_router: true,
        });
        assert!(yes.has_prepared_router().await);
        assert!(
            !StaticCapability {
                prepared_router: false
            }
            .has_prepared_router()
            .await
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_counts_as_absent() {
        // `false` ignores its arguments and exits 1.
        let probe = NodeCapabilityProbe::new(std::env::temp_dir()).with_node("false");
        assert!(!probe.has_prepared_router().await);
    }
}

//! Evaluating compiled bundles outside the current process.
//!
//! The default [`NodeExecutor`] streams the bundle into a short-lived Node.js
//! process over stdin. The bundle never touches the filesystem, so repeated
//! builds (watch mode) cannot collide on temporary files. The harness reports
//! back a single JSON line; everything else the application prints is
//! forwarded to `tracing` at debug level.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::app::{ApplicationHandle, RawRoute};
use crate::compile::CompiledBundle;
use crate::{Error, Result};

/// Prefix of the harness report line on stdout.
pub const REPORT_MARKER: &str = "__SLIM_REPORT__";

/// Default timeout for a bundle evaluation (60 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Evaluation harness. Reads the CommonJS bundle from stdin, evaluates it
/// with a `require` rooted at the entry directory, validates the default
/// export and prints one report line.
///
/// Externals that `require` refuses (ESM-only packages) are loaded up front
/// with `import()` and handed out by the same `require`.
const HARNESS: &str = r#"
import { createRequire } from "node:module";
import { pathToFileURL } from "node:url";

const MARKER = "__SLIM_REPORT__";
const report = (value) => process.stdout.write("\n" + MARKER + JSON.stringify(value) + "\n");

const chunks = [];
for await (const chunk of process.stdin) chunks.push(chunk);
const code = Buffer.concat(chunks).toString("utf8");
const entry = process.env.SLIM_ENTRY;
const entryDir = process.env.SLIM_ENTRY_DIR;

const ESM_ONLY = new Set(["ERR_REQUIRE_ESM", "ERR_REQUIRE_ASYNC_MODULE", "ERR_PACKAGE_PATH_NOT_EXPORTED"]);

async function importExternal(nodeRequire, id) {
  try {
    return await import(pathToFileURL(nodeRequire.resolve(id)).href);
  } catch {
    return await import(id);
  }
}

try {
  const nodeRequire = createRequire(entryDir + "/");
  const preloaded = new Map();
  for (const id of JSON.parse(process.env.SLIM_EXTERNALS || "[]")) {
    try {
      nodeRequire(id);
    } catch (error) {
      if (!ESM_ONLY.has(error?.code)) continue;
      preloaded.set(id, await importExternal(nodeRequire, id));
    }
  }
  const require = (id) => (preloaded.has(id) ? preloaded.get(id) : nodeRequire(id));
  require.resolve = nodeRequire.resolve;
  const module = { exports: {} };
  new Function("module", "exports", "require", "__filename", "__dirname", code)(
    module, module.exports, require, entry, entryDir,
  );
  const exported = module.exports;
  const app = exported && exported.__esModule ? exported.default : (exported?.default ?? exported);
  if (!app || typeof app.fetch !== "function" || !Array.isArray(app.routes)) {
    report({
      ok: false,
      kind: "invalid-application",
      error: "default export must expose a fetch() handler and a routes table",
    });
  } else {
    const unused = globalThis.__slimUnusedMethods;
    report({
      ok: true,
      routes: app.routes.map((route) => ({ method: String(route.method), path: String(route.path) })),
      unusedMethods: unused instanceof Set ? [...unused].sort() : null,
    });
  }
} catch (error) {
  report({ ok: false, kind: "execution", error: String(error?.stack ?? error) });
}
process.exit(0);
"#;

/// Runs a compiled bundle and reports what it exported.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, bundle: &CompiledBundle) -> Result<ExecutionReport>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Arc<E> {
    async fn execute(&self, bundle: &CompiledBundle) -> Result<ExecutionReport> {
        (**self).execute(bundle).await
    }
}

/// The harness' verdict on one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub ok: bool,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub routes: Vec<RawRoute>,
    #[serde(default)]
    pub unused_methods: Option<Vec<String>>,
}

impl ExecutionReport {
    /// A successful report, as a canned executor would produce it.
    pub fn success(routes: Vec<RawRoute>, unused_methods: Option<Vec<String>>) -> Self {
        Self {
            ok: true,
            routes,
            unused_methods,
            ..Default::default()
        }
    }

    /// Find and decode the report line in harness stdout.
    pub fn parse(stdout: &str) -> Result<Self> {
        let line = stdout
            .lines()
            .rev()
            .find_map(|line| line.strip_prefix(REPORT_MARKER))
            .ok_or_else(|| Error::Execution("runtime exited without a report".to_string()))?;
        Ok(serde_json::from_str(line)?)
    }

    /// Turn the report into an application handle, or the error it describes.
    pub fn into_handle(self, bundle: CompiledBundle) -> Result<ApplicationHandle> {
        if !self.ok {
            let message = self
                .error
                .unwrap_or_else(|| "unknown failure".to_string());
            return Err(match self.kind.as_deref() {
                Some("invalid-application") => Error::InvalidApplication(message),
                _ => Error::Execution(message),
            });
        }

        Ok(ApplicationHandle::new(
            bundle.entry,
            self.routes,
            self.unused_methods,
            Arc::from(bundle.code),
            Arc::new(bundle.closure),
        ))
    }
}

/// Evaluates bundles with a `node` binary.
#[derive(Debug, Clone)]
pub struct NodeExecutor {
    node: PathBuf,
    timeout_secs: u64,
}

impl NodeExecutor {
    pub fn new() -> Self {
        Self {
            node: PathBuf::from("node"),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Use a specific Node.js binary.
    pub fn with_node(mut self, node: impl Into<PathBuf>) -> Self {
        self.node = node.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for NodeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for NodeExecutor {
    async fn execute(&self, bundle: &CompiledBundle) -> Result<ExecutionReport> {
        let entry_dir = bundle.entry.parent().unwrap_or(Path::new("."));

        let mut cmd = Command::new(&self.node);
        cmd.arg("--input-type=module")
            .arg("-e")
            .arg(HARNESS)
            .env("SLIM_ENTRY", &bundle.entry)
            .env("SLIM_ENTRY_DIR", entry_dir)
            .env("SLIM_EXTERNALS", serde_json::to_string(&bundle.externals)?)
            .current_dir(&bundle.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            Error::Execution(format!("failed to start {}: {e}", self.node.display()))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Execution("failed to capture runtime stdin".to_string()))?;
        stdin.write_all(bundle.code.as_bytes()).await?;
        drop(stdin); // EOF ends the harness' read loop

        let output = timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| {
            Error::Execution(format!(
                "bundle evaluation timed out after {}s",
                self.timeout_secs
            ))
        })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        for line in stdout.lines().filter(|l| !l.starts_with(REPORT_MARKER)) {
            if !line.is_empty() {
                debug!(target: "slim_loader::app", "{line}");
            }
        }
        for line in stderr.lines().filter(|l| !l.is_empty()) {
            debug!(target: "slim_loader::app", "{line}");
        }

        ExecutionReport::parse(&stdout).map_err(|err| match err {
            Error::Execution(_) if !output.status.success() => Error::Execution(format!(
                "runtime exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::SourceClosure;

    fn bundle() -> CompiledBundle {
        CompiledBundle {
            entry: PathBuf::from("/app/src/index.ts"),
            cwd: PathBuf::from("/app/src"),
            code: "module.exports = {}".to_string(),
            externals: vec!["@hono/node-server".to_string()],
            closure: SourceClosure::new(),
        }
    }

    #[test]
    fn test_parse_skips_application_output() {
        let stdout = format!(
            "listening on 3000\n{REPORT_MARKER}{}\n",
            r#"{"ok":true,"routes":[{"method":"GET","path":"/"}],"unusedMethods":["mount","route"]}"#
        );

        let report = ExecutionReport::parse(&stdout).unwrap();
        assert!(report.ok);
        assert_eq!(report.routes[0].path, "/");
        assert_eq!(
            report.unused_methods,
            Some(vec!["mount".to_string(), "route".to_string()])
        );
    }

    #[test]
    fn test_parse_without_report_is_execution_error() {
        let err = ExecutionReport::parse("Segmentation fault\n").unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
    }

    #[test]
    fn test_invalid_application_report_maps_to_error() {
        let report = ExecutionReport {
            ok: false,
            kind: Some("invalid-application".to_string()),
            error: Some("no fetch".to_string()),
            ..Default::default()
        };

        let err = report.into_handle(bundle()).unwrap_err();
        assert!(matches!(err, Error::InvalidApplication(msg) if msg == "no fetch"));
    }

    #[test]
    fn test_success_report_keeps_route_order() {
        let routes = vec![
            RawRoute {
                method: "POST".to_string(),
                path: "/b".to_string(),
            },
            RawRoute {
                method: "GET".to_string(),
                path: "/a".to_string(),
            },
        ];

        let handle = ExecutionReport::success(routes.clone(), None)
            .into_handle(bundle())
            .unwrap();
        assert_eq!(handle.routes(), routes.as_slice());
        assert_eq!(&**handle.code(), "module.exports = {}");
    }

    #[test]
    fn test_harness_reads_probe_record() {
        assert!(HARNESS.contains("__slimUnusedMethods"));
        assert!(HARNESS.contains(REPORT_MARKER));
    }

    #[test]
    fn test_harness_preloads_esm_only_externals() {
        assert!(HARNESS.contains("SLIM_EXTERNALS"));
        assert!(HARNESS.contains("ERR_REQUIRE_ESM"));
        assert!(HARNESS.contains("await importExternal"));
    }

    #[tokio::test]
    async fn test_missing_runtime_binary_is_execution_error() {
        let executor = NodeExecutor::new().with_node("/nonexistent/slim-test-node");
        let err = executor.execute(&bundle()).await.unwrap_err();
        assert!(matches!(err, Error::Execution(msg) if msg.contains("failed to start")));
    }
}

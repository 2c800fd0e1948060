//! End-to-end loader behavior with a real Rolldown build and a canned executor.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use slim_loader::{
    BuildMode, CompiledBundle, Error, ExecutionReport, Executor, LoadOptions, NodeExecutor,
    RawRoute, compile, load_with,
};
use tempfile::TempDir;
use tokio::time::timeout;

/// Reports one GET route per build and remembers the code it was given.
#[derive(Default)]
struct CannedExecutor {
    calls: AtomicUsize,
    last_code: parking_lot::Mutex<String>,
}

#[async_trait]
impl Executor for CannedExecutor {
    async fn execute(&self, bundle: &CompiledBundle) -> slim_loader::Result<ExecutionReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_code.lock() = bundle.code.clone();
        Ok(ExecutionReport::success(
            vec![RawRoute {
                method: "GET".to_string(),
                path: "/".to_string(),
            }],
            None,
        ))
    }
}

fn write_entry(dir: &Path, marker: &str) {
    std::fs::write(
        dir.join("index.js"),
        format!(
            "import {{ greet }} from './greet.js';\n\
             const app = {{ routes: [], fetch() {{ return greet('{marker}'); }} }};\n\
             export default app;\n"
        ),
    )
    .unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("greet.js"),
        "export const greet = (name) => `hello ${name}`;\n",
    )
    .unwrap();
    write_entry(dir.path(), "v1");
    dir
}

#[tokio::test]
async fn test_probe_build_collects_closure() {
    let dir = project();
    let options = LoadOptions::new().cwd(dir.path());

    let bundle = compile("index.js", &options, BuildMode::Probe).await.unwrap();

    assert!(bundle.code.contains("hello"));
    let ids: Vec<&str> = bundle.closure.ids().collect();
    assert!(ids.iter().any(|id| id.ends_with("index.js")));
    assert!(ids.iter().any(|id| id.ends_with("greet.js")));
}

#[tokio::test]
async fn test_production_build_is_esm() {
    let dir = project();
    let options = LoadOptions::new().cwd(dir.path());

    let bundle = compile("index.js", &options, BuildMode::Production { minify: false })
        .await
        .unwrap();

    assert!(bundle.code.contains("export"));
}

fn write_files(dir: &Path, files: &[(&str, &str)]) {
    for (path, contents) in files {
        let path = dir.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

fn node_available() -> bool {
    std::process::Command::new("node")
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success())
}

#[tokio::test]
async fn test_tsx_entry_uses_hono_jsx_runtime() {
    let dir = TempDir::new().unwrap();
    write_files(
        dir.path(),
        &[
            ("node_modules/hono/package.json", r#"{"name":"hono"}"#),
            (
                "node_modules/hono/jsx/jsx-runtime.js",
                "export const jsx = (tag, props) => ({ tag, props, runtime: 'hono-jsx' });\n\
                 export const jsxs = jsx;\n\
                 export const Fragment = 'fragment';\n",
            ),
            (
                "src/index.tsx",
                "const Page = (props: { name: string }) => <h1>{props.name}</h1>;\n\
                 export default { routes: [], fetch() { return <Page name=\"slim\" />; } };\n",
            ),
        ],
    );
    let options = LoadOptions::new().cwd(dir.path());

    let bundle = compile("src/index.tsx", &options, BuildMode::Probe)
        .await
        .unwrap();

    assert!(bundle.code.contains("hono-jsx"));
    assert!(!bundle.code.contains("react"));
    assert!(!bundle.code.contains("<h1>"));
    assert!(bundle.closure.ids().any(|id| id.ends_with("jsx-runtime.js")));
}

#[tokio::test]
async fn test_syntax_target_lowers_nullish_coalescing() {
    let dir = TempDir::new().unwrap();
    write_files(
        dir.path(),
        &[(
            "index.js",
            "export default { routes: [], fetch(req) { return req.body ?? 'empty'; } };\n",
        )],
    );

    let modern = compile(
        "index.js",
        &LoadOptions::new().cwd(dir.path()),
        BuildMode::Production { minify: false },
    )
    .await
    .unwrap();
    assert!(modern.code.contains("??"));

    let lowered = compile(
        "index.js",
        &LoadOptions::new().cwd(dir.path()).target("es2015"),
        BuildMode::Production { minify: false },
    )
    .await
    .unwrap();
    assert!(!lowered.code.contains("??"));
    assert!(lowered.code.contains("empty"));
}

#[tokio::test]
async fn test_dynamic_import_stays_in_one_bundle() {
    let dir = TempDir::new().unwrap();
    write_files(
        dir.path(),
        &[
            ("lazy.js", "export const lazy = () => 'lazy-marker';\n"),
            (
                "index.js",
                "export default {\n\
                   routes: [],\n\
                   async fetch() { const { lazy } = await import('./lazy.js'); return lazy(); },\n\
                 };\n",
            ),
        ],
    );
    let options = LoadOptions::new().cwd(dir.path());

    for mode in [BuildMode::Probe, BuildMode::Production { minify: false }] {
        let bundle = compile("index.js", &options, mode).await.unwrap();
        assert!(bundle.code.contains("lazy-marker"), "{mode:?}");
        assert!(bundle.closure.ids().any(|id| id.ends_with("lazy.js")));
    }
}

#[tokio::test]
async fn test_esm_only_external_is_left_unbundled() {
    let dir = TempDir::new().unwrap();
    write_files(
        dir.path(),
        &[
            (
                "node_modules/esm-only/package.json",
                r#"{"name":"esm-only","type":"module","exports":{"import":"./index.js"}}"#,
            ),
            ("node_modules/esm-only/index.js", "export const tag = 'esm';\n"),
            (
                "index.js",
                "import { tag } from 'esm-only';\n\
                 export default { routes: [{ method: 'GET', path: '/' + tag }], fetch() {} };\n",
            ),
        ],
    );
    let options = LoadOptions::new().cwd(dir.path()).external(["esm-only"]);

    let bundle = compile("index.js", &options, BuildMode::Probe).await.unwrap();
    assert_eq!(bundle.externals, vec!["esm-only".to_string()]);
    assert!(bundle.code.contains(r#"require("esm-only")"#));

    if !node_available() {
        eprintln!("node not found, skipping evaluation");
        return;
    }
    let mut apps = load_with(
        dir.path().join("index.js"),
        options,
        Arc::new(NodeExecutor::new()),
    );
    let app = apps.next().await.unwrap().unwrap();
    assert_eq!(app.routes()[0].path, "/esm");
}

#[tokio::test]
async fn test_syntax_error_is_build_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.js"), "export default {{{\n").unwrap();

    let err = compile(dir.path().join("index.js"), &LoadOptions::new(), BuildMode::Probe)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Bundler(_)));
}

#[tokio::test]
async fn test_one_shot_yields_exactly_one_application() {
    let dir = project();
    let executor = Arc::new(CannedExecutor::default());

    let mut apps = load_with(
        dir.path().join("index.js"),
        LoadOptions::new(),
        executor.clone(),
    );

    let app = apps.next().await.unwrap().unwrap();
    assert_eq!(app.routes().len(), 1);
    assert!(app.closure().len() >= 2);
    assert!(apps.next().await.is_none());
    assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_watch_mode_rebuilds_and_survives_failures() {
    let dir = project();
    let executor = Arc::new(CannedExecutor::default());
    let options = LoadOptions::new()
        .watch(true)
        .debounce(Duration::from_millis(50));

    let mut apps = load_with(dir.path().join("index.js"), options, executor.clone());

    let first = timeout(Duration::from_secs(10), apps.next())
        .await
        .unwrap()
        .unwrap();
    assert!(first.is_ok());
    assert!(executor.last_code.lock().contains("v1"));

    // A broken edit is logged and skipped; the sequence keeps waiting.
    std::fs::write(dir.path().join("index.js"), "export default {{{").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    write_entry(dir.path(), "v2");

    let second = timeout(Duration::from_secs(10), apps.next())
        .await
        .unwrap()
        .unwrap();
    assert!(second.is_ok());
    assert!(executor.last_code.lock().contains("v2"));

    apps.close();
    timeout(Duration::from_secs(5), async {
        while !apps.is_finished() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();
}

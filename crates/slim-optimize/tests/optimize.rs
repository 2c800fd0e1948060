//! Optimize runs against a miniature framework install, with real Rolldown
//! builds and a canned executor standing in for the probe run.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use slim_loader::{CompiledBundle, ExecutionReport, Executor, RawRoute};
use slim_optimize::{
    CapabilityQuery, Category, OptimizeOptions, Optimizer, RouterChoice, SpecializationToggles,
    StaticCapability,
};
use tempfile::TempDir;

const HONO_BASE: &str = r#"import { Context } from "./context.js";
import { HonoRequest } from "./request.js";

var Hono = class {
  routes = [];
  constructor(options = {}) {
    this.options = options;
  }
  get(path, handler) {
    this.routes.push({ method: "GET", path, handler });
    return this;
  }
  post(path, handler) {
    this.routes.push({ method: "POST", path, handler });
    return this;
  }
  route(path, app) {
    app.routes.forEach((r) => this.routes.push({ ...r, path: path + r.path }));
    return this;
  }
  basePath(path) {
    this.base = path;
    return this;
  }
  onError = (handler) => {
    this.errorHandler = handler;
    return this;
  };
  notFound = (handler) => {
    this.notFoundHandler = handler;
    return this;
  };
  mount(path, handler) {
    this.mounted = { path, handler };
    return this;
  }
  fire() {
    addEventListener("fetch", (event) => event.respondWith(this.fetch(event.request)));
  }
  request = (input) => this.fetch(new Request(input));
  fetch = (request) => {
    const c = new Context(new HonoRequest(request));
    return this.routes[0].handler(c);
  };
};
export { Hono as HonoBase };
"#;

const CONTEXT: &str = r#"var Context = class {
  constructor(req) {
    this.req = req;
  }
  text = (text) => new Response(text);
  json = (object) => new Response(JSON.stringify(object));
  html = (html) => new Response(html, { headers: { "content-type": "text/html; marker=html" } });
  redirect = (location) => new Response(null, { status: 302, headers: { location } });
};
export { Context };
"#;

const REQUEST: &str = r#"var HonoRequest = class {
  bodyCache = {};
  constructor(request) {
    this.raw = request;
  }
  #cachedBody = (key) => {
    const { bodyCache, raw } = this;
    return bodyCache[key] ??= raw[key]();
  };
  parseBody() {
    return this.#cachedBody("formData").then((form) => Object.fromEntries(form));
  }
  json() {
    return this.#cachedBody("json");
  }
  header(name) {
    return this.raw.headers.get(name);
  }
};
export { HonoRequest };
"#;

const HONO: &str = r#"import { HonoBase } from "./hono-base.js";
import { TrieRouter } from "./router/trie-router/index.js";
var Hono = class extends HonoBase {
  constructor(options = {}) {
    super(options);
    this.router = options.router ?? new TrieRouter();
  }
};
export { Hono };
"#;

const ALL_LIFECYCLE: &[&str] = &[
    "basePath", "fire", "mount", "notFound", "onError", "request", "route",
];

/// Returns fixed routes and lifecycle record without running anything.
struct CannedProbe {
    routes: Vec<(&'static str, &'static str)>,
    unused: Option<Vec<String>>,
}

impl CannedProbe {
    fn new(routes: &[(&'static str, &'static str)]) -> Self {
        Self {
            routes: routes.to_vec(),
            unused: Some(ALL_LIFECYCLE.iter().map(|s| s.to_string()).collect()),
        }
    }
}

#[async_trait]
impl Executor for CannedProbe {
    async fn execute(&self, _bundle: &CompiledBundle) -> slim_loader::Result<ExecutionReport> {
        let routes = self
            .routes
            .iter()
            .map(|(method, path)| RawRoute {
                method: method.to_string(),
                path: path.to_string(),
            })
            .collect();
        Ok(ExecutionReport::success(routes, self.unused.clone()))
    }
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A project with the framework installed and `app` as `src/index.js`.
fn project(app: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let hono = dir.path().join("node_modules/hono");
    write(
        &hono.join("package.json"),
        r#"{"name":"hono","version":"4.6.3","type":"module","exports":{".":"./dist/index.js"}}"#,
    );
    write(&hono.join("dist/hono-base.js"), HONO_BASE);
    write(&hono.join("dist/context.js"), CONTEXT);
    write(&hono.join("dist/request.js"), REQUEST);
    write(&hono.join("dist/hono.js"), HONO);
    write(
        &hono.join("dist/index.js"),
        "import { Hono } from \"./hono.js\";\nexport { Hono };\n",
    );
    write(
        &hono.join("dist/router/trie-router/index.js"),
        "export class TrieRouter { name = \"trie-router-marker\"; }\n",
    );
    write(
        &hono.join("dist/router/reg-exp-router/index.js"),
        "export class RegExpRouter { name = \"regexp-router-marker\"; }\n\
         export class PreparedRegExpRouter { constructor(matchers, relocate) { this.name = \"prepared-router-marker\"; this.matchers = matchers; } }\n",
    );
    write(&dir.path().join("src/index.js"), app);
    dir
}

const TEXT_APP: &str = r#"import { Hono } from "hono";
const app = new Hono();
app.get("/", (c) => c.text("hello"));
export default app;
"#;

fn options(dir: &TempDir) -> OptimizeOptions {
    let mut options = OptimizeOptions::new("src/index.js");
    options.cwd = Some(dir.path().to_path_buf());
    options
}

fn removed(report: &slim_optimize::OptimizationReport, category: Category) -> Option<Vec<String>> {
    report
        .removed
        .iter()
        .find(|r| r.category == category)
        .map(|r| r.members.clone())
}

async fn read_output(dir: &TempDir) -> String {
    tokio::fs::read_to_string(dir.path().join("dist/index.js"))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_single_get_route_with_prepared_router() {
    let dir = project(TEXT_APP);
    let optimizer = Optimizer::new(
        CannedProbe::new(&[("GET", "/")]),
        StaticCapability {
            prepared_router: true,
        },
    );

    let report = optimizer.run(&options(&dir)).await.unwrap();

    assert!(matches!(report.router, Some(RouterChoice::Prepared(_))));
    assert_eq!(
        removed(&report, Category::RequestBody),
        Some(vec![
            "parseBody".to_string(),
            "json".to_string(),
            "bodyCache".to_string(),
            "#cachedBody".to_string(),
        ])
    );
    assert_eq!(
        removed(&report, Category::Response),
        Some(vec!["json".to_string(), "html".to_string(), "redirect".to_string()])
    );

    let output = read_output(&dir).await;
    assert!(output.contains("prepared-router-marker"));
    assert!(output.contains("new Response(text)"));
    assert!(!output.contains("JSON.stringify"));
    assert!(!output.contains("marker=html"));
    assert!(!output.contains("Object.fromEntries"));
    assert!(output.contains("headers.get(name)"));
    assert_eq!(report.artifact.size, output.len() as u64);
}

#[tokio::test]
async fn test_regexp_router_when_prepared_symbol_missing() {
    let dir = project(TEXT_APP);
    let optimizer = Optimizer::new(
        CannedProbe::new(&[("GET", "/")]),
        StaticCapability {
            prepared_router: false,
        },
    );

    let report = optimizer.run(&options(&dir)).await.unwrap();

    assert_eq!(report.router, Some(RouterChoice::RegExpBased));
    assert!(read_output(&dir).await.contains("regexp-router-marker"));
}

#[tokio::test]
async fn test_unsupported_pattern_uses_trie_router() {
    let dir = project(TEXT_APP);
    let optimizer = Optimizer::new(
        CannedProbe::new(&[("GET", "/media/:file{(a|b)\\.png}")]),
        StaticCapability {
            prepared_router: true,
        },
    );

    let report = optimizer.run(&options(&dir)).await.unwrap();

    assert_eq!(report.router, Some(RouterChoice::TrieBased));
    assert!(read_output(&dir).await.contains("trie-router-marker"));
}

/// Counts capability checks.
#[derive(Default)]
struct CountingCapability {
    queries: AtomicUsize,
}

#[async_trait]
impl CapabilityQuery for CountingCapability {
    async fn has_prepared_router(&self) -> bool {
        self.queries.fetch_add(1, Ordering::SeqCst);
        true
    }
}

#[tokio::test]
async fn test_disabled_router_toggle_skips_capability_check() {
    let dir = project(TEXT_APP);
    let capability = Arc::new(CountingCapability::default());
    let optimizer = Optimizer::new(CannedProbe::new(&[("GET", "/")]), capability.clone());
    let mut disabled = options(&dir);
    disabled.toggles = SpecializationToggles {
        router: false,
        ..Default::default()
    };

    let plan = optimizer.plan(&disabled).await.unwrap();

    assert_eq!(plan.router, None);
    assert_eq!(plan.specialization.router, None);
    assert_eq!(capability.queries.load(Ordering::SeqCst), 0);

    let plan = optimizer.plan(&options(&dir)).await.unwrap();
    assert!(matches!(plan.router, Some(RouterChoice::Prepared(_))));
    assert_eq!(capability.queries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_target_lowers_production_syntax() {
    let app = r#"import { Hono } from "hono";
const app = new Hono();
app.get("/", (c) => c.text(c.req.header("x-name") ?? "anonymous"));
export default app;
"#;
    let dir = project(app);
    let optimizer = Optimizer::new(
        CannedProbe::new(&[("GET", "/")]),
        StaticCapability {
            prepared_router: true,
        },
    );
    let mut options = options(&dir);
    options.target = Some("es2015".to_string());

    optimizer.run(&options).await.unwrap();

    let output = read_output(&dir).await;
    assert!(output.contains("anonymous"));
    assert!(!output.contains("??"));
}

#[tokio::test]
async fn test_body_route_keeps_request_body_apis() {
    let app = r#"import { Hono } from "hono";
const app = new Hono();
app.post("/items", async (c) => c.text(String(await c.req.parseBody())));
export default app;
"#;
    let dir = project(app);
    let optimizer = Optimizer::new(
        CannedProbe::new(&[("POST", "/items")]),
        StaticCapability {
            prepared_router: true,
        },
    );

    let report = optimizer.run(&options(&dir)).await.unwrap();

    assert_eq!(removed(&report, Category::RequestBody), None);
    assert!(!report.to_string().contains("Request body APIs"));
    assert!(read_output(&dir).await.contains("Object.fromEntries"));
}

#[tokio::test]
async fn test_disabled_lifecycle_toggle_keeps_methods() {
    let dir = project(TEXT_APP);
    let optimizer = Optimizer::new(
        CannedProbe::new(&[("GET", "/")]),
        StaticCapability {
            prepared_router: true,
        },
    );
    let mut options = options(&dir);
    options.toggles = SpecializationToggles {
        lifecycle: false,
        ..Default::default()
    };

    let report = optimizer.run(&options).await.unwrap();

    assert_eq!(removed(&report, Category::Lifecycle), None);
    let output = read_output(&dir).await;
    assert!(output.contains("this.mounted"));
    assert!(output.contains("addEventListener"));
}

#[tokio::test]
async fn test_unused_lifecycle_methods_are_removed() {
    let dir = project(TEXT_APP);
    let optimizer = Optimizer::new(
        CannedProbe::new(&[("GET", "/")]),
        StaticCapability {
            prepared_router: true,
        },
    );

    let report = optimizer.run(&options(&dir)).await.unwrap();

    let lifecycle = removed(&report, Category::Lifecycle).unwrap();
    assert!(lifecycle.contains(&"mount".to_string()));
    assert!(lifecycle.contains(&"fire".to_string()));
    assert!(!read_output(&dir).await.contains("this.mounted"));
}

#[tokio::test]
async fn test_mention_in_string_keeps_member() {
    let app = r#"import { Hono } from "hono";
const app = new Hono();
const note = "call .json() later";
app.get("/", (c) => c.text(note));
export default app;
"#;
    let dir = project(app);
    let optimizer = Optimizer::new(
        CannedProbe::new(&[("GET", "/")]),
        StaticCapability {
            prepared_router: false,
        },
    );

    let plan = optimizer.plan(&options(&dir)).await.unwrap();

    assert!(plan.usage.used().contains("json"));
    let response = plan
        .specialization
        .removed
        .iter()
        .find(|r| r.category == Category::Response)
        .unwrap();
    assert!(!response.members.contains(&"json".to_string()));
}

#[tokio::test]
async fn test_repeated_runs_are_byte_identical() {
    let dir = project(TEXT_APP);
    let optimizer = Optimizer::new(
        CannedProbe::new(&[("GET", "/"), ("GET", "/posts/:id"), ("ALL", "/api/*")]),
        StaticCapability {
            prepared_router: true,
        },
    );

    let first = optimizer.run(&options(&dir)).await.unwrap();
    let first_output = read_output(&dir).await;
    let second = optimizer.run(&options(&dir)).await.unwrap();
    let second_output = read_output(&dir).await;

    assert_eq!(first, second);
    assert_eq!(first_output, second_output);
}

#[tokio::test]
async fn test_missing_framework_fails_before_build() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("src/index.js"), TEXT_APP);
    let optimizer = Optimizer::new(
        CannedProbe::new(&[("GET", "/")]),
        StaticCapability {
            prepared_router: true,
        },
    );

    let err = optimizer.run(&options(&dir)).await.unwrap_err();

    assert!(matches!(err, slim_optimize::Error::FrameworkNotFound(_)));
    assert!(!dir.path().join("dist/index.js").exists());
}

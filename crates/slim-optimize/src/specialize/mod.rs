//! Framework specialization.
//!
//! Each category is decided and applied independently. Router wiring is a
//! generated module; the other three categories are the framework's own
//! files with unused class members cut out. A category whose file cannot be
//! read, parsed or rewritten is skipped and the original file is bundled.

pub mod excise;
pub mod plugin;
pub mod registry;
pub mod wiring;

use std::fmt;

use tracing::{debug, info};

pub use excise::{ClassMember, ExciseError, Excision, MemberKind, excise_members};
pub use plugin::VirtualModulePlugin;
pub use registry::{ResolveFilter, VIRTUAL_QUERY, VirtualModule, VirtualModuleRegistry};

use crate::Result;
use crate::framework::{FrameworkLayout, INDEX_FILE, PACKAGE_NAME};
use crate::router::RouterChoice;
use crate::routes::{RouteTable, requires_request_body};
use crate::usage::{Catalogue, LIFECYCLE, REQUEST_BODY, RESPONSE, UsageAnalysis};

/// The four independent specialization decisions, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Router,
    RequestBody,
    Response,
    Lifecycle,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Router,
        Category::RequestBody,
        Category::Response,
        Category::Lifecycle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Router => "router",
            Category::RequestBody => "request-body",
            Category::Response => "response",
            Category::Lifecycle => "lifecycle",
        }
    }

    /// Human-readable label used in the summary.
    pub fn label(self) -> &'static str {
        match self {
            Category::Router => "Router",
            Category::RequestBody => "Request body APIs",
            Category::Response => "Response APIs",
            Category::Lifecycle => "Lifecycle methods",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-category switches. Everything is on unless turned off explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecializationToggles {
    pub router: bool,
    pub request_body: bool,
    pub response: bool,
    pub lifecycle: bool,
}

impl Default for SpecializationToggles {
    fn default() -> Self {
        Self {
            router: true,
            request_body: true,
            response: true,
            lifecycle: true,
        }
    }
}

impl SpecializationToggles {
    pub fn enabled(&self, category: Category) -> bool {
        match category {
            Category::Router => self.router,
            Category::RequestBody => self.request_body,
            Category::Response => self.response,
            Category::Lifecycle => self.lifecycle,
        }
    }
}

/// Members removed from one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedMembers {
    pub category: Category,
    pub members: Vec<String>,
}

/// Everything the specializer needs from earlier stages.
#[derive(Debug, Clone, Copy)]
pub struct SpecializeInputs<'a> {
    pub layout: &'a FrameworkLayout,
    pub routes: &'a RouteTable,
    /// `None` when router selection was skipped.
    pub router: Option<&'a RouterChoice>,
    pub usage: &'a UsageAnalysis,
    pub toggles: SpecializationToggles,
}

/// Result of specialization: the modules for the production build and what
/// they changed.
#[derive(Debug, Clone, Default)]
pub struct Specialization {
    pub registry: VirtualModuleRegistry,
    /// Router installed by the generated entry, if router wiring applied.
    pub router: Option<RouterChoice>,
    /// Removed members, in category order. Skipped categories are absent.
    pub removed: Vec<RemovedMembers>,
}

impl Specialization {
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

/// Build the virtual modules for one production build.
pub async fn specialize(inputs: SpecializeInputs<'_>) -> Result<Specialization> {
    let SpecializeInputs {
        layout,
        routes,
        router,
        usage,
        toggles,
    } = inputs;
    let mut specialization = Specialization::default();

    for category in Category::ALL {
        if !toggles.enabled(category) {
            debug!(%category, "specialization disabled");
            continue;
        }

        if category == Category::Router {
            let Some(router) = router else {
                debug!("no router chosen, keeping the framework default");
                continue;
            };
            let filter = ResolveFilter::file(layout.dist_file(INDEX_FILE)).with_bare(PACKAGE_NAME);
            specialization.registry.register(VirtualModule::new(
                category.name(),
                filter,
                wiring::router_module(router),
            ))?;
            specialization.router = Some(router.clone());
            continue;
        }

        let (catalogue, unused) = match category {
            Category::RequestBody => {
                if requires_request_body(routes) {
                    debug!("a route accepts a request body, keeping body APIs");
                    continue;
                }
                (REQUEST_BODY, usage.unused_in(&REQUEST_BODY))
            }
            Category::Response => (RESPONSE, usage.unused_in(&RESPONSE)),
            Category::Lifecycle => (LIFECYCLE, usage.unused_lifecycle()),
            Category::Router => continue,
        };
        if unused.is_empty() {
            continue;
        }

        let Some(excision) = excise_file(layout, &catalogue, &unused).await else {
            continue;
        };
        if excision.removed.is_empty() {
            continue;
        }

        info!(%category, members = ?excision.removed, "removing unused members");
        specialization.registry.register(VirtualModule::new(
            category.name(),
            ResolveFilter::file(layout.dist_file(catalogue.file)),
            excision.code,
        ))?;
        specialization.removed.push(RemovedMembers {
            category,
            members: excision.removed,
        });
    }

    Ok(specialization)
}

async fn excise_file(
    layout: &FrameworkLayout,
    catalogue: &Catalogue,
    unused: &[String],
) -> Option<Excision> {
    let path = layout.dist_file(catalogue.file);
    let source = match tokio::fs::read_to_string(&path).await {
        Ok(source) => source,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "framework file unreadable, skipping");
            return None;
        }
    };
    match excise_members(&source, catalogue.class_name, unused) {
        Ok(excision) => Some(excision),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "framework file not specialized");
            None
        }
    }
}

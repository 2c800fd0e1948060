//! # slim-optimize
//!
//! Build-time specialization of Hono applications.
//!
//! The optimizer runs the application once through the loader to learn its
//! route table and which optional framework APIs it touches, then produces a
//! production bundle in which:
//!
//! - the router is fixed at build time (a precomputed table where possible),
//! - unused request-body, response and lifecycle members are cut out of the
//!   framework's own classes.
//!
//! Every decision degrades towards the unmodified framework. A route the
//! precomputed format cannot express falls back to a slower router; a
//! framework file with an unexpected layout is bundled as is.
//!
//! ## Quick Start
//!
//! ```no_run
//! use slim_optimize::{OptimizeOptions, Optimizer};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let optimizer = Optimizer::node(".");
//! let report = optimizer.run(&OptimizeOptions::new("src/index.ts")).await?;
//! println!("{report}");
//! # Ok(()) }
//! ```

pub mod emit;
pub mod error;
pub mod framework;
pub mod pipeline;
pub mod report;
pub mod router;
pub mod routes;
pub mod specialize;
pub mod usage;

pub use emit::{BuildArtifact, EmitOptions, emit};
pub use error::{Error, Result};
pub use framework::FrameworkLayout;
pub use pipeline::{OptimizationPlan, OptimizeOptions, Optimizer};
pub use report::{OptimizationReport, format_size};
pub use router::{CapabilityQuery, NodeCapabilityProbe, RouterChoice, StaticCapability, choose_router};
pub use routes::{Method, RouteEntry, RouteTable, extract_routes, requires_request_body};
pub use specialize::{Category, RemovedMembers, Specialization, SpecializationToggles};
pub use usage::{UsageAnalysis, UsedMemberSet};

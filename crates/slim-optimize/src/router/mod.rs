//! Router selection.
//!
//! The fastest router the installed framework can run wins, as long as it
//! preserves match semantics: a precomputed table when the route set can be
//! serialized and the prepared router exists, the runtime-built regexp router
//! when only serialization succeeds, and the trie router otherwise.

pub mod capability;
pub mod prepared;

use std::fmt;

use tracing::{debug, info};

pub use capability::{CapabilityQuery, NodeCapabilityProbe, StaticCapability};
pub use prepared::{UnsupportedPath, serialize_routes};

use crate::routes::RouteTable;

/// The router the specialized build will install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterChoice {
    /// Precomputed table, rendered as constructor arguments.
    Prepared(String),
    RegExpBased,
    TrieBased,
}

impl RouterChoice {
    /// Class name of the router in the framework.
    pub fn router_name(&self) -> &'static str {
        match self {
            RouterChoice::Prepared(_) => "PreparedRegExpRouter",
            RouterChoice::RegExpBased => "RegExpRouter",
            RouterChoice::TrieBased => "TrieRouter",
        }
    }
}

impl fmt::Display for RouterChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.router_name())
    }
}

/// Pick the router for `routes`.
///
/// The capability query is only consulted when the table serializes; a route
/// set the regexp router cannot express always gets the trie router.
pub async fn choose_router(routes: &RouteTable, capability: &dyn CapabilityQuery) -> RouterChoice {
    let params = match serialize_routes(routes) {
        Ok(params) => params,
        Err(err) => {
            info!(path = %err.path, "route cannot be precomputed, using TrieRouter");
            return RouterChoice::TrieBased;
        }
    };

    if capability.has_prepared_router().await {
        debug!(bytes = params.len(), "using precomputed route table");
        RouterChoice::Prepared(params)
    } else {
        info!("installed framework has no PreparedRegExpRouter, using RegExpRouter");
        RouterChoice::RegExpBased
    }
}

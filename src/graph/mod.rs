//! Graph adapters: the synchronous read contract the core depends on, an
//! in-memory fixture for tests, and the real `neo4rs`-backed adapter.

pub mod fixture;
#[cfg(feature = "neo4j")]
pub mod neo4j;

pub use fixture::FixtureGraphAdapter;
#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jGraphAdapter;

use crate::core::errors::Result;
use crate::logger::Sink;
use crate::model::{Node, Path};

/// Read-only access to the graph store, synchronous from the core's point
/// of view. Implementations own however much async/connection machinery
/// they need internally; the rest of the crate never sees it.
pub trait GraphAdapter {
    /// Look up a user principal by its `name` property. `Ok(None)` means the
    /// name was not found, which is a data anomaly, not a fatal error.
    fn find_user(&self, name: &str) -> Result<Option<Node>>;

    /// One-hop outbound edges from the named principal. Empty is legal: a
    /// principal with no outbound paths still gets an attribute assessment.
    /// An edge whose relationship type is unrecognized, or whose endpoints
    /// are inconsistent with it, is skipped and logged via `sink` rather
    /// than failing the whole lookup.
    fn outbound_paths(&self, name: &str, sink: &mut dyn Sink) -> Result<Vec<Path>>;
}

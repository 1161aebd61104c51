//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use cadra::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{CadraError, Result};

// Model
pub use crate::model::{Edge, EdgeType, Node, NodeKind, Path, PrincipalView, PropertyValue, User};

// Engine
pub use crate::engine::{
    assess_permissions, assess_user_attributes, AdassScore, AttributeAssessment,
    PermissionAssessment, PermissionRuleTable, RuleEngine,
};

// Graph
pub use crate::graph::{FixtureGraphAdapter, GraphAdapter};
#[cfg(feature = "neo4j")]
pub use crate::graph::Neo4jGraphAdapter;

// Logging
pub use crate::logger::{ConsoleSink, JsonlSink, LogEvent, Severity, Sink};

// Report and driver
pub use crate::driver::assess;
pub use crate::report::Report;

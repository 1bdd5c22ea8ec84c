//! The osprey sharded-query router.
//!
//! Sits between MySQL-protocol clients and a fleet of backend shards, each
//! owning a disjoint keyspace-id range. For every statement it decides
//! which shards execute, rewrites the statement, fans out through the
//! scatter executor, and keeps owned secondary-index (vindex) tables
//! consistent with base-table DML.
//!
//! The SQL parser/planner, topology service, and scatter executor are
//! consumed through seams (`PlanBuilder`, `SrvTopo`, `ScatterConn`); this
//! crate owns the plan-to-execution mapping and the vindex lifecycle.

pub mod context;
pub mod plan;
pub mod planner;
pub mod router;
pub mod routing;
pub mod scatter;
pub mod session;
pub mod vschema;

pub use context::RequestContext;
pub use plan::{Plan, PlanKind, PlanValue, LIST_VAR_NAME};
pub use planner::{PlanBuilder, PlanCacheStats, Planner};
pub use router::Router;
pub use routing::RoutingMap;
pub use scatter::ScatterConn;
pub use session::{SafeSession, SessionState};
pub use vschema::{ColVindex, Keyspace, Table, VSchema, VSchemaConfig};

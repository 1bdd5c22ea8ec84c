use async_trait::async_trait;

use osprey_common::error::RouterError;
use osprey_common::query::{BindVars, QueryResult};

/// Callback handle a vindex uses to run SQL against its backing table.
///
/// The router implements this on its per-statement request context, so
/// vindex reads and writes are themselves routed statements sharing the
/// caller's session and cancellation scope.
#[async_trait]
pub trait VCursor: Send + Sync {
    async fn execute(&self, sql: &str, bind_vars: &BindVars) -> Result<QueryResult, RouterError>;
}

use std::collections::HashMap;

use async_trait::async_trait;

use osprey_common::cancel::CancelToken;
use osprey_common::error::RouterError;
use osprey_common::query::{BindVars, QueryResult, TabletType};

use crate::session::SafeSession;

/// The scatter executor seam: dials the selected shards, runs the rewritten
/// SQL under the session, fans out concurrently, and merges results. Its
/// errors pass through the router unchanged.
#[async_trait]
pub trait ScatterConn: Send + Sync {
    /// One SQL, one bind map, dispatched to every listed shard.
    #[allow(clippy::too_many_arguments)]
    async fn execute(
        &self,
        ctx: &CancelToken,
        sql: &str,
        bind_vars: &BindVars,
        keyspace: &str,
        shards: &[String],
        tablet_type: TabletType,
        session: &SafeSession,
    ) -> Result<QueryResult, RouterError>;

    /// One SQL with per-shard bind maps (the IN arm's list bundles).
    async fn execute_multi(
        &self,
        ctx: &CancelToken,
        sql: &str,
        keyspace: &str,
        shard_bind_vars: &HashMap<String, BindVars>,
        tablet_type: TabletType,
        session: &SafeSession,
    ) -> Result<QueryResult, RouterError>;
}

use std::sync::Arc;

use async_trait::async_trait;

use osprey_common::cancel::CancelToken;
use osprey_common::error::RouterError;
use osprey_common::query::{BindVars, Query, QueryResult, TabletType};
use osprey_vindex::cursor::VCursor;

use crate::router::Router;
use crate::session::SafeSession;

/// Per-statement scope: the cancellation token, tablet selector, session
/// handle, and a back-pointer to the router.
///
/// Implements `VCursor`, so vindex lookup/insert/delete callbacks issue
/// their SQL as fully routed statements re-entering the router under the
/// same session and cancellation scope.
pub struct RequestContext {
    pub cancel: CancelToken,
    pub tablet_type: TabletType,
    pub session: SafeSession,
    router: Arc<Router>,
}

impl RequestContext {
    pub(crate) fn new(
        router: Arc<Router>,
        cancel: CancelToken,
        tablet_type: TabletType,
        session: SafeSession,
    ) -> Self {
        RequestContext {
            cancel,
            tablet_type,
            session,
            router,
        }
    }
}

#[async_trait]
impl VCursor for RequestContext {
    async fn execute(&self, sql: &str, bind_vars: &BindVars) -> Result<QueryResult, RouterError> {
        self.cancel.check()?;
        let query = Query {
            sql: sql.to_string(),
            bind_variables: bind_vars.clone(),
            tablet_type: self.tablet_type,
        };
        self.router
            .execute(&self.cancel, query, self.session.clone())
            .await
    }
}

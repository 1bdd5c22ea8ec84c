//! The routing core: turns a plan into a concrete set of
//! (keyspace, shard, rewritten-SQL, bind-vars) dispatches, and keeps owned
//! vindex tables consistent with base-table DML.
//!
//! Vindex maintenance runs inside the caller's session: owned entries are
//! created before the base insert is dispatched and deleted before the base
//! delete, so within the committed session boundary a surviving index entry
//! for a missing row is impossible. If a later step fails, rollback of the
//! earlier vindex writes is the session transaction's responsibility.

use std::collections::HashSet;
use std::slice;
use std::sync::Arc;

use tracing::debug;

use osprey_common::cancel::CancelToken;
use osprey_common::config::RouterConfig;
use osprey_common::datum::Datum;
use osprey_common::error::{RouterError, RouterResult};
use osprey_common::query::{BindValue, BindVars, Query, QueryResult, TabletType};
use osprey_topo::{
    map_exact_shards, shard_for_keyspace_id, KeyRange, KeyspaceId, ShardRef, SrvTopo,
};
use osprey_vindex::vindex::{Cardinality, VindexCap};

use crate::context::RequestContext;
use crate::plan::{Plan, PlanKind, PlanValue};
use crate::planner::{PlanBuilder, PlanCacheStats, Planner};
use crate::routing::RoutingMap;
use crate::scatter::ScatterConn;
use crate::session::SafeSession;
use crate::vschema::ColVindex;

/// Bind var carrying the DML's keyspace id.
const KSID_NAME: &str = "keyspace_id";

/// Routes statements to the correct shards based on the values in the
/// query. Holds only immutable configuration; the planner's plan cache is
/// the sole mutable state.
pub struct Router {
    topo: Arc<dyn SrvTopo>,
    cell: String,
    planner: Planner,
    scatter_conn: Arc<dyn ScatterConn>,
}

impl Router {
    pub fn new(
        config: &RouterConfig,
        topo: Arc<dyn SrvTopo>,
        plan_builder: Arc<dyn PlanBuilder>,
        scatter_conn: Arc<dyn ScatterConn>,
    ) -> Arc<Router> {
        Arc::new(Router {
            topo,
            cell: config.cell.clone(),
            planner: Planner::new(plan_builder, config.plan_cache_capacity),
            scatter_conn,
        })
    }

    pub fn plan_cache_stats(&self) -> PlanCacheStats {
        self.planner.stats()
    }

    /// Route and execute a non-streaming statement.
    pub async fn execute(
        self: &Arc<Self>,
        ctx: &CancelToken,
        query: Query,
        session: SafeSession,
    ) -> RouterResult<QueryResult> {
        ctx.check()?;
        let plan = self.planner.get_plan(&query.sql)?;
        let vcursor = RequestContext::new(
            self.clone(),
            ctx.clone(),
            query.tablet_type,
            session,
        );
        let result = match plan.kind {
            PlanKind::SelectUnsharded
            | PlanKind::UpdateUnsharded
            | PlanKind::DeleteUnsharded
            | PlanKind::InsertUnsharded => self.exec_unsharded(&vcursor, &plan, query).await,
            PlanKind::SelectEqual => self.exec_select_equal(&vcursor, &plan, query).await,
            PlanKind::SelectIn => self.exec_select_in(&vcursor, &plan, query).await,
            PlanKind::SelectKeyrange => self.exec_select_keyrange(&vcursor, &plan, query).await,
            PlanKind::SelectScatter => self.exec_select_scatter(&vcursor, &plan, query).await,
            PlanKind::UpdateEqual | PlanKind::DeleteEqual => {
                self.exec_dml_equal(&vcursor, &plan, query).await
            }
            PlanKind::InsertSharded => self.exec_insert_sharded(&vcursor, &plan, query).await,
        };
        if let Err(err) = &result {
            err.log_if_internal();
        }
        result
    }

    // ── Read executors ──────────────────────────────────────────────────────

    /// All four unsharded arms: the keyspace's sole shard runs the original
    /// query text unchanged.
    async fn exec_unsharded(
        &self,
        vcursor: &RequestContext,
        plan: &Plan,
        query: Query,
    ) -> RouterResult<QueryResult> {
        let (keyspace, all_shards) = self
            .get_keyspace_shards(vcursor, &plan.table.keyspace.name, query.tablet_type)
            .await?;
        if all_shards.len() != 1 {
            return Err(RouterError::UnshardedKeyspace {
                keyspace,
                shard_count: all_shards.len(),
            });
        }
        let shards = vec![all_shards[0].name.clone()];
        self.scatter_conn
            .execute(
                &vcursor.cancel,
                &query.sql,
                &query.bind_variables,
                &keyspace,
                &shards,
                query.tablet_type,
                &vcursor.session,
            )
            .await
    }

    async fn exec_select_equal(
        &self,
        vcursor: &RequestContext,
        plan: &Plan,
        query: Query,
    ) -> RouterResult<QueryResult> {
        let keys = resolve_keys(&plan.values, &query.bind_variables)?;
        let (keyspace, routing) = self.resolve_shards(vcursor, &keys, plan).await?;
        self.scatter_conn
            .execute(
                &vcursor.cancel,
                &plan.rewritten,
                &query.bind_variables,
                &keyspace,
                &routing.shards(),
                query.tablet_type,
                &vcursor.session,
            )
            .await
    }

    async fn exec_select_in(
        &self,
        vcursor: &RequestContext,
        plan: &Plan,
        query: Query,
    ) -> RouterResult<QueryResult> {
        let keys = resolve_keys(&plan.values, &query.bind_variables)?;
        let (keyspace, routing) = self.resolve_shards(vcursor, &keys, plan).await?;
        let shard_bind_vars = routing.shard_bind_vars(&query.bind_variables);
        self.scatter_conn
            .execute_multi(
                &vcursor.cancel,
                &plan.rewritten,
                &keyspace,
                &shard_bind_vars,
                query.tablet_type,
                &vcursor.session,
            )
            .await
    }

    async fn exec_select_keyrange(
        &self,
        vcursor: &RequestContext,
        plan: &Plan,
        query: Query,
    ) -> RouterResult<QueryResult> {
        // Raw resolution: a byte-string endpoint IS the keyspace id, so it
        // must not be interned as text.
        let keys = resolve_raw_keys(&plan.values, &query.bind_variables)?;
        let range = key_range_from_keys(&keys)?;
        vcursor.cancel.check()?;
        let (keyspace, shards) = map_exact_shards(
            self.topo.as_ref(),
            &vcursor.cancel,
            &self.cell,
            &plan.table.keyspace.name,
            query.tablet_type,
            &range,
        )
        .await?;
        if shards.len() != 1 {
            return Err(RouterError::KeyRangeShardCount {
                keys: format!("{keys:?}"),
            });
        }
        self.scatter_conn
            .execute(
                &vcursor.cancel,
                &plan.rewritten,
                &query.bind_variables,
                &keyspace,
                &shards,
                query.tablet_type,
                &vcursor.session,
            )
            .await
    }

    async fn exec_select_scatter(
        &self,
        vcursor: &RequestContext,
        plan: &Plan,
        query: Query,
    ) -> RouterResult<QueryResult> {
        let (keyspace, all_shards) = self
            .get_keyspace_shards(vcursor, &plan.table.keyspace.name, query.tablet_type)
            .await?;
        let shards: Vec<String> = all_shards.iter().map(|s| s.name.clone()).collect();
        self.scatter_conn
            .execute(
                &vcursor.cancel,
                &plan.rewritten,
                &query.bind_variables,
                &keyspace,
                &shards,
                query.tablet_type,
                &vcursor.session,
            )
            .await
    }

    // ── DML executors ───────────────────────────────────────────────────────

    /// UpdateEqual and DeleteEqual: single-shard DML routed by the primary
    /// vindex. A MinKey image is a successful no-op. DeleteEqual first runs
    /// the owned-vindex deletion protocol when the plan carries a subquery.
    async fn exec_dml_equal(
        &self,
        vcursor: &RequestContext,
        plan: &Plan,
        mut query: Query,
    ) -> RouterResult<QueryResult> {
        let keys = resolve_keys(&plan.values, &query.bind_variables)?;
        let key = keys.into_iter().next().ok_or_else(|| {
            RouterError::internal_bug(
                "E-ROUTE-001",
                "equal DML plan has no routing value",
                format!("table={}", plan.table.name),
            )
        })?;
        let (keyspace, shard, ksid) = self.resolve_single_shard(vcursor, key, plan).await?;
        let Some(shard) = shard else {
            // Unroutable: nothing matches, nothing to do.
            return Ok(QueryResult::default());
        };
        if plan.kind == PlanKind::DeleteEqual {
            if let Some(subquery) = &plan.subquery {
                self.delete_vindex_entries(
                    vcursor,
                    plan,
                    subquery,
                    &keyspace,
                    &shard,
                    &ksid,
                    &query.bind_variables,
                )
                .await?;
            }
        }
        query.bind_variables.insert(
            KSID_NAME.to_string(),
            BindValue::Value(Datum::Bytea(ksid.as_bytes().to_vec())),
        );
        let rewritten = dml_with_routing_comment(&plan.rewritten, &ksid);
        debug!(
            keyspace = %keyspace,
            shard = %shard,
            ksid = %ksid,
            kind = ?plan.kind,
            "routing DML to single shard"
        );
        self.scatter_conn
            .execute(
                &vcursor.cancel,
                &rewritten,
                &query.bind_variables,
                &keyspace,
                slice::from_ref(&shard),
                query.tablet_type,
                &vcursor.session,
            )
            .await
    }

    /// InsertSharded: the ordered ColVindex list is the index-maintenance
    /// plan. The primary produces the row's keyspace id; secondaries are
    /// created/verified/derived against it, echoing each resolved value
    /// into `_<column>`.
    async fn exec_insert_sharded(
        &self,
        vcursor: &RequestContext,
        plan: &Plan,
        mut query: Query,
    ) -> RouterResult<QueryResult> {
        let keys = resolve_keys(&plan.values, &query.bind_variables)?;
        if keys.len() != plan.table.col_vindexes.len() {
            return Err(RouterError::internal_bug(
                "E-ROUTE-002",
                "insert values don't line up with the table's col-vindexes",
                format!(
                    "table={} values={} col_vindexes={}",
                    plan.table.name,
                    keys.len(),
                    plan.table.col_vindexes.len()
                ),
            ));
        }
        let primary = plan.table.primary().ok_or_else(|| {
            RouterError::internal_bug(
                "E-ROUTE-003",
                "sharded insert into a table without col-vindexes",
                format!("table={}", plan.table.name),
            )
        })?;
        let mut keys = keys.into_iter();
        let (ksid, mut generated) = self
            .handle_primary(
                vcursor,
                keys.next().unwrap_or(Datum::Null),
                primary,
                &mut query.bind_variables,
            )
            .await?;
        let (keyspace, shard) = self
            .get_routing(vcursor, &plan.table.keyspace.name, query.tablet_type, &ksid)
            .await?;
        for (key, col_vindex) in keys.zip(plan.table.col_vindexes.iter().skip(1)) {
            let newly_generated = self
                .handle_non_primary(vcursor, key, col_vindex, &mut query.bind_variables, &ksid)
                .await?;
            if let Some(value) = newly_generated {
                if generated.is_some() {
                    return Err(RouterError::MultipleGenerated);
                }
                generated = Some(value);
            }
        }
        query.bind_variables.insert(
            KSID_NAME.to_string(),
            BindValue::Value(Datum::Bytea(ksid.as_bytes().to_vec())),
        );
        let rewritten = dml_with_routing_comment(&plan.rewritten, &ksid);
        debug!(
            keyspace = %keyspace,
            shard = %shard,
            ksid = %ksid,
            table = %plan.table.name,
            "routing sharded insert"
        );
        let mut result = self
            .scatter_conn
            .execute(
                &vcursor.cancel,
                &rewritten,
                &query.bind_variables,
                &keyspace,
                slice::from_ref(&shard),
                query.tablet_type,
                &vcursor.session,
            )
            .await?;
        if let Some(value) = generated {
            if result.insert_id != 0 {
                return Err(RouterError::GeneratedValueConflict);
            }
            result.insert_id = value as u64;
        }
        Ok(result)
    }

    /// Primary ColVindex handling on insert: owned vindexes get their entry
    /// created (or a fresh value generated), then the value maps to the
    /// row's keyspace id. MinKey here means the row cannot be placed.
    async fn handle_primary(
        &self,
        vcursor: &RequestContext,
        mut key: Datum,
        col_vindex: &ColVindex,
        bind_vars: &mut BindVars,
    ) -> RouterResult<(KeyspaceId, Option<i64>)> {
        vcursor.cancel.check()?;
        let mut generated = None;
        if col_vindex.owned {
            if key.is_null() {
                if !col_vindex.vindex.supports(VindexCap::Generate) {
                    return Err(RouterError::ValueRequired {
                        column: col_vindex.column.clone(),
                    });
                }
                let value = col_vindex.vindex.generate(vcursor, None).await?;
                generated = Some(value);
                key = Datum::Int64(value);
            } else {
                if !col_vindex.vindex.supports(VindexCap::Create) {
                    return Err(col_vindex.vindex.unsupported("Create").into());
                }
                col_vindex.vindex.create(vcursor, &key, None).await?;
            }
        }
        if key.is_null() {
            return Err(RouterError::ValueRequired {
                column: col_vindex.column.clone(),
            });
        }
        let ksid = self.map_unique(vcursor, col_vindex, &key).await?;
        if ksid.is_min() {
            return Err(RouterError::Unroutable {
                value: key.to_string(),
            });
        }
        bind_vars.insert(
            format!("_{}", col_vindex.column),
            BindValue::Value(key),
        );
        Ok((ksid, generated))
    }

    /// Secondary ColVindex handling on insert, by owned × value-supplied:
    /// owned+supplied creates the entry, owned+missing generates one bound
    /// to the primary ksid, non-owned+supplied verifies consistency,
    /// non-owned+missing derives the value by reverse-mapping the ksid.
    async fn handle_non_primary(
        &self,
        vcursor: &RequestContext,
        mut key: Datum,
        col_vindex: &ColVindex,
        bind_vars: &mut BindVars,
        ksid: &KeyspaceId,
    ) -> RouterResult<Option<i64>> {
        vcursor.cancel.check()?;
        let mut generated = None;
        if col_vindex.owned {
            if key.is_null() {
                if !col_vindex.vindex.supports(VindexCap::Generate) {
                    return Err(RouterError::ValueRequired {
                        column: col_vindex.column.clone(),
                    });
                }
                let value = col_vindex.vindex.generate(vcursor, Some(ksid)).await?;
                generated = Some(value);
                key = Datum::Int64(value);
            } else {
                if !col_vindex.vindex.supports(VindexCap::Create) {
                    return Err(col_vindex.vindex.unsupported("Create").into());
                }
                col_vindex.vindex.create(vcursor, &key, Some(ksid)).await?;
            }
        } else if key.is_null() {
            if !col_vindex.vindex.supports(VindexCap::ReverseMap) {
                return Err(RouterError::ValueRequired {
                    column: col_vindex.column.clone(),
                });
            }
            match col_vindex.vindex.reverse_map(vcursor, ksid).await? {
                Some(value) => key = value,
                None => {
                    return Err(RouterError::ValueComputeFailed {
                        column: col_vindex.column.clone(),
                    })
                }
            }
        } else {
            if !col_vindex.vindex.supports(VindexCap::Verify) {
                return Err(col_vindex.vindex.unsupported("Verify").into());
            }
            if !col_vindex.vindex.verify(vcursor, &key, ksid).await? {
                return Err(RouterError::VerifyFailed {
                    value: key.to_string(),
                    column: col_vindex.column.clone(),
                    keyspace_id: ksid.to_hex(),
                });
            }
        }
        bind_vars.insert(
            format!("_{}", col_vindex.column),
            BindValue::Value(key),
        );
        Ok(generated)
    }

    /// Owned-vindex deletion protocol for DeleteEqual: read the owned
    /// columns of the doomed rows, then remove their index entries, all
    /// before the base delete is issued.
    ///
    /// An empty subquery result skips the vindex deletes but the caller
    /// still dispatches the base DELETE: rows may have appeared between the
    /// subquery and the delete, and the WHERE clause must still see them.
    #[allow(clippy::too_many_arguments)]
    async fn delete_vindex_entries(
        &self,
        vcursor: &RequestContext,
        plan: &Plan,
        subquery: &str,
        keyspace: &str,
        shard: &str,
        ksid: &KeyspaceId,
        bind_vars: &BindVars,
    ) -> RouterResult<()> {
        vcursor.cancel.check()?;
        let shard_list = [shard.to_string()];
        let result = self
            .scatter_conn
            .execute(
                &vcursor.cancel,
                subquery,
                bind_vars,
                keyspace,
                &shard_list,
                vcursor.tablet_type,
                &vcursor.session,
            )
            .await?;
        if result.rows.is_empty() {
            return Ok(());
        }
        let owned = &plan.table.owned;
        for row in &result.rows {
            if row.len() != owned.len() {
                return Err(RouterError::internal_bug(
                    "E-ROUTE-004",
                    "deletion subquery row width doesn't match owned col-vindexes",
                    format!(
                        "table={} row_width={} owned={}",
                        plan.table.name,
                        row.len(),
                        owned.len()
                    ),
                ));
            }
        }
        for (i, col_vindex) in owned.iter().enumerate() {
            let mut seen = HashSet::new();
            let mut ids = Vec::new();
            for row in &result.rows {
                let value = row[i].clone().normalized();
                if seen.insert(value.clone()) {
                    ids.push(value);
                }
            }
            if !col_vindex.vindex.supports(VindexCap::Delete) {
                return Err(col_vindex.vindex.unsupported("Delete").into());
            }
            col_vindex.vindex.delete(vcursor, &ids, ksid).await?;
        }
        Ok(())
    }

    // ── Shard resolution ────────────────────────────────────────────────────

    /// Map the resolved keys through the plan's routing vindex and group
    /// them by owning shard. MinKey images are skipped; non-unique vindexes
    /// fan a key out to every shard its images cover.
    async fn resolve_shards(
        &self,
        vcursor: &RequestContext,
        keys: &[Datum],
        plan: &Plan,
    ) -> RouterResult<(String, RoutingMap)> {
        let (keyspace, all_shards) = self
            .get_keyspace_shards(vcursor, &plan.table.keyspace.name, vcursor.tablet_type)
            .await?;
        let col_vindex = routing_vindex(plan)?;
        vcursor.cancel.check()?;
        let images = col_vindex.vindex.map(vcursor, keys).await?;
        if images.len() != keys.len() {
            return Err(map_arity_bug(col_vindex, keys.len(), images.len()));
        }
        let mut routing = RoutingMap::default();
        match col_vindex.vindex.cardinality() {
            Cardinality::Unique => {
                for (key, image) in keys.iter().zip(&images) {
                    let ksid = single_image(col_vindex, image)?;
                    if ksid.is_min() {
                        continue;
                    }
                    let shard = shard_for_keyspace_id(&all_shards, ksid)?;
                    routing.add(shard, key.clone());
                }
            }
            Cardinality::NonUnique => {
                for (key, image) in keys.iter().zip(&images) {
                    for ksid in image {
                        if ksid.is_min() {
                            continue;
                        }
                        let shard = shard_for_keyspace_id(&all_shards, ksid)?;
                        routing.add(shard, key.clone());
                    }
                }
            }
        }
        debug!(
            keyspace = %keyspace,
            vindex = %col_vindex.name,
            keys = keys.len(),
            shards = routing.shards().len(),
            "resolved shards"
        );
        Ok((keyspace, routing))
    }

    /// Equal-predicate DML resolution. The routing vindex must be unique.
    /// A MinKey image returns `(keyspace, None, MIN)`: a no-op for the
    /// caller, never an error.
    async fn resolve_single_shard(
        &self,
        vcursor: &RequestContext,
        key: Datum,
        plan: &Plan,
    ) -> RouterResult<(String, Option<String>, KeyspaceId)> {
        let (keyspace, all_shards) = self
            .get_keyspace_shards(vcursor, &plan.table.keyspace.name, vcursor.tablet_type)
            .await?;
        let col_vindex = routing_vindex(plan)?;
        if col_vindex.vindex.cardinality() != Cardinality::Unique {
            return Err(RouterError::internal_bug(
                "E-ROUTE-005",
                "equal DML requires a unique routing vindex",
                format!("vindex={} table={}", col_vindex.name, plan.table.name),
            ));
        }
        vcursor.cancel.check()?;
        let ksid = self.map_unique(vcursor, col_vindex, &key).await?;
        if ksid.is_min() {
            return Ok((keyspace, None, ksid));
        }
        let shard = shard_for_keyspace_id(&all_shards, &ksid)?.to_string();
        Ok((keyspace, Some(shard), ksid))
    }

    /// Topology fetch for a keyspace id already in hand (insert routing).
    async fn get_routing(
        &self,
        vcursor: &RequestContext,
        keyspace: &str,
        tablet_type: TabletType,
        ksid: &KeyspaceId,
    ) -> RouterResult<(String, String)> {
        let (keyspace, all_shards) = self
            .get_keyspace_shards(vcursor, keyspace, tablet_type)
            .await?;
        let shard = shard_for_keyspace_id(&all_shards, ksid)?.to_string();
        Ok((keyspace, shard))
    }

    /// Map one key through a unique vindex to its single keyspace id.
    async fn map_unique(
        &self,
        vcursor: &RequestContext,
        col_vindex: &ColVindex,
        key: &Datum,
    ) -> RouterResult<KeyspaceId> {
        let images = col_vindex.vindex.map(vcursor, slice::from_ref(key)).await?;
        if images.len() != 1 {
            return Err(map_arity_bug(col_vindex, 1, images.len()));
        }
        Ok(single_image(col_vindex, &images[0])?.clone())
    }

    /// Per-statement topology fetch. The shard set may change between
    /// statements; the returned (possibly rerouted) keyspace name is used
    /// for everything downstream.
    async fn get_keyspace_shards(
        &self,
        vcursor: &RequestContext,
        keyspace: &str,
        tablet_type: TabletType,
    ) -> RouterResult<(String, Vec<ShardRef>)> {
        vcursor.cancel.check()?;
        let (effective, shards) = self
            .topo
            .get_keyspace_shards(&vcursor.cancel, &self.cell, keyspace, tablet_type)
            .await?;
        Ok((effective, shards))
    }
}

// ── Key resolution helpers ──────────────────────────────────────────────────

/// Substitute bind-var references, preserving byte strings as-is. A bind
/// var holding a list expands in place (the `IN ::names` shape); everything
/// else keeps 1:1 arity and order.
fn resolve_raw_keys(values: &[PlanValue], bind_vars: &BindVars) -> RouterResult<Vec<Datum>> {
    let mut keys = Vec::with_capacity(values.len());
    for value in values {
        match value {
            PlanValue::BindRef(name) => match bind_vars.get(name) {
                None => return Err(RouterError::BindVarMissing(format!(":{name}"))),
                Some(BindValue::Value(datum)) => keys.push(datum.clone()),
                Some(BindValue::List(list)) => keys.extend(list.iter().cloned()),
            },
            PlanValue::Literal(datum) => keys.push(datum.clone()),
            PlanValue::Null => keys.push(Datum::Null),
        }
    }
    Ok(keys)
}

/// `resolve_raw_keys` plus text interning of byte strings, for the vindex
/// paths where values compare by content.
fn resolve_keys(values: &[PlanValue], bind_vars: &BindVars) -> RouterResult<Vec<Datum>> {
    Ok(resolve_raw_keys(values, bind_vars)?
        .into_iter()
        .map(Datum::normalized)
        .collect())
}

/// The two resolved keyrange endpoints, as hex text or raw bytes.
fn key_range_from_keys(keys: &[Datum]) -> RouterResult<KeyRange> {
    let bad = || RouterError::KeyRangeBadValue {
        keys: format!("{keys:?}"),
    };
    if keys.len() != 2 {
        return Err(bad());
    }
    let mut endpoints = Vec::with_capacity(2);
    for key in keys {
        let ksid = match key {
            Datum::Text(s) => KeyspaceId::from_hex(s).ok_or_else(bad)?,
            Datum::Bytea(b) => KeyspaceId::new(b.clone()),
            _ => return Err(bad()),
        };
        endpoints.push(ksid);
    }
    let end = endpoints.pop().unwrap_or(KeyspaceId::MIN);
    let start = endpoints.pop().unwrap_or(KeyspaceId::MIN);
    Ok(KeyRange::new(start, end))
}

fn routing_vindex(plan: &Plan) -> RouterResult<&Arc<ColVindex>> {
    plan.col_vindex.as_ref().ok_or_else(|| {
        RouterError::internal_bug(
            "E-ROUTE-006",
            "plan has no routing vindex",
            format!("kind={:?} table={}", plan.kind, plan.table.name),
        )
    })
}

fn single_image<'a>(
    col_vindex: &ColVindex,
    image: &'a [KeyspaceId],
) -> RouterResult<&'a KeyspaceId> {
    match image {
        [ksid] => Ok(ksid),
        other => Err(RouterError::internal_bug(
            "E-ROUTE-007",
            "unique vindex produced multiple keyspace ids for one key",
            format!("vindex={} images={}", col_vindex.name, other.len()),
        )),
    }
}

fn map_arity_bug(col_vindex: &ColVindex, expected: usize, got: usize) -> RouterError {
    RouterError::internal_bug(
        "E-ROUTE-008",
        "vindex map arity mismatch",
        format!("vindex={} expected={expected} got={got}", col_vindex.name),
    )
}

/// The trailing routing comment on every DML: preserves ksid provenance in
/// server-side logs and on replicas. Binlog consumers parse this text, so
/// the hex form must stay stable. Appended last, outside any SQL that
/// might be rewritten further downstream.
fn dml_with_routing_comment(rewritten: &str, ksid: &KeyspaceId) -> String {
    format!("{rewritten} /* _routing keyspace_id:{} */", ksid.to_hex())
}

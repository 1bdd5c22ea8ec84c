use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use osprey_common::error::RouterResult;

use crate::plan::Plan;

/// The planner seam: turns SQL text into a plan. Identical SQL strings must
/// yield the same plan, which is what makes the cache sound.
pub trait PlanBuilder: Send + Sync {
    fn build_plan(&self, sql: &str) -> RouterResult<Arc<Plan>>;
}

/// Memoising facade over a `PlanBuilder`: a bounded, thread-safe plan cache
/// keyed by SQL text. Eviction drops the least-used entry.
pub struct Planner {
    builder: Arc<dyn PlanBuilder>,
    inner: RwLock<CacheInner>,
}

struct CacheInner {
    /// SQL -> (plan, access count)
    entries: HashMap<String, (Arc<Plan>, u64)>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

/// Snapshot of plan cache statistics.
#[derive(Debug, Clone)]
pub struct PlanCacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate_pct: f64,
}

impl Planner {
    pub fn new(builder: Arc<dyn PlanBuilder>, capacity: usize) -> Self {
        Planner {
            builder,
            inner: RwLock::new(CacheInner {
                entries: HashMap::new(),
                capacity,
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Look up or build the plan for `sql`.
    pub fn get_plan(&self, sql: &str) -> RouterResult<Arc<Plan>> {
        {
            let mut inner = self.inner.write();
            let hit = inner.entries.get_mut(sql).map(|(plan, count)| {
                *count += 1;
                plan.clone()
            });
            match hit {
                Some(plan) => {
                    inner.hits += 1;
                    return Ok(plan);
                }
                None => inner.misses += 1,
            }
        }

        // Build outside the lock; concurrent misses may race to insert the
        // same plan, which is harmless.
        let plan = self.builder.build_plan(sql)?;

        let mut inner = self.inner.write();
        if !inner.entries.contains_key(sql) && inner.entries.len() >= inner.capacity {
            let victim = inner
                .entries
                .iter()
                .min_by_key(|(_, (_, count))| *count)
                .map(|(sql, _)| sql.clone());
            if let Some(victim) = victim {
                debug!(sql = %victim, "plan cache full, evicting least-used entry");
                inner.entries.remove(&victim);
            }
        }
        inner.entries.insert(sql.to_string(), (plan.clone(), 1));
        Ok(plan)
    }

    pub fn stats(&self) -> PlanCacheStats {
        let inner = self.inner.read();
        let total = inner.hits + inner.misses;
        PlanCacheStats {
            entries: inner.entries.len(),
            capacity: inner.capacity,
            hits: inner.hits,
            misses: inner.misses,
            hit_rate_pct: if total == 0 {
                0.0
            } else {
                inner.hits as f64 * 100.0 / total as f64
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PlanKind, PlanValue};
    use crate::vschema::VSchema;
    use osprey_common::error::RouterError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn vschema() -> VSchema {
        VSchema::from_json(
            r#"{"keyspaces": {"TestUnsharded": {"tables": {"main1": {}}}}}"#,
        )
        .unwrap()
    }

    struct CountingBuilder {
        vschema: VSchema,
        builds: AtomicUsize,
    }

    impl PlanBuilder for CountingBuilder {
        fn build_plan(&self, sql: &str) -> RouterResult<Arc<Plan>> {
            if sql.contains("syntax error") {
                return Err(RouterError::Plan(format!("cannot plan: {sql}")));
            }
            self.builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Plan {
                kind: PlanKind::SelectUnsharded,
                table: self.vschema.table("main1").unwrap().clone(),
                col_vindex: None,
                rewritten: sql.to_string(),
                subquery: None,
                values: Vec::<PlanValue>::new(),
            }))
        }
    }

    fn planner(capacity: usize) -> (Planner, Arc<CountingBuilder>) {
        let builder = Arc::new(CountingBuilder {
            vschema: vschema(),
            builds: AtomicUsize::new(0),
        });
        (Planner::new(builder.clone(), capacity), builder)
    }

    #[test]
    fn test_identical_sql_builds_once() {
        let (planner, builder) = planner(10);
        let a = planner.get_plan("select 1 from main1").unwrap();
        let b = planner.get_plan("select 1 from main1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(builder.builds.load(Ordering::SeqCst), 1);

        let stats = planner.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_capacity_evicts_least_used() {
        let (planner, _) = planner(2);
        planner.get_plan("q1").unwrap();
        planner.get_plan("q1").unwrap(); // q1 used twice
        planner.get_plan("q2").unwrap();
        planner.get_plan("q3").unwrap(); // evicts q2

        let stats = planner.stats();
        assert_eq!(stats.entries, 2);
        // q1 survived: fetching it again is a hit without a rebuild.
        let before = planner.stats().hits;
        planner.get_plan("q1").unwrap();
        assert_eq!(planner.stats().hits, before + 1);
    }

    #[test]
    fn test_build_failure_is_not_cached() {
        let (planner, _) = planner(10);
        assert!(planner.get_plan("syntax error 1").is_err());
        assert_eq!(planner.stats().entries, 0);
    }
}

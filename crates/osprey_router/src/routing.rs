use std::collections::{BTreeMap, HashMap};

use osprey_common::datum::Datum;
use osprey_common::query::{BindValue, BindVars};

use crate::plan::LIST_VAR_NAME;

/// Shard name → the input keys routed there. Ordered so fan-out and logs
/// are deterministic.
#[derive(Debug, Default)]
pub struct RoutingMap {
    entries: BTreeMap<String, Vec<Datum>>,
}

impl RoutingMap {
    pub fn add(&mut self, shard: &str, key: Datum) {
        self.entries.entry(shard.to_string()).or_default().push(key);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shards(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Datum>)> {
        self.entries.iter()
    }

    /// Per-shard bind maps for the IN arm: each shard gets a copy of the
    /// base bind vars plus its own key slice under `::__vals`.
    pub fn shard_bind_vars(&self, base: &BindVars) -> HashMap<String, BindVars> {
        self.entries
            .iter()
            .map(|(shard, keys)| {
                let mut bind_vars = base.clone();
                bind_vars.insert(LIST_VAR_NAME.to_string(), BindValue::List(keys.clone()));
                (shard.clone(), bind_vars)
            })
            .collect()
    }
}

use std::collections::HashMap;

use async_trait::async_trait;

use osprey_common::cancel::CancelToken;
use osprey_common::error::TopoError;
use osprey_common::query::TabletType;

use crate::key_range::KeyRange;
use crate::shard::{shards_for_key_range_exact, uniform_partition, ShardRef};

/// The serving-topology adapter the router consults per statement.
///
/// The returned keyspace name may differ from the requested one when the
/// keyspace is being rerouted (resharding); callers must use the returned
/// name downstream.
#[async_trait]
pub trait SrvTopo: Send + Sync {
    async fn get_keyspace_shards(
        &self,
        ctx: &CancelToken,
        cell: &str,
        keyspace: &str,
        tablet_type: TabletType,
    ) -> Result<(String, Vec<ShardRef>), TopoError>;
}

/// Resolve a key range to the shard names exactly covering it.
pub async fn map_exact_shards(
    topo: &dyn SrvTopo,
    ctx: &CancelToken,
    cell: &str,
    keyspace: &str,
    tablet_type: TabletType,
    range: &KeyRange,
) -> Result<(String, Vec<String>), TopoError> {
    let (effective, all_shards) = topo
        .get_keyspace_shards(ctx, cell, keyspace, tablet_type)
        .await?;
    let covered = shards_for_key_range_exact(&all_shards, range)?;
    let names = covered.into_iter().map(|s| s.name.clone()).collect();
    Ok((effective, names))
}

/// In-memory topology for tests and single-cell deployments: a fixed shard
/// partition per keyspace plus optional keyspace redirects (the resharding
/// "effective keyspace" mechanism).
#[derive(Debug, Default)]
pub struct StaticSrvTopo {
    keyspaces: HashMap<String, Vec<ShardRef>>,
    redirects: HashMap<String, String>,
}

impl StaticSrvTopo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyspace(mut self, name: impl Into<String>, shards: Vec<ShardRef>) -> Self {
        self.keyspaces.insert(name.into(), shards);
        self
    }

    /// A keyspace with `shard_count` uniform shards.
    pub fn with_uniform_keyspace(self, name: impl Into<String>, shard_count: usize) -> Self {
        self.with_keyspace(name, uniform_partition(shard_count))
    }

    /// An unsharded keyspace: a single shard named "0" covering everything.
    pub fn with_unsharded_keyspace(self, name: impl Into<String>) -> Self {
        self.with_keyspace(name, vec![ShardRef::new("0", KeyRange::full())])
    }

    /// Requests for `from` serve `to`'s shards and report `to` as the
    /// effective keyspace.
    pub fn with_redirect(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.redirects.insert(from.into(), to.into());
        self
    }
}

#[async_trait]
impl SrvTopo for StaticSrvTopo {
    async fn get_keyspace_shards(
        &self,
        _ctx: &CancelToken,
        _cell: &str,
        keyspace: &str,
        _tablet_type: TabletType,
    ) -> Result<(String, Vec<ShardRef>), TopoError> {
        let effective = match self.redirects.get(keyspace) {
            Some(target) => {
                tracing::debug!(from = keyspace, to = %target, "keyspace redirected");
                target.as_str()
            }
            None => keyspace,
        };
        let shards = self
            .keyspaces
            .get(effective)
            .ok_or_else(|| TopoError::KeyspaceNotFound(keyspace.to_string()))?;
        if shards.is_empty() {
            return Err(TopoError::NoShards(effective.to_string()));
        }
        Ok((effective.to_string(), shards.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyspace_id::KeyspaceId;

    fn topo() -> StaticSrvTopo {
        StaticSrvTopo::new()
            .with_uniform_keyspace("TestRouter", 4)
            .with_unsharded_keyspace("TestUnsharded")
            .with_redirect("TestRouterOld", "TestRouter")
    }

    #[tokio::test]
    async fn test_lookup_and_redirect() {
        let t = topo();
        let ctx = CancelToken::never();
        let (ks, shards) = t
            .get_keyspace_shards(&ctx, "zone1", "TestRouter", TabletType::Master)
            .await
            .unwrap();
        assert_eq!(ks, "TestRouter");
        assert_eq!(shards.len(), 4);

        let (ks, _) = t
            .get_keyspace_shards(&ctx, "zone1", "TestRouterOld", TabletType::Master)
            .await
            .unwrap();
        assert_eq!(ks, "TestRouter", "redirect reports the effective keyspace");
    }

    #[tokio::test]
    async fn test_unknown_keyspace() {
        let t = topo();
        let err = t
            .get_keyspace_shards(
                &CancelToken::never(),
                "zone1",
                "NoSuch",
                TabletType::Master,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TopoError::KeyspaceNotFound(_)));
    }

    #[tokio::test]
    async fn test_map_exact_shards_single() {
        let t = topo();
        let range = KeyRange::new(
            KeyspaceId::from_hex("40").unwrap(),
            KeyspaceId::from_hex("80").unwrap(),
        );
        let (ks, names) = map_exact_shards(
            &t,
            &CancelToken::never(),
            "zone1",
            "TestRouter",
            TabletType::Master,
            &range,
        )
        .await
        .unwrap();
        assert_eq!(ks, "TestRouter");
        assert_eq!(names, vec!["40-80"]);
    }

    #[tokio::test]
    async fn test_unsharded_has_one_full_shard() {
        let t = topo();
        let (_, shards) = t
            .get_keyspace_shards(
                &CancelToken::never(),
                "zone1",
                "TestUnsharded",
                TabletType::Replica,
            )
            .await
            .unwrap();
        assert_eq!(shards.len(), 1);
        assert_eq!(shards[0].name, "0");
        assert!(shards[0].key_range.contains(&KeyspaceId::from_u64(42)));
    }
}

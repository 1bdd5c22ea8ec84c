//! Topology model for the osprey router: keyspace ids, half-open key
//! ranges, ordered shard partitions, and the `SrvTopo` adapter that answers
//! "what shards does this keyspace have, right now, for this tablet type?".

pub mod key_range;
pub mod keyspace_id;
pub mod shard;
pub mod srv;

pub use key_range::KeyRange;
pub use keyspace_id::KeyspaceId;
pub use shard::{shard_for_keyspace_id, shards_for_key_range_exact, uniform_partition, ShardRef};
pub use srv::{map_exact_shards, SrvTopo, StaticSrvTopo};

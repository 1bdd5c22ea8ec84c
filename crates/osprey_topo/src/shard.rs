use serde::{Deserialize, Serialize};

use osprey_common::error::TopoError;

use crate::key_range::KeyRange;
use crate::keyspace_id::KeyspaceId;

/// One shard of a keyspace: a name and the key range it owns. The shard set
/// for a keyspace is an ordered, gapless, disjoint partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardRef {
    pub name: String,
    pub key_range: KeyRange,
}

impl ShardRef {
    pub fn new(name: impl Into<String>, key_range: KeyRange) -> Self {
        ShardRef {
            name: name.into(),
            key_range,
        }
    }
}

/// Locate the shard owning `ksid` by ordered binary search over the
/// partition's range starts.
pub fn shard_for_keyspace_id<'a>(
    shards: &'a [ShardRef],
    ksid: &KeyspaceId,
) -> Result<&'a str, TopoError> {
    let idx = shards.partition_point(|s| s.key_range.start <= *ksid);
    if idx > 0 && shards[idx - 1].key_range.contains(ksid) {
        return Ok(&shards[idx - 1].name);
    }
    Err(TopoError::NoShardForKeyspaceId {
        keyspace_id: ksid.to_hex(),
    })
}

/// The shards whose union is exactly `range`. Boundaries must align with
/// the partition; a partial overlap is an error.
pub fn shards_for_key_range_exact<'a>(
    shards: &'a [ShardRef],
    range: &KeyRange,
) -> Result<Vec<&'a ShardRef>, TopoError> {
    let mismatch = || TopoError::KeyRangeMismatch {
        range: range.to_string(),
    };
    let start = shards
        .iter()
        .position(|s| s.key_range.start == range.start)
        .ok_or_else(mismatch)?;
    let mut covered = Vec::new();
    for shard in &shards[start..] {
        covered.push(shard);
        if shard.key_range.ends_at(&range.end) {
            return Ok(covered);
        }
        if shard.key_range.end.is_min() {
            // Ran off the top of the partition without hitting range.end.
            break;
        }
    }
    Err(mismatch())
}

/// Split the keyspace-id space into `shard_count` uniform ranges. Shard
/// names are the hex range boundaries ("-40", "40-80", ..., "c0-").
pub fn uniform_partition(shard_count: usize) -> Vec<ShardRef> {
    assert!(shard_count > 0, "shard_count must be positive");
    let size = u64::MAX / shard_count as u64;
    (0..shard_count)
        .map(|i| {
            let start = if i == 0 {
                KeyspaceId::MIN
            } else {
                KeyspaceId::from_u64_trimmed(i as u64 * (size + 1))
            };
            let end = if i == shard_count - 1 {
                KeyspaceId::MIN
            } else {
                KeyspaceId::from_u64_trimmed((i as u64 + 1) * (size + 1))
            };
            let range = KeyRange::new(start, end);
            ShardRef::new(range.to_string(), range)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_partition_names() {
        let shards = uniform_partition(4);
        let names: Vec<_> = shards.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["-40", "40-80", "80-c0", "c0-"]);
    }

    #[test]
    fn test_partition_is_gapless() {
        let shards = uniform_partition(4);
        for pair in shards.windows(2) {
            assert_eq!(pair[0].key_range.end, pair[1].key_range.start);
        }
        assert!(shards.first().unwrap().key_range.start.is_min());
        assert!(shards.last().unwrap().key_range.end.is_min());
    }

    #[test]
    fn test_shard_for_keyspace_id() {
        let shards = uniform_partition(4);
        let cases = [
            (0u64, "-40"),
            (0x3fff_ffff_ffff_ffff, "-40"),
            (0x4000_0000_0000_0000, "40-80"),
            (0x8000_0000_0000_0001, "80-c0"),
            (u64::MAX, "c0-"),
        ];
        for (v, want) in cases {
            let got = shard_for_keyspace_id(&shards, &KeyspaceId::from_u64(v)).unwrap();
            assert_eq!(got, want, "ksid {v:#x}");
        }
    }

    #[test]
    fn test_shard_lookup_soundness() {
        // The chosen shard's range always contains the id.
        let shards = uniform_partition(7);
        for v in [0u64, 1, 99, 1 << 40, u64::MAX / 2, u64::MAX - 1, u64::MAX] {
            let ksid = KeyspaceId::from_u64(v);
            let name = shard_for_keyspace_id(&shards, &ksid).unwrap();
            let shard = shards.iter().find(|s| s.name == name).unwrap();
            assert!(shard.key_range.contains(&ksid));
        }
    }

    #[test]
    fn test_exact_cover_single_shard() {
        let shards = uniform_partition(4);
        let range = shards[1].key_range.clone();
        let covered = shards_for_key_range_exact(&shards, &range).unwrap();
        assert_eq!(covered.len(), 1);
        assert_eq!(covered[0].name, "40-80");
    }

    #[test]
    fn test_exact_cover_spanning() {
        let shards = uniform_partition(4);
        let range = KeyRange::new(
            shards[1].key_range.start.clone(),
            shards[2].key_range.end.clone(),
        );
        let covered = shards_for_key_range_exact(&shards, &range).unwrap();
        let names: Vec<_> = covered.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["40-80", "80-c0"]);
    }

    #[test]
    fn test_exact_cover_full_keyspace() {
        let shards = uniform_partition(4);
        let covered = shards_for_key_range_exact(&shards, &KeyRange::full()).unwrap();
        assert_eq!(covered.len(), 4);
    }

    #[test]
    fn test_misaligned_range_rejected() {
        let shards = uniform_partition(4);
        let range = KeyRange::new(
            KeyspaceId::from_hex("45").unwrap(),
            KeyspaceId::from_hex("80").unwrap(),
        );
        assert!(matches!(
            shards_for_key_range_exact(&shards, &range),
            Err(TopoError::KeyRangeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_keyspace_id_without_cover() {
        // A truncated partition (no tail shard) can't place a high id.
        let mut shards = uniform_partition(4);
        shards.pop();
        assert!(matches!(
            shard_for_keyspace_id(&shards, &KeyspaceId::from_u64(u64::MAX)),
            Err(TopoError::NoShardForKeyspaceId { .. })
        ));
    }
}

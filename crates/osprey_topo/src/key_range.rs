use std::fmt;

use serde::{Deserialize, Serialize};

use crate::keyspace_id::KeyspaceId;

/// A half-open keyspace-id range `[start, end)`. An empty `end` means
/// "unbounded above", so the full keyspace is `["", "")`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: KeyspaceId,
    pub end: KeyspaceId,
}

impl KeyRange {
    pub fn new(start: KeyspaceId, end: KeyspaceId) -> Self {
        KeyRange { start, end }
    }

    /// The full keyspace.
    pub fn full() -> Self {
        KeyRange::default()
    }

    pub fn contains(&self, ksid: &KeyspaceId) -> bool {
        *ksid >= self.start && (self.end.is_min() || *ksid < self.end)
    }

    /// Whether the two ends are the same boundary, treating empty as +∞.
    pub fn ends_at(&self, end: &KeyspaceId) -> bool {
        self.end == *end
    }

    pub fn intersects(&self, other: &KeyRange) -> bool {
        let self_below = !self.end.is_min() && self.end <= other.start;
        let other_below = !other.end.is_min() && other.end <= self.start;
        !(self_below || other_below)
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.to_hex(), self.end.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kr(start: u64, end: u64) -> KeyRange {
        KeyRange::new(
            KeyspaceId::from_u64_trimmed(start),
            KeyspaceId::from_u64_trimmed(end),
        )
    }

    #[test]
    fn test_contains_half_open() {
        let r = kr(0x40 << 56, 0x80 << 56);
        assert!(r.contains(&KeyspaceId::from_u64(0x40 << 56)));
        assert!(r.contains(&KeyspaceId::from_u64(0x7fff_ffff_ffff_ffff)));
        assert!(!r.contains(&KeyspaceId::from_u64(0x80 << 56)));
        assert!(!r.contains(&KeyspaceId::from_u64(0x3fff_ffff_ffff_ffff)));
    }

    #[test]
    fn test_unbounded_end() {
        let r = KeyRange::new(KeyspaceId::from_u64_trimmed(0xc0 << 56), KeyspaceId::MIN);
        assert!(r.contains(&KeyspaceId::from_u64(u64::MAX)));
        assert!(!r.contains(&KeyspaceId::from_u64(0x40 << 56)));
    }

    #[test]
    fn test_full_range_contains_min() {
        assert!(KeyRange::full().contains(&KeyspaceId::MIN));
        assert!(KeyRange::full().contains(&KeyspaceId::from_u64(u64::MAX)));
    }

    #[test]
    fn test_intersects() {
        assert!(kr(0, 0x80 << 56).intersects(&kr(0x40 << 56, 0xc0 << 56)));
        assert!(!kr(0, 0x40 << 56).intersects(&kr(0x40 << 56, 0x80 << 56)));
        let tail = KeyRange::new(KeyspaceId::from_u64_trimmed(0xc0 << 56), KeyspaceId::MIN);
        assert!(tail.intersects(&KeyRange::full()));
    }

    #[test]
    fn test_display() {
        assert_eq!(kr(0x40 << 56, 0x80 << 56).to_string(), "40-80");
        assert_eq!(KeyRange::full().to_string(), "-");
    }
}

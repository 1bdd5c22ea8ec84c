use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque, ordered byte string locating a row within a keyspace's shard
/// partition. The empty id (`KeyspaceId::MIN`) is the unroutable sentinel:
/// a no-op on read/update/delete, an error on insert.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct KeyspaceId(Vec<u8>);

impl KeyspaceId {
    pub const MIN: KeyspaceId = KeyspaceId(Vec::new());

    pub fn new(bytes: Vec<u8>) -> Self {
        KeyspaceId(bytes)
    }

    /// Big-endian 8-byte id, trailing zero bytes kept. This is the image
    /// format of the numeric vindexes.
    pub fn from_u64(v: u64) -> Self {
        KeyspaceId(v.to_be_bytes().to_vec())
    }

    /// Range-boundary constructor: big-endian with trailing zero bytes
    /// trimmed, so `0x4000...` prints as `40` and prefix ordering holds.
    pub fn from_u64_trimmed(v: u64) -> Self {
        let mut bytes = v.to_be_bytes().to_vec();
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        KeyspaceId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_min(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_u64(&self) -> Option<u64> {
        let bytes: [u8; 8] = self.0.as_slice().try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }

    /// Canonical text form: lowercase hex. This is what the routing comment
    /// and every log line carry, so it must stay stable.
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(self.0.len() * 2);
        for b in &self.0 {
            s.push_str(&format!("{b:02x}"));
        }
        s
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() % 2 != 0 {
            return None;
        }
        let mut bytes = Vec::with_capacity(s.len() / 2);
        for i in (0..s.len()).step_by(2) {
            bytes.push(u8::from_str_radix(s.get(i..i + 2)?, 16).ok()?);
        }
        Some(KeyspaceId(bytes))
    }
}

impl fmt::Display for KeyspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<&[u8]> for KeyspaceId {
    fn from(bytes: &[u8]) -> Self {
        KeyspaceId(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_is_empty_and_sorts_first() {
        assert!(KeyspaceId::MIN.is_min());
        assert!(KeyspaceId::MIN < KeyspaceId::from_u64(0));
    }

    #[test]
    fn test_hex_round_trip() {
        let id = KeyspaceId::from_u64(0x166b_40b4_4aba_4bd6);
        assert_eq!(id.to_hex(), "166b40b44aba4bd6");
        assert_eq!(KeyspaceId::from_hex("166b40b44aba4bd6"), Some(id));
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert_eq!(KeyspaceId::from_hex("4"), None);
        assert_eq!(KeyspaceId::from_hex("zz"), None);
    }

    #[test]
    fn test_trimmed_boundary_prefix_order() {
        let boundary = KeyspaceId::from_u64_trimmed(0x4000_0000_0000_0000);
        assert_eq!(boundary.to_hex(), "40");
        // Full-width ids on either side of the boundary order correctly.
        assert!(KeyspaceId::from_u64(0x3fff_ffff_ffff_ffff) < boundary);
        assert!(KeyspaceId::from_u64(0x4000_0000_0000_0000) >= boundary);
        assert!(KeyspaceId::from_u64(0x4000_0000_0000_0001) > boundary);
    }

    #[test]
    fn test_to_u64_requires_eight_bytes() {
        assert_eq!(KeyspaceId::from_u64(7).to_u64(), Some(7));
        assert_eq!(KeyspaceId::from_u64_trimmed(0x40 << 56).to_u64(), None);
    }
}

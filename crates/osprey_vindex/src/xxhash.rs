use async_trait::async_trait;
use xxhash_rust::xxh3::xxh3_64;

use osprey_common::datum::Datum;
use osprey_common::error::VindexError;
use osprey_topo::KeyspaceId;

use crate::cursor::VCursor;
use crate::vindex::{Cardinality, KeyspaceIdSet, Vindex, VindexCap};

/// One-way hash vindex over arbitrary scalar values. xxh3-64 of a
/// type-tagged byte encoding, so text and numeric values never collide by
/// representation. Not reversible.
#[derive(Debug, Clone, Copy, Default)]
pub struct XxhashVindex;

// Type tag + value bytes; text gets a terminator to avoid prefix collisions.
fn encode_for_hash(buf: &mut Vec<u8>, datum: &Datum) -> Result<(), VindexError> {
    match datum {
        Datum::Int64(v) => {
            buf.push(0x01);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        Datum::Uint64(v) => {
            buf.push(0x01);
            buf.extend_from_slice(&(*v as i64).to_le_bytes());
        }
        Datum::Float64(v) => {
            buf.push(0x02);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        Datum::Text(s) => {
            buf.push(0x03);
            buf.extend_from_slice(s.as_bytes());
            buf.push(0x00);
        }
        Datum::Bytea(b) => {
            buf.push(0x03);
            buf.extend_from_slice(b);
            buf.push(0x00);
        }
        Datum::Null => {
            return Err(VindexError::BadValue {
                vindex: "xxhash".to_string(),
                message: "cannot hash NULL".to_string(),
            })
        }
    }
    Ok(())
}

impl XxhashVindex {
    fn image(&self, value: &Datum) -> Result<KeyspaceId, VindexError> {
        let mut buf = Vec::with_capacity(16);
        encode_for_hash(&mut buf, value)?;
        Ok(KeyspaceId::from_u64(xxh3_64(&buf)))
    }
}

#[async_trait]
impl Vindex for XxhashVindex {
    fn type_name(&self) -> &'static str {
        "xxhash"
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::Unique
    }

    fn capabilities(&self) -> &[VindexCap] {
        &[VindexCap::Map, VindexCap::Verify]
    }

    async fn map(
        &self,
        _cursor: &dyn VCursor,
        keys: &[Datum],
    ) -> Result<Vec<KeyspaceIdSet>, VindexError> {
        keys.iter().map(|k| Ok(vec![self.image(k)?])).collect()
    }

    async fn verify(
        &self,
        _cursor: &dyn VCursor,
        value: &Datum,
        ksid: &KeyspaceId,
    ) -> Result<bool, VindexError> {
        Ok(self.image(value)? == *ksid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osprey_common::error::RouterError;
    use osprey_common::query::{BindVars, QueryResult};

    struct NullCursor;

    #[async_trait]
    impl VCursor for NullCursor {
        async fn execute(
            &self,
            _sql: &str,
            _bind_vars: &BindVars,
        ) -> Result<QueryResult, RouterError> {
            Ok(QueryResult::default())
        }
    }

    #[tokio::test]
    async fn test_text_and_bytes_share_an_image() {
        let v = XxhashVindex;
        let a = v.map(&NullCursor, &[Datum::Text("alice".into())]).await.unwrap();
        let b = v
            .map(&NullCursor, &[Datum::Bytea(b"alice".to_vec())])
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_int_widths_share_an_image() {
        let v = XxhashVindex;
        let a = v.map(&NullCursor, &[Datum::Int64(9)]).await.unwrap();
        let b = v.map(&NullCursor, &[Datum::Uint64(9)]).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_reverse_map_unsupported() {
        let v = XxhashVindex;
        assert!(!v.supports(VindexCap::ReverseMap));
        let err = v
            .reverse_map(&NullCursor, &KeyspaceId::from_u64(1))
            .await
            .unwrap_err();
        assert!(matches!(err, VindexError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_null_rejected() {
        let v = XxhashVindex;
        let err = v.map(&NullCursor, &[Datum::Null]).await.unwrap_err();
        assert!(matches!(err, VindexError::BadValue { .. }));
    }
}

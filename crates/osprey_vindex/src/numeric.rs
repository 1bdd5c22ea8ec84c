use async_trait::async_trait;

use osprey_common::datum::Datum;
use osprey_common::error::VindexError;
use osprey_topo::KeyspaceId;

use crate::cursor::VCursor;
use crate::vindex::{Cardinality, KeyspaceIdSet, Vindex, VindexCap};

/// Identity vindex: the big-endian bytes of the numeric value are the
/// keyspace id. Useful when the application already controls placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericVindex;

impl NumericVindex {
    fn image(&self, value: &Datum) -> Result<KeyspaceId, VindexError> {
        let v = value.as_i64().ok_or_else(|| VindexError::BadValue {
            vindex: "numeric".to_string(),
            message: format!("expected a number, got {value:?}"),
        })?;
        Ok(KeyspaceId::from_u64(v as u64))
    }
}

#[async_trait]
impl Vindex for NumericVindex {
    fn type_name(&self) -> &'static str {
        "numeric"
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::Unique
    }

    fn capabilities(&self) -> &[VindexCap] {
        &[VindexCap::Map, VindexCap::ReverseMap, VindexCap::Verify]
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

    async fn reverse_map(
        &self,
        _cursor: &dyn VCursor,
        ksid: &KeyspaceId,
    ) -> Result<Option<Datum>, VindexError> {
        let raw = ksid.to_u64().ok_or_else(|| VindexError::BadValue {
            vindex: "numeric".to_string(),
            message: format!("keyspace id {ksid} is not 8 bytes"),
        })?;
        Ok(Some(Datum::Int64(raw as i64)))
    }
}

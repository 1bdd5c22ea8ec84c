use async_trait::async_trait;

use osprey_common::datum::Datum;
use osprey_common::error::VindexError;
use osprey_topo::KeyspaceId;

use crate::cursor::VCursor;

/// How many keyspace ids a single value may map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Unique,
    NonUnique,
}

/// The operations a vindex may support. `Map` is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VindexCap {
    Map,
    ReverseMap,
    Verify,
    Create,
    Delete,
    Generate,
}

/// The keyspace-id images of one input value. Unique vindexes produce
/// exactly one element (possibly `KeyspaceId::MIN` for "unroutable");
/// non-unique vindexes produce zero or more.
pub type KeyspaceIdSet = Vec<KeyspaceId>;

/// A named mapping between a column value and one or more keyspace ids.
///
/// Operations a vindex does not declare in `capabilities()` keep their
/// default bodies, which fail with a descriptive `Unsupported` error; the
/// router checks `supports()` first so the error names the missing
/// capability at the call site that needed it.
#[async_trait]
pub trait Vindex: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn cardinality(&self) -> Cardinality;

    fn capabilities(&self) -> &[VindexCap];

    fn supports(&self, cap: VindexCap) -> bool {
        self.capabilities().contains(&cap)
    }

    fn unsupported(&self, capability: &'static str) -> VindexError {
        VindexError::Unsupported {
            vindex: self.type_name().to_string(),
            capability,
        }
    }

    /// Map each key to its keyspace-id images. The output length equals the
    /// input length.
    async fn map(
        &self,
        cursor: &dyn VCursor,
        keys: &[Datum],
    ) -> Result<Vec<KeyspaceIdSet>, VindexError>;

    /// Whether `value` is consistent with `ksid`.
    async fn verify(
        &self,
        _cursor: &dyn VCursor,
        _value: &Datum,
        _ksid: &KeyspaceId,
    ) -> Result<bool, VindexError> {
        Err(self.unsupported("Verify"))
    }

    /// Compute the value whose image is `ksid`, if the mapping is
    /// invertible. `Ok(None)` means no value exists.
    async fn reverse_map(
        &self,
        _cursor: &dyn VCursor,
        _ksid: &KeyspaceId,
    ) -> Result<Option<Datum>, VindexError> {
        Err(self.unsupported("ReverseMap"))
    }

    /// Record `value` in the backing table. Lookup vindexes bind the entry
    /// to `ksid`; functional vindexes receive `None`.
    async fn create(
        &self,
        _cursor: &dyn VCursor,
        _value: &Datum,
        _ksid: Option<&KeyspaceId>,
    ) -> Result<(), VindexError> {
        Err(self.unsupported("Create"))
    }

    /// Remove the entries for `values` from the backing table.
    async fn delete(
        &self,
        _cursor: &dyn VCursor,
        _values: &[Datum],
        _ksid: &KeyspaceId,
    ) -> Result<(), VindexError> {
        Err(self.unsupported("Delete"))
    }

    /// Allocate a fresh value. Lookup generators bind it to `ksid`;
    /// functional generators receive `None`.
    async fn generate(
        &self,
        _cursor: &dyn VCursor,
        _ksid: Option<&KeyspaceId>,
    ) -> Result<i64, VindexError> {
        Err(self.unsupported("Generate"))
    }
}

impl std::fmt::Debug for dyn Vindex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vindex")
            .field("type_name", &self.type_name())
            .finish()
    }
}

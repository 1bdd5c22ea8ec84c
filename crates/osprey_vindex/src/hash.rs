use async_trait::async_trait;

use osprey_common::datum::Datum;
use osprey_common::error::VindexError;
use osprey_common::query::{BindValue, BindVars};
use osprey_topo::KeyspaceId;

use crate::cursor::VCursor;
use crate::mix::{mix, unmix};
use crate::vindex::{Cardinality, KeyspaceIdSet, Vindex, VindexCap};

const BASE_CAPS: &[VindexCap] = &[VindexCap::Map, VindexCap::ReverseMap, VindexCap::Verify];
const OWNED_CAPS: &[VindexCap] = &[
    VindexCap::Map,
    VindexCap::ReverseMap,
    VindexCap::Verify,
    VindexCap::Create,
    VindexCap::Delete,
    VindexCap::Generate,
];

/// The workhorse unique vindex: a bijective mix of the numeric column value
/// is the keyspace id, so `Map` needs no backing table and `ReverseMap` is
/// exact.
///
/// When configured with an autoincrement backing table, the vindex also
/// supports `Create`/`Delete`/`Generate` and can own its column: `Generate`
/// inserts a NULL row and adopts the backend's insert id.
#[derive(Debug, Clone)]
pub struct HashVindex {
    table: Option<HashTable>,
}

#[derive(Debug, Clone)]
struct HashTable {
    table: String,
    column: String,
}

impl HashVindex {
    pub fn new() -> Self {
        HashVindex { table: None }
    }

    pub fn with_table(table: impl Into<String>, column: impl Into<String>) -> Self {
        HashVindex {
            table: Some(HashTable {
                table: table.into(),
                column: column.into(),
            }),
        }
    }

    fn backing(&self, capability: &'static str) -> Result<&HashTable, VindexError> {
        self.table.as_ref().ok_or_else(|| self.unsupported(capability))
    }

    fn number(&self, value: &Datum) -> Result<u64, VindexError> {
        value
            .as_i64()
            .map(|v| v as u64)
            .ok_or_else(|| VindexError::BadValue {
                vindex: self.type_name().to_string(),
                message: format!("expected a number, got {value:?}"),
            })
    }

    fn image(&self, value: &Datum) -> Result<KeyspaceId, VindexError> {
        Ok(KeyspaceId::from_u64(mix(self.number(value)?)))
    }
}

impl Default for HashVindex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Vindex for HashVindex {
    fn type_name(&self) -> &'static str {
        "hash"
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::Unique
    }

    fn capabilities(&self) -> &[VindexCap] {
        if self.table.is_some() {
            OWNED_CAPS
        } else {
            BASE_CAPS
        }
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
            vindex: "hash".to_string(),
            message: format!("keyspace id {ksid} is not 8 bytes"),
        })?;
        Ok(Some(Datum::Int64(unmix(raw) as i64)))
    }

    async fn create(
        &self,
        cursor: &dyn VCursor,
        value: &Datum,
        _ksid: Option<&KeyspaceId>,
    ) -> Result<(), VindexError> {
        let t = self.backing("Create")?;
        let sql = format!("insert into {}({}) values(:{})", t.table, t.column, t.column);
        let mut bind_vars = BindVars::new();
        bind_vars.insert(t.column.clone(), BindValue::Value(value.clone()));
        cursor.execute(&sql, &bind_vars).await?;
        Ok(())
    }

    async fn delete(
        &self,
        cursor: &dyn VCursor,
        values: &[Datum],
        _ksid: &KeyspaceId,
    ) -> Result<(), VindexError> {
        let t = self.backing("Delete")?;
        let sql = format!("delete from {} where {} in ::{}", t.table, t.column, t.column);
        let mut bind_vars = BindVars::new();
        bind_vars.insert(t.column.clone(), BindValue::List(values.to_vec()));
        cursor.execute(&sql, &bind_vars).await?;
        Ok(())
    }

    async fn generate(
        &self,
        cursor: &dyn VCursor,
        _ksid: Option<&KeyspaceId>,
    ) -> Result<i64, VindexError> {
        let t = self.backing("Generate")?;
        let sql = format!("insert into {}({}) values(null)", t.table, t.column);
        let result = cursor.execute(&sql, &BindVars::new()).await?;
        if result.insert_id == 0 {
            return Err(VindexError::NoGeneratedId {
                vindex: self.type_name().to_string(),
            });
        }
        Ok(result.insert_id as i64)
    }
}

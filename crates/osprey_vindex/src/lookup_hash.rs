use async_trait::async_trait;
use tracing::debug;

use osprey_common::datum::Datum;
use osprey_common::error::VindexError;
use osprey_common::query::{BindValue, BindVars};
use osprey_topo::KeyspaceId;

use crate::cursor::VCursor;
use crate::mix::{mix, unmix};
use crate::vindex::{Cardinality, KeyspaceIdSet, Vindex, VindexCap};

/// Lookup-table-backed vindex: the table maps `from_column` values to the
/// numbers whose mixed image is the keyspace id. The owning base table
/// keeps it consistent through `Create`/`Delete`; `Generate` allocates a
/// fresh from-value via the backing table's autoincrement.
///
/// `lookup_hash_unique` expects at most one row per value and maps a
/// missing value to the unroutable sentinel; `lookup_hash_multi` returns
/// every row's image.
#[derive(Debug, Clone)]
pub struct LookupHashVindex {
    unique: bool,
    table: String,
    from_column: String,
    to_column: String,
}

impl LookupHashVindex {
    pub fn unique(
        table: impl Into<String>,
        from_column: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        LookupHashVindex {
            unique: true,
            table: table.into(),
            from_column: from_column.into(),
            to_column: to_column.into(),
        }
    }

    pub fn non_unique(
        table: impl Into<String>,
        from_column: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        LookupHashVindex {
            unique: false,
            table: table.into(),
            from_column: from_column.into(),
            to_column: to_column.into(),
        }
    }

    /// The stored to-value whose image is `ksid`.
    fn to_value(&self, ksid: &KeyspaceId) -> Result<i64, VindexError> {
        let raw = ksid.to_u64().ok_or_else(|| VindexError::BadValue {
            vindex: self.type_name().to_string(),
            message: format!("keyspace id {ksid} is not 8 bytes"),
        })?;
        Ok(unmix(raw) as i64)
    }

    async fn lookup(
        &self,
        cursor: &dyn VCursor,
        key: &Datum,
    ) -> Result<Vec<KeyspaceId>, VindexError> {
        let sql = format!(
            "select {} from {} where {} = :{}",
            self.to_column, self.table, self.from_column, self.from_column
        );
        let mut bind_vars = BindVars::new();
        bind_vars.insert(self.from_column.clone(), BindValue::Value(key.clone()));
        let result = cursor.execute(&sql, &bind_vars).await?;
        let mut images = Vec::with_capacity(result.rows.len());
        for row in &result.rows {
            let to = row.first().and_then(|d| d.as_i64()).ok_or_else(|| {
                VindexError::BadValue {
                    vindex: self.type_name().to_string(),
                    message: format!("non-numeric {} for {key}", self.to_column),
                }
            })?;
            images.push(KeyspaceId::from_u64(mix(to as u64)));
        }
        Ok(images)
    }
}

#[async_trait]
impl Vindex for LookupHashVindex {
    fn type_name(&self) -> &'static str {
        if self.unique {
            "lookup_hash_unique"
        } else {
            "lookup_hash_multi"
        }
    }

    fn cardinality(&self) -> Cardinality {
        if self.unique {
            Cardinality::Unique
        } else {
            Cardinality::NonUnique
        }
    }

    fn capabilities(&self) -> &[VindexCap] {
        &[
            VindexCap::Map,
            VindexCap::Verify,
            VindexCap::Create,
            VindexCap::Delete,
            VindexCap::Generate,
        ]
    }

    async fn map(
        &self,
        cursor: &dyn VCursor,
        keys: &[Datum],
    ) -> Result<Vec<KeyspaceIdSet>, VindexError> {
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let images = self.lookup(cursor, key).await?;
            if self.unique {
                match images.len() {
                    0 => out.push(vec![KeyspaceId::MIN]),
                    1 => out.push(images),
                    _ => {
                        return Err(VindexError::DuplicateLookup {
                            vindex: self.type_name().to_string(),
                            value: key.to_string(),
                        })
                    }
                }
            } else {
                out.push(images);
            }
        }
        Ok(out)
    }

    async fn verify(
        &self,
        cursor: &dyn VCursor,
        value: &Datum,
        ksid: &KeyspaceId,
    ) -> Result<bool, VindexError> {
        let sql = format!(
            "select {} from {} where {} = :{} and {} = :{}",
            self.from_column,
            self.table,
            self.from_column,
            self.from_column,
            self.to_column,
            self.to_column
        );
        let mut bind_vars = BindVars::new();
        bind_vars.insert(self.from_column.clone(), BindValue::Value(value.clone()));
        bind_vars.insert(
            self.to_column.clone(),
            BindValue::Value(Datum::Int64(self.to_value(ksid)?)),
        );
        let result = cursor.execute(&sql, &bind_vars).await?;
        Ok(!result.rows.is_empty())
    }

    async fn create(
        &self,
        cursor: &dyn VCursor,
        value: &Datum,
        ksid: Option<&KeyspaceId>,
    ) -> Result<(), VindexError> {
        let ksid = ksid.ok_or_else(|| self.unsupported("Create without a keyspace id"))?;
        let sql = format!(
            "insert into {}({}, {}) values(:{}, :{})",
            self.table, self.from_column, self.to_column, self.from_column, self.to_column
        );
        let mut bind_vars = BindVars::new();
        bind_vars.insert(self.from_column.clone(), BindValue::Value(value.clone()));
        bind_vars.insert(
            self.to_column.clone(),
            BindValue::Value(Datum::Int64(self.to_value(ksid)?)),
        );
        cursor.execute(&sql, &bind_vars).await?;
        Ok(())
    }

    async fn delete(
        &self,
        cursor: &dyn VCursor,
        values: &[Datum],
        ksid: &KeyspaceId,
    ) -> Result<(), VindexError> {
        let sql = format!(
            "delete from {} where {} in ::{} and {} = :{}",
            self.table, self.from_column, self.from_column, self.to_column, self.to_column
        );
        let mut bind_vars = BindVars::new();
        bind_vars.insert(self.from_column.clone(), BindValue::List(values.to_vec()));
        bind_vars.insert(
            self.to_column.clone(),
            BindValue::Value(Datum::Int64(self.to_value(ksid)?)),
        );
        debug!(
            vindex = self.type_name(),
            table = %self.table,
            entries = values.len(),
            "deleting owned vindex entries"
        );
        cursor.execute(&sql, &bind_vars).await?;
        Ok(())
    }

    async fn generate(
        &self,
        cursor: &dyn VCursor,
        ksid: Option<&KeyspaceId>,
    ) -> Result<i64, VindexError> {
        let ksid = ksid.ok_or_else(|| self.unsupported("Generate without a keyspace id"))?;
        let sql = format!(
            "insert into {}({}, {}) values(null, :{})",
            self.table, self.from_column, self.to_column, self.to_column
        );
        let mut bind_vars = BindVars::new();
        bind_vars.insert(
            self.to_column.clone(),
            BindValue::Value(Datum::Int64(self.to_value(ksid)?)),
        );
        let result = cursor.execute(&sql, &bind_vars).await?;
        if result.insert_id == 0 {
            return Err(VindexError::NoGeneratedId {
                vindex: self.type_name().to_string(),
            });
        }
        Ok(result.insert_id as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osprey_common::error::RouterError;
    use osprey_common::query::{Field, QueryResult};
    use std::sync::Mutex;

    struct FakeCursor {
        log: Mutex<Vec<(String, BindVars)>>,
        results: Mutex<Vec<QueryResult>>,
    }

    impl FakeCursor {
        fn new(results: Vec<QueryResult>) -> Self {
            FakeCursor {
                log: Mutex::new(Vec::new()),
                results: Mutex::new(results),
            }
        }

        fn executed(&self) -> Vec<(String, BindVars)> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VCursor for FakeCursor {
        async fn execute(
            &self,
            sql: &str,
            bind_vars: &BindVars,
        ) -> Result<QueryResult, RouterError> {
            self.log
                .lock()
                .unwrap()
                .push((sql.to_string(), bind_vars.clone()));
            let mut results = self.results.lock().unwrap();
            if results.is_empty() {
                Ok(QueryResult::default())
            } else {
                Ok(results.remove(0))
            }
        }
    }

    fn rows_of(to_values: &[i64]) -> QueryResult {
        QueryResult {
            fields: vec![Field::new("user_id")],
            rows: to_values.iter().map(|v| vec![Datum::Int64(*v)]).collect(),
            ..Default::default()
        }
    }

    fn music_map() -> LookupHashVindex {
        LookupHashVindex::unique("music_user_map", "music_id", "user_id")
    }

    fn name_map() -> LookupHashVindex {
        LookupHashVindex::non_unique("name_user_map", "name", "user_id")
    }

    #[tokio::test]
    async fn test_unique_map_hits_backing_table() {
        let v = music_map();
        let cursor = FakeCursor::new(vec![rows_of(&[42])]);
        let images = v.map(&cursor, &[Datum::Int64(7)]).await.unwrap();
        assert_eq!(images, vec![vec![KeyspaceId::from_u64(mix(42))]]);
        let log = cursor.executed();
        assert_eq!(
            log[0].0,
            "select user_id from music_user_map where music_id = :music_id"
        );
        assert_eq!(log[0].1["music_id"], BindValue::Value(Datum::Int64(7)));
    }

    #[tokio::test]
    async fn test_unique_map_missing_row_is_unroutable() {
        let v = music_map();
        let cursor = FakeCursor::new(vec![rows_of(&[])]);
        let images = v.map(&cursor, &[Datum::Int64(7)]).await.unwrap();
        assert_eq!(images, vec![vec![KeyspaceId::MIN]]);
    }

    #[tokio::test]
    async fn test_unique_map_duplicate_rows_error() {
        let v = music_map();
        let cursor = FakeCursor::new(vec![rows_of(&[1, 2])]);
        let err = v.map(&cursor, &[Datum::Int64(7)]).await.unwrap_err();
        assert!(matches!(err, VindexError::DuplicateLookup { .. }));
    }

    #[tokio::test]
    async fn test_multi_map_fans_out() {
        let v = name_map();
        let cursor = FakeCursor::new(vec![rows_of(&[1, 2]), rows_of(&[3])]);
        let images = v
            .map(
                &cursor,
                &[Datum::Text("alice".into()), Datum::Text("bob".into())],
            )
            .await
            .unwrap();
        assert_eq!(images[0].len(), 2);
        assert_eq!(images[1].len(), 1);
        assert_eq!(images[1][0], KeyspaceId::from_u64(mix(3)));
    }

    #[tokio::test]
    async fn test_create_binds_unmixed_to_value() {
        let v = music_map();
        let cursor = FakeCursor::new(vec![]);
        let ksid = KeyspaceId::from_u64(mix(42));
        v.create(&cursor, &Datum::Int64(7), Some(&ksid)).await.unwrap();
        let log = cursor.executed();
        assert_eq!(
            log[0].0,
            "insert into music_user_map(music_id, user_id) values(:music_id, :user_id)"
        );
        assert_eq!(log[0].1["user_id"], BindValue::Value(Datum::Int64(42)));
    }

    #[tokio::test]
    async fn test_create_requires_keyspace_id() {
        let v = music_map();
        let cursor = FakeCursor::new(vec![]);
        let err = v.create(&cursor, &Datum::Int64(7), None).await.unwrap_err();
        assert!(matches!(err, VindexError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_delete_scopes_by_to_value() {
        let v = name_map();
        let cursor = FakeCursor::new(vec![]);
        let ksid = KeyspaceId::from_u64(mix(42));
        v.delete(
            &cursor,
            &[Datum::Text("alice".into()), Datum::Text("bob".into())],
            &ksid,
        )
        .await
        .unwrap();
        let log = cursor.executed();
        assert_eq!(
            log[0].0,
            "delete from name_user_map where name in ::name and user_id = :user_id"
        );
        assert_eq!(
            log[0].1["name"],
            BindValue::List(vec![Datum::Text("alice".into()), Datum::Text("bob".into())])
        );
        assert_eq!(log[0].1["user_id"], BindValue::Value(Datum::Int64(42)));
    }

    #[tokio::test]
    async fn test_generate_inserts_null_from_value() {
        let v = music_map();
        let cursor = FakeCursor::new(vec![QueryResult {
            insert_id: 4,
            ..Default::default()
        }]);
        let ksid = KeyspaceId::from_u64(mix(42));
        let generated = v.generate(&cursor, Some(&ksid)).await.unwrap();
        assert_eq!(generated, 4);
        let log = cursor.executed();
        assert_eq!(
            log[0].0,
            "insert into music_user_map(music_id, user_id) values(null, :user_id)"
        );
        assert_eq!(log[0].1["user_id"], BindValue::Value(Datum::Int64(42)));
    }

    #[tokio::test]
    async fn test_verify_checks_pairing() {
        let v = music_map();
        let cursor = FakeCursor::new(vec![rows_of(&[7])]);
        let ksid = KeyspaceId::from_u64(mix(42));
        assert!(v.verify(&cursor, &Datum::Int64(7), &ksid).await.unwrap());
        let log = cursor.executed();
        assert_eq!(
            log[0].0,
            "select music_id from music_user_map where music_id = :music_id and user_id = :user_id"
        );

        let cursor = FakeCursor::new(vec![rows_of(&[])]);
        assert!(!v.verify(&cursor, &Datum::Int64(7), &ksid).await.unwrap());
    }

    #[tokio::test]
    async fn test_callback_errors_pass_through() {
        struct FailingCursor;

        #[async_trait]
        impl VCursor for FailingCursor {
            async fn execute(
                &self,
                _sql: &str,
                _bind_vars: &BindVars,
            ) -> Result<QueryResult, RouterError> {
                Err(RouterError::Scatter("shard down".into()))
            }
        }

        let v = music_map();
        let err = v.map(&FailingCursor, &[Datum::Int64(7)]).await.unwrap_err();
        assert!(matches!(err, VindexError::Callback(_)));
        assert!(err.to_string().contains("shard down"));
    }
}

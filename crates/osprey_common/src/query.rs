use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::datum::Datum;

/// Which class of tablet a statement should land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TabletType {
    #[default]
    Master,
    Replica,
    Rdonly,
}

/// A bind variable value: a scalar, or a list (IN clauses and per-shard
/// list bundles).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindValue {
    Value(Datum),
    List(Vec<Datum>),
}

impl From<Datum> for BindValue {
    fn from(d: Datum) -> Self {
        BindValue::Value(d)
    }
}

impl From<Vec<Datum>> for BindValue {
    fn from(l: Vec<Datum>) -> Self {
        BindValue::List(l)
    }
}

pub type BindVars = HashMap<String, BindValue>;

/// The inbound statement: SQL text, bind variables, tablet selector.
/// The session handle rides next to it, owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub sql: String,
    /// A missing bind-var map is just an empty one.
    pub bind_variables: BindVars,
    pub tablet_type: TabletType,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Query {
            sql: sql.into(),
            ..Default::default()
        }
    }

    pub fn with_bind_vars(mut self, bind_variables: BindVars) -> Self {
        self.bind_variables = bind_variables;
        self
    }

    pub fn with_tablet_type(mut self, tablet_type: TabletType) -> Self {
        self.tablet_type = tablet_type;
        self
    }
}

/// One result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Field { name: name.into() }
    }
}

/// The outbound result. `insert_id` may be rewritten by the router when an
/// owned vindex generated the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub fields: Vec<Field>,
    pub rows: Vec<Vec<Datum>>,
    pub rows_affected: u64,
    pub insert_id: u64,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.rows_affected == 0 && self.insert_id == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder_defaults() {
        let q = Query::new("select 1");
        assert_eq!(q.sql, "select 1");
        assert!(q.bind_variables.is_empty());
        assert_eq!(q.tablet_type, TabletType::Master);
    }

    #[test]
    fn test_bind_value_from_impls() {
        let v: BindValue = Datum::Int64(1).into();
        assert_eq!(v, BindValue::Value(Datum::Int64(1)));
        let l: BindValue = vec![Datum::Int64(1), Datum::Int64(2)].into();
        assert!(matches!(l, BindValue::List(ref xs) if xs.len() == 2));
    }

    #[test]
    fn test_empty_result() {
        assert!(QueryResult::default().is_empty());
        let r = QueryResult {
            rows_affected: 1,
            ..Default::default()
        };
        assert!(!r.is_empty());
    }

    #[test]
    fn test_tablet_type_serde_names() {
        let t: TabletType = serde_json::from_str("\"replica\"").unwrap();
        assert_eq!(t, TabletType::Replica);
    }
}

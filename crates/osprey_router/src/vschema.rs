//! The vschema: which keyspaces exist, which vindexes they declare, and how
//! table columns bind to those vindexes.
//!
//! Loaded from JSON. A table's first ColVindex is the primary: it routes
//! the row and must be unique-cardinality. The rest are secondaries kept
//! consistent with the primary's keyspace id. A ColVindex is *owned* when
//! the declaring vindex names this table as its owner; owned vindexes are
//! maintained by the router during DML and therefore must support `Create`
//! and `Delete`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use osprey_common::error::{RouterError, RouterResult};
use osprey_vindex::registry::{create_vindex, VindexParams};
use osprey_vindex::vindex::{Cardinality, Vindex, VindexCap};

// ---------------------------------------------------------------------------
// Raw serde form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VSchemaConfig {
    pub keyspaces: HashMap<String, KeyspaceConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyspaceConfig {
    #[serde(default)]
    pub sharded: bool,
    #[serde(default)]
    pub vindexes: HashMap<String, VindexConfig>,
    #[serde(default)]
    pub tables: HashMap<String, TableConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VindexConfig {
    #[serde(rename = "type")]
    pub vindex_type: String,
    #[serde(default)]
    pub params: VindexParams,
    /// The table whose DML maintains this vindex's backing table.
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub col_vindexes: Vec<ColVindexConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColVindexConfig {
    pub column: String,
    /// Vindex instance name within the keyspace.
    pub name: String,
}

// ---------------------------------------------------------------------------
// Built form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    pub name: String,
    pub sharded: bool,
}

/// A table column bound to a vindex instance.
pub struct ColVindex {
    pub column: String,
    pub name: String,
    pub owned: bool,
    pub vindex: Arc<dyn Vindex>,
}

impl std::fmt::Debug for ColVindex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColVindex")
            .field("column", &self.column)
            .field("name", &self.name)
            .field("owned", &self.owned)
            .field("vindex", &self.vindex.type_name())
            .finish()
    }
}

pub struct Table {
    pub name: String,
    pub keyspace: Arc<Keyspace>,
    /// Ordered; index 0 is the primary ColVindex.
    pub col_vindexes: Vec<Arc<ColVindex>>,
    /// The owned subset, in ColVindex order. Drives the deletion protocol.
    pub owned: Vec<Arc<ColVindex>>,
}

impl Table {
    pub fn primary(&self) -> Option<&Arc<ColVindex>> {
        self.col_vindexes.first()
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("keyspace", &self.keyspace.name)
            .field("col_vindexes", &self.col_vindexes)
            .finish()
    }
}

/// All keyspaces' tables, indexed by unqualified table name.
#[derive(Debug, Default)]
pub struct VSchema {
    tables: HashMap<String, Arc<Table>>,
}

impl VSchema {
    pub fn from_json(json: &str) -> RouterResult<VSchema> {
        let config: VSchemaConfig =
            serde_json::from_str(json).map_err(|e| RouterError::Schema(e.to_string()))?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &VSchemaConfig) -> RouterResult<VSchema> {
        let mut tables = HashMap::new();
        for (ks_name, ks_config) in &config.keyspaces {
            let keyspace = Arc::new(Keyspace {
                name: ks_name.clone(),
                sharded: ks_config.sharded,
            });

            let mut vindexes: HashMap<&str, (Arc<dyn Vindex>, Option<&str>)> = HashMap::new();
            for (name, vc) in &ks_config.vindexes {
                let vindex = create_vindex(&vc.vindex_type, &vc.params)?;
                vindexes.insert(name, (vindex, vc.owner.as_deref()));
            }

            for (table_name, tc) in &ks_config.tables {
                let mut col_vindexes = Vec::with_capacity(tc.col_vindexes.len());
                for cvc in &tc.col_vindexes {
                    let (vindex, owner) = vindexes.get(cvc.name.as_str()).ok_or_else(|| {
                        RouterError::Schema(format!(
                            "table {table_name} references unknown vindex {}",
                            cvc.name
                        ))
                    })?;
                    let owned = *owner == Some(table_name.as_str());
                    if owned
                        && !(vindex.supports(VindexCap::Create)
                            && vindex.supports(VindexCap::Delete))
                    {
                        return Err(RouterError::Schema(format!(
                            "vindex {} is owned by {table_name} but cannot create/delete entries",
                            cvc.name
                        )));
                    }
                    col_vindexes.push(Arc::new(ColVindex {
                        column: cvc.column.clone(),
                        name: cvc.name.clone(),
                        owned,
                        vindex: vindex.clone(),
                    }));
                }
                if let Some(primary) = col_vindexes.first() {
                    if primary.vindex.cardinality() != Cardinality::Unique {
                        return Err(RouterError::Schema(format!(
                            "table {table_name}: primary vindex {} must be unique",
                            primary.name
                        )));
                    }
                }
                let owned = col_vindexes
                    .iter()
                    .filter(|cv| cv.owned)
                    .cloned()
                    .collect();
                let table = Arc::new(Table {
                    name: table_name.clone(),
                    keyspace: keyspace.clone(),
                    col_vindexes,
                    owned,
                });
                if tables.insert(table_name.clone(), table).is_some() {
                    return Err(RouterError::Schema(format!(
                        "table {table_name} defined in more than one keyspace"
                    )));
                }
            }
        }
        Ok(VSchema { tables })
    }

    pub fn table(&self, name: &str) -> RouterResult<&Arc<Table>> {
        self.tables
            .get(name)
            .ok_or_else(|| RouterError::Schema(format!("unknown table {name}")))
    }
}

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use osprey_common::datum::Datum;

use crate::vschema::{ColVindex, Table};

/// Bind-var name under which each shard receives its slice of IN values.
/// The planner rewrites the IN clause to expand `::__vals`.
pub const LIST_VAR_NAME: &str = "__vals";

/// The executor arm a plan selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanKind {
    SelectUnsharded,
    SelectEqual,
    SelectIn,
    SelectKeyrange,
    SelectScatter,
    UpdateUnsharded,
    UpdateEqual,
    DeleteUnsharded,
    DeleteEqual,
    InsertUnsharded,
    InsertSharded,
}

/// One item of a plan's values list: a literal, a bind-var reference, or
/// NULL ("unsupplied", which triggers the generate/reverse-map paths on
/// insert).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanValue {
    Null,
    Literal(Datum),
    BindRef(String),
}

impl PlanValue {
    pub fn bind_ref(name: impl Into<String>) -> PlanValue {
        PlanValue::BindRef(name.into())
    }
}

impl From<Datum> for PlanValue {
    fn from(d: Datum) -> Self {
        PlanValue::Literal(d)
    }
}

/// A plan as delivered by the planner. The router never mutates one; plans
/// are shared out of the cache.
pub struct Plan {
    pub kind: PlanKind,
    pub table: Arc<Table>,
    /// The routing ColVindex for the Equal/In/Keyrange arms.
    pub col_vindex: Option<Arc<ColVindex>>,
    /// SQL template to execute on the selected shards.
    pub rewritten: String,
    /// For DeleteEqual on tables with owned vindexes: reads the owned
    /// columns of the doomed rows so their index entries can be removed.
    pub subquery: Option<String>,
    /// One item per routing key (Equal: one; In: many; Keyrange: the two
    /// endpoints; InsertSharded: one per ColVindex).
    pub values: Vec<PlanValue>,
}

impl std::fmt::Debug for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plan")
            .field("kind", &self.kind)
            .field("table", &self.table.name)
            .field("rewritten", &self.rewritten)
            .field("values", &self.values)
            .finish()
    }
}

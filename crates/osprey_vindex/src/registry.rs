use std::collections::HashMap;
use std::sync::Arc;

use osprey_common::error::VindexError;

use crate::hash::HashVindex;
use crate::lookup_hash::LookupHashVindex;
use crate::numeric::NumericVindex;
use crate::vindex::Vindex;
use crate::xxhash::XxhashVindex;

/// Free-form `params` map from the vschema, interpreted per vindex type.
pub type VindexParams = HashMap<String, String>;

fn required<'a>(
    vindex_type: &str,
    params: &'a VindexParams,
    param: &'static str,
) -> Result<&'a str, VindexError> {
    params
        .get(param)
        .map(String::as_str)
        .ok_or(VindexError::MissingParam {
            vindex: vindex_type.to_string(),
            param,
        })
}

/// Construct a vindex from its vschema `(type, params)` declaration.
///
/// - `hash`: optional `table` + `column` enable the owned lifecycle
///   (Create/Delete/Generate against an autoincrement backing table).
/// - `numeric`, `xxhash`: no params.
/// - `lookup_hash_unique` / `lookup_hash_multi`: require `table`, `from`,
///   `to`.
pub fn create_vindex(
    vindex_type: &str,
    params: &VindexParams,
) -> Result<Arc<dyn Vindex>, VindexError> {
    match vindex_type {
        "hash" => match (params.get("table"), params.get("column")) {
            (Some(table), Some(column)) => Ok(Arc::new(HashVindex::with_table(table, column))),
            (None, None) => Ok(Arc::new(HashVindex::new())),
            (Some(_), None) => Err(VindexError::MissingParam {
                vindex: vindex_type.to_string(),
                param: "column",
            }),
            (None, Some(_)) => Err(VindexError::MissingParam {
                vindex: vindex_type.to_string(),
                param: "table",
            }),
        },
        "numeric" => Ok(Arc::new(NumericVindex)),
        "xxhash" => Ok(Arc::new(XxhashVindex)),
        "lookup_hash_unique" => Ok(Arc::new(LookupHashVindex::unique(
            required(vindex_type, params, "table")?,
            required(vindex_type, params, "from")?,
            required(vindex_type, params, "to")?,
        ))),
        "lookup_hash_multi" => Ok(Arc::new(LookupHashVindex::non_unique(
            required(vindex_type, params, "table")?,
            required(vindex_type, params, "from")?,
            required(vindex_type, params, "to")?,
        ))),
        other => Err(VindexError::UnknownType(other.to_string())),
    }
}

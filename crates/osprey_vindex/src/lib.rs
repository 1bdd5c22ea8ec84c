//! Vindexes: named mappings from column values to keyspace ids.
//!
//! Every vindex declares a capability set (`Map` is always present;
//! `ReverseMap`, `Verify`, `Create`, `Delete`, `Generate` are optional) and
//! a cardinality (`Unique` or `NonUnique`). The router dispatches on
//! capabilities, so a mismatch is a descriptive error instead of a panic.
//!
//! Table-backed vindexes issue their own routed SQL through the `VCursor`
//! callback the router hands them.

pub mod cursor;
pub mod hash;
pub mod lookup_hash;
pub mod mix;
pub mod numeric;
pub mod registry;
pub mod vindex;
pub mod xxhash;

pub use cursor::VCursor;
pub use hash::HashVindex;
pub use lookup_hash::LookupHashVindex;
pub use numeric::NumericVindex;
pub use registry::{create_vindex, VindexParams};
pub use vindex::{Cardinality, KeyspaceIdSet, Vindex, VindexCap};
pub use xxhash::XxhashVindex;

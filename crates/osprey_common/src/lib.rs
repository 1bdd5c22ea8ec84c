//! Shared building blocks for the osprey query router: scalar values,
//! query/result shapes, cancellation, configuration, and the error taxonomy
//! every other crate converts into.

pub mod cancel;
pub mod config;
pub mod datum;
pub mod error;
pub mod query;

pub use cancel::{CancelSource, CancelToken};
pub use config::RouterConfig;
pub use datum::Datum;
pub use error::{ErrorKind, RouterError, RouterResult, TopoError, VindexError};
pub use query::{BindValue, BindVars, Field, Query, QueryResult, TabletType};

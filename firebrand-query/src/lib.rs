//! Query builder for Firebrand.
//!
//! A [`Query`] describes a select, update or delete over an entity type or
//! a raw column family, a reference to a named query, or native text.
//! [`Query::compile`] maps properties to storage columns, encodes values
//! with the column codecs and renders the native statement.
//!
//! ```ignore
//! let query = Query::select("FirstEntity")
//!     .filter(Predicate::between("phone", 10_i64, 20_i64))
//!     .limit(5);
//! let text = Query::from(query).compile(&registry)?;
//! ```

mod compile;
mod error;
mod predicate;
mod query;

pub use error::{CompileResult, QueryError};
pub use predicate::{Comparison, Predicate};
pub use query::{Assign, Delete, Named, Query, Select, Selection, Target, Update};

//! Identifier grammars, the error taxonomy and the domain records.
//!
//! Everything here is pure and allocation-light; no XML parser, lock or
//! encoding crate is needed to use it.

mod access_key;
mod collaborator;
mod dps_id;
mod error;
mod query;
mod tax_id;
mod types;

pub use access_key::*;
pub use collaborator::*;
pub use dps_id::*;
pub use error::*;
pub use query::*;
pub use tax_id::*;
pub use types::*;

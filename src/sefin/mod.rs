//! Normalization of SEFIN (Ambiente Nacional) error codes.
//!
//! The backend speaks two vocabularies: banded `Qnnn` codes and a handful
//! of legacy `Ennn` codes. A [`CodeRegistry`] holds both, seeded with the
//! built-in entries and extensible at runtime; a [`Translator`] resolves
//! any (code, message) pair against it into a [`QueryError`](crate::core::QueryError)
//! whose retryability drives the caller's retry policy.
//!
//! ```
//! use std::sync::Arc;
//! use nfse_nacional::sefin::{CodeRegistry, Translator};
//! use nfse_nacional::QueryErrorCode;
//!
//! let translator = Translator::new(Arc::new(CodeRegistry::with_builtin()));
//! let err = translator.to_query_error(" q101 ", "Timeout na consulta");
//! assert_eq!(err.code, QueryErrorCode::GovernmentTimeout);
//! assert!(err.retryable);
//! ```

mod codes;
mod registry;
mod translate;

pub use codes::*;
pub use registry::*;
pub use translate::*;

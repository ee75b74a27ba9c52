use std::sync::Arc;

use tracing::warn;

use super::codes::{Generation, GovernmentQueryCode, QueryCategory};
use super::registry::{CodeRegistry, normalize_code};
use crate::core::{QueryError, QueryErrorCode};

const FALLBACK_ACTION: &str =
    "Contact support with the error code and original message for assistance";

/// Converts government (code, message) pairs into the internal taxonomy.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct Translator {
    registry: Arc<CodeRegistry>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(Arc::new(CodeRegistry::with_builtin()))
    }
}

impl Translator {
    pub fn new(registry: Arc<CodeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CodeRegistry {
        &self.registry
    }

    /// Registered entry for a code, if any.
    pub fn lookup(&self, government_code: &str) -> Option<GovernmentQueryCode> {
        self.registry.get(government_code)
    }

    /// Resolve a code to an entry, synthesizing one for unknown codes.
    ///
    /// The synthesized entry maps to [`QueryErrorCode::GovernmentUnavailable`],
    /// is not retryable, and keeps the original code and message verbatim.
    /// Its category comes from the code's numeric band when it has one.
    pub fn translate(&self, government_code: &str, message: &str) -> GovernmentQueryCode {
        if let Some(entry) = self.lookup(government_code) {
            return entry;
        }

        warn!(
            code = government_code,
            government_message = message,
            "unknown government error code, using fallback entry"
        );
        GovernmentQueryCode {
            code: government_code.to_string(),
            message: message.to_string(),
            description: format!("Unknown government query error code: {government_code}"),
            action: FALLBACK_ACTION.to_string(),
            category: QueryCategory::from_band(&normalize_code(government_code))
                .unwrap_or(QueryCategory::Unknown),
            retryable: false,
            mapped_code: QueryErrorCode::GovernmentUnavailable,
            generation: Generation::Current,
        }
    }

    /// Translate straight to a [`QueryError`] carrying the government code.
    pub fn to_query_error(&self, government_code: &str, message: &str) -> QueryError {
        let (code, text, detail, retryable) = match self.lookup(government_code) {
            Some(entry) => match entry.generation {
                Generation::Current => (
                    entry.mapped_code,
                    entry.description,
                    entry.action,
                    entry.retryable,
                ),
                Generation::Legacy => (
                    entry.mapped_code,
                    entry.message,
                    message.to_string(),
                    entry.retryable,
                ),
            },
            None => {
                warn!(
                    code = government_code,
                    government_message = message,
                    "unknown government error code, reporting as unavailable"
                );
                (
                    QueryErrorCode::GovernmentUnavailable,
                    format!("Unknown government error: {government_code}"),
                    message.to_string(),
                    false,
                )
            }
        };

        QueryError {
            code,
            message: text,
            detail: (!detail.is_empty()).then_some(detail),
            government_code: Some(government_code.to_string()),
            retryable,
        }
    }

    /// Whether a code is retryable. Unknown codes are not.
    pub fn is_retryable(&self, government_code: &str) -> bool {
        self.lookup(government_code).is_some_and(|e| e.retryable)
    }

    /// Category of a code: the registered one, else its band, else unknown.
    pub fn category(&self, government_code: &str) -> QueryCategory {
        match self.lookup(government_code) {
            Some(entry) => entry.category,
            None => QueryCategory::from_band(&normalize_code(government_code))
                .unwrap_or(QueryCategory::Unknown),
        }
    }
}

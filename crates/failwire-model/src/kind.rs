//! Failure kinds and their ancestry.
//!
//! A kind is a plain name. Every kind descends from the root kind
//! [`kinds::FAILURE`]; the ordered ancestor list of a kind (its *lineage*,
//! most-derived first) is computed once when the kind is registered, so
//! hierarchy matching during a request is a walk over a precomputed list.
//!
//! ```text
//! Failure
//! ├── InvalidArgument ─┬── ArgumentNull
//! │                    ├── ArgumentOutOfRange
//! │                    └── Validation
//! ├── Serialization
//! ├── Format
//! ├── NotImplemented
//! ├── NotSupported
//! ├── AuthenticationRequired
//! ├── AccessDenied
//! ├── ConcurrencyConflict
//! └── HttpError
//! ```

use std::collections::HashMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Names of the built-in kinds.
pub mod kinds {
    /// Root of every lineage.
    pub const FAILURE: &str = "Failure";
    /// Malformed argument supplied by the caller.
    pub const INVALID_ARGUMENT: &str = "InvalidArgument";
    /// A required argument was missing.
    pub const ARGUMENT_NULL: &str = "ArgumentNull";
    /// An argument fell outside its accepted range.
    pub const ARGUMENT_OUT_OF_RANGE: &str = "ArgumentOutOfRange";
    /// One or more field validation rules failed.
    pub const VALIDATION: &str = "Validation";
    /// The request body could not be deserialized.
    pub const SERIALIZATION: &str = "Serialization";
    /// A value had the wrong textual format.
    pub const FORMAT: &str = "Format";
    /// The operation exists but has no implementation.
    pub const NOT_IMPLEMENTED: &str = "NotImplemented";
    /// The operation is not supported.
    pub const NOT_SUPPORTED: &str = "NotSupported";
    /// The caller must authenticate first.
    pub const AUTHENTICATION_REQUIRED: &str = "AuthenticationRequired";
    /// The caller is authenticated but not allowed.
    pub const ACCESS_DENIED: &str = "AccessDenied";
    /// An optimistic concurrency check failed.
    pub const CONCURRENCY_CONFLICT: &str = "ConcurrencyConflict";
    /// A pre-resolved terminal response.
    pub const HTTP_ERROR: &str = "HttpError";
}

/// Built-in status category of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Malformed-argument family.
    MalformedArgument,
    /// Not implemented or not supported.
    NotSupported,
    /// Authentication required.
    AuthenticationRequired,
    /// Access denied.
    AccessDenied,
    /// Optimistic concurrency conflict.
    ConcurrencyConflict,
    /// Anything else.
    Fault,
}

impl FailureCategory {
    /// Status code used when neither the failure nor the override table
    /// decide.
    pub fn default_status(self) -> StatusCode {
        match self {
            Self::MalformedArgument => StatusCode::BAD_REQUEST,
            Self::NotSupported => StatusCode::METHOD_NOT_ALLOWED,
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::ConcurrencyConflict => StatusCode::CONFLICT,
            Self::Fault => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::MalformedArgument => "malformed-argument",
            Self::NotSupported => "not-supported",
            Self::AuthenticationRequired => "authentication-required",
            Self::AccessDenied => "access-denied",
            Self::ConcurrencyConflict => "concurrency-conflict",
            Self::Fault => "fault",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
struct KindEntry {
    /// The kind itself followed by every ancestor up to the root.
    lineage: Vec<String>,
    /// Category inherited from the nearest categorised ancestor.
    category: FailureCategory,
}

/// Registry of failure kinds with precomputed lineages.
///
/// Built once at startup and read-only afterwards. Kinds that were never
/// registered are treated as direct children of the root.
#[derive(Debug, Clone)]
pub struct KindHierarchy {
    entries: HashMap<String, KindEntry>,
}

impl Default for KindHierarchy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KindHierarchy {
    /// A hierarchy holding only the root kind.
    pub fn empty() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            kinds::FAILURE.to_string(),
            KindEntry {
                lineage: vec![kinds::FAILURE.to_string()],
                category: FailureCategory::Fault,
            },
        );
        Self { entries }
    }

    /// The hierarchy with every built-in kind registered.
    pub fn builtin() -> Self {
        use FailureCategory::*;

        let mut hierarchy = Self::empty();
        let builtins: [(&str, Option<&str>, Option<FailureCategory>); 12] = [
            (kinds::INVALID_ARGUMENT, None, Some(MalformedArgument)),
            (kinds::ARGUMENT_NULL, Some(kinds::INVALID_ARGUMENT), None),
            (kinds::ARGUMENT_OUT_OF_RANGE, Some(kinds::INVALID_ARGUMENT), None),
            (kinds::VALIDATION, Some(kinds::INVALID_ARGUMENT), None),
            (kinds::SERIALIZATION, None, Some(MalformedArgument)),
            (kinds::FORMAT, None, Some(MalformedArgument)),
            (kinds::NOT_IMPLEMENTED, None, Some(NotSupported)),
            (kinds::NOT_SUPPORTED, None, Some(NotSupported)),
            (kinds::AUTHENTICATION_REQUIRED, None, Some(AuthenticationRequired)),
            (kinds::ACCESS_DENIED, None, Some(AccessDenied)),
            (kinds::CONCURRENCY_CONFLICT, None, Some(ConcurrencyConflict)),
            (kinds::HTTP_ERROR, None, None),
        ];
        for (name, parent, category) in builtins {
            let registered = hierarchy.register(name, parent, category);
            debug_assert!(registered.is_ok(), "built-in kind '{}' rejected", name);
        }
        hierarchy
    }

    /// Registers a kind under `parent` (the root when `None`).
    ///
    /// `category` overrides the category inherited from the parent.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind already exists or the parent is unknown.
    pub fn register(
        &mut self,
        name: &str,
        parent: Option<&str>,
        category: Option<FailureCategory>,
    ) -> Result<()> {
        if self.entries.contains_key(name) {
            return Err(ModelError::DuplicateKind(name.to_string()));
        }

        let parent = parent.unwrap_or(kinds::FAILURE);
        let parent_entry = self
            .entries
            .get(parent)
            .ok_or_else(|| ModelError::UnknownParentKind {
                kind: name.to_string(),
                parent: parent.to_string(),
            })?;

        let mut lineage = Vec::with_capacity(parent_entry.lineage.len() + 1);
        lineage.push(name.to_string());
        lineage.extend(parent_entry.lineage.iter().cloned());

        let entry = KindEntry {
            lineage,
            category: category.unwrap_or(parent_entry.category),
        };
        self.entries.insert(name.to_string(), entry);
        Ok(())
    }

    /// Whether `kind` has been registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.entries.contains_key(kind)
    }

    /// The lineage of `kind`, most-derived first, ending at the root.
    pub fn lineage<'a>(&'a self, kind: &'a str) -> Vec<&'a str> {
        match self.entries.get(kind) {
            Some(entry) => entry.lineage.iter().map(String::as_str).collect(),
            None => vec![kind, kinds::FAILURE],
        }
    }

    /// Effective category of `kind`.
    pub fn category_of(&self, kind: &str) -> FailureCategory {
        self.entries
            .get(kind)
            .map(|entry| entry.category)
            .unwrap_or(FailureCategory::Fault)
    }

    /// Whether `kind` is `ancestor` or descends from it.
    pub fn is_kind_of(&self, kind: &str, ancestor: &str) -> bool {
        self.lineage(kind).contains(&ancestor)
    }

    /// Number of registered kinds, root included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the root is always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lineage() {
        let hierarchy = KindHierarchy::builtin();
        assert_eq!(
            hierarchy.lineage(kinds::ARGUMENT_NULL),
            vec![kinds::ARGUMENT_NULL, kinds::INVALID_ARGUMENT, kinds::FAILURE]
        );
    }

    #[test]
    fn test_every_builtin_registered() {
        let hierarchy = KindHierarchy::builtin();
        assert_eq!(hierarchy.len(), 13);
        assert!(hierarchy.contains(kinds::HTTP_ERROR));
    }

    #[test]
    fn test_builtin_parents_precede_children() {
        let hierarchy = KindHierarchy::builtin();
        for kind in [kinds::ARGUMENT_NULL, kinds::ARGUMENT_OUT_OF_RANGE, kinds::VALIDATION] {
            assert_eq!(hierarchy.lineage(kind).len(), 3, "{}", kind);
        }
        for kind in [kinds::SERIALIZATION, kinds::NOT_SUPPORTED, kinds::HTTP_ERROR] {
            assert_eq!(hierarchy.lineage(kind), vec![kind, kinds::FAILURE]);
        }
    }

    #[test]
    fn test_unregistered_kind_hangs_off_root() {
        let hierarchy = KindHierarchy::builtin();
        assert_eq!(hierarchy.lineage("Mystery"), vec!["Mystery", kinds::FAILURE]);
        assert_eq!(hierarchy.category_of("Mystery"), FailureCategory::Fault);
    }

    #[test]
    fn test_category_is_inherited() {
        let mut hierarchy = KindHierarchy::builtin();
        hierarchy
            .register("EmailMissing", Some(kinds::ARGUMENT_NULL), None)
            .unwrap();
        assert_eq!(
            hierarchy.category_of("EmailMissing"),
            FailureCategory::MalformedArgument
        );
        assert!(hierarchy.is_kind_of("EmailMissing", kinds::INVALID_ARGUMENT));
    }

    #[test]
    fn test_explicit_category_wins_over_parent() {
        let mut hierarchy = KindHierarchy::builtin();
        hierarchy
            .register("ReadOnlyField", Some(kinds::INVALID_ARGUMENT), Some(FailureCategory::AccessDenied))
            .unwrap();
        assert_eq!(hierarchy.category_of("ReadOnlyField"), FailureCategory::AccessDenied);
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let mut hierarchy = KindHierarchy::builtin();
        let err = hierarchy.register("Child", Some("Nope"), None).unwrap_err();
        assert!(matches!(err, ModelError::UnknownParentKind { .. }));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut hierarchy = KindHierarchy::builtin();
        let err = hierarchy.register(kinds::FORMAT, None, None).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateKind(_)));
    }

    #[test]
    fn test_default_status_table() {
        assert_eq!(FailureCategory::MalformedArgument.default_status(), StatusCode::BAD_REQUEST);
        assert_eq!(FailureCategory::NotSupported.default_status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(FailureCategory::AuthenticationRequired.default_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(FailureCategory::AccessDenied.default_status(), StatusCode::FORBIDDEN);
        assert_eq!(FailureCategory::ConcurrencyConflict.default_status(), StatusCode::CONFLICT);
        assert_eq!(FailureCategory::Fault.default_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

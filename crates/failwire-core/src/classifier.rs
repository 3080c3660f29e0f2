//! Status classification.
//!
//! Resolution order, first match wins:
//!
//! 1. the failure's self-reported status code;
//! 2. the override table, walking the failure's lineage most-derived first;
//! 3. the built-in category of the failure's kind.
//!
//! The last step always produces a value, so classification never fails.

use std::collections::HashMap;
use std::fmt;

use failwire_model::{Failure, FailureCategory, KindHierarchy};
use http::StatusCode;
use tracing::{debug, warn};

/// Kind name to status code mappings, in registration order.
///
/// Populated at startup. When a kind is registered twice the first
/// registration is kept.
#[derive(Debug, Clone, Default)]
pub struct StatusOverrideTable {
    order: Vec<String>,
    statuses: HashMap<String, StatusCode>,
}

impl StatusOverrideTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `kind` to `status`. Returns false if `kind` was already mapped,
    /// in which case the earlier mapping stays.
    pub fn insert(&mut self, kind: impl Into<String>, status: StatusCode) -> bool {
        let kind = kind.into();
        if let Some(existing) = self.statuses.get(&kind) {
            warn!(
                "Ignoring override {} for '{}': already mapped to {}",
                status, kind, existing
            );
            return false;
        }
        self.order.push(kind.clone());
        self.statuses.insert(kind, status);
        true
    }

    /// Status mapped to exactly `kind`.
    pub fn get(&self, kind: &str) -> Option<StatusCode> {
        self.statuses.get(kind).copied()
    }

    /// Mappings in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, StatusCode)> {
        self.order
            .iter()
            .map(move |kind| (kind.as_str(), self.statuses[kind]))
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Which rule decided a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSource {
    /// The failure reported its own code.
    SelfReported,
    /// An override matched this kind in the failure's lineage.
    Override {
        /// Kind the override is registered for.
        kind: String,
    },
    /// The built-in category table.
    Category(FailureCategory),
}

impl fmt::Display for StatusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfReported => write!(f, "self-reported"),
            Self::Override { kind } => write!(f, "override on '{}'", kind),
            Self::Category(category) => write!(f, "{} default", category),
        }
    }
}

/// A classified status together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The status code.
    pub status: StatusCode,
    /// The deciding rule.
    pub source: StatusSource,
}

/// Maps failures to status codes.
#[derive(Debug, Clone, Default)]
pub struct StatusClassifier {
    kinds: KindHierarchy,
    overrides: StatusOverrideTable,
}

impl StatusClassifier {
    /// Creates a classifier over a kind hierarchy and override table.
    pub fn new(kinds: KindHierarchy, overrides: StatusOverrideTable) -> Self {
        Self { kinds, overrides }
    }

    /// The kind hierarchy.
    pub fn kinds(&self) -> &KindHierarchy {
        &self.kinds
    }

    /// The override table.
    pub fn overrides(&self) -> &StatusOverrideTable {
        &self.overrides
    }

    /// Status code for `failure`.
    pub fn classify(&self, failure: &dyn Failure) -> StatusCode {
        self.explain(failure).status
    }

    /// Status code for `failure` and the rule that chose it.
    pub fn explain(&self, failure: &dyn Failure) -> Classification {
        if let Some(status) = failure.status_code() {
            debug!("Self-reported status {} for '{}'", status, failure.kind());
            return Classification {
                status,
                source: StatusSource::SelfReported,
            };
        }
        self.explain_kind(failure.kind())
    }

    /// Status code for a bare kind, ignoring self-reported codes.
    pub fn explain_kind(&self, kind: &str) -> Classification {
        for ancestor in self.kinds.lineage(kind) {
            if let Some(status) = self.overrides.get(ancestor) {
                debug!("Override on '{}' gives {} for '{}'", ancestor, status, kind);
                return Classification {
                    status,
                    source: StatusSource::Override {
                        kind: ancestor.to_string(),
                    },
                };
            }
        }

        let category = self.kinds.category_of(kind);
        Classification {
            status: category.default_status(),
            source: StatusSource::Category(category),
        }
    }
}

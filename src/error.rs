//! Error types for the schema engine.
//!
//! Every core failure is reported as a structured [`SchemaViolation`]
//! carrying a stable [`ViolationCode`]; the codes are normative, the detail
//! strings are not. Mutations collect violations into the manager's error
//! list and return `false` rather than raising, so [`SchemaError`] only
//! surfaces at the crate boundary: lookups, loaders and serialization.

use crate::model::SchemaObjectKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error codes for schema violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationCode {
    // Structural
    AlreadyExists,
    NoSuchEntity,
    DuplicateName,
    // Reference
    UnknownSuperior,
    UnknownSyntax,
    UnknownMatchingRule,
    UnknownObjectClass,
    UnknownAttributeType,
    StillReferenced,
    // Cycle
    InheritanceCycle,
    // Attribute type semantics
    NoSyntax,
    NoMatchingRule,
    UsageMismatch,
    CollectiveOperational,
    NoUserModUserApp,
    CollectiveSingleValued,
    // Object class semantics
    KindIncompatibility,
    MustMayOverlap,
    // Completeness
    MissingNormalizer,
    MissingComparator,
    MissingSyntaxChecker,
    // Schema level
    SchemaDependencyMissing,
    SchemaStillDepended,
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single schema violation.
///
/// Identifies the offending entity by OID and kind, optionally the OID it
/// referenced, and carries a human-readable detail. The kind is absent only
/// when the subject itself could not be identified (deleting an id no
/// registry knows).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaViolation {
    pub code: ViolationCode,
    pub subject_oid: String,
    pub subject_kind: Option<SchemaObjectKind>,
    pub referenced_oid: Option<String>,
    pub detail: String,
}

impl SchemaViolation {
    pub fn new(
        code: ViolationCode,
        subject_kind: SchemaObjectKind,
        subject_oid: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            code,
            subject_oid: subject_oid.into(),
            subject_kind: Some(subject_kind),
            referenced_oid: None,
            detail: detail.into(),
        }
    }

    /// A violation whose subject is not a registered entity: an unknown id,
    /// or a schema rather than a schema object.
    pub fn unknown_subject(
        code: ViolationCode,
        subject: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            code,
            subject_oid: subject.into(),
            subject_kind: None,
            referenced_oid: None,
            detail: detail.into(),
        }
    }

    /// Attach the dangling or conflicting OID the subject referenced.
    pub fn referencing(mut self, oid: impl Into<String>) -> Self {
        self.referenced_oid = Some(oid.into());
        self
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subject_kind {
            Some(kind) => write!(
                f,
                "{} on {} {}: {}",
                self.code, kind, self.subject_oid, self.detail
            ),
            None => write!(f, "{} on {}: {}", self.code, self.subject_oid, self.detail),
        }
    }
}

impl std::error::Error for SchemaViolation {}

/// Top-level error type for schema engine operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A structured schema violation.
    #[error("schema violation: {0}")]
    Violation(#[from] SchemaViolation),

    /// A lookup missed: no entity of the kind is registered under the id.
    #[error("no such {kind}: {id}")]
    NoSuchEntity { kind: SchemaObjectKind, id: String },

    /// A schema name is unknown to the configured loader.
    #[error("schema not found: {schema}")]
    SchemaNotFound { schema: String },

    /// The loader failed to produce a schema's descriptors.
    #[error("loader error for schema {schema}: {message}")]
    Loader { schema: String, message: String },

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors from filesystem-backed loaders.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// Create a lookup-miss error.
    pub fn no_such_entity(kind: SchemaObjectKind, id: impl Into<String>) -> Self {
        Self::NoSuchEntity {
            kind,
            id: id.into(),
        }
    }

    /// Create a schema-not-found error.
    pub fn schema_not_found(schema: impl Into<String>) -> Self {
        Self::SchemaNotFound {
            schema: schema.into(),
        }
    }

    /// Wrap a loader failure for the named schema.
    pub fn loader(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Loader {
            schema: schema.into(),
            message: message.into(),
        }
    }
}

// Result type aliases for convenience
pub type SchemaResult<T> = Result<T, SchemaError>;
pub type ViolationResult<T> = Result<T, SchemaViolation>;

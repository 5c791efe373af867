//! In-memory LDAP schema engine.
//!
//! The authority a directory server consults for every attribute type,
//! object class, matching rule and syntax defined by RFC 4512. The engine
//! keeps the schema entities in typed registries, enforces the consistency
//! rules between them, and validates every mutation transactionally: a
//! rejected change leaves the registries untouched and produces a
//! structured violation list.
//!
//! # Core Components
//!
//! - [`SchemaManager`] - loading, mutations, validation and lookup
//! - [`Registries`] - the typed registry set with reference tracking
//! - [`SchemaLoader`] - pluggable source of schema descriptors
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ldap_schema_engine::{EmbeddedLoader, SchemaManager};
//!
//! # async fn example() {
//! let manager = SchemaManager::new(EmbeddedLoader::new());
//! assert!(manager.load_with_deps("system").await);
//! let cn = manager.lookup_attribute_type("cn").unwrap();
//! assert_eq!(cn.oid, "2.5.4.3");
//! # }
//! ```

pub mod error;
pub mod factory;
pub mod manager;
pub mod model;
pub mod registries;
pub mod resolver;
pub mod schema;
pub mod validation;

// Re-export commonly used types for convenience
pub use error::{SchemaError, SchemaResult, SchemaViolation, ViolationCode};
pub use manager::{SchemaListener, SchemaManager, DEFAULT_SCHEMA_NAME};
pub use model::{
    AnySchemaObject, AttributeType, Comparator, DitContentRule, DitStructureRule, LdapSyntax,
    MatchingRule, MatchingRuleUse, NameForm, Normalizer, ObjectClass, ObjectClassKind,
    SchemaObject, SchemaObjectKind, SyntaxChecker, Usage,
};
pub use registries::Registries;
pub use schema::{EmbeddedLoader, JsonDirectoryLoader, Schema, SchemaContent, SchemaLoader};

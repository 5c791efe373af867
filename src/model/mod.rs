//! Core schema entity definitions for the LDAP schema engine.
//!
//! This module contains the data structures describing the eleven RFC 4512
//! schema entity kinds, their shared identity header (OID, names, owning
//! schema), and the reference edges between them.
//!
//! # Key Types
//!
//! - [`AttributeType`], [`ObjectClass`], [`MatchingRule`], [`LdapSyntax`] -
//!   the main descriptor-backed entities
//! - [`SchemaObject`] - common accessor trait over every entity kind
//! - [`AnySchemaObject`] - tagged variant used wherever entities are handled
//!   polymorphically (registration, reference tracking, validation dispatch)

pub mod attribute_type;
pub mod dit;
pub mod functional;
pub mod matching_rule;
pub mod object_class;
pub mod syntax;

pub use attribute_type::{AttributeType, Usage};
pub use dit::{DitContentRule, DitStructureRule, NameForm};
pub use functional::{Comparator, Normalizer, SyntaxChecker};
pub use matching_rule::{MatchingRule, MatchingRuleUse};
pub use object_class::{ObjectClass, ObjectClassKind};
pub use syntax::LdapSyntax;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a schema entity.
///
/// Every registered OID belongs to exactly one kind, with two sanctioned
/// overlaps defined by RFC 4512 itself: a matching rule use shares the OID
/// of its matching rule, and a DIT content rule shares the OID of its
/// structural object class.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum SchemaObjectKind {
    AttributeType,
    ObjectClass,
    MatchingRule,
    MatchingRuleUse,
    LdapSyntax,
    DitContentRule,
    DitStructureRule,
    NameForm,
    Normalizer,
    Comparator,
    SyntaxChecker,
}

impl fmt::Display for SchemaObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AttributeType => "attributeType",
            Self::ObjectClass => "objectClass",
            Self::MatchingRule => "matchingRule",
            Self::MatchingRuleUse => "matchingRuleUse",
            Self::LdapSyntax => "ldapSyntax",
            Self::DitContentRule => "dITContentRule",
            Self::DitStructureRule => "dITStructureRule",
            Self::NameForm => "nameForm",
            Self::Normalizer => "normalizer",
            Self::Comparator => "comparator",
            Self::SyntaxChecker => "syntaxChecker",
        };
        f.write_str(name)
    }
}

impl SchemaObjectKind {
    /// The functional kinds: opaque implementation objects conventionally
    /// registered under the OID of the matching rule or syntax they serve.
    pub fn is_functional(self) -> bool {
        matches!(self, Self::Normalizer | Self::Comparator | Self::SyntaxChecker)
    }

    /// Whether two distinct kinds are allowed to claim the same OID.
    ///
    /// Functional objects always may (a normalizer and a comparator both
    /// live under their rule's OID, a syntax checker under its syntax's);
    /// beyond that only the two overlaps RFC 4512 defines are sanctioned.
    pub fn shares_oid_with(self, other: SchemaObjectKind) -> bool {
        if self == other {
            return false;
        }
        if self.is_functional() || other.is_functional() {
            return true;
        }
        matches!(
            (self, other),
            (Self::MatchingRuleUse, Self::MatchingRule)
                | (Self::MatchingRule, Self::MatchingRuleUse)
                | (Self::DitContentRule, Self::ObjectClass)
                | (Self::ObjectClass, Self::DitContentRule)
        )
    }
}

/// Common accessors shared by every schema entity kind.
///
/// `references` reports the outgoing `(kind, oid)` edges of the entity and
/// drives both the reference-integrity resolver and the reverse-reference
/// bookkeeping that backs `StillReferenced` enforcement. For linked entities
/// every reported OID is canonical (dotted-decimal, never a name alias).
pub trait SchemaObject: Clone {
    /// The kind tag of this entity type.
    const KIND: SchemaObjectKind;

    fn oid(&self) -> &str;
    fn names(&self) -> &[String];
    fn schema_name(&self) -> &str;
    fn is_obsolete(&self) -> bool;
    fn references(&self) -> Vec<(SchemaObjectKind, String)>;
}

/// A schema entity of any kind.
///
/// The engine prefers this tagged variant over trait objects: per-kind
/// dispatch in the factory, the validator and the resolver stays exhaustive
/// and the compiler checks that no kind is forgotten.
#[derive(Debug, Clone, PartialEq)]
pub enum AnySchemaObject {
    AttributeType(AttributeType),
    ObjectClass(ObjectClass),
    MatchingRule(MatchingRule),
    MatchingRuleUse(MatchingRuleUse),
    LdapSyntax(LdapSyntax),
    DitContentRule(DitContentRule),
    DitStructureRule(DitStructureRule),
    NameForm(NameForm),
    Normalizer(Normalizer),
    Comparator(Comparator),
    SyntaxChecker(SyntaxChecker),
}

macro_rules! for_each_kind {
    ($self:expr, $entity:ident => $body:expr) => {
        match $self {
            AnySchemaObject::AttributeType($entity) => $body,
            AnySchemaObject::ObjectClass($entity) => $body,
            AnySchemaObject::MatchingRule($entity) => $body,
            AnySchemaObject::MatchingRuleUse($entity) => $body,
            AnySchemaObject::LdapSyntax($entity) => $body,
            AnySchemaObject::DitContentRule($entity) => $body,
            AnySchemaObject::DitStructureRule($entity) => $body,
            AnySchemaObject::NameForm($entity) => $body,
            AnySchemaObject::Normalizer($entity) => $body,
            AnySchemaObject::Comparator($entity) => $body,
            AnySchemaObject::SyntaxChecker($entity) => $body,
        }
    };
}

impl AnySchemaObject {
    pub fn oid(&self) -> &str {
        for_each_kind!(self, e => e.oid())
    }

    pub fn names(&self) -> &[String] {
        for_each_kind!(self, e => e.names())
    }

    pub fn schema_name(&self) -> &str {
        for_each_kind!(self, e => e.schema_name())
    }

    pub fn set_schema_name(&mut self, schema: &str) {
        for_each_kind!(self, e => e.schema_name = schema.to_string())
    }

    pub fn references(&self) -> Vec<(SchemaObjectKind, String)> {
        for_each_kind!(self, e => e.references())
    }

    pub fn kind(&self) -> SchemaObjectKind {
        match self {
            Self::AttributeType(_) => SchemaObjectKind::AttributeType,
            Self::ObjectClass(_) => SchemaObjectKind::ObjectClass,
            Self::MatchingRule(_) => SchemaObjectKind::MatchingRule,
            Self::MatchingRuleUse(_) => SchemaObjectKind::MatchingRuleUse,
            Self::LdapSyntax(_) => SchemaObjectKind::LdapSyntax,
            Self::DitContentRule(_) => SchemaObjectKind::DitContentRule,
            Self::DitStructureRule(_) => SchemaObjectKind::DitStructureRule,
            Self::NameForm(_) => SchemaObjectKind::NameForm,
            Self::Normalizer(_) => SchemaObjectKind::Normalizer,
            Self::Comparator(_) => SchemaObjectKind::Comparator,
            Self::SyntaxChecker(_) => SchemaObjectKind::SyntaxChecker,
        }
    }
}

macro_rules! impl_from_entity {
    ($($variant:ident => $ty:ty),+ $(,)?) => {
        $(impl From<$ty> for AnySchemaObject {
            fn from(entity: $ty) -> Self {
                AnySchemaObject::$variant(entity)
            }
        })+
    };
}

impl_from_entity! {
    AttributeType => AttributeType,
    ObjectClass => ObjectClass,
    MatchingRule => MatchingRule,
    MatchingRuleUse => MatchingRuleUse,
    LdapSyntax => LdapSyntax,
    DitContentRule => DitContentRule,
    DitStructureRule => DitStructureRule,
    NameForm => NameForm,
    Normalizer => Normalizer,
    Comparator => Comparator,
    SyntaxChecker => SyntaxChecker,
}

/// Whether `id` is a dotted-decimal OID rather than a descriptor name.
///
/// Accepts single-arc identifiers such as `1` because DIT structure rules
/// are keyed by their integer rule-id carried in the OID slot.
pub fn is_numeric_oid(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.ends_with('.')
        && !id.contains("..")
        && id.chars().all(|c| c.is_ascii_digit() || c == '.')
}

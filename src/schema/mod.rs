//! Schemas, schema content, and the loader boundary.
//!
//! A [`Schema`] is a named grouping of descriptors with dependency
//! declarations on other schemas. [`SchemaLoader`] is the abstract source of
//! schema content; loaders perform their I/O outside the registry lock and
//! hand the engine parsed descriptor values.
//!
//! # Key Types
//!
//! - [`Schema`] - schema metadata: name, enabled flag, dependencies
//! - [`SchemaContent`] - the per-kind descriptor sets of one schema
//! - [`SchemaLoader`] - async source of schemas ([`EmbeddedLoader`],
//!   [`JsonDirectoryLoader`] in-tree; live subschema loaders external)

pub mod embedded;
pub mod loader;

pub use loader::{EmbeddedLoader, JsonDirectoryLoader, SchemaLoader};

use crate::model::{
    AnySchemaObject, AttributeType, Comparator, DitContentRule, DitStructureRule, LdapSyntax,
    MatchingRule, MatchingRuleUse, NameForm, Normalizer, ObjectClass, SyntaxChecker,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Metadata of one schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub create_timestamp: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub modify_timestamp: Option<DateTime<FixedOffset>>,

    /// Entities parked here while the schema is disabled, so enabling can
    /// replay them without going back to the loader.
    #[serde(skip)]
    pub stashed: Vec<AnySchemaObject>,
}

fn default_enabled() -> bool {
    true
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: String::new(),
            dependencies: Vec::new(),
            enabled: true,
            create_timestamp: None,
            modify_timestamp: None,
            stashed: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

/// The descriptor sets of one schema, keyed the way the subschema subentry
/// publishes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaContent {
    #[serde(default, rename = "ldapSyntaxes")]
    pub ldap_syntaxes: Vec<LdapSyntax>,
    #[serde(default, rename = "matchingRules")]
    pub matching_rules: Vec<MatchingRule>,
    #[serde(default, rename = "attributeTypes")]
    pub attribute_types: Vec<AttributeType>,
    #[serde(default, rename = "objectClasses")]
    pub object_classes: Vec<ObjectClass>,
    #[serde(default, rename = "matchingRuleUse")]
    pub matching_rule_use: Vec<MatchingRuleUse>,
    #[serde(default, rename = "dITContentRules")]
    pub dit_content_rules: Vec<DitContentRule>,
    #[serde(default, rename = "dITStructureRules")]
    pub dit_structure_rules: Vec<DitStructureRule>,
    #[serde(default, rename = "nameForms")]
    pub name_forms: Vec<NameForm>,
    #[serde(default, rename = "normalizers")]
    pub normalizers: Vec<Normalizer>,
    #[serde(default, rename = "comparators")]
    pub comparators: Vec<Comparator>,
    #[serde(default, rename = "syntaxCheckers")]
    pub syntax_checkers: Vec<SyntaxChecker>,
}

impl SchemaContent {
    pub fn is_empty(&self) -> bool {
        self.entity_count() == 0
    }

    pub fn entity_count(&self) -> usize {
        self.ldap_syntaxes.len()
            + self.matching_rules.len()
            + self.attribute_types.len()
            + self.object_classes.len()
            + self.matching_rule_use.len()
            + self.dit_content_rules.len()
            + self.dit_structure_rules.len()
            + self.name_forms.len()
            + self.normalizers.len()
            + self.comparators.len()
            + self.syntax_checkers.len()
    }

    /// Flattens the content into registration order: functional objects
    /// first, then syntaxes, matching rules, attribute types, object
    /// classes, and the structural rules last. Entities without a schema
    /// name are stamped with `schema`.
    pub fn into_entities(self, schema: &str) -> Vec<AnySchemaObject> {
        let mut entities: Vec<AnySchemaObject> = Vec::with_capacity(self.entity_count());
        entities.extend(self.syntax_checkers.into_iter().map(Into::into));
        entities.extend(self.normalizers.into_iter().map(Into::into));
        entities.extend(self.comparators.into_iter().map(Into::into));
        entities.extend(self.ldap_syntaxes.into_iter().map(Into::into));
        entities.extend(self.matching_rules.into_iter().map(Into::into));
        entities.extend(self.attribute_types.into_iter().map(Into::into));
        entities.extend(self.object_classes.into_iter().map(Into::into));
        entities.extend(self.matching_rule_use.into_iter().map(Into::into));
        entities.extend(self.name_forms.into_iter().map(Into::into));
        entities.extend(self.dit_content_rules.into_iter().map(Into::into));
        entities.extend(self.dit_structure_rules.into_iter().map(Into::into));
        for entity in &mut entities {
            if entity.schema_name().is_empty() {
                entity.set_schema_name(schema);
            }
        }
        entities
    }
}

/// One schema as serialized on disk or embedded in the binary: metadata
/// plus content in a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(flatten)]
    pub schema: Schema,
    #[serde(flatten)]
    pub content: SchemaContent,
}

//! Object class definitions.

use super::{SchemaObject, SchemaObjectKind};
use serde::{Deserialize, Serialize};

/// The three object class kinds of RFC 4512 §4.1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectClassKind {
    Abstract,
    Structural,
    Auxiliary,
}

impl Default for ObjectClassKind {
    fn default() -> Self {
        Self::Structural
    }
}

/// An object class descriptor.
///
/// `superiors`, `must` and `may` hold the references as declared (OIDs or
/// names); the `effective_*` fields hold the canonical OIDs once the entity
/// is linked against the registries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectClass {
    pub oid: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default)]
    pub superiors: Vec<String>,
    #[serde(default)]
    pub kind: ObjectClassKind,
    #[serde(default)]
    pub must: Vec<String>,
    #[serde(default)]
    pub may: Vec<String>,
    #[serde(default)]
    pub schema_name: String,

    #[serde(skip)]
    pub effective_superiors: Vec<String>,
    #[serde(skip)]
    pub effective_must: Vec<String>,
    #[serde(skip)]
    pub effective_may: Vec<String>,
}

impl ObjectClass {
    /// OID of `top`, the root of the object class hierarchy.
    pub const TOP_OID: &'static str = "2.5.6.0";

    pub fn new(oid: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            names: Vec::new(),
            description: String::new(),
            obsolete: false,
            superiors: Vec::new(),
            kind: ObjectClassKind::default(),
            must: Vec::new(),
            may: Vec::new(),
            schema_name: String::new(),
            effective_superiors: Vec::new(),
            effective_must: Vec::new(),
            effective_may: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.oid == Self::TOP_OID
    }

    /// Strips the link-time fields, returning the entity as declared.
    pub fn as_declared(&self) -> Self {
        let mut declared = self.clone();
        declared.effective_superiors = Vec::new();
        declared.effective_must = Vec::new();
        declared.effective_may = Vec::new();
        declared
    }
}

impl Default for ObjectClass {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl SchemaObject for ObjectClass {
    const KIND: SchemaObjectKind = SchemaObjectKind::ObjectClass;

    fn oid(&self) -> &str {
        &self.oid
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn schema_name(&self) -> &str {
        &self.schema_name
    }

    fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    fn references(&self) -> Vec<(SchemaObjectKind, String)> {
        let mut refs = Vec::new();
        for sup in &self.effective_superiors {
            refs.push((SchemaObjectKind::ObjectClass, sup.clone()));
        }
        for attr in self.effective_must.iter().chain(&self.effective_may) {
            refs.push((SchemaObjectKind::AttributeType, attr.clone()));
        }
        refs
    }
}

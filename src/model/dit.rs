//! DIT content rules, DIT structure rules and name forms.

use super::{SchemaObject, SchemaObjectKind};
use serde::{Deserialize, Serialize};

/// A DIT content rule descriptor.
///
/// Identified by the OID of the structural object class it governs; lists
/// the auxiliary classes and the additional, permitted and precluded
/// attribute types for entries of that class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DitContentRule {
    pub oid: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default)]
    pub aux: Vec<String>,
    #[serde(default)]
    pub must: Vec<String>,
    #[serde(default)]
    pub may: Vec<String>,
    #[serde(default)]
    pub not: Vec<String>,
    #[serde(default)]
    pub schema_name: String,

    #[serde(skip)]
    pub effective_aux: Vec<String>,
    #[serde(skip)]
    pub effective_must: Vec<String>,
    #[serde(skip)]
    pub effective_may: Vec<String>,
    #[serde(skip)]
    pub effective_not: Vec<String>,
}

impl DitContentRule {
    pub fn new(oid: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            names: Vec::new(),
            description: String::new(),
            obsolete: false,
            aux: Vec::new(),
            must: Vec::new(),
            may: Vec::new(),
            not: Vec::new(),
            schema_name: String::new(),
            effective_aux: Vec::new(),
            effective_must: Vec::new(),
            effective_may: Vec::new(),
            effective_not: Vec::new(),
        }
    }
}

impl SchemaObject for DitContentRule {
    const KIND: SchemaObjectKind = SchemaObjectKind::DitContentRule;

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
        let mut refs = vec![(SchemaObjectKind::ObjectClass, self.oid.clone())];
        for class in &self.effective_aux {
            refs.push((SchemaObjectKind::ObjectClass, class.clone()));
        }
        for attr in self
            .effective_must
            .iter()
            .chain(&self.effective_may)
            .chain(&self.effective_not)
        {
            refs.push((SchemaObjectKind::AttributeType, attr.clone()));
        }
        refs
    }
}

/// A DIT structure rule descriptor.
///
/// Structure rules are identified by an integer rule-id rather than an OID;
/// the decimal form of the rule-id is carried in the OID slot so the
/// registries stay uniform. Each rule names the name form it governs and
/// the superior rules it may sit under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DitStructureRule {
    /// Decimal rule-id.
    pub oid: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub obsolete: bool,
    pub form: String,
    #[serde(default)]
    pub superior_rules: Vec<String>,
    #[serde(default)]
    pub schema_name: String,

    #[serde(skip)]
    pub effective_form: Option<String>,
}

impl DitStructureRule {
    pub fn new(rule_id: u32, form: impl Into<String>) -> Self {
        Self {
            oid: rule_id.to_string(),
            names: Vec::new(),
            description: String::new(),
            obsolete: false,
            form: form.into(),
            superior_rules: Vec::new(),
            schema_name: String::new(),
            effective_form: None,
        }
    }
}

impl SchemaObject for DitStructureRule {
    const KIND: SchemaObjectKind = SchemaObjectKind::DitStructureRule;

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
        if let Some(form) = &self.effective_form {
            refs.push((SchemaObjectKind::NameForm, form.clone()));
        }
        for rule in &self.superior_rules {
            refs.push((SchemaObjectKind::DitStructureRule, rule.clone()));
        }
        refs
    }
}

/// A name form descriptor.
///
/// Binds a structural object class to the attribute types allowed in the
/// RDN of entries of that class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameForm {
    pub oid: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub obsolete: bool,
    pub structural_class: String,
    #[serde(default)]
    pub must: Vec<String>,
    #[serde(default)]
    pub may: Vec<String>,
    #[serde(default)]
    pub schema_name: String,

    #[serde(skip)]
    pub effective_structural_class: Option<String>,
    #[serde(skip)]
    pub effective_must: Vec<String>,
    #[serde(skip)]
    pub effective_may: Vec<String>,
}

impl NameForm {
    pub fn new(oid: impl Into<String>, structural_class: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            names: Vec::new(),
            description: String::new(),
            obsolete: false,
            structural_class: structural_class.into(),
            must: Vec::new(),
            may: Vec::new(),
            schema_name: String::new(),
            effective_structural_class: None,
            effective_must: Vec::new(),
            effective_may: Vec::new(),
        }
    }
}

impl SchemaObject for NameForm {
    const KIND: SchemaObjectKind = SchemaObjectKind::NameForm;

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
        if let Some(class) = &self.effective_structural_class {
            refs.push((SchemaObjectKind::ObjectClass, class.clone()));
        }
        for attr in self.effective_must.iter().chain(&self.effective_may) {
            refs.push((SchemaObjectKind::AttributeType, attr.clone()));
        }
        refs
    }
}

//! Matching rule and matching rule use definitions.

use super::{SchemaObject, SchemaObjectKind};
use serde::{Deserialize, Serialize};

/// A matching rule descriptor.
///
/// Every matching rule is bound to a syntax and to a normalizer/comparator
/// pair. When the descriptor leaves the normalizer or comparator reference
/// unset, linking defaults it to the rule's own OID - the convention under
/// which the functional objects of a rule are registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingRule {
    pub oid: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub obsolete: bool,
    pub syntax: String,
    #[serde(default)]
    pub normalizer: Option<String>,
    #[serde(default)]
    pub comparator: Option<String>,
    #[serde(default)]
    pub schema_name: String,

    /// Canonical OID of the syntax. Filled at link time.
    #[serde(skip)]
    pub effective_syntax: Option<String>,
}

impl MatchingRule {
    pub fn new(oid: impl Into<String>, syntax: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            names: Vec::new(),
            description: String::new(),
            obsolete: false,
            syntax: syntax.into(),
            normalizer: None,
            comparator: None,
            schema_name: String::new(),
            effective_syntax: None,
        }
    }

    /// The normalizer reference, defaulted to the rule's own OID.
    pub fn normalizer_oid(&self) -> &str {
        self.normalizer.as_deref().unwrap_or(&self.oid)
    }

    /// The comparator reference, defaulted to the rule's own OID.
    pub fn comparator_oid(&self) -> &str {
        self.comparator.as_deref().unwrap_or(&self.oid)
    }
}

impl SchemaObject for MatchingRule {
    const KIND: SchemaObjectKind = SchemaObjectKind::MatchingRule;

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
        if let Some(syntax) = &self.effective_syntax {
            refs.push((SchemaObjectKind::LdapSyntax, syntax.clone()));
        }
        refs.push((
            SchemaObjectKind::Normalizer,
            self.normalizer_oid().to_string(),
        ));
        refs.push((
            SchemaObjectKind::Comparator,
            self.comparator_oid().to_string(),
        ));
        refs
    }
}

/// A matching rule use descriptor.
///
/// Carries the OID of its matching rule and lists the attribute types the
/// rule applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingRuleUse {
    pub oid: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default)]
    pub applies: Vec<String>,
    #[serde(default)]
    pub schema_name: String,

    #[serde(skip)]
    pub effective_applies: Vec<String>,
}

impl MatchingRuleUse {
    pub fn new(oid: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            names: Vec::new(),
            description: String::new(),
            obsolete: false,
            applies: Vec::new(),
            schema_name: String::new(),
            effective_applies: Vec::new(),
        }
    }
}

impl SchemaObject for MatchingRuleUse {
    const KIND: SchemaObjectKind = SchemaObjectKind::MatchingRuleUse;

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
        let mut refs = vec![(SchemaObjectKind::MatchingRule, self.oid.clone())];
        for attr in &self.effective_applies {
            refs.push((SchemaObjectKind::AttributeType, attr.clone()));
        }
        refs
    }
}

//! Attribute type definitions.

use super::{SchemaObject, SchemaObjectKind};
use serde::{Deserialize, Serialize};

/// Usage of an attribute type as defined in RFC 4512 §4.1.2.
///
/// Controls who may see and modify values of the attribute; everything but
/// `UserApplications` is an operational usage maintained by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Usage {
    UserApplications,
    DirectoryOperation,
    DistributedOperation,
    #[serde(rename = "dSAOperation")]
    DsaOperation,
}

impl Usage {
    /// True for any of the three operational usages.
    pub fn is_operational(self) -> bool {
        !matches!(self, Usage::UserApplications)
    }
}

impl Default for Usage {
    fn default() -> Self {
        Self::UserApplications
    }
}

/// An attribute type descriptor.
///
/// The declared reference fields (`superior`, `equality`, `ordering`,
/// `substring`, `syntax`) hold whatever the descriptor said - an OID or a
/// name alias - and are never rewritten. The `effective_*` fields are filled
/// in when the entity is linked against the registries: each holds the
/// canonical OID, inherited from the nearest superior that defines it when
/// the entity itself leaves it unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeType {
    pub oid: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default)]
    pub superior: Option<String>,
    #[serde(default)]
    pub equality: Option<String>,
    #[serde(default)]
    pub ordering: Option<String>,
    #[serde(default)]
    pub substring: Option<String>,
    #[serde(default)]
    pub syntax: Option<String>,
    #[serde(default)]
    pub single_valued: bool,
    #[serde(default)]
    pub collective: bool,
    #[serde(default)]
    pub no_user_modification: bool,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default)]
    pub schema_name: String,

    /// Canonical OID of the resolved superior. Filled at link time.
    #[serde(skip)]
    pub effective_superior: Option<String>,
    /// Canonical OID of the declared or inherited equality matching rule.
    #[serde(skip)]
    pub effective_equality: Option<String>,
    /// Canonical OID of the declared or inherited ordering matching rule.
    #[serde(skip)]
    pub effective_ordering: Option<String>,
    /// Canonical OID of the declared or inherited substring matching rule.
    #[serde(skip)]
    pub effective_substring: Option<String>,
    /// Canonical OID of the declared or inherited syntax.
    #[serde(skip)]
    pub effective_syntax: Option<String>,
}

impl AttributeType {
    pub fn new(oid: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            names: Vec::new(),
            description: String::new(),
            obsolete: false,
            superior: None,
            equality: None,
            ordering: None,
            substring: None,
            syntax: None,
            single_valued: false,
            collective: false,
            no_user_modification: false,
            usage: Usage::default(),
            schema_name: String::new(),
            effective_superior: None,
            effective_equality: None,
            effective_ordering: None,
            effective_substring: None,
            effective_syntax: None,
        }
    }

    /// Strips the link-time fields, returning the entity as declared.
    pub fn as_declared(&self) -> Self {
        let mut declared = self.clone();
        declared.effective_superior = None;
        declared.effective_equality = None;
        declared.effective_ordering = None;
        declared.effective_substring = None;
        declared.effective_syntax = None;
        declared
    }
}

impl Default for AttributeType {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl SchemaObject for AttributeType {
    const KIND: SchemaObjectKind = SchemaObjectKind::AttributeType;

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
        if let Some(sup) = &self.effective_superior {
            refs.push((SchemaObjectKind::AttributeType, sup.clone()));
        }
        for rule in [
            &self.effective_equality,
            &self.effective_ordering,
            &self.effective_substring,
        ]
        .into_iter()
        .flatten()
        {
            refs.push((SchemaObjectKind::MatchingRule, rule.clone()));
        }
        if let Some(syntax) = &self.effective_syntax {
            refs.push((SchemaObjectKind::LdapSyntax, syntax.clone()));
        }
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_deserializes_rfc_spellings() {
        assert_eq!(
            serde_json::from_str::<Usage>("\"userApplications\"").unwrap(),
            Usage::UserApplications
        );
        assert_eq!(
            serde_json::from_str::<Usage>("\"dSAOperation\"").unwrap(),
            Usage::DsaOperation
        );
        assert!(Usage::DirectoryOperation.is_operational());
        assert!(!Usage::UserApplications.is_operational());
    }

    #[test]
    fn references_use_effective_fields() {
        let mut at = AttributeType::new("1.1.0");
        at.equality = Some("caseIgnoreMatch".to_string());
        assert!(at.references().is_empty());

        at.effective_equality = Some("2.5.13.2".to_string());
        at.effective_syntax = Some("1.3.6.1.4.1.1466.115.121.1.15".to_string());
        let refs = at.references();
        assert!(refs.contains(&(SchemaObjectKind::MatchingRule, "2.5.13.2".into())));
        assert!(refs.contains(&(
            SchemaObjectKind::LdapSyntax,
            "1.3.6.1.4.1.1466.115.121.1.15".into()
        )));
    }
}

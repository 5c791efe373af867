//! LDAP syntax definitions.

use super::{SchemaObject, SchemaObjectKind};
use serde::{Deserialize, Serialize};

/// An LDAP syntax descriptor.
///
/// Syntaxes define the value space of attributes. Each syntax is bound to a
/// syntax checker registered under the same OID unless the descriptor names
/// a different one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LdapSyntax {
    pub oid: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default = "default_human_readable")]
    pub human_readable: bool,
    #[serde(default)]
    pub syntax_checker: Option<String>,
    #[serde(default)]
    pub schema_name: String,
}

fn default_human_readable() -> bool {
    true
}

impl LdapSyntax {
    pub fn new(oid: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            names: Vec::new(),
            description: String::new(),
            obsolete: false,
            human_readable: true,
            syntax_checker: None,
            schema_name: String::new(),
        }
    }

    /// The syntax checker reference, defaulted to the syntax's own OID.
    pub fn syntax_checker_oid(&self) -> &str {
        self.syntax_checker.as_deref().unwrap_or(&self.oid)
    }
}

impl SchemaObject for LdapSyntax {
    const KIND: SchemaObjectKind = SchemaObjectKind::LdapSyntax;

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
        vec![(
            SchemaObjectKind::SyntaxChecker,
            self.syntax_checker_oid().to_string(),
        )]
    }
}

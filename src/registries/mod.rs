//! The registry set: one typed registry per entity kind, the shared OID
//! registry, the loaded-schema map, and the reverse-reference table.
//!
//! `Registries` is a plain value and is `Clone`; the manager stages every
//! mutation on a clone and swaps it in only after validation succeeds, which
//! is what makes mutations all-or-nothing.

pub mod oid_registry;
pub mod registry;

pub use oid_registry::{normalize_name, OidRegistry};
pub use registry::Registry;

use crate::error::{SchemaViolation, ViolationCode, ViolationResult};
use crate::model::{
    AnySchemaObject, AttributeType, Comparator, DitContentRule, DitStructureRule, LdapSyntax,
    MatchingRule, MatchingRuleUse, NameForm, Normalizer, ObjectClass, SchemaObjectKind,
    SyntaxChecker,
};
use crate::schema::Schema;
use std::collections::{BTreeSet, HashMap};

/// The complete registry set of one schema manager instance.
///
/// Owns every registered entity. Cross-registry relationships are stored as
/// OID references on the entities; the `used_by` table is the inverted index
/// over those references and backs `StillReferenced` enforcement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registries {
    oid_registry: OidRegistry,
    attribute_types: Registry<AttributeType>,
    object_classes: Registry<ObjectClass>,
    matching_rules: Registry<MatchingRule>,
    matching_rule_uses: Registry<MatchingRuleUse>,
    ldap_syntaxes: Registry<LdapSyntax>,
    dit_content_rules: Registry<DitContentRule>,
    dit_structure_rules: Registry<DitStructureRule>,
    name_forms: Registry<NameForm>,
    normalizers: Registry<Normalizer>,
    comparators: Registry<Comparator>,
    syntax_checkers: Registry<SyntaxChecker>,
    schemas: HashMap<String, Schema>,
    /// referenced (kind, oid) -> the (kind, oid) pairs holding a reference
    /// to it.
    used_by: HashMap<(SchemaObjectKind, String), BTreeSet<(SchemaObjectKind, String)>>,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn oid_registry(&self) -> &OidRegistry {
        &self.oid_registry
    }

    pub fn attribute_types(&self) -> &Registry<AttributeType> {
        &self.attribute_types
    }

    pub fn object_classes(&self) -> &Registry<ObjectClass> {
        &self.object_classes
    }

    pub fn matching_rules(&self) -> &Registry<MatchingRule> {
        &self.matching_rules
    }

    pub fn matching_rule_uses(&self) -> &Registry<MatchingRuleUse> {
        &self.matching_rule_uses
    }

    pub fn ldap_syntaxes(&self) -> &Registry<LdapSyntax> {
        &self.ldap_syntaxes
    }

    pub fn dit_content_rules(&self) -> &Registry<DitContentRule> {
        &self.dit_content_rules
    }

    pub fn dit_structure_rules(&self) -> &Registry<DitStructureRule> {
        &self.dit_structure_rules
    }

    pub fn name_forms(&self) -> &Registry<NameForm> {
        &self.name_forms
    }

    pub fn normalizers(&self) -> &Registry<Normalizer> {
        &self.normalizers
    }

    pub fn comparators(&self) -> &Registry<Comparator> {
        &self.comparators
    }

    pub fn syntax_checkers(&self) -> &Registry<SyntaxChecker> {
        &self.syntax_checkers
    }

    /// Verifies that an OID is free for the given kind.
    pub fn check_oid_free(&self, kind: SchemaObjectKind, oid: &str) -> ViolationResult<()> {
        for existing in self.oid_registry.kinds_of(oid) {
            if existing == kind || !existing.shares_oid_with(kind) {
                return Err(SchemaViolation::new(
                    ViolationCode::AlreadyExists,
                    kind,
                    oid,
                    format!("OID is already registered as a {existing}"),
                ));
            }
        }
        Ok(())
    }

    /// Registers a linked entity into its typed registry and records its
    /// outgoing references in the reverse-reference table.
    pub fn register(&mut self, entity: AnySchemaObject) -> ViolationResult<()> {
        let user = (entity.kind(), entity.oid().to_string());
        let refs = entity.references();
        match entity {
            AnySchemaObject::AttributeType(e) => {
                self.attribute_types.register(e, &mut self.oid_registry)?
            }
            AnySchemaObject::ObjectClass(e) => {
                self.object_classes.register(e, &mut self.oid_registry)?
            }
            AnySchemaObject::MatchingRule(e) => {
                self.matching_rules.register(e, &mut self.oid_registry)?
            }
            AnySchemaObject::MatchingRuleUse(e) => {
                self.matching_rule_uses.register(e, &mut self.oid_registry)?
            }
            AnySchemaObject::LdapSyntax(e) => {
                self.ldap_syntaxes.register(e, &mut self.oid_registry)?
            }
            AnySchemaObject::DitContentRule(e) => {
                self.dit_content_rules.register(e, &mut self.oid_registry)?
            }
            AnySchemaObject::DitStructureRule(e) => {
                self.dit_structure_rules.register(e, &mut self.oid_registry)?
            }
            AnySchemaObject::NameForm(e) => self.name_forms.register(e, &mut self.oid_registry)?,
            AnySchemaObject::Normalizer(e) => {
                self.normalizers.register(e, &mut self.oid_registry)?
            }
            AnySchemaObject::Comparator(e) => {
                self.comparators.register(e, &mut self.oid_registry)?
            }
            AnySchemaObject::SyntaxChecker(e) => {
                self.syntax_checkers.register(e, &mut self.oid_registry)?
            }
        }
        for target in refs {
            self.used_by.entry(target).or_default().insert(user.clone());
        }
        Ok(())
    }

    /// Removes an entity and drops its outgoing references from the
    /// reverse-reference table. Does not check inbound references; that is
    /// the manager's job before it gets here.
    pub fn unregister(
        &mut self,
        kind: SchemaObjectKind,
        oid: &str,
    ) -> ViolationResult<AnySchemaObject> {
        let removed: AnySchemaObject = match kind {
            SchemaObjectKind::AttributeType => self
                .attribute_types
                .unregister(oid, &mut self.oid_registry)?
                .into(),
            SchemaObjectKind::ObjectClass => self
                .object_classes
                .unregister(oid, &mut self.oid_registry)?
                .into(),
            SchemaObjectKind::MatchingRule => self
                .matching_rules
                .unregister(oid, &mut self.oid_registry)?
                .into(),
            SchemaObjectKind::MatchingRuleUse => self
                .matching_rule_uses
                .unregister(oid, &mut self.oid_registry)?
                .into(),
            SchemaObjectKind::LdapSyntax => self
                .ldap_syntaxes
                .unregister(oid, &mut self.oid_registry)?
                .into(),
            SchemaObjectKind::DitContentRule => self
                .dit_content_rules
                .unregister(oid, &mut self.oid_registry)?
                .into(),
            SchemaObjectKind::DitStructureRule => self
                .dit_structure_rules
                .unregister(oid, &mut self.oid_registry)?
                .into(),
            SchemaObjectKind::NameForm => self
                .name_forms
                .unregister(oid, &mut self.oid_registry)?
                .into(),
            SchemaObjectKind::Normalizer => self
                .normalizers
                .unregister(oid, &mut self.oid_registry)?
                .into(),
            SchemaObjectKind::Comparator => self
                .comparators
                .unregister(oid, &mut self.oid_registry)?
                .into(),
            SchemaObjectKind::SyntaxChecker => self
                .syntax_checkers
                .unregister(oid, &mut self.oid_registry)?
                .into(),
        };
        let user = (kind, oid.to_string());
        for target in removed.references() {
            if let Some(users) = self.used_by.get_mut(&target) {
                users.remove(&user);
                if users.is_empty() {
                    self.used_by.remove(&target);
                }
            }
        }
        Ok(removed)
    }

    /// The entities holding a reference to the (kind, oid) target.
    pub fn users_of(&self, kind: SchemaObjectKind, oid: &str) -> Vec<(SchemaObjectKind, String)> {
        self.used_by
            .get(&(kind, oid.to_string()))
            .map(|users| users.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Clones an entity of any kind out of its typed registry.
    pub fn get_any(&self, kind: SchemaObjectKind, oid: &str) -> Option<AnySchemaObject> {
        match kind {
            SchemaObjectKind::AttributeType => {
                self.attribute_types.get(oid).cloned().map(Into::into)
            }
            SchemaObjectKind::ObjectClass => {
                self.object_classes.get(oid).cloned().map(Into::into)
            }
            SchemaObjectKind::MatchingRule => {
                self.matching_rules.get(oid).cloned().map(Into::into)
            }
            SchemaObjectKind::MatchingRuleUse => {
                self.matching_rule_uses.get(oid).cloned().map(Into::into)
            }
            SchemaObjectKind::LdapSyntax => {
                self.ldap_syntaxes.get(oid).cloned().map(Into::into)
            }
            SchemaObjectKind::DitContentRule => {
                self.dit_content_rules.get(oid).cloned().map(Into::into)
            }
            SchemaObjectKind::DitStructureRule => {
                self.dit_structure_rules.get(oid).cloned().map(Into::into)
            }
            SchemaObjectKind::NameForm => self.name_forms.get(oid).cloned().map(Into::into),
            SchemaObjectKind::Normalizer => self.normalizers.get(oid).cloned().map(Into::into),
            SchemaObjectKind::Comparator => self.comparators.get(oid).cloned().map(Into::into),
            SchemaObjectKind::SyntaxChecker => {
                self.syntax_checkers.get(oid).cloned().map(Into::into)
            }
        }
    }

    /// Resolves a name to an OID across every kind, walking the registries
    /// in a fixed order: attribute types first, structure rules last.
    pub fn oid_for_name(&self, name: &str) -> Option<String> {
        let oids = &self.oid_registry;
        if let Some(at) = self.attribute_types.lookup(name, oids) {
            return Some(at.oid.clone());
        }
        if let Some(oc) = self.object_classes.lookup(name, oids) {
            return Some(oc.oid.clone());
        }
        if let Some(syntax) = self.ldap_syntaxes.lookup(name, oids) {
            return Some(syntax.oid.clone());
        }
        if let Some(rule) = self.matching_rules.lookup(name, oids) {
            return Some(rule.oid.clone());
        }
        if let Some(mru) = self.matching_rule_uses.lookup(name, oids) {
            return Some(mru.oid.clone());
        }
        if let Some(form) = self.name_forms.lookup(name, oids) {
            return Some(form.oid.clone());
        }
        if let Some(dcr) = self.dit_content_rules.lookup(name, oids) {
            return Some(dcr.oid.clone());
        }
        if let Some(dsr) = self.dit_structure_rules.lookup(name, oids) {
            return Some(dsr.oid.clone());
        }
        None
    }

    /// All entities belonging to a schema, in no particular order.
    pub fn entities_of_schema(&self, schema: &str) -> Vec<AnySchemaObject> {
        let mut out: Vec<AnySchemaObject> = Vec::new();
        out.extend(
            self.syntax_checkers
                .iter()
                .filter(|e| e.schema_name == schema)
                .cloned()
                .map(Into::into),
        );
        out.extend(
            self.normalizers
                .iter()
                .filter(|e| e.schema_name == schema)
                .cloned()
                .map(Into::into),
        );
        out.extend(
            self.comparators
                .iter()
                .filter(|e| e.schema_name == schema)
                .cloned()
                .map(Into::into),
        );
        out.extend(
            self.ldap_syntaxes
                .iter()
                .filter(|e| e.schema_name == schema)
                .cloned()
                .map(Into::into),
        );
        out.extend(
            self.matching_rules
                .iter()
                .filter(|e| e.schema_name == schema)
                .cloned()
                .map(Into::into),
        );
        out.extend(
            self.attribute_types
                .iter()
                .filter(|e| e.schema_name == schema)
                .cloned()
                .map(Into::into),
        );
        out.extend(
            self.object_classes
                .iter()
                .filter(|e| e.schema_name == schema)
                .cloned()
                .map(Into::into),
        );
        out.extend(
            self.matching_rule_uses
                .iter()
                .filter(|e| e.schema_name == schema)
                .cloned()
                .map(Into::into),
        );
        out.extend(
            self.name_forms
                .iter()
                .filter(|e| e.schema_name == schema)
                .cloned()
                .map(Into::into),
        );
        out.extend(
            self.dit_content_rules
                .iter()
                .filter(|e| e.schema_name == schema)
                .cloned()
                .map(Into::into),
        );
        out.extend(
            self.dit_structure_rules
                .iter()
                .filter(|e| e.schema_name == schema)
                .cloned()
                .map(Into::into),
        );
        out
    }

    // --- loaded schema bookkeeping -------------------------------------

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn schema_mut(&mut self, name: &str) -> Option<&mut Schema> {
        self.schemas.get_mut(name)
    }

    pub fn insert_schema(&mut self, schema: Schema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn is_schema_loaded(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn loaded_schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    /// Enabled schemas whose dependency list names `name`.
    pub fn enabled_dependents_of(&self, name: &str) -> Vec<String> {
        let mut dependents: Vec<String> = self
            .schemas
            .values()
            .filter(|s| s.enabled && s.dependencies.iter().any(|d| d == name))
            .map(|s| s.name.clone())
            .collect();
        dependents.sort();
        dependents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_references_track_registration() {
        let mut regs = Registries::new();
        let mut checker = SyntaxChecker::new(
            "1.3.6.1.4.1.1466.115.121.1.15",
            "dirserver.checkers.DirectoryString",
        );
        checker.schema_name = "system".into();
        regs.register(checker.into()).unwrap();

        let mut syntax = LdapSyntax::new("1.3.6.1.4.1.1466.115.121.1.15");
        syntax.schema_name = "system".into();
        regs.register(syntax.into()).unwrap();

        let users = regs.users_of(
            SchemaObjectKind::SyntaxChecker,
            "1.3.6.1.4.1.1466.115.121.1.15",
        );
        assert_eq!(
            users,
            vec![(
                SchemaObjectKind::LdapSyntax,
                "1.3.6.1.4.1.1466.115.121.1.15".to_string()
            )]
        );

        regs.unregister(SchemaObjectKind::LdapSyntax, "1.3.6.1.4.1.1466.115.121.1.15")
            .unwrap();
        assert!(regs
            .users_of(
                SchemaObjectKind::SyntaxChecker,
                "1.3.6.1.4.1.1466.115.121.1.15",
            )
            .is_empty());
    }

    #[test]
    fn oid_free_honors_sanctioned_overlap() {
        let mut regs = Registries::new();
        let mut checker = SyntaxChecker::new("1.3.6.1.4.1.1466.115.121.1.15", "x");
        checker.schema_name = "system".into();
        regs.register(checker.into()).unwrap();
        let mut syntax = LdapSyntax::new("1.3.6.1.4.1.1466.115.121.1.15");
        syntax.schema_name = "system".into();
        regs.register(syntax.into()).unwrap();
        let mut rule = MatchingRule::new("2.5.13.2", "1.3.6.1.4.1.1466.115.121.1.15");
        rule.effective_syntax = Some("1.3.6.1.4.1.1466.115.121.1.15".into());
        rule.normalizer = Some("2.5.13.2".into());
        rule.comparator = Some("2.5.13.2".into());
        regs.register(rule.into()).unwrap();

        assert!(regs
            .check_oid_free(SchemaObjectKind::MatchingRuleUse, "2.5.13.2")
            .is_ok());
        assert!(regs
            .check_oid_free(SchemaObjectKind::AttributeType, "2.5.13.2")
            .is_err());
    }
}

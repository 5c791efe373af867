//! Entity linking.
//!
//! The factory turns a parsed descriptor into a fully linked entity against
//! a registry snapshot: every name-or-OID reference is resolved to the
//! canonical OID of an already-registered entity of the expected kind, and
//! attribute types get their effective syntax and matching rules computed,
//! inherited from the nearest superior that defines them. Declared fields
//! are never rewritten; linking only fills the `effective_*` fields.

use crate::error::{SchemaViolation, ViolationCode, ViolationResult};
use crate::model::{
    AnySchemaObject, AttributeType, DitContentRule, DitStructureRule, MatchingRule,
    MatchingRuleUse, NameForm, ObjectClass, SchemaObjectKind,
};
use crate::registries::{normalize_name, Registries};
use std::collections::HashSet;

/// Links one entity of any kind. Functional objects and syntaxes carry no
/// resolvable references and pass through unchanged.
pub fn link(entity: AnySchemaObject, regs: &Registries) -> ViolationResult<AnySchemaObject> {
    match entity {
        AnySchemaObject::AttributeType(at) => link_attribute_type(at, regs).map(Into::into),
        AnySchemaObject::ObjectClass(oc) => link_object_class(oc, regs).map(Into::into),
        AnySchemaObject::MatchingRule(rule) => link_matching_rule(rule, regs).map(Into::into),
        AnySchemaObject::MatchingRuleUse(mru) => {
            link_matching_rule_use(mru, regs).map(Into::into)
        }
        AnySchemaObject::NameForm(form) => link_name_form(form, regs).map(Into::into),
        AnySchemaObject::DitContentRule(dcr) => {
            link_dit_content_rule(dcr, regs).map(Into::into)
        }
        AnySchemaObject::DitStructureRule(dsr) => {
            link_dit_structure_rule(dsr, regs).map(Into::into)
        }
        AnySchemaObject::LdapSyntax(_)
        | AnySchemaObject::Normalizer(_)
        | AnySchemaObject::Comparator(_)
        | AnySchemaObject::SyntaxChecker(_) => Ok(entity),
    }
}

/// Whether `reference` denotes the entity itself, by OID or by one of its
/// own names. Needed before resolution: the entity is not registered yet,
/// so a self-reference never resolves.
fn is_self_reference(reference: &str, oid: &str, names: &[String]) -> bool {
    if reference == oid {
        return true;
    }
    let normalized = normalize_name(reference);
    names.iter().any(|n| normalize_name(n) == normalized)
}

pub fn link_attribute_type(
    at: AttributeType,
    regs: &Registries,
) -> ViolationResult<AttributeType> {
    let mut at = at.as_declared();

    if let Some(sup_ref) = at.superior.clone() {
        if is_self_reference(&sup_ref, &at.oid, &at.names) {
            return Err(SchemaViolation::new(
                ViolationCode::InheritanceCycle,
                SchemaObjectKind::AttributeType,
                &at.oid,
                "attribute type names itself as its superior",
            )
            .referencing(sup_ref));
        }
        let superior = regs
            .attribute_types()
            .lookup(&sup_ref, regs.oid_registry())
            .ok_or_else(|| {
                SchemaViolation::new(
                    ViolationCode::UnknownSuperior,
                    SchemaObjectKind::AttributeType,
                    &at.oid,
                    format!("superior '{sup_ref}' is not a registered attribute type"),
                )
                .referencing(sup_ref.clone())
            })?;

        // The chain above the superior can only contain the candidate when
        // relinking during a modify; guard against it all the same.
        let mut seen = HashSet::new();
        let mut cursor = Some(superior.oid.clone());
        while let Some(current) = cursor {
            if current == at.oid || !seen.insert(current.clone()) {
                return Err(SchemaViolation::new(
                    ViolationCode::InheritanceCycle,
                    SchemaObjectKind::AttributeType,
                    &at.oid,
                    format!("superior chain through {current} loops back"),
                )
                .referencing(current));
            }
            cursor = regs
                .attribute_types()
                .get(&current)
                .and_then(|sup| sup.effective_superior.clone());
        }

        at.effective_superior = Some(superior.oid.clone());
        at.effective_equality = superior.effective_equality.clone();
        at.effective_ordering = superior.effective_ordering.clone();
        at.effective_substring = superior.effective_substring.clone();
        at.effective_syntax = superior.effective_syntax.clone();
    }

    if let Some(rule_ref) = at.equality.clone() {
        at.effective_equality = Some(resolve_matching_rule(&rule_ref, &at.oid, regs)?);
    }
    if let Some(rule_ref) = at.ordering.clone() {
        at.effective_ordering = Some(resolve_matching_rule(&rule_ref, &at.oid, regs)?);
    }
    if let Some(rule_ref) = at.substring.clone() {
        at.effective_substring = Some(resolve_matching_rule(&rule_ref, &at.oid, regs)?);
    }

    if let Some(syntax_ref) = &at.syntax {
        let syntax = regs
            .ldap_syntaxes()
            .lookup(syntax_ref, regs.oid_registry())
            .ok_or_else(|| {
                SchemaViolation::new(
                    ViolationCode::UnknownSyntax,
                    SchemaObjectKind::AttributeType,
                    &at.oid,
                    format!("syntax '{syntax_ref}' is not registered"),
                )
                .referencing(syntax_ref.clone())
            })?;
        at.effective_syntax = Some(syntax.oid.clone());
    }

    Ok(at)
}

fn resolve_matching_rule(
    rule_ref: &str,
    subject_oid: &str,
    regs: &Registries,
) -> ViolationResult<String> {
    regs.matching_rules()
        .lookup(rule_ref, regs.oid_registry())
        .map(|rule| rule.oid.clone())
        .ok_or_else(|| {
            SchemaViolation::new(
                ViolationCode::UnknownMatchingRule,
                SchemaObjectKind::AttributeType,
                subject_oid,
                format!("matching rule '{rule_ref}' is not registered"),
            )
            .referencing(rule_ref)
        })
}

pub fn link_object_class(oc: ObjectClass, regs: &Registries) -> ViolationResult<ObjectClass> {
    let mut oc = oc.as_declared();

    for sup_ref in oc.superiors.clone() {
        if is_self_reference(&sup_ref, &oc.oid, &oc.names) {
            return Err(SchemaViolation::new(
                ViolationCode::InheritanceCycle,
                SchemaObjectKind::ObjectClass,
                &oc.oid,
                "object class names itself as a superior",
            )
            .referencing(sup_ref));
        }
        let superior = regs
            .object_classes()
            .lookup(&sup_ref, regs.oid_registry())
            .ok_or_else(|| {
                SchemaViolation::new(
                    ViolationCode::UnknownSuperior,
                    SchemaObjectKind::ObjectClass,
                    &oc.oid,
                    format!("superior '{sup_ref}' is not a registered object class"),
                )
                .referencing(sup_ref.clone())
            })?;

        if reaches(regs, &superior.oid, &oc.oid) {
            return Err(SchemaViolation::new(
                ViolationCode::InheritanceCycle,
                SchemaObjectKind::ObjectClass,
                &oc.oid,
                format!("superior {} already inherits from this class", superior.oid),
            )
            .referencing(superior.oid.clone()));
        }
        oc.effective_superiors.push(superior.oid.clone());
    }

    oc.effective_must = resolve_attribute_list(&oc.must, &oc.oid, SchemaObjectKind::ObjectClass, regs)?;
    oc.effective_may = resolve_attribute_list(&oc.may, &oc.oid, SchemaObjectKind::ObjectClass, regs)?;
    Ok(oc)
}

/// DFS over the committed superior DAG: does `from` reach `target`?
fn reaches(regs: &Registries, from: &str, target: &str) -> bool {
    let mut stack = vec![from.to_string()];
    let mut seen = HashSet::new();
    while let Some(current) = stack.pop() {
        if current == target {
            return true;
        }
        if !seen.insert(current.clone()) {
            continue;
        }
        if let Some(oc) = regs.object_classes().get(&current) {
            stack.extend(oc.effective_superiors.iter().cloned());
        }
    }
    false
}

fn resolve_attribute_list(
    attrs: &[String],
    subject_oid: &str,
    subject_kind: SchemaObjectKind,
    regs: &Registries,
) -> ViolationResult<Vec<String>> {
    let mut resolved = Vec::with_capacity(attrs.len());
    for attr_ref in attrs {
        let attr = regs
            .attribute_types()
            .lookup(attr_ref, regs.oid_registry())
            .ok_or_else(|| {
                SchemaViolation::new(
                    ViolationCode::UnknownAttributeType,
                    subject_kind,
                    subject_oid,
                    format!("attribute type '{attr_ref}' is not registered"),
                )
                .referencing(attr_ref.clone())
            })?;
        resolved.push(attr.oid.clone());
    }
    Ok(resolved)
}

pub fn link_matching_rule(
    rule: MatchingRule,
    regs: &Registries,
) -> ViolationResult<MatchingRule> {
    let mut rule = rule;
    rule.effective_syntax = None;
    let syntax = regs
        .ldap_syntaxes()
        .lookup(&rule.syntax, regs.oid_registry())
        .ok_or_else(|| {
            SchemaViolation::new(
                ViolationCode::UnknownSyntax,
                SchemaObjectKind::MatchingRule,
                &rule.oid,
                format!("syntax '{}' is not registered", rule.syntax),
            )
            .referencing(rule.syntax.clone())
        })?;
    rule.effective_syntax = Some(syntax.oid.clone());
    Ok(rule)
}

pub fn link_matching_rule_use(
    mru: MatchingRuleUse,
    regs: &Registries,
) -> ViolationResult<MatchingRuleUse> {
    let mut mru = mru;
    mru.effective_applies = resolve_attribute_list(
        &mru.applies,
        &mru.oid,
        SchemaObjectKind::MatchingRuleUse,
        regs,
    )?;
    Ok(mru)
}

pub fn link_name_form(form: NameForm, regs: &Registries) -> ViolationResult<NameForm> {
    let mut form = form;
    form.effective_structural_class = None;
    let class = regs
        .object_classes()
        .lookup(&form.structural_class, regs.oid_registry())
        .ok_or_else(|| {
            SchemaViolation::new(
                ViolationCode::UnknownObjectClass,
                SchemaObjectKind::NameForm,
                &form.oid,
                format!(
                    "structural object class '{}' is not registered",
                    form.structural_class
                ),
            )
            .referencing(form.structural_class.clone())
        })?;
    form.effective_structural_class = Some(class.oid.clone());
    form.effective_must =
        resolve_attribute_list(&form.must, &form.oid, SchemaObjectKind::NameForm, regs)?;
    form.effective_may =
        resolve_attribute_list(&form.may, &form.oid, SchemaObjectKind::NameForm, regs)?;
    Ok(form)
}

pub fn link_dit_content_rule(
    dcr: DitContentRule,
    regs: &Registries,
) -> ViolationResult<DitContentRule> {
    let mut dcr = dcr;
    dcr.effective_aux = Vec::new();
    for class_ref in dcr.aux.clone() {
        let class = regs
            .object_classes()
            .lookup(&class_ref, regs.oid_registry())
            .ok_or_else(|| {
                SchemaViolation::new(
                    ViolationCode::UnknownObjectClass,
                    SchemaObjectKind::DitContentRule,
                    &dcr.oid,
                    format!("auxiliary class '{class_ref}' is not registered"),
                )
                .referencing(class_ref.clone())
            })?;
        dcr.effective_aux.push(class.oid.clone());
    }
    dcr.effective_must =
        resolve_attribute_list(&dcr.must, &dcr.oid, SchemaObjectKind::DitContentRule, regs)?;
    dcr.effective_may =
        resolve_attribute_list(&dcr.may, &dcr.oid, SchemaObjectKind::DitContentRule, regs)?;
    dcr.effective_not =
        resolve_attribute_list(&dcr.not, &dcr.oid, SchemaObjectKind::DitContentRule, regs)?;
    Ok(dcr)
}

pub fn link_dit_structure_rule(
    dsr: DitStructureRule,
    regs: &Registries,
) -> ViolationResult<DitStructureRule> {
    let mut dsr = dsr;
    dsr.effective_form = None;
    let form = regs
        .name_forms()
        .lookup(&dsr.form, regs.oid_registry())
        .ok_or_else(|| {
            SchemaViolation::new(
                ViolationCode::NoSuchEntity,
                SchemaObjectKind::DitStructureRule,
                &dsr.oid,
                format!("name form '{}' is not registered", dsr.form),
            )
            .referencing(dsr.form.clone())
        })?;
    dsr.effective_form = Some(form.oid.clone());
    for rule_id in &dsr.superior_rules {
        if !regs.dit_structure_rules().contains(rule_id) {
            return Err(SchemaViolation::new(
                ViolationCode::UnknownSuperior,
                SchemaObjectKind::DitStructureRule,
                &dsr.oid,
                format!("superior structure rule {rule_id} is not registered"),
            )
            .referencing(rule_id.clone()));
        }
    }
    Ok(dsr)
}

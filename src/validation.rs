//! Per-kind semantic validation.
//!
//! Rules run over a linked entity plus the registry snapshot it was linked
//! against, after the factory and before commit. Mutations stop at the
//! first violated rule, so the rule order here is part of the contract:
//! usage compatibility before syntax presence, syntax presence before the
//! matching-facility requirement, and the flag rules last.

use crate::error::{SchemaViolation, ViolationCode, ViolationResult};
use crate::model::{
    AnySchemaObject, AttributeType, DitContentRule, LdapSyntax, MatchingRule, MatchingRuleUse,
    NameForm, ObjectClass, ObjectClassKind, SchemaObjectKind, Usage,
};
use crate::registries::Registries;

/// Validates one linked entity against the registry snapshot.
pub fn check_entity(entity: &AnySchemaObject, regs: &Registries) -> ViolationResult<()> {
    match entity {
        AnySchemaObject::AttributeType(at) => check_attribute_type(at, regs),
        AnySchemaObject::ObjectClass(oc) => check_object_class(oc, regs),
        AnySchemaObject::MatchingRule(rule) => check_matching_rule(rule, regs),
        AnySchemaObject::MatchingRuleUse(mru) => check_matching_rule_use(mru, regs),
        AnySchemaObject::LdapSyntax(syntax) => check_ldap_syntax(syntax, regs),
        AnySchemaObject::NameForm(form) => check_name_form(form, regs),
        AnySchemaObject::DitContentRule(dcr) => check_dit_content_rule(dcr, regs),
        AnySchemaObject::DitStructureRule(_)
        | AnySchemaObject::Normalizer(_)
        | AnySchemaObject::Comparator(_)
        | AnySchemaObject::SyntaxChecker(_) => Ok(()),
    }
}

pub fn check_attribute_type(at: &AttributeType, regs: &Registries) -> ViolationResult<()> {
    if let Some(sup_oid) = &at.effective_superior {
        let superior = regs.attribute_types().get(sup_oid).ok_or_else(|| {
            SchemaViolation::new(
                ViolationCode::UnknownSuperior,
                SchemaObjectKind::AttributeType,
                &at.oid,
                format!("superior {sup_oid} is not a registered attribute type"),
            )
            .referencing(sup_oid.clone())
        })?;
        if at.usage != superior.usage {
            return Err(SchemaViolation::new(
                ViolationCode::UsageMismatch,
                SchemaObjectKind::AttributeType,
                &at.oid,
                format!("usage differs from superior {sup_oid}"),
            )
            .referencing(sup_oid.clone()));
        }
    }

    if at.effective_syntax.is_none() {
        return Err(SchemaViolation::new(
            ViolationCode::NoSyntax,
            SchemaObjectKind::AttributeType,
            &at.oid,
            "no syntax and no superior to inherit one from",
        ));
    }

    if at.effective_equality.is_none()
        && at.effective_ordering.is_none()
        && at.effective_substring.is_none()
    {
        return Err(SchemaViolation::new(
            ViolationCode::NoMatchingRule,
            SchemaObjectKind::AttributeType,
            &at.oid,
            "no equality, ordering or substring matching rule, declared or inherited",
        ));
    }

    if at.collective && at.usage != Usage::UserApplications {
        return Err(SchemaViolation::new(
            ViolationCode::CollectiveOperational,
            SchemaObjectKind::AttributeType,
            &at.oid,
            "collective attribute types must have userApplications usage",
        ));
    }

    if at.no_user_modification && !at.usage.is_operational() {
        return Err(SchemaViolation::new(
            ViolationCode::NoUserModUserApp,
            SchemaObjectKind::AttributeType,
            &at.oid,
            "NO-USER-MODIFICATION requires an operational usage",
        ));
    }

    if at.collective && at.single_valued {
        return Err(SchemaViolation::new(
            ViolationCode::CollectiveSingleValued,
            SchemaObjectKind::AttributeType,
            &at.oid,
            "collective attribute types cannot be single-valued",
        ));
    }

    Ok(())
}

pub fn check_object_class(oc: &ObjectClass, regs: &Registries) -> ViolationResult<()> {
    if oc.effective_superiors.is_empty() && !oc.is_root() {
        return Err(SchemaViolation::new(
            ViolationCode::UnknownSuperior,
            SchemaObjectKind::ObjectClass,
            &oc.oid,
            "every object class except top requires at least one superior",
        ));
    }

    for sup_oid in &oc.effective_superiors {
        let superior = regs.object_classes().get(sup_oid).ok_or_else(|| {
            SchemaViolation::new(
                ViolationCode::UnknownSuperior,
                SchemaObjectKind::ObjectClass,
                &oc.oid,
                format!("superior {sup_oid} is not a registered object class"),
            )
            .referencing(sup_oid.clone())
        })?;
        let incompatible = match oc.kind {
            ObjectClassKind::Abstract => superior.kind != ObjectClassKind::Abstract,
            ObjectClassKind::Structural => superior.kind == ObjectClassKind::Auxiliary,
            ObjectClassKind::Auxiliary => superior.kind == ObjectClassKind::Structural,
        };
        if incompatible {
            return Err(SchemaViolation::new(
                ViolationCode::KindIncompatibility,
                SchemaObjectKind::ObjectClass,
                &oc.oid,
                format!(
                    "{:?} class cannot inherit from {:?} class {sup_oid}",
                    oc.kind, superior.kind
                ),
            )
            .referencing(sup_oid.clone()));
        }
    }

    if let Some(overlap) = oc
        .effective_must
        .iter()
        .find(|attr| oc.effective_may.contains(attr))
    {
        return Err(SchemaViolation::new(
            ViolationCode::MustMayOverlap,
            SchemaObjectKind::ObjectClass,
            &oc.oid,
            format!("attribute type {overlap} appears in both MUST and MAY"),
        )
        .referencing(overlap.clone()));
    }

    Ok(())
}

pub fn check_matching_rule(rule: &MatchingRule, regs: &Registries) -> ViolationResult<()> {
    if !regs.normalizers().contains(rule.normalizer_oid()) {
        return Err(SchemaViolation::new(
            ViolationCode::MissingNormalizer,
            SchemaObjectKind::MatchingRule,
            &rule.oid,
            format!("no normalizer registered under {}", rule.normalizer_oid()),
        )
        .referencing(rule.normalizer_oid()));
    }
    if !regs.comparators().contains(rule.comparator_oid()) {
        return Err(SchemaViolation::new(
            ViolationCode::MissingComparator,
            SchemaObjectKind::MatchingRule,
            &rule.oid,
            format!("no comparator registered under {}", rule.comparator_oid()),
        )
        .referencing(rule.comparator_oid()));
    }
    Ok(())
}

pub fn check_matching_rule_use(mru: &MatchingRuleUse, regs: &Registries) -> ViolationResult<()> {
    if !regs.matching_rules().contains(&mru.oid) {
        return Err(SchemaViolation::new(
            ViolationCode::UnknownMatchingRule,
            SchemaObjectKind::MatchingRuleUse,
            &mru.oid,
            "no matching rule registered under this OID",
        )
        .referencing(mru.oid.clone()));
    }
    Ok(())
}

pub fn check_ldap_syntax(syntax: &LdapSyntax, regs: &Registries) -> ViolationResult<()> {
    if !regs.syntax_checkers().contains(syntax.syntax_checker_oid()) {
        return Err(SchemaViolation::new(
            ViolationCode::MissingSyntaxChecker,
            SchemaObjectKind::LdapSyntax,
            &syntax.oid,
            format!(
                "no syntax checker registered under {}",
                syntax.syntax_checker_oid()
            ),
        )
        .referencing(syntax.syntax_checker_oid()));
    }
    Ok(())
}

pub fn check_name_form(form: &NameForm, regs: &Registries) -> ViolationResult<()> {
    if let Some(class_oid) = &form.effective_structural_class {
        if let Some(class) = regs.object_classes().get(class_oid) {
            if class.kind != ObjectClassKind::Structural {
                return Err(SchemaViolation::new(
                    ViolationCode::KindIncompatibility,
                    SchemaObjectKind::NameForm,
                    &form.oid,
                    format!("named object class {class_oid} is not STRUCTURAL"),
                )
                .referencing(class_oid.clone()));
            }
        }
    }
    if let Some(overlap) = form
        .effective_must
        .iter()
        .find(|attr| form.effective_may.contains(attr))
    {
        return Err(SchemaViolation::new(
            ViolationCode::MustMayOverlap,
            SchemaObjectKind::NameForm,
            &form.oid,
            format!("attribute type {overlap} appears in both MUST and MAY"),
        )
        .referencing(overlap.clone()));
    }
    Ok(())
}

pub fn check_dit_content_rule(dcr: &DitContentRule, regs: &Registries) -> ViolationResult<()> {
    let class = regs.object_classes().get(&dcr.oid).ok_or_else(|| {
        SchemaViolation::new(
            ViolationCode::UnknownObjectClass,
            SchemaObjectKind::DitContentRule,
            &dcr.oid,
            "no object class registered under this OID",
        )
        .referencing(dcr.oid.clone())
    })?;
    if class.kind != ObjectClassKind::Structural {
        return Err(SchemaViolation::new(
            ViolationCode::KindIncompatibility,
            SchemaObjectKind::DitContentRule,
            &dcr.oid,
            "content rules govern STRUCTURAL classes only",
        )
        .referencing(dcr.oid.clone()));
    }
    for aux_oid in &dcr.effective_aux {
        if let Some(aux) = regs.object_classes().get(aux_oid) {
            if aux.kind != ObjectClassKind::Auxiliary {
                return Err(SchemaViolation::new(
                    ViolationCode::KindIncompatibility,
                    SchemaObjectKind::DitContentRule,
                    &dcr.oid,
                    format!("class {aux_oid} in AUX is not AUXILIARY"),
                )
                .referencing(aux_oid.clone()));
            }
        }
    }
    if let Some(overlap) = dcr
        .effective_must
        .iter()
        .find(|attr| dcr.effective_may.contains(attr))
    {
        return Err(SchemaViolation::new(
            ViolationCode::MustMayOverlap,
            SchemaObjectKind::DitContentRule,
            &dcr.oid,
            format!("attribute type {overlap} appears in both MUST and MAY"),
        )
        .referencing(overlap.clone()));
    }
    Ok(())
}

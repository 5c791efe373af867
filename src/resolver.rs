//! Whole-graph reference integrity.
//!
//! The resolver walks every registered entity and confirms that each stored
//! reference resolves to a present entity of the expected kind, and that the
//! inheritance graphs are acyclic. It accumulates violations and never
//! stops at the first finding: a committed state must come back with an
//! empty list, and when it does not, the caller wants the whole picture.

use crate::error::{SchemaViolation, ViolationCode};
use crate::model::SchemaObjectKind;
use crate::registries::Registries;
use std::collections::HashMap;

/// Checks the entire registry set, returning every violation found.
pub fn check(regs: &Registries) -> Vec<SchemaViolation> {
    let mut errors = Vec::new();
    check_attribute_types(regs, &mut errors);
    check_object_classes(regs, &mut errors);
    check_matching_rules(regs, &mut errors);
    check_ldap_syntaxes(regs, &mut errors);
    check_matching_rule_uses(regs, &mut errors);
    check_name_forms(regs, &mut errors);
    check_dit_content_rules(regs, &mut errors);
    check_dit_structure_rules(regs, &mut errors);
    errors
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    Grey,
    Black,
}

/// DFS over `successors` starting at `oid`, grey/black marking. Reports a
/// violation for the first grey re-entry on each start node.
fn mark_cycles(
    kind: SchemaObjectKind,
    oid: &str,
    successors: &impl Fn(&str) -> Vec<String>,
    colors: &mut HashMap<String, Color>,
    errors: &mut Vec<SchemaViolation>,
) {
    match colors.get(oid) {
        Some(Color::Black) => return,
        Some(Color::Grey) => {
            errors.push(
                SchemaViolation::new(
                    ViolationCode::InheritanceCycle,
                    kind,
                    oid,
                    "inheritance chain loops back through this entity",
                )
                .referencing(oid),
            );
            return;
        }
        None => {}
    }
    colors.insert(oid.to_string(), Color::Grey);
    for next in successors(oid) {
        mark_cycles(kind, &next, successors, colors, errors);
    }
    colors.insert(oid.to_string(), Color::Black);
}

fn check_attribute_types(regs: &Registries, errors: &mut Vec<SchemaViolation>) {
    let mut colors = HashMap::new();
    let successors = |oid: &str| -> Vec<String> {
        regs.attribute_types()
            .get(oid)
            .and_then(|at| at.effective_superior.clone())
            .into_iter()
            .collect()
    };

    for at in regs.attribute_types().iter() {
        mark_cycles(
            SchemaObjectKind::AttributeType,
            &at.oid,
            &successors,
            &mut colors,
            errors,
        );

        if let Some(sup) = &at.effective_superior {
            if !regs.attribute_types().contains(sup) {
                errors.push(
                    SchemaViolation::new(
                        ViolationCode::UnknownSuperior,
                        SchemaObjectKind::AttributeType,
                        &at.oid,
                        format!("superior {sup} is not registered"),
                    )
                    .referencing(sup.clone()),
                );
            }
        }
        for rule in [
            &at.effective_equality,
            &at.effective_ordering,
            &at.effective_substring,
        ]
        .into_iter()
        .flatten()
        {
            if !regs.matching_rules().contains(rule) {
                errors.push(
                    SchemaViolation::new(
                        ViolationCode::UnknownMatchingRule,
                        SchemaObjectKind::AttributeType,
                        &at.oid,
                        format!("matching rule {rule} is not registered"),
                    )
                    .referencing(rule.clone()),
                );
            }
        }
        match &at.effective_syntax {
            None => errors.push(SchemaViolation::new(
                ViolationCode::NoSyntax,
                SchemaObjectKind::AttributeType,
                &at.oid,
                "no syntax, declared or inherited",
            )),
            Some(syntax) if !regs.ldap_syntaxes().contains(syntax) => {
                errors.push(
                    SchemaViolation::new(
                        ViolationCode::UnknownSyntax,
                        SchemaObjectKind::AttributeType,
                        &at.oid,
                        format!("syntax {syntax} is not registered"),
                    )
                    .referencing(syntax.clone()),
                );
            }
            Some(_) => {}
        }
    }
}

fn check_object_classes(regs: &Registries, errors: &mut Vec<SchemaViolation>) {
    let mut colors = HashMap::new();
    let successors = |oid: &str| -> Vec<String> {
        regs.object_classes()
            .get(oid)
            .map(|oc| oc.effective_superiors.clone())
            .unwrap_or_default()
    };

    for oc in regs.object_classes().iter() {
        mark_cycles(
            SchemaObjectKind::ObjectClass,
            &oc.oid,
            &successors,
            &mut colors,
            errors,
        );

        for sup in &oc.effective_superiors {
            if !regs.object_classes().contains(sup) {
                errors.push(
                    SchemaViolation::new(
                        ViolationCode::UnknownSuperior,
                        SchemaObjectKind::ObjectClass,
                        &oc.oid,
                        format!("superior {sup} is not registered"),
                    )
                    .referencing(sup.clone()),
                );
            }
        }
        for attr in oc.effective_must.iter().chain(&oc.effective_may) {
            if !regs.attribute_types().contains(attr) {
                errors.push(
                    SchemaViolation::new(
                        ViolationCode::UnknownAttributeType,
                        SchemaObjectKind::ObjectClass,
                        &oc.oid,
                        format!("attribute type {attr} is not registered"),
                    )
                    .referencing(attr.clone()),
                );
            }
        }
    }
}

fn check_matching_rules(regs: &Registries, errors: &mut Vec<SchemaViolation>) {
    for rule in regs.matching_rules().iter() {
        match &rule.effective_syntax {
            Some(syntax) if regs.ldap_syntaxes().contains(syntax) => {}
            Some(syntax) => errors.push(
                SchemaViolation::new(
                    ViolationCode::UnknownSyntax,
                    SchemaObjectKind::MatchingRule,
                    &rule.oid,
                    format!("syntax {syntax} is not registered"),
                )
                .referencing(syntax.clone()),
            ),
            None => errors.push(
                SchemaViolation::new(
                    ViolationCode::UnknownSyntax,
                    SchemaObjectKind::MatchingRule,
                    &rule.oid,
                    format!("syntax {} is not registered", rule.syntax),
                )
                .referencing(rule.syntax.clone()),
            ),
        }
        if !regs.normalizers().contains(rule.normalizer_oid()) {
            errors.push(
                SchemaViolation::new(
                    ViolationCode::MissingNormalizer,
                    SchemaObjectKind::MatchingRule,
                    &rule.oid,
                    format!("no normalizer registered under {}", rule.normalizer_oid()),
                )
                .referencing(rule.normalizer_oid()),
            );
        }
        if !regs.comparators().contains(rule.comparator_oid()) {
            errors.push(
                SchemaViolation::new(
                    ViolationCode::MissingComparator,
                    SchemaObjectKind::MatchingRule,
                    &rule.oid,
                    format!("no comparator registered under {}", rule.comparator_oid()),
                )
                .referencing(rule.comparator_oid()),
            );
        }
    }
}

fn check_ldap_syntaxes(regs: &Registries, errors: &mut Vec<SchemaViolation>) {
    for syntax in regs.ldap_syntaxes().iter() {
        if !regs.syntax_checkers().contains(syntax.syntax_checker_oid()) {
            errors.push(
                SchemaViolation::new(
                    ViolationCode::MissingSyntaxChecker,
                    SchemaObjectKind::LdapSyntax,
                    &syntax.oid,
                    format!(
                        "no syntax checker registered under {}",
                        syntax.syntax_checker_oid()
                    ),
                )
                .referencing(syntax.syntax_checker_oid()),
            );
        }
    }
}

fn check_matching_rule_uses(regs: &Registries, errors: &mut Vec<SchemaViolation>) {
    for mru in regs.matching_rule_uses().iter() {
        if !regs.matching_rules().contains(&mru.oid) {
            errors.push(
                SchemaViolation::new(
                    ViolationCode::UnknownMatchingRule,
                    SchemaObjectKind::MatchingRuleUse,
                    &mru.oid,
                    "no matching rule registered under this OID",
                )
                .referencing(mru.oid.clone()),
            );
        }
        for attr in &mru.effective_applies {
            if !regs.attribute_types().contains(attr) {
                errors.push(
                    SchemaViolation::new(
                        ViolationCode::UnknownAttributeType,
                        SchemaObjectKind::MatchingRuleUse,
                        &mru.oid,
                        format!("attribute type {attr} is not registered"),
                    )
                    .referencing(attr.clone()),
                );
            }
        }
    }
}

fn check_name_forms(regs: &Registries, errors: &mut Vec<SchemaViolation>) {
    for form in regs.name_forms().iter() {
        match &form.effective_structural_class {
            Some(class) if regs.object_classes().contains(class) => {}
            Some(class) => errors.push(
                SchemaViolation::new(
                    ViolationCode::UnknownObjectClass,
                    SchemaObjectKind::NameForm,
                    &form.oid,
                    format!("object class {class} is not registered"),
                )
                .referencing(class.clone()),
            ),
            None => errors.push(
                SchemaViolation::new(
                    ViolationCode::UnknownObjectClass,
                    SchemaObjectKind::NameForm,
                    &form.oid,
                    format!("object class {} is not registered", form.structural_class),
                )
                .referencing(form.structural_class.clone()),
            ),
        }
        for attr in form.effective_must.iter().chain(&form.effective_may) {
            if !regs.attribute_types().contains(attr) {
                errors.push(
                    SchemaViolation::new(
                        ViolationCode::UnknownAttributeType,
                        SchemaObjectKind::NameForm,
                        &form.oid,
                        format!("attribute type {attr} is not registered"),
                    )
                    .referencing(attr.clone()),
                );
            }
        }
    }
}

fn check_dit_content_rules(regs: &Registries, errors: &mut Vec<SchemaViolation>) {
    for dcr in regs.dit_content_rules().iter() {
        if !regs.object_classes().contains(&dcr.oid) {
            errors.push(
                SchemaViolation::new(
                    ViolationCode::UnknownObjectClass,
                    SchemaObjectKind::DitContentRule,
                    &dcr.oid,
                    "no object class registered under this OID",
                )
                .referencing(dcr.oid.clone()),
            );
        }
        for class in &dcr.effective_aux {
            if !regs.object_classes().contains(class) {
                errors.push(
                    SchemaViolation::new(
                        ViolationCode::UnknownObjectClass,
                        SchemaObjectKind::DitContentRule,
                        &dcr.oid,
                        format!("auxiliary class {class} is not registered"),
                    )
                    .referencing(class.clone()),
                );
            }
        }
        for attr in dcr
            .effective_must
            .iter()
            .chain(&dcr.effective_may)
            .chain(&dcr.effective_not)
        {
            if !regs.attribute_types().contains(attr) {
                errors.push(
                    SchemaViolation::new(
                        ViolationCode::UnknownAttributeType,
                        SchemaObjectKind::DitContentRule,
                        &dcr.oid,
                        format!("attribute type {attr} is not registered"),
                    )
                    .referencing(attr.clone()),
                );
            }
        }
    }
}

fn check_dit_structure_rules(regs: &Registries, errors: &mut Vec<SchemaViolation>) {
    for dsr in regs.dit_structure_rules().iter() {
        match &dsr.effective_form {
            Some(form) if regs.name_forms().contains(form) => {}
            Some(form) => errors.push(
                SchemaViolation::new(
                    ViolationCode::NoSuchEntity,
                    SchemaObjectKind::DitStructureRule,
                    &dsr.oid,
                    format!("name form {form} is not registered"),
                )
                .referencing(form.clone()),
            ),
            None => errors.push(
                SchemaViolation::new(
                    ViolationCode::NoSuchEntity,
                    SchemaObjectKind::DitStructureRule,
                    &dsr.oid,
                    format!("name form {} is not registered", dsr.form),
                )
                .referencing(dsr.form.clone()),
            ),
        }
        for rule_id in &dsr.superior_rules {
            if !regs.dit_structure_rules().contains(rule_id) {
                errors.push(
                    SchemaViolation::new(
                        ViolationCode::UnknownSuperior,
                        SchemaObjectKind::DitStructureRule,
                        &dsr.oid,
                        format!("superior structure rule {rule_id} is not registered"),
                    )
                    .referencing(rule_id.clone()),
                );
            }
        }
    }
}

//! Attribute type mutation rules, driven against the system schema.

mod common;

use common::*;
use ldap_schema_engine::{resolver, AttributeType, SchemaError, Usage, ViolationCode};

fn is_present(manager: &ldap_schema_engine::SchemaManager, oid: &str) -> bool {
    manager.lookup_attribute_type(oid).is_ok()
}

fn sole_error(manager: &ldap_schema_engine::SchemaManager) -> ViolationCode {
    let errors = manager.get_errors();
    assert_eq!(errors.len(), 1, "expected exactly one violation: {errors:?}");
    errors[0].code
}

#[tokio::test]
async fn add_without_syntax_or_superior_is_rejected() {
    let manager = load_system().await;
    let snapshot = manager.registries();

    let mut at = AttributeType::new("1.1.0");
    at.equality = Some(DN_MATCH.to_string());

    assert!(!manager.add(at));
    assert_eq!(sole_error(&manager), ViolationCode::NoSyntax);
    assert!(matches!(
        manager.lookup_attribute_type("1.1.0"),
        Err(SchemaError::NoSuchEntity { .. })
    ));
    assert_eq!(manager.registries(), snapshot);
}

#[tokio::test]
async fn collective_user_attribute_is_accepted() {
    let manager = load_system().await;

    let mut at = user_attribute("1.1.0");
    at.collective = true;

    assert!(manager.add(at));
    assert!(manager.get_errors().is_empty());
    assert!(is_present(&manager, "1.1.0"));
}

#[tokio::test]
async fn collective_operational_attribute_is_rejected() {
    let manager = load_system().await;

    let mut at = user_attribute("1.1.0");
    at.usage = Usage::DirectoryOperation;
    at.collective = true;

    assert!(!manager.add(at));
    assert_eq!(sole_error(&manager), ViolationCode::CollectiveOperational);
    assert!(!is_present(&manager, "1.1.0"));
}

#[tokio::test]
async fn no_user_modification_on_user_attribute_is_rejected() {
    let manager = load_system().await;

    let mut at = user_attribute("1.1.0");
    at.no_user_modification = true;

    assert!(!manager.add(at));
    assert_eq!(sole_error(&manager), ViolationCode::NoUserModUserApp);
    assert!(!is_present(&manager, "1.1.0"));
}

#[tokio::test]
async fn no_user_modification_on_operational_attribute_is_accepted() {
    let manager = load_system().await;

    let mut at = user_attribute("1.1.0");
    at.usage = Usage::DistributedOperation;
    at.no_user_modification = true;

    assert!(manager.add(at));
    assert!(is_present(&manager, "1.1.0"));
}

#[tokio::test]
async fn collective_single_valued_is_rejected() {
    let manager = load_system().await;

    let mut at = user_attribute("1.1.0");
    at.collective = true;
    at.single_valued = true;

    assert!(!manager.add(at));
    assert_eq!(sole_error(&manager), ViolationCode::CollectiveSingleValued);
}

#[tokio::test]
async fn syntax_without_any_matching_rule_is_rejected() {
    let manager = load_system().await;

    let mut at = AttributeType::new("1.1.0");
    at.syntax = Some(IA5_STRING.to_string());

    assert!(!manager.add(at));
    assert_eq!(sole_error(&manager), ViolationCode::NoMatchingRule);
}

#[tokio::test]
async fn invalid_equality_rule_is_rejected() {
    let manager = load_system().await;

    let mut at = user_attribute("1.1.0");
    at.equality = Some("0.0".to_string());

    assert!(!manager.add(at));
    let errors = manager.get_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, ViolationCode::UnknownMatchingRule);
    assert_eq!(errors[0].referenced_oid.as_deref(), Some("0.0"));
    assert!(!is_present(&manager, "1.1.0"));
}

#[tokio::test]
async fn invalid_ordering_and_substring_rules_are_rejected() {
    let manager = load_system().await;

    let mut at = user_attribute("1.1.0");
    at.ordering = Some("0.0".to_string());
    assert!(!manager.add(at));
    assert_eq!(sole_error(&manager), ViolationCode::UnknownMatchingRule);

    let mut at = user_attribute("1.1.0");
    at.substring = Some("0.0".to_string());
    assert!(!manager.add(at));
    assert_eq!(sole_error(&manager), ViolationCode::UnknownMatchingRule);
}

#[tokio::test]
async fn all_three_matching_rules_accepted() {
    let manager = load_system().await;

    let mut at = user_attribute("1.1.0");
    at.ordering = Some(DN_MATCH.to_string());
    at.substring = Some(DN_MATCH.to_string());

    assert!(manager.add(at));
    assert!(is_present(&manager, "1.1.0"));
}

#[tokio::test]
async fn adding_an_existing_oid_is_rejected_and_leaves_the_original() {
    let manager = load_system().await;
    let snapshot = manager.registries();

    let mut at = AttributeType::new(MODIFIERS_NAME);
    at.equality = Some(DN_MATCH.to_string());
    at.ordering = Some(DN_MATCH.to_string());
    at.substring = Some(DN_MATCH.to_string());

    assert!(!manager.add(at));
    assert_eq!(sole_error(&manager), ViolationCode::AlreadyExists);

    // The original descriptor is untouched, equality still by name.
    let original = manager.lookup_attribute_type(MODIFIERS_NAME).unwrap();
    assert_eq!(original.equality.as_deref(), Some("distinguishedNameMatch"));
    assert_eq!(manager.registries(), snapshot);
}

#[tokio::test]
async fn superior_supplies_syntax_and_matching_rule() {
    let manager = load_system().await;

    let mut at = AttributeType::new("1.1.0");
    at.superior = Some(MODIFIERS_NAME.to_string());
    at.usage = Usage::DirectoryOperation;

    assert!(manager.add(at), "{:?}", manager.get_errors());

    let result = manager.lookup_attribute_type("1.1.0").unwrap();
    assert_eq!(result.effective_syntax.as_deref(), Some(DN_SYNTAX));
    assert_eq!(result.effective_equality.as_deref(), Some(DN_MATCH));
    assert_eq!(result.effective_superior.as_deref(), Some(MODIFIERS_NAME));
    // Declared fields stay as declared: nothing was set on the entity.
    assert_eq!(result.syntax, None);
    assert_eq!(result.equality, None);
}

#[tokio::test]
async fn usage_must_match_superior() {
    let manager = load_system().await;

    let mut at = AttributeType::new("1.1.0");
    at.superior = Some(MODIFIERS_NAME.to_string());
    at.usage = Usage::DistributedOperation;

    assert!(!manager.add(at));
    assert_eq!(sole_error(&manager), ViolationCode::UsageMismatch);
    assert!(!is_present(&manager, "1.1.0"));
}

#[tokio::test]
async fn self_superior_is_an_inheritance_cycle() {
    let manager = load_system().await;

    let mut at = AttributeType::new("1.1.0");
    at.superior = Some("1.1.0".to_string());
    at.usage = Usage::DistributedOperation;

    assert!(!manager.add(at));
    assert_eq!(sole_error(&manager), ViolationCode::InheritanceCycle);
    assert!(!is_present(&manager, "1.1.0"));
}

#[tokio::test]
async fn unknown_superior_is_rejected() {
    let manager = load_system().await;

    let mut at = AttributeType::new("1.1.0");
    at.superior = Some("0.0".to_string());
    at.usage = Usage::DistributedOperation;

    assert!(!manager.add(at));
    let errors = manager.get_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, ViolationCode::UnknownSuperior);
    assert_eq!(errors[0].referenced_oid.as_deref(), Some("0.0"));
}

#[tokio::test]
async fn references_resolve_by_name() {
    let manager = load_system().await;

    let mut at = AttributeType::new("1.1.0");
    at.equality = Some("caseIgnoreMatch".to_string());
    at.syntax = Some(DIRECTORY_STRING.to_string());

    assert!(manager.add(at));
    let result = manager.lookup_attribute_type("1.1.0").unwrap();
    assert_eq!(result.effective_equality.as_deref(), Some("2.5.13.2"));
    // The declared reference keeps its spelling.
    assert_eq!(result.equality.as_deref(), Some("caseIgnoreMatch"));
}

#[tokio::test]
async fn duplicate_name_is_rejected() {
    let manager = load_system().await;

    let mut at = user_attribute("1.1.0");
    at.names = vec!["cn".to_string()];

    assert!(!manager.add(at));
    assert_eq!(sole_error(&manager), ViolationCode::DuplicateName);
}

#[tokio::test]
async fn lookup_by_every_name_and_oid_agree() {
    let manager = load_system().await;

    let by_oid = manager.lookup_attribute_type("2.5.4.3").unwrap();
    let by_short = manager.lookup_attribute_type("cn").unwrap();
    let by_long = manager.lookup_attribute_type("commonName").unwrap();
    assert_eq!(by_oid, by_short);
    assert_eq!(by_oid, by_long);
}

#[tokio::test]
async fn delete_and_re_add_restores_the_snapshot() {
    let manager = load_system().await;

    let mut at = user_attribute("1.1.0");
    at.names = vec!["testAttr".to_string()];
    assert!(manager.add(at.clone()));
    let snapshot = manager.registries();

    assert!(manager.delete("1.1.0"));
    assert!(!is_present(&manager, "1.1.0"));

    assert!(manager.add(at));
    assert_eq!(manager.registries(), snapshot);
}

#[tokio::test]
async fn delete_of_referenced_entity_is_rejected() {
    let manager = load_system().await;
    let snapshot = manager.registries();

    // distinguishedNameMatch is referenced by the operational attributes.
    assert!(!manager.delete(DN_MATCH));
    let errors = manager.get_errors();
    assert_eq!(errors[0].code, ViolationCode::StillReferenced);

    // name (2.5.4.41) is the superior of cn and sn.
    assert!(!manager.delete("name"));
    assert_eq!(manager.get_errors()[0].code, ViolationCode::StillReferenced);

    assert_eq!(manager.registries(), snapshot);
}

#[tokio::test]
async fn delete_of_unknown_id_is_rejected() {
    let manager = load_system().await;
    assert!(!manager.delete("9.9.9.9"));
    assert_eq!(manager.get_errors()[0].code, ViolationCode::NoSuchEntity);
}

#[tokio::test]
async fn committed_states_pass_the_resolver() {
    let manager = load_system().await;
    assert!(resolver::check(&manager.registries()).is_empty());

    assert!(manager.add(user_attribute("1.1.0")));
    assert!(resolver::check(&manager.registries()).is_empty());

    let mut rejected = AttributeType::new("1.1.1");
    rejected.equality = Some("0.0".to_string());
    rejected.syntax = Some(IA5_STRING.to_string());
    assert!(!manager.add(rejected));
    assert!(resolver::check(&manager.registries()).is_empty());
}

#[tokio::test]
async fn modify_rewrites_inherited_fields_of_descendants() {
    let manager = load_system().await;

    let mut child = AttributeType::new("1.1.0");
    child.names = vec!["childAttr".to_string()];
    child.superior = Some(MODIFIERS_NAME.to_string());
    child.usage = Usage::DirectoryOperation;
    assert!(manager.add(child));
    assert_eq!(
        manager
            .lookup_attribute_type("1.1.0")
            .unwrap()
            .effective_syntax
            .as_deref(),
        Some(DN_SYNTAX)
    );

    // Re-point the superior at the Directory String syntax.
    let mut replacement = AttributeType::new(MODIFIERS_NAME);
    replacement.names = vec!["modifiersName".to_string()];
    replacement.equality = Some("distinguishedNameMatch".to_string());
    replacement.syntax = Some(DIRECTORY_STRING.to_string());
    replacement.single_valued = true;
    replacement.no_user_modification = true;
    replacement.usage = Usage::DirectoryOperation;
    replacement.schema_name = "system".to_string();
    assert!(manager.modify(replacement), "{:?}", manager.get_errors());

    let child = manager.lookup_attribute_type("childAttr").unwrap();
    assert_eq!(child.effective_syntax.as_deref(), Some(DIRECTORY_STRING));
}

#[tokio::test]
async fn failed_modify_changes_nothing() {
    let manager = load_system().await;
    let snapshot = manager.registries();

    // NO-USER-MODIFICATION with userApplications usage is invalid.
    let mut replacement = AttributeType::new(MODIFIERS_NAME);
    replacement.names = vec!["modifiersName".to_string()];
    replacement.equality = Some("distinguishedNameMatch".to_string());
    replacement.syntax = Some(DN_SYNTAX.to_string());
    replacement.no_user_modification = true;
    replacement.usage = Usage::UserApplications;
    assert!(!manager.modify(replacement));
    assert_eq!(manager.get_errors()[0].code, ViolationCode::NoUserModUserApp);
    assert_eq!(manager.registries(), snapshot);

    let mut missing = user_attribute("7.7.7");
    missing.schema_name = "other".to_string();
    assert!(!manager.modify(missing));
    assert_eq!(manager.get_errors()[0].code, ViolationCode::NoSuchEntity);
}

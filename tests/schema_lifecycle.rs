//! Schema loading, dependencies, enable/disable and events.

mod common;

use common::*;
use ldap_schema_engine::{
    AttributeType, EmbeddedLoader, JsonDirectoryLoader, Schema, SchemaListener, SchemaManager,
    ViolationCode,
};
use std::sync::{Arc, Mutex};

const TEST_SCHEMA: &str = r#"{
    "name": "test",
    "dependencies": ["system"],
    "attributeTypes": [
        { "oid": "1.5.1", "names": ["deviceSerial"], "equality": "caseIgnoreMatch",
          "syntax": "1.3.6.1.4.1.1466.115.121.1.15" }
    ],
    "objectClasses": [
        { "oid": "1.5.2", "names": ["device"], "kind": "STRUCTURAL",
          "superiors": ["top"], "must": ["cn"], "may": ["deviceSerial"] }
    ]
}"#;

fn manager_with_test_schema() -> SchemaManager {
    let loader = EmbeddedLoader::new().with_json(TEST_SCHEMA).unwrap();
    SchemaManager::new(loader)
}

#[tokio::test]
async fn load_pulls_in_dependencies() {
    let manager = manager_with_test_schema();
    assert!(manager.load_with_deps("test").await, "{:?}", manager.get_errors());

    assert!(manager.is_schema_loaded("system"));
    assert!(manager.is_schema_loaded("test"));
    assert_eq!(manager.loaded_schema_names(), vec!["system", "test"]);

    let at = manager.lookup_attribute_type("deviceSerial").unwrap();
    assert_eq!(at.oid, "1.5.1");
    assert_eq!(at.schema_name, "test");
    let oc = manager.lookup_object_class("device").unwrap();
    assert_eq!(oc.effective_may, vec!["1.5.1".to_string()]);
}

#[tokio::test]
async fn load_is_idempotent() {
    let manager = manager_with_test_schema();
    assert!(manager.load_with_deps("test").await);
    let snapshot = manager.registries();

    assert!(manager.load_with_deps("test").await);
    assert!(manager.get_errors().is_empty());
    assert_eq!(manager.registries(), snapshot);
}

#[tokio::test]
async fn loading_an_unknown_schema_fails() {
    let manager = load_system().await;
    assert!(!manager.load_with_deps("nonexistent").await);
    let errors = manager.get_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, ViolationCode::SchemaDependencyMissing);
}

#[tokio::test]
async fn disable_is_blocked_by_dependent_schemas() {
    let manager = manager_with_test_schema();
    assert!(manager.load_with_deps("test").await);

    assert!(!manager.disable_schema("system"));
    assert_eq!(
        manager.get_errors()[0].code,
        ViolationCode::SchemaStillDepended
    );
    assert!(manager.is_schema_enabled("system"));
}

#[tokio::test]
async fn disable_hides_exactly_the_schemas_entities() {
    let manager = manager_with_test_schema();
    assert!(manager.load_with_deps("test").await);
    let snapshot = manager.registries();

    assert!(manager.disable_schema("test"), "{:?}", manager.get_errors());
    assert!(manager.lookup_attribute_type("deviceSerial").is_err());
    assert!(manager.lookup_object_class("device").is_err());
    // Everything else is untouched.
    assert!(manager.lookup_attribute_type("cn").is_ok());
    assert!(manager.lookup_object_class("person").is_ok());
    assert!(!manager.is_schema_enabled("test"));

    assert!(manager.enable_schema("test"), "{:?}", manager.get_errors());
    assert_eq!(manager.registries(), snapshot);
}

#[tokio::test]
async fn disable_is_blocked_by_outside_references() {
    let manager = load_system().await;

    let mut at = AttributeType::new("1.6.1");
    at.equality = Some("caseIgnoreMatch".to_string());
    at.syntax = Some(DIRECTORY_STRING.to_string());
    assert!(manager.add(at));

    assert!(!manager.disable_schema("system"));
    assert!(manager
        .get_errors()
        .iter()
        .all(|e| e.code == ViolationCode::StillReferenced));

    assert!(manager.delete("1.6.1"));
    assert!(manager.disable_schema("system"));
}

#[tokio::test]
async fn enable_requires_enabled_dependencies() {
    let manager = manager_with_test_schema();
    assert!(manager.load_with_deps("test").await);

    assert!(manager.disable_schema("test"));
    assert!(manager.disable_schema("system"));

    assert!(!manager.enable_schema("test"));
    assert_eq!(
        manager.get_errors()[0].code,
        ViolationCode::SchemaDependencyMissing
    );

    assert!(manager.enable_schema("system"), "{:?}", manager.get_errors());
    assert!(manager.enable_schema("test"), "{:?}", manager.get_errors());
    assert!(manager.lookup_attribute_type("deviceSerial").is_ok());
}

#[tokio::test]
async fn enable_of_unloaded_schema_fails() {
    let manager = load_system().await;
    assert!(!manager.enable_schema("nonexistent"));
    assert_eq!(
        manager.get_errors()[0].code,
        ViolationCode::SchemaDependencyMissing
    );
}

#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl SchemaListener for Recorder {
    fn schema_loaded(&self, schema: &Schema) {
        self.events
            .lock()
            .unwrap()
            .push(format!("loaded:{}", schema.name));
    }

    fn schema_unloaded(&self, schema: &Schema) {
        self.events
            .lock()
            .unwrap()
            .push(format!("unloaded:{}", schema.name));
    }
}

#[tokio::test]
async fn listeners_observe_load_and_unload() {
    let manager = manager_with_test_schema();
    let recorder = Recorder::default();
    manager.register_listener(recorder.clone());

    assert!(manager.load_with_deps("test").await);
    assert!(manager.disable_schema("test"));
    assert!(manager.enable_schema("test"));

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "loaded:system".to_string(),
            "loaded:test".to_string(),
            "unloaded:test".to_string(),
            "loaded:test".to_string(),
        ]
    );
}

#[tokio::test]
async fn cross_kind_name_resolution() {
    let manager = load_system().await;
    assert_eq!(manager.oid_for_name("cn").as_deref(), Some("2.5.4.3"));
    assert_eq!(manager.oid_for_name("person").as_deref(), Some("2.5.6.6"));
    assert_eq!(
        manager.oid_for_name("distinguishedNameMatch").as_deref(),
        Some("2.5.13.1")
    );
    assert_eq!(manager.oid_for_name("nonexistent"), None);
}

#[tokio::test]
async fn bad_descriptor_does_not_abort_its_schema() {
    let loader = EmbeddedLoader::new()
        .with_json(
            r#"{
                "name": "partial",
                "dependencies": ["system"],
                "attributeTypes": [
                    { "oid": "1.7.1", "names": ["goodAttr"], "equality": "caseIgnoreMatch",
                      "syntax": "1.3.6.1.4.1.1466.115.121.1.15" },
                    { "oid": "1.7.2", "names": ["badAttr"], "equality": "0.0",
                      "syntax": "1.3.6.1.4.1.1466.115.121.1.15" }
                ]
            }"#,
        )
        .unwrap();
    let manager = SchemaManager::new(loader);

    assert!(!manager.load_with_deps("partial").await);
    let errors = manager.get_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, ViolationCode::UnknownMatchingRule);

    // The rest of the schema is in place.
    assert!(manager.is_schema_loaded("partial"));
    assert!(manager.lookup_attribute_type("goodAttr").is_ok());
    assert!(manager.lookup_attribute_type("badAttr").is_err());
}

#[tokio::test]
async fn json_directory_loader_round_trip() {
    let dir = std::env::temp_dir().join(format!(
        "ldap-schema-engine-test-{}",
        std::process::id()
    ));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(
        dir.join("system.json"),
        ldap_schema_engine::schema::embedded::system_schema(),
    )
    .await
    .unwrap();
    tokio::fs::write(dir.join("test.json"), TEST_SCHEMA).await.unwrap();

    let manager = SchemaManager::new(JsonDirectoryLoader::new(&dir));
    assert!(manager.load_with_deps("test").await, "{:?}", manager.get_errors());
    assert!(manager.lookup_attribute_type("deviceSerial").is_ok());

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn independent_managers_do_not_interfere() {
    let first = load_system().await;
    let second = SchemaManager::new(EmbeddedLoader::new());

    assert!(first.lookup_attribute_type("cn").is_ok());
    assert!(second.lookup_attribute_type("cn").is_err());

    let mut at = AttributeType::new("1.8.1");
    at.equality = Some("caseIgnoreMatch".to_string());
    at.syntax = Some(DIRECTORY_STRING.to_string());
    assert!(first.add(at));
    assert!(second.lookup_attribute_type("1.8.1").is_err());
}

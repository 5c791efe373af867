//! Shared helpers for integration tests.
#![allow(dead_code)] // not every test binary uses every helper

use ldap_schema_engine::{AttributeType, EmbeddedLoader, SchemaManager, Usage};

/// IA5 String syntax, present in the system schema.
pub const IA5_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.26";
/// Directory String syntax.
pub const DIRECTORY_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.15";
/// DN syntax.
pub const DN_SYNTAX: &str = "1.3.6.1.4.1.1466.115.121.1.12";
/// distinguishedNameMatch.
pub const DN_MATCH: &str = "2.5.13.1";
/// modifiersName, an operational attribute of the system schema.
pub const MODIFIERS_NAME: &str = "2.5.18.4";

/// A manager with the embedded system schema loaded.
pub async fn load_system() -> SchemaManager {
    let manager = SchemaManager::new(EmbeddedLoader::new());
    assert!(
        manager.load_with_deps("system").await,
        "system schema must load cleanly: {:?}",
        manager.get_errors()
    );
    manager
}

/// A user attribute type with an equality rule and the IA5 String syntax.
pub fn user_attribute(oid: &str) -> AttributeType {
    let mut at = AttributeType::new(oid);
    at.equality = Some(DN_MATCH.to_string());
    at.syntax = Some(IA5_STRING.to_string());
    at.usage = Usage::UserApplications;
    at
}

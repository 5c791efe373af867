//! Embedded system schema.
//!
//! The bootstrap schema every directory needs before any other schema can
//! load: the core syntaxes with their checkers, the core matching rules
//! with their normalizer/comparator pairs, the operational attribute types
//! and the root object classes. Embedded as JSON and deserialized through
//! the same path external schema documents take.

/// Returns the `system` schema as a JSON document.
pub fn system_schema() -> &'static str {
    r#"{
  "name": "system",
  "owner": "uid=admin,ou=system",
  "dependencies": [],
  "syntaxCheckers": [
    { "oid": "1.3.6.1.4.1.1466.115.121.1.7", "fqcn": "dirserver.checkers.BooleanSyntaxChecker" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.12", "fqcn": "dirserver.checkers.DnSyntaxChecker" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.15", "fqcn": "dirserver.checkers.DirectoryStringSyntaxChecker" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.24", "fqcn": "dirserver.checkers.GeneralizedTimeSyntaxChecker" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.26", "fqcn": "dirserver.checkers.Ia5StringSyntaxChecker" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.27", "fqcn": "dirserver.checkers.IntegerSyntaxChecker" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.38", "fqcn": "dirserver.checkers.OidSyntaxChecker" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.58", "fqcn": "dirserver.checkers.SubstringAssertionSyntaxChecker" }
  ],
  "normalizers": [
    { "oid": "2.5.13.0", "fqcn": "dirserver.normalizers.ObjectIdentifierNormalizer" },
    { "oid": "2.5.13.1", "fqcn": "dirserver.normalizers.DnNormalizer" },
    { "oid": "2.5.13.2", "fqcn": "dirserver.normalizers.CaseIgnoreNormalizer" },
    { "oid": "2.5.13.3", "fqcn": "dirserver.normalizers.CaseIgnoreNormalizer" },
    { "oid": "2.5.13.4", "fqcn": "dirserver.normalizers.CaseIgnoreSubstringNormalizer" },
    { "oid": "2.5.13.13", "fqcn": "dirserver.normalizers.BooleanNormalizer" },
    { "oid": "2.5.13.14", "fqcn": "dirserver.normalizers.IntegerNormalizer" },
    { "oid": "2.5.13.27", "fqcn": "dirserver.normalizers.GeneralizedTimeNormalizer" }
  ],
  "comparators": [
    { "oid": "2.5.13.0", "fqcn": "dirserver.comparators.ObjectIdentifierComparator" },
    { "oid": "2.5.13.1", "fqcn": "dirserver.comparators.DnComparator" },
    { "oid": "2.5.13.2", "fqcn": "dirserver.comparators.CaseIgnoreComparator" },
    { "oid": "2.5.13.3", "fqcn": "dirserver.comparators.CaseIgnoreOrderingComparator" },
    { "oid": "2.5.13.4", "fqcn": "dirserver.comparators.CaseIgnoreSubstringComparator" },
    { "oid": "2.5.13.13", "fqcn": "dirserver.comparators.BooleanComparator" },
    { "oid": "2.5.13.14", "fqcn": "dirserver.comparators.IntegerComparator" },
    { "oid": "2.5.13.27", "fqcn": "dirserver.comparators.GeneralizedTimeComparator" }
  ],
  "ldapSyntaxes": [
    { "oid": "1.3.6.1.4.1.1466.115.121.1.7", "description": "Boolean" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.12", "description": "DN" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.15", "description": "Directory String" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.24", "description": "Generalized Time" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.26", "description": "IA5 String" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.27", "description": "INTEGER" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.38", "description": "OID" },
    { "oid": "1.3.6.1.4.1.1466.115.121.1.58", "description": "Substring Assertion" }
  ],
  "matchingRules": [
    { "oid": "2.5.13.0", "names": ["objectIdentifierMatch"], "syntax": "1.3.6.1.4.1.1466.115.121.1.38" },
    { "oid": "2.5.13.1", "names": ["distinguishedNameMatch"], "syntax": "1.3.6.1.4.1.1466.115.121.1.12" },
    { "oid": "2.5.13.2", "names": ["caseIgnoreMatch"], "syntax": "1.3.6.1.4.1.1466.115.121.1.15" },
    { "oid": "2.5.13.3", "names": ["caseIgnoreOrderingMatch"], "syntax": "1.3.6.1.4.1.1466.115.121.1.15" },
    { "oid": "2.5.13.4", "names": ["caseIgnoreSubstringsMatch"], "syntax": "1.3.6.1.4.1.1466.115.121.1.58" },
    { "oid": "2.5.13.13", "names": ["booleanMatch"], "syntax": "1.3.6.1.4.1.1466.115.121.1.7" },
    { "oid": "2.5.13.14", "names": ["integerMatch"], "syntax": "1.3.6.1.4.1.1466.115.121.1.27" },
    { "oid": "2.5.13.27", "names": ["generalizedTimeMatch"], "syntax": "1.3.6.1.4.1.1466.115.121.1.24" }
  ],
  "attributeTypes": [
    {
      "oid": "2.5.4.0",
      "names": ["objectClass"],
      "description": "RFC 4512: object classes of the entity",
      "equality": "objectIdentifierMatch",
      "syntax": "1.3.6.1.4.1.1466.115.121.1.38"
    },
    {
      "oid": "2.5.4.41",
      "names": ["name"],
      "description": "RFC 4519: common supertype of name attributes",
      "equality": "caseIgnoreMatch",
      "substring": "caseIgnoreSubstringsMatch",
      "syntax": "1.3.6.1.4.1.1466.115.121.1.15"
    },
    {
      "oid": "2.5.4.3",
      "names": ["cn", "commonName"],
      "description": "RFC 4519: common name(s) for which the entity is known by",
      "superior": "name"
    },
    {
      "oid": "2.5.4.4",
      "names": ["sn", "surname"],
      "description": "RFC 4519: last (family) name(s) for which the entity is known by",
      "superior": "name"
    },
    {
      "oid": "2.5.4.13",
      "names": ["description"],
      "description": "RFC 4519: descriptive information",
      "equality": "caseIgnoreMatch",
      "substring": "caseIgnoreSubstringsMatch",
      "syntax": "1.3.6.1.4.1.1466.115.121.1.15"
    },
    {
      "oid": "2.5.18.1",
      "names": ["createTimestamp"],
      "description": "RFC 4512: time which object was created",
      "equality": "generalizedTimeMatch",
      "syntax": "1.3.6.1.4.1.1466.115.121.1.24",
      "singleValued": true,
      "noUserModification": true,
      "usage": "directoryOperation"
    },
    {
      "oid": "2.5.18.2",
      "names": ["modifyTimestamp"],
      "description": "RFC 4512: time which object was last modified",
      "equality": "generalizedTimeMatch",
      "syntax": "1.3.6.1.4.1.1466.115.121.1.24",
      "singleValued": true,
      "noUserModification": true,
      "usage": "directoryOperation"
    },
    {
      "oid": "2.5.18.3",
      "names": ["creatorsName"],
      "description": "RFC 4512: name of creator",
      "equality": "distinguishedNameMatch",
      "syntax": "1.3.6.1.4.1.1466.115.121.1.12",
      "singleValued": true,
      "noUserModification": true,
      "usage": "directoryOperation"
    },
    {
      "oid": "2.5.18.4",
      "names": ["modifiersName"],
      "description": "RFC 4512: name of last modifier",
      "equality": "distinguishedNameMatch",
      "syntax": "1.3.6.1.4.1.1466.115.121.1.12",
      "singleValued": true,
      "noUserModification": true,
      "usage": "directoryOperation"
    }
  ],
  "objectClasses": [
    {
      "oid": "2.5.6.0",
      "names": ["top"],
      "description": "top of the superclass chain",
      "kind": "ABSTRACT",
      "must": ["objectClass"]
    },
    {
      "oid": "2.5.6.6",
      "names": ["person"],
      "description": "RFC 4519: a person",
      "kind": "STRUCTURAL",
      "superiors": ["top"],
      "must": ["sn", "cn"],
      "may": ["description"]
    }
  ]
}
"#
}

#[cfg(test)]
mod tests {
    use crate::schema::SchemaDocument;

    #[test]
    fn system_schema_parses() {
        let doc: SchemaDocument = serde_json::from_str(super::system_schema()).unwrap();
        assert_eq!(doc.schema.name, "system");
        assert!(doc.schema.dependencies.is_empty());
        assert_eq!(doc.content.ldap_syntaxes.len(), 8);
        assert_eq!(doc.content.matching_rules.len(), 8);
        assert_eq!(doc.content.normalizers.len(), 8);
        assert_eq!(doc.content.comparators.len(), 8);
        assert_eq!(doc.content.syntax_checkers.len(), 8);
        assert_eq!(doc.content.attribute_types.len(), 9);
        assert_eq!(doc.content.object_classes.len(), 2);
    }
}

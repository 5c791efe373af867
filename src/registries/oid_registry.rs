//! Bi-directional OID / name mapping.

use crate::error::{SchemaViolation, ViolationCode, ViolationResult};
use crate::model::{is_numeric_oid, SchemaObjectKind};
use std::collections::HashMap;

/// Normalizes a descriptor name: ASCII-lowercase, trimmed, with internal
/// whitespace runs collapsed to a single space.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;
    for c in name.trim().chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c.to_ascii_lowercase());
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
struct OidEntry {
    kind: SchemaObjectKind,
    /// Normalized names registered for this (oid, kind) pair.
    names: Vec<String>,
}

/// Maps OIDs to their registered names and kinds, and names back to OIDs.
///
/// The registry holds weak back-references only; the typed registries own
/// the entities. An OID may be claimed by two kinds only where RFC 4512
/// itself overlaps them (matching rule / matching rule use, object class /
/// DIT content rule). A name may never map to two different OIDs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OidRegistry {
    entries: HashMap<String, Vec<OidEntry>>,
    by_name: HashMap<String, (String, SchemaObjectKind)>,
}

impl OidRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an OID with its names under the given kind.
    ///
    /// Fails with `AlreadyExists` when the OID is claimed by an incompatible
    /// kind and with `DuplicateName` when a name already maps to a different
    /// OID.
    pub fn register(
        &mut self,
        oid: &str,
        names: &[String],
        kind: SchemaObjectKind,
    ) -> ViolationResult<()> {
        if let Some(existing) = self.entries.get(oid) {
            for entry in existing {
                if entry.kind == kind || !entry.kind.shares_oid_with(kind) {
                    return Err(SchemaViolation::new(
                        ViolationCode::AlreadyExists,
                        kind,
                        oid,
                        format!("OID is already registered as a {}", entry.kind),
                    ));
                }
            }
        }

        let normalized: Vec<String> = names.iter().map(|n| normalize_name(n)).collect();
        for name in &normalized {
            if let Some((other_oid, other_kind)) = self.by_name.get(name) {
                if other_oid != oid {
                    return Err(SchemaViolation::new(
                        ViolationCode::DuplicateName,
                        kind,
                        oid,
                        format!("name '{name}' already maps to {other_kind} {other_oid}"),
                    )
                    .referencing(other_oid.clone()));
                }
            }
        }

        for name in &normalized {
            self.by_name
                .entry(name.clone())
                .or_insert_with(|| (oid.to_string(), kind));
        }
        self.entries.entry(oid.to_string()).or_default().push(OidEntry {
            kind,
            names: normalized,
        });
        Ok(())
    }

    /// Removes the (oid, kind) registration and the names it brought in.
    pub fn unregister(&mut self, oid: &str, kind: SchemaObjectKind) {
        let Some(entries) = self.entries.get_mut(oid) else {
            return;
        };
        let Some(pos) = entries.iter().position(|e| e.kind == kind) else {
            return;
        };
        let removed = entries.remove(pos);
        if entries.is_empty() {
            self.entries.remove(oid);
        }
        for name in removed.names {
            match self.by_name.get(&name) {
                Some((mapped_oid, mapped_kind))
                    if mapped_oid == oid && *mapped_kind == kind =>
                {
                    self.by_name.remove(&name);
                    // The name may still be claimed by the overlapping kind.
                    if let Some(remaining) = self.entries.get(oid) {
                        if let Some(entry) =
                            remaining.iter().find(|e| e.names.contains(&name))
                        {
                            self.by_name
                                .insert(name, (oid.to_string(), entry.kind));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Whether any kind claims this OID.
    pub fn has_oid(&self, oid: &str) -> bool {
        self.entries.contains_key(oid)
    }

    /// The kinds registered under an OID, if any.
    pub fn kinds_of(&self, oid: &str) -> Vec<SchemaObjectKind> {
        self.entries
            .get(oid)
            .map(|entries| entries.iter().map(|e| e.kind).collect())
            .unwrap_or_default()
    }

    /// Looks a name up, returning the OID and kind it maps to.
    pub fn lookup_by_name(&self, name: &str) -> Option<(&str, SchemaObjectKind)> {
        self.by_name
            .get(&normalize_name(name))
            .map(|(oid, kind)| (oid.as_str(), *kind))
    }

    /// Canonicalizes an identifier: dotted-decimal input passes through,
    /// anything else resolves as a name.
    pub fn oid_for(&self, id: &str) -> Option<String> {
        if is_numeric_oid(id) {
            Some(id.to_string())
        } else {
            self.lookup_by_name(id).map(|(oid, _)| oid.to_string())
        }
    }

    /// Registered names for an (oid, kind) pair, normalized.
    pub fn names_of(&self, oid: &str, kind: SchemaObjectKind) -> &[String] {
        self.entries
            .get(oid)
            .and_then(|entries| entries.iter().find(|e| e.kind == kind))
            .map(|e| e.names.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_normalization() {
        assert_eq!(normalize_name("  Common   Name "), "common name");
        assert_eq!(normalize_name("distinguishedNameMatch"), "distinguishednamematch");
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = OidRegistry::new();
        registry
            .register(
                "2.5.4.3",
                &["cn".into(), "commonName".into()],
                SchemaObjectKind::AttributeType,
            )
            .unwrap();

        assert!(registry.has_oid("2.5.4.3"));
        let (oid, kind) = registry.lookup_by_name("CommonName").unwrap();
        assert_eq!(oid, "2.5.4.3");
        assert_eq!(kind, SchemaObjectKind::AttributeType);
        assert_eq!(registry.oid_for("cn").as_deref(), Some("2.5.4.3"));
        assert_eq!(registry.oid_for("2.5.4.3").as_deref(), Some("2.5.4.3"));
    }

    #[test]
    fn duplicate_oid_rejected_across_kinds() {
        let mut registry = OidRegistry::new();
        registry
            .register("2.5.4.3", &[], SchemaObjectKind::AttributeType)
            .unwrap();
        let err = registry
            .register("2.5.4.3", &[], SchemaObjectKind::ObjectClass)
            .unwrap_err();
        assert_eq!(err.code, ViolationCode::AlreadyExists);
    }

    #[test]
    fn matching_rule_use_may_share_its_rules_oid() {
        let mut registry = OidRegistry::new();
        registry
            .register("2.5.13.2", &["caseIgnoreMatch".into()], SchemaObjectKind::MatchingRule)
            .unwrap();
        registry
            .register("2.5.13.2", &[], SchemaObjectKind::MatchingRuleUse)
            .unwrap();
        assert_eq!(registry.kinds_of("2.5.13.2").len(), 2);

        registry.unregister("2.5.13.2", SchemaObjectKind::MatchingRuleUse);
        assert_eq!(registry.kinds_of("2.5.13.2"), vec![SchemaObjectKind::MatchingRule]);
        assert!(registry.lookup_by_name("caseignorematch").is_some());
    }

    #[test]
    fn name_collision_rejected() {
        let mut registry = OidRegistry::new();
        registry
            .register("2.5.4.3", &["cn".into()], SchemaObjectKind::AttributeType)
            .unwrap();
        let err = registry
            .register("1.1.1", &["CN".into()], SchemaObjectKind::AttributeType)
            .unwrap_err();
        assert_eq!(err.code, ViolationCode::DuplicateName);
    }

    #[test]
    fn unregister_frees_names() {
        let mut registry = OidRegistry::new();
        registry
            .register("2.5.4.3", &["cn".into()], SchemaObjectKind::AttributeType)
            .unwrap();
        registry.unregister("2.5.4.3", SchemaObjectKind::AttributeType);
        assert!(!registry.has_oid("2.5.4.3"));
        assert!(registry.lookup_by_name("cn").is_none());
        registry
            .register("1.1.1", &["cn".into()], SchemaObjectKind::AttributeType)
            .unwrap();
    }
}

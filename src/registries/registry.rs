//! Generic per-kind entity store.

use super::oid_registry::OidRegistry;
use crate::error::{SchemaViolation, ViolationCode, ViolationResult};
use crate::model::{is_numeric_oid, SchemaObject};
use std::collections::BTreeMap;

/// A typed registry owning every entity of one kind.
///
/// Registries are passive: they enforce OID and name uniqueness through the
/// shared [`OidRegistry`] and nothing else. Cross-kind rules belong to the
/// resolver and the validator. Iteration is stable (OID order) so integrity
/// checks see a deterministic sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry<T: SchemaObject> {
    by_oid: BTreeMap<String, T>,
}

impl<T: SchemaObject> Default for Registry<T> {
    fn default() -> Self {
        Self {
            by_oid: BTreeMap::new(),
        }
    }
}

impl<T: SchemaObject> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity, claiming its OID and names in the OidRegistry.
    pub fn register(&mut self, entity: T, oids: &mut OidRegistry) -> ViolationResult<()> {
        let oid = entity.oid().to_string();
        if self.by_oid.contains_key(&oid) {
            return Err(SchemaViolation::new(
                ViolationCode::AlreadyExists,
                T::KIND,
                oid,
                "an entity of this kind already uses the OID",
            ));
        }
        oids.register(&oid, entity.names(), T::KIND)?;
        self.by_oid.insert(oid, entity);
        Ok(())
    }

    /// Removes an entity and releases its OID and names.
    pub fn unregister(&mut self, oid: &str, oids: &mut OidRegistry) -> ViolationResult<T> {
        match self.by_oid.remove(oid) {
            Some(entity) => {
                oids.unregister(oid, T::KIND);
                Ok(entity)
            }
            None => Err(SchemaViolation::new(
                ViolationCode::NoSuchEntity,
                T::KIND,
                oid,
                "no entity of this kind uses the OID",
            )),
        }
    }

    /// Direct access by canonical OID.
    pub fn get(&self, oid: &str) -> Option<&T> {
        self.by_oid.get(oid)
    }

    pub fn get_mut(&mut self, oid: &str) -> Option<&mut T> {
        self.by_oid.get_mut(oid)
    }

    /// Looks an entity up by OID or by any of its names.
    pub fn lookup(&self, id: &str, oids: &OidRegistry) -> Option<&T> {
        if is_numeric_oid(id) {
            self.by_oid.get(id)
        } else {
            let (oid, _) = oids.lookup_by_name(id)?;
            self.by_oid.get(oid)
        }
    }

    pub fn contains(&self, oid: &str) -> bool {
        self.by_oid.contains_key(oid)
    }

    /// The schema an entity belongs to.
    pub fn schema_name_of(&self, oid: &str) -> Option<&str> {
        self.by_oid.get(oid).map(|e| e.schema_name())
    }

    /// Stable, OID-ordered iteration.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.by_oid.values()
    }

    pub fn len(&self) -> usize {
        self.by_oid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_oid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeType;

    fn cn() -> AttributeType {
        let mut at = AttributeType::new("2.5.4.3");
        at.names = vec!["cn".into(), "commonName".into()];
        at.schema_name = "core".into();
        at
    }

    #[test]
    fn register_lookup_unregister() {
        let mut oids = OidRegistry::new();
        let mut registry = Registry::<AttributeType>::new();
        registry.register(cn(), &mut oids).unwrap();

        assert!(registry.contains("2.5.4.3"));
        assert_eq!(registry.lookup("commonName", &oids).unwrap().oid, "2.5.4.3");
        assert_eq!(registry.lookup("2.5.4.3", &oids).unwrap().oid, "2.5.4.3");
        assert_eq!(registry.schema_name_of("2.5.4.3"), Some("core"));

        let err = registry.register(cn(), &mut oids).unwrap_err();
        assert_eq!(err.code, ViolationCode::AlreadyExists);

        registry.unregister("2.5.4.3", &mut oids).unwrap();
        assert!(registry.lookup("cn", &oids).is_none());
        let err = registry.unregister("2.5.4.3", &mut oids).unwrap_err();
        assert_eq!(err.code, ViolationCode::NoSuchEntity);
    }

    #[test]
    fn iteration_is_oid_ordered() {
        let mut oids = OidRegistry::new();
        let mut registry = Registry::<AttributeType>::new();
        for oid in ["2.5.4.41", "2.5.4.3", "2.5.18.4"] {
            registry
                .register(AttributeType::new(oid), &mut oids)
                .unwrap();
        }
        let seen: Vec<&str> = registry.iter().map(|at| at.oid.as_str()).collect();
        assert_eq!(seen, vec!["2.5.18.4", "2.5.4.3", "2.5.4.41"]);
    }
}

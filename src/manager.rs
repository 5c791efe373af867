//! The schema manager.
//!
//! `SchemaManager` orchestrates loading, mutations, validation and lookup
//! over one registry set. Mutations are all-or-nothing: every write stages
//! a clone of the registries, runs the factory, the per-kind rules and the
//! reference-integrity resolver against it, and swaps the clone in only
//! when everything passes. On rejection the committed registries are
//! untouched and [`SchemaManager::get_errors`] returns the violations of
//! the failed operation.
//!
//! Concurrency follows a single-writer model: one reader-writer lock guards
//! the registry set, validation runs entirely inside the writer's critical
//! section, and loader I/O happens outside the lock. Multiple managers are
//! independent; nothing here is global.

use crate::error::{SchemaError, SchemaResult, SchemaViolation, ViolationCode};
use crate::factory;
use crate::model::{
    AnySchemaObject, AttributeType, Comparator, DitContentRule, DitStructureRule, LdapSyntax,
    MatchingRule, MatchingRuleUse, NameForm, Normalizer, ObjectClass, SchemaObjectKind,
    SyntaxChecker,
};
use crate::registries::Registries;
use crate::resolver;
use crate::schema::{Schema, SchemaLoader};
use crate::validation;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Schema assigned to entities added without one.
pub const DEFAULT_SCHEMA_NAME: &str = "other";

/// Receives load/unload events, fired inside the writer critical section
/// after the commit. Callbacks must not call back into the manager.
pub trait SchemaListener: Send + Sync {
    fn schema_loaded(&self, _schema: &Schema) {}
    fn schema_unloaded(&self, _schema: &Schema) {}
}

#[derive(Debug, Default)]
struct ManagerState {
    registries: Registries,
    errors: Vec<SchemaViolation>,
}

/// The in-memory schema authority.
pub struct SchemaManager {
    loader: Box<dyn SchemaLoader>,
    state: RwLock<ManagerState>,
    listeners: Mutex<Vec<Box<dyn SchemaListener>>>,
}

/// Kind preference for deletes addressed by bare OID: dependent kinds
/// before the entities they piggyback on, functional objects last.
const DELETE_KIND_ORDER: [SchemaObjectKind; 11] = [
    SchemaObjectKind::DitStructureRule,
    SchemaObjectKind::DitContentRule,
    SchemaObjectKind::NameForm,
    SchemaObjectKind::MatchingRuleUse,
    SchemaObjectKind::ObjectClass,
    SchemaObjectKind::AttributeType,
    SchemaObjectKind::MatchingRule,
    SchemaObjectKind::LdapSyntax,
    SchemaObjectKind::Normalizer,
    SchemaObjectKind::Comparator,
    SchemaObjectKind::SyntaxChecker,
];

impl SchemaManager {
    /// Creates a manager bound to a loader, with empty registries. Nothing
    /// is loaded until [`load_with_deps`](Self::load_with_deps) is called.
    pub fn new(loader: impl SchemaLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            state: RwLock::new(ManagerState::default()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ManagerState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ManagerState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a load/unload listener.
    pub fn register_listener(&self, listener: impl SchemaListener + 'static) {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Box::new(listener));
    }

    fn notify_loaded(&self, schema: &Schema) {
        for listener in self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
        {
            listener.schema_loaded(schema);
        }
    }

    fn notify_unloaded(&self, schema: &Schema) {
        for listener in self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
        {
            listener.schema_unloaded(schema);
        }
    }

    // --- loading --------------------------------------------------------

    /// Loads the named schema and all of its transitive dependencies, in
    /// dependency order. Already-loaded schemas are skipped, so the call is
    /// idempotent. Returns `true` when everything loaded without a single
    /// violation; partial results stay committed (a load is cancellable
    /// only between whole schemas) and [`get_errors`](Self::get_errors)
    /// reports what went wrong.
    pub async fn load_with_deps(&self, name: &str) -> bool {
        let mut errors: Vec<SchemaViolation> = Vec::new();

        let listed = match self.loader.list_schemas().await {
            Ok(listed) => listed,
            Err(e) => {
                errors.push(SchemaViolation::unknown_subject(
                    ViolationCode::SchemaDependencyMissing,
                    name,
                    format!("loader failed to list schemas: {e}"),
                ));
                return self.finish(errors);
            }
        };
        let metas: HashMap<String, Schema> = listed
            .into_iter()
            .map(|schema| (schema.name.clone(), schema))
            .collect();

        let mut order = Vec::new();
        if let Err(v) = topo_order(name, &metas, &mut order, &mut HashMap::new()) {
            errors.push(v);
            return self.finish(errors);
        }

        for schema_name in order {
            if self.read().registries.is_schema_loaded(&schema_name) {
                continue;
            }
            let meta = metas
                .get(&schema_name)
                .expect("topological order only contains listed schemas")
                .clone();

            // I/O outside the lock.
            let content = match self.loader.load_schema(&schema_name).await {
                Ok(content) => content,
                Err(e) => {
                    errors.push(SchemaViolation::unknown_subject(
                        ViolationCode::SchemaDependencyMissing,
                        &schema_name,
                        format!("loader failed: {e}"),
                    ));
                    break;
                }
            };
            let entities = content.into_entities(&schema_name);

            if !meta.enabled {
                // Park the content; enabling replays it.
                let mut st = self.write();
                let mut schema = meta.clone();
                schema.stashed = entities;
                st.registries.insert_schema(schema);
                info!("schema {schema_name} loaded disabled");
                continue;
            }

            let mut st = self.write();
            let mut stage = st.registries.clone();
            let batch_errors = register_batch(&mut stage, entities);
            let skipped = !batch_errors.is_empty();
            errors.extend(batch_errors);

            let leftover = resolver::check(&stage);
            if !leftover.is_empty() {
                errors.extend(leftover);
                warn!("schema {schema_name} left dangling references, not committed");
                continue;
            }
            stage.insert_schema(meta.clone());
            st.registries = stage;
            info!(
                "schema {schema_name} loaded{}",
                if skipped { " with skipped descriptors" } else { "" }
            );
            // Listeners fire inside the writer critical section.
            self.notify_loaded(&meta);
        }

        self.finish(errors)
    }

    fn finish(&self, errors: Vec<SchemaViolation>) -> bool {
        let mut st = self.write();
        let ok = errors.is_empty();
        st.errors = errors;
        ok
    }

    // --- mutations ------------------------------------------------------

    /// Atomically adds one entity. On failure nothing changes and the
    /// violations are available through [`get_errors`](Self::get_errors).
    pub fn add(&self, entity: impl Into<AnySchemaObject>) -> bool {
        let mut entity = entity.into();
        if entity.schema_name().is_empty() {
            entity.set_schema_name(DEFAULT_SCHEMA_NAME);
        }
        let mut st = self.write();
        st.errors.clear();

        match stage_add(&st.registries, entity) {
            Ok(stage) => {
                st.registries = stage;
                true
            }
            Err(violations) => {
                debug!("add rejected: {:?}", violations);
                st.errors = violations;
                false
            }
        }
    }

    /// Deletes the entity the id denotes. Fails with `StillReferenced`
    /// while any other registered entity references it. When a bare OID is
    /// shared between a matching rule and its matching rule use (or an
    /// object class and its content rule), the dependent entity is deleted
    /// first.
    pub fn delete(&self, id: &str) -> bool {
        let mut st = self.write();
        st.errors.clear();

        let Some(oid) = st.registries.oid_registry().oid_for(id) else {
            st.errors.push(SchemaViolation::unknown_subject(
                ViolationCode::NoSuchEntity,
                id,
                "no registered entity under this id",
            ));
            return false;
        };
        let kinds = st.registries.oid_registry().kinds_of(&oid);
        let Some(kind) = DELETE_KIND_ORDER.iter().copied().find(|k| kinds.contains(k)) else {
            st.errors.push(SchemaViolation::unknown_subject(
                ViolationCode::NoSuchEntity,
                oid,
                "no registered entity under this id",
            ));
            return false;
        };
        self.delete_kind_locked(&mut st, kind, &oid)
    }

    /// Deletes an entity of a specific kind; needed when an OID is shared
    /// and the preference order of [`delete`](Self::delete) picks the wrong
    /// entity.
    pub fn delete_kind(&self, kind: SchemaObjectKind, id: &str) -> bool {
        let mut st = self.write();
        st.errors.clear();
        let Some(oid) = st.registries.oid_registry().oid_for(id) else {
            st.errors.push(SchemaViolation::unknown_subject(
                ViolationCode::NoSuchEntity,
                id,
                "no registered entity under this id",
            ));
            return false;
        };
        self.delete_kind_locked(&mut st, kind, &oid)
    }

    fn delete_kind_locked(
        &self,
        st: &mut ManagerState,
        kind: SchemaObjectKind,
        oid: &str,
    ) -> bool {
        let users = st.registries.users_of(kind, oid);
        if !users.is_empty() {
            let (user_kind, user_oid) = &users[0];
            st.errors.push(
                SchemaViolation::new(
                    ViolationCode::StillReferenced,
                    kind,
                    oid,
                    format!("still referenced by {user_kind} {user_oid} ({} in total)", users.len()),
                )
                .referencing(user_oid.clone()),
            );
            return false;
        }

        let mut stage = st.registries.clone();
        match stage.unregister(kind, oid) {
            Ok(_) => {
                let leftover = resolver::check(&stage);
                if !leftover.is_empty() {
                    st.errors = leftover;
                    return false;
                }
                st.registries = stage;
                debug!("deleted {kind} {oid}");
                true
            }
            Err(v) => {
                st.errors.push(v);
                false
            }
        }
    }

    /// Replaces an entity with a new definition under the same OID: a
    /// delete and a re-add inside one validated transition. Attribute types
    /// inheriting from the modified entity are relinked and revalidated as
    /// part of the same transition.
    pub fn modify(&self, entity: impl Into<AnySchemaObject>) -> bool {
        let mut entity = entity.into();
        let kind = entity.kind();
        let oid = entity.oid().to_string();

        let mut st = self.write();
        st.errors.clear();

        let Some(existing) = st.registries.get_any(kind, &oid) else {
            st.errors.push(SchemaViolation::new(
                ViolationCode::NoSuchEntity,
                kind,
                oid,
                "no entity of this kind to modify",
            ));
            return false;
        };
        if entity.schema_name().is_empty() {
            entity.set_schema_name(existing.schema_name());
        }

        let mut stage = st.registries.clone();
        let staged = (|| -> Result<(), SchemaViolation> {
            stage.unregister(kind, &oid)?;
            let linked = factory::link(entity, &stage)?;
            validation::check_entity(&linked, &stage)?;
            stage.register(linked)?;
            relink_dependents(&mut stage, kind, &oid)?;
            Ok(())
        })();

        match staged {
            Ok(()) => {
                let leftover = resolver::check(&stage);
                if !leftover.is_empty() {
                    st.errors = leftover;
                    return false;
                }
                st.registries = stage;
                debug!("modified {kind} {oid}");
                true
            }
            Err(v) => {
                debug!("modify rejected: {v}");
                st.errors.push(v);
                false
            }
        }
    }

    // --- schema lifecycle ----------------------------------------------

    /// Enables a previously disabled schema by replaying its parked
    /// entities. All declared dependencies must be loaded and enabled.
    pub fn enable_schema(&self, name: &str) -> bool {
        let mut st = self.write();
        st.errors.clear();

        let Some(schema) = st.registries.schema(name).cloned() else {
            st.errors.push(SchemaViolation::unknown_subject(
                ViolationCode::SchemaDependencyMissing,
                name,
                "schema is not loaded",
            ));
            return false;
        };
        if schema.enabled {
            return true;
        }
        for dep in &schema.dependencies {
            let satisfied = st
                .registries
                .schema(dep)
                .map(|s| s.enabled)
                .unwrap_or(false);
            if !satisfied {
                st.errors.push(SchemaViolation::unknown_subject(
                    ViolationCode::SchemaDependencyMissing,
                    name,
                    format!("dependency {dep} is not loaded and enabled"),
                ));
                return false;
            }
        }

        let mut stage = st.registries.clone();
        // Mark the schema enabled in the stage first, or the replayed
        // entities would be rejected as targeting a disabled schema.
        let mut enabled = schema.clone();
        enabled.enabled = true;
        enabled.stashed = Vec::new();
        stage.insert_schema(enabled.clone());

        let violations = register_batch(&mut stage, schema.stashed.clone());
        if !violations.is_empty() {
            st.errors = violations;
            return false;
        }
        let leftover = resolver::check(&stage);
        if !leftover.is_empty() {
            st.errors = leftover;
            return false;
        }
        st.registries = stage;
        info!("schema {name} enabled");
        self.notify_loaded(&enabled);
        true
    }

    /// Disables a schema, hiding exactly its entities. Fails while an
    /// enabled schema declares a dependency on it, or while any entity of
    /// another schema references one of its entities.
    pub fn disable_schema(&self, name: &str) -> bool {
        let mut st = self.write();
        st.errors.clear();

        let Some(schema) = st.registries.schema(name).cloned() else {
            st.errors.push(SchemaViolation::unknown_subject(
                ViolationCode::SchemaDependencyMissing,
                name,
                "schema is not loaded",
            ));
            return false;
        };
        if !schema.enabled {
            return true;
        }

        let dependents = st.registries.enabled_dependents_of(name);
        if !dependents.is_empty() {
            for dependent in dependents {
                st.errors.push(SchemaViolation::unknown_subject(
                    ViolationCode::SchemaStillDepended,
                    name,
                    format!("enabled schema {dependent} depends on this schema"),
                ));
            }
            return false;
        }

        let entities = st.registries.entities_of_schema(name);
        for entity in &entities {
            for (user_kind, user_oid) in st.registries.users_of(entity.kind(), entity.oid()) {
                let foreign = st
                    .registries
                    .get_any(user_kind, &user_oid)
                    .map(|user| user.schema_name() != name)
                    .unwrap_or(false);
                if foreign {
                    st.errors.push(
                        SchemaViolation::new(
                            ViolationCode::StillReferenced,
                            entity.kind(),
                            entity.oid(),
                            format!("still referenced by {user_kind} {user_oid} outside the schema"),
                        )
                        .referencing(user_oid.clone()),
                    );
                }
            }
        }
        if !st.errors.is_empty() {
            return false;
        }

        let mut stage = st.registries.clone();
        for entity in &entities {
            if let Err(v) = stage.unregister(entity.kind(), entity.oid()) {
                st.errors.push(v);
                return false;
            }
        }
        let leftover = resolver::check(&stage);
        if !leftover.is_empty() {
            st.errors = leftover;
            return false;
        }
        let mut disabled = schema.clone();
        disabled.enabled = false;
        disabled.stashed = entities;
        stage.insert_schema(disabled.clone());
        st.registries = stage;
        info!("schema {name} disabled");
        self.notify_unloaded(&disabled);
        true
    }

    // --- reads ----------------------------------------------------------

    /// The violations produced by the last mutation or load; empty after a
    /// successful operation.
    pub fn get_errors(&self) -> Vec<SchemaViolation> {
        self.read().errors.clone()
    }

    /// Snapshot of the registry set, for inspection and tests.
    pub fn registries(&self) -> Registries {
        self.read().registries.clone()
    }

    pub fn is_schema_loaded(&self, name: &str) -> bool {
        self.read().registries.is_schema_loaded(name)
    }

    pub fn is_schema_enabled(&self, name: &str) -> bool {
        self.read()
            .registries
            .schema(name)
            .map(|s| s.enabled)
            .unwrap_or(false)
    }

    pub fn loaded_schema_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .read()
            .registries
            .loaded_schemas()
            .map(|s| s.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn schema(&self, name: &str) -> Option<Schema> {
        self.read().registries.schema(name).cloned()
    }

    /// Cross-kind name resolution, walking every registry.
    pub fn oid_for_name(&self, name: &str) -> Option<String> {
        self.read().registries.oid_for_name(name)
    }
}

macro_rules! lookup_method {
    ($(#[$doc:meta])* $fn_name:ident, $accessor:ident, $ty:ty, $kind:expr) => {
        impl SchemaManager {
            $(#[$doc])*
            pub fn $fn_name(&self, id: &str) -> SchemaResult<$ty> {
                let st = self.read();
                st.registries
                    .$accessor()
                    .lookup(id, st.registries.oid_registry())
                    .cloned()
                    .ok_or_else(|| SchemaError::no_such_entity($kind, id))
            }
        }
    };
}

lookup_method!(
    /// Looks an attribute type up by OID or name.
    lookup_attribute_type,
    attribute_types,
    AttributeType,
    SchemaObjectKind::AttributeType
);
lookup_method!(
    /// Looks an object class up by OID or name.
    lookup_object_class,
    object_classes,
    ObjectClass,
    SchemaObjectKind::ObjectClass
);
lookup_method!(
    /// Looks a matching rule up by OID or name.
    lookup_matching_rule,
    matching_rules,
    MatchingRule,
    SchemaObjectKind::MatchingRule
);
lookup_method!(
    lookup_matching_rule_use,
    matching_rule_uses,
    MatchingRuleUse,
    SchemaObjectKind::MatchingRuleUse
);
lookup_method!(
    /// Looks a syntax up by OID.
    lookup_ldap_syntax,
    ldap_syntaxes,
    LdapSyntax,
    SchemaObjectKind::LdapSyntax
);
lookup_method!(
    lookup_dit_content_rule,
    dit_content_rules,
    DitContentRule,
    SchemaObjectKind::DitContentRule
);
lookup_method!(
    lookup_dit_structure_rule,
    dit_structure_rules,
    DitStructureRule,
    SchemaObjectKind::DitStructureRule
);
lookup_method!(lookup_name_form, name_forms, NameForm, SchemaObjectKind::NameForm);
lookup_method!(lookup_normalizer, normalizers, Normalizer, SchemaObjectKind::Normalizer);
lookup_method!(lookup_comparator, comparators, Comparator, SchemaObjectKind::Comparator);
lookup_method!(
    lookup_syntax_checker,
    syntax_checkers,
    SyntaxChecker,
    SchemaObjectKind::SyntaxChecker
);

/// Stages one add against a clone of `current`. Rule order: duplicate OID
/// first, then factory linking, then the per-kind semantic rules, then
/// registration and the whole-graph resolver.
fn stage_add(
    current: &Registries,
    entity: AnySchemaObject,
) -> Result<Registries, Vec<SchemaViolation>> {
    let mut stage = current.clone();
    let kind = entity.kind();
    let oid = entity.oid().to_string();

    let staged = (|| -> Result<(), SchemaViolation> {
        stage.check_oid_free(kind, &oid)?;
        ensure_target_schema(&mut stage, &entity)?;
        let linked = factory::link(entity, &stage)?;
        validation::check_entity(&linked, &stage)?;
        stage.register(linked)?;
        Ok(())
    })();

    match staged {
        Ok(()) => {
            let leftover = resolver::check(&stage);
            if leftover.is_empty() {
                debug!("added {kind} {oid}");
                Ok(stage)
            } else {
                Err(leftover)
            }
        }
        Err(v) => Err(vec![v]),
    }
}

/// Creates the target schema on first use; rejects adds into a disabled
/// schema (its entities are hidden, nothing may link against them).
fn ensure_target_schema(
    stage: &mut Registries,
    entity: &AnySchemaObject,
) -> Result<(), SchemaViolation> {
    let name = entity.schema_name().to_string();
    match stage.schema(&name) {
        Some(schema) if !schema.enabled => Err(SchemaViolation::new(
            ViolationCode::SchemaDependencyMissing,
            entity.kind(),
            entity.oid(),
            format!("schema {name} is disabled"),
        )),
        Some(_) => Ok(()),
        None => {
            stage.insert_schema(Schema::new(name));
            Ok(())
        }
    }
}

/// Registers a batch of entities, retrying the leftovers after every pass
/// so in-schema dependency order does not matter. Entities that still fail
/// when a pass makes no progress are reported and skipped.
fn register_batch(
    stage: &mut Registries,
    mut pending: Vec<AnySchemaObject>,
) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();
    while !pending.is_empty() {
        let before = pending.len();
        let mut next = Vec::new();
        let mut round_violations = Vec::new();
        for entity in pending {
            let attempt = (|| -> Result<(), SchemaViolation> {
                stage.check_oid_free(entity.kind(), entity.oid())?;
                ensure_target_schema(stage, &entity)?;
                let linked = factory::link(entity.clone(), stage)?;
                validation::check_entity(&linked, stage)?;
                stage.register(linked)?;
                Ok(())
            })();
            if let Err(v) = attempt {
                round_violations.push(v);
                next.push(entity);
            }
        }
        if next.len() == before {
            // No progress this pass; everything left is genuinely broken.
            violations.extend(round_violations);
            break;
        }
        pending = next;
    }
    violations
}

/// After a modify, recompute the inherited fields of every attribute type
/// descending from the modified entity and revalidate the object classes
/// built on it.
fn relink_dependents(
    stage: &mut Registries,
    kind: SchemaObjectKind,
    oid: &str,
) -> Result<(), SchemaViolation> {
    match kind {
        SchemaObjectKind::AttributeType => relink_attribute_children(stage, oid),
        SchemaObjectKind::ObjectClass => {
            let children: Vec<ObjectClass> = stage
                .object_classes()
                .iter()
                .filter(|oc| oc.effective_superiors.iter().any(|sup| sup == oid))
                .cloned()
                .collect();
            for child in children {
                validation::check_entity(&child.into(), stage)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn relink_attribute_children(
    stage: &mut Registries,
    oid: &str,
) -> Result<(), SchemaViolation> {
    let children: Vec<String> = stage
        .attribute_types()
        .iter()
        .filter(|at| at.effective_superior.as_deref() == Some(oid))
        .map(|at| at.oid.clone())
        .collect();
    for child_oid in children {
        let declared = stage
            .attribute_types()
            .get(&child_oid)
            .map(|at| at.as_declared())
            .expect("child listed above");
        stage.unregister(SchemaObjectKind::AttributeType, &child_oid)?;
        let linked = factory::link_attribute_type(declared, stage)?;
        validation::check_entity(&linked.clone().into(), stage)?;
        stage.register(linked.into())?;
        relink_attribute_children(stage, &child_oid)?;
    }
    Ok(())
}

fn topo_order(
    name: &str,
    metas: &HashMap<String, Schema>,
    order: &mut Vec<String>,
    marks: &mut HashMap<String, bool>,
) -> Result<(), SchemaViolation> {
    match marks.get(name) {
        Some(true) => return Ok(()),
        Some(false) => {
            return Err(SchemaViolation::unknown_subject(
                ViolationCode::SchemaDependencyMissing,
                name,
                "schema dependency cycle",
            ))
        }
        None => {}
    }
    let meta = metas.get(name).ok_or_else(|| {
        SchemaViolation::unknown_subject(
            ViolationCode::SchemaDependencyMissing,
            name,
            "loader does not provide this schema",
        )
    })?;
    marks.insert(name.to_string(), false);
    for dep in &meta.dependencies {
        topo_order(dep, metas, order, marks)?;
    }
    marks.insert(name.to_string(), true);
    order.push(name.to_string());
    Ok(())
}

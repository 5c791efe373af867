//! Schema loaders.
//!
//! Loaders are the external boundary of the engine: they produce parsed
//! schema documents from wherever schemas live - the embedded bootstrap
//! data, a directory of JSON documents, or (outside this crate) a live
//! subschema subentry. Loader I/O happens outside the registry lock.

use super::{embedded, Schema, SchemaContent, SchemaDocument};
use crate::error::{SchemaError, SchemaResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Abstract source of schemas.
///
/// The engine consumes loaders polymorphically; the only contract is that
/// the returned descriptor values are well-formed. Loaders never touch the
/// registries.
#[async_trait]
pub trait SchemaLoader: Send + Sync {
    /// The schemas this loader can provide, metadata only.
    async fn list_schemas(&self) -> SchemaResult<Vec<Schema>>;

    /// The full descriptor content of one schema.
    async fn load_schema(&self, name: &str) -> SchemaResult<SchemaContent>;
}

/// Loader serving the schemas embedded in the binary.
///
/// Out of the box it knows the `system` bootstrap schema; additional
/// documents can be registered for tests or for servers that compile their
/// schemas in.
#[derive(Debug, Clone)]
pub struct EmbeddedLoader {
    documents: HashMap<String, SchemaDocument>,
}

impl EmbeddedLoader {
    pub fn new() -> Self {
        let doc: SchemaDocument = serde_json::from_str(embedded::system_schema())
            .expect("embedded system schema must parse");
        let mut documents = HashMap::new();
        documents.insert(doc.schema.name.clone(), doc);
        Self { documents }
    }

    /// Adds a schema document, replacing any previous one of the same name.
    pub fn with_document(mut self, document: SchemaDocument) -> Self {
        self.documents
            .insert(document.schema.name.clone(), document);
        self
    }

    /// Parses and adds a JSON schema document.
    pub fn with_json(self, json: &str) -> SchemaResult<Self> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        Ok(self.with_document(document))
    }
}

impl Default for EmbeddedLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchemaLoader for EmbeddedLoader {
    async fn list_schemas(&self) -> SchemaResult<Vec<Schema>> {
        Ok(self
            .documents
            .values()
            .map(|doc| doc.schema.clone())
            .collect())
    }

    async fn load_schema(&self, name: &str) -> SchemaResult<SchemaContent> {
        self.documents
            .get(name)
            .map(|doc| doc.content.clone())
            .ok_or_else(|| SchemaError::schema_not_found(name))
    }
}

/// Loader reading one JSON schema document per file from a directory.
///
/// A schema named `core` is expected at `<dir>/core.json`. Files are read
/// with `tokio::fs`, so directory loads never block the runtime.
#[derive(Debug, Clone)]
pub struct JsonDirectoryLoader {
    dir: PathBuf,
}

impl JsonDirectoryLoader {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    async fn read_document(&self, path: &Path) -> SchemaResult<SchemaDocument> {
        let text = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl SchemaLoader for JsonDirectoryLoader {
    async fn list_schemas(&self) -> SchemaResult<Vec<Schema>> {
        let mut schemas = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_document(&path).await {
                Ok(doc) => schemas.push(doc.schema),
                Err(e) => {
                    log::warn!("skipping unreadable schema document {}: {e}", path.display());
                }
            }
        }
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(schemas)
    }

    async fn load_schema(&self, name: &str) -> SchemaResult<SchemaContent> {
        let path = self.dir.join(format!("{name}.json"));
        if !tokio::fs::try_exists(&path).await? {
            return Err(SchemaError::schema_not_found(name));
        }
        let doc = self
            .read_document(&path)
            .await
            .map_err(|e| SchemaError::loader(name, e.to_string()))?;
        Ok(doc.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embedded_loader_serves_system() {
        let loader = EmbeddedLoader::new();
        let schemas = loader.list_schemas().await.unwrap();
        assert!(schemas.iter().any(|s| s.name == "system"));

        let content = loader.load_schema("system").await.unwrap();
        assert!(!content.is_empty());

        let missing = loader.load_schema("nonexistent").await;
        assert!(matches!(missing, Err(SchemaError::SchemaNotFound { .. })));
    }

    #[tokio::test]
    async fn embedded_loader_accepts_extra_documents() {
        let loader = EmbeddedLoader::new()
            .with_json(
                r#"{
                    "name": "test",
                    "dependencies": ["system"],
                    "attributeTypes": [
                        { "oid": "1.1.1", "names": ["testAttr"], "equality": "caseIgnoreMatch",
                          "syntax": "1.3.6.1.4.1.1466.115.121.1.15" }
                    ]
                }"#,
            )
            .unwrap();
        let content = loader.load_schema("test").await.unwrap();
        assert_eq!(content.attribute_types.len(), 1);
    }
}

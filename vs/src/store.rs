//! On-disk store of saved vector indexes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::index::{Node, VectorIndex};

/// Unique identifier for a saved index
pub type IndexId = String;

const MANIFEST_FILE: &str = "manifest.json";
const NODES_FILE: &str = "nodes.jsonl";

/// Metadata describing a saved index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Index ID
    pub id: IndexId,
    /// Optional human label (usually the request that built the index)
    pub label: Option<String>,
    /// When the index was saved
    pub created_at: DateTime<Utc>,
    /// Embedding dimension
    pub dimensions: usize,
    /// Number of nodes
    pub node_count: usize,
    /// Titles of the indexed documents
    pub documents: Vec<String>,
}

/// Size statistics for a saved index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of nodes
    pub node_count: usize,
    /// Number of source documents
    pub document_count: usize,
    /// Total bytes of chunk text
    pub text_bytes: u64,
    /// Size of the nodes file on disk
    pub disk_bytes: u64,
}

/// A directory of saved indexes
pub struct IndexStore {
    /// Base path for storage
    base_path: PathBuf,
}

impl IndexStore {
    /// Open or create an index store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        debug!(?base_path, "Opened index store");
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Save an index under a new ID
    pub fn save(&self, index: &VectorIndex, label: Option<&str>) -> Result<IndexManifest> {
        let id = Uuid::now_v7().to_string();
        let index_path = self.base_path.join(&id);
        fs::create_dir_all(&index_path)?;

        let mut writer = BufWriter::new(fs::File::create(index_path.join(NODES_FILE))?);
        for node in index.nodes() {
            let line = serde_json::to_string(node)?;
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;

        let manifest = IndexManifest {
            id: id.clone(),
            label: label.map(str::to_string),
            created_at: Utc::now(),
            dimensions: index.dimensions().unwrap_or(0),
            node_count: index.len(),
            documents: index.document_titles(),
        };
        fs::write(index_path.join(MANIFEST_FILE), serde_json::to_string_pretty(&manifest)?)?;

        info!(index_id = %id, node_count = manifest.node_count, "Saved index");
        Ok(manifest)
    }

    /// Read the manifest of a saved index
    pub fn manifest(&self, id: &str) -> Result<IndexManifest> {
        let path = self.base_path.join(id).join(MANIFEST_FILE);
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load a saved index
    pub fn load(&self, id: &str) -> Result<(IndexManifest, VectorIndex)> {
        let manifest = self.manifest(id)?;
        let file = fs::File::open(self.base_path.join(id).join(NODES_FILE))?;
        let reader = BufReader::new(file);

        let mut index = VectorIndex::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let node: Node = serde_json::from_str(&line)?;
            index.insert(node)?;
        }

        if index.len() != manifest.node_count {
            return Err(StoreError::Corrupt {
                id: id.to_string(),
                reason: format!("manifest lists {} nodes, found {}", manifest.node_count, index.len()),
            });
        }

        debug!(index_id = %id, node_count = index.len(), "Loaded index");
        Ok((manifest, index))
    }

    /// Get statistics for a saved index
    pub fn stats(&self, id: &str) -> Result<IndexStats> {
        let manifest = self.manifest(id)?;
        let nodes_path = self.base_path.join(id).join(NODES_FILE);
        let disk_bytes = fs::metadata(&nodes_path)?.len();

        let reader = BufReader::new(fs::File::open(&nodes_path)?);
        let mut node_count = 0;
        let mut text_bytes = 0u64;
        let mut documents = std::collections::HashSet::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let node: Node = serde_json::from_str(&line)?;
            node_count += 1;
            text_bytes += node.text.len() as u64;
            documents.insert(node.doc_id);
        }

        debug!(index_id = %manifest.id, node_count, "stats: computed");
        Ok(IndexStats {
            node_count,
            document_count: documents.len(),
            text_bytes,
            disk_bytes,
        })
    }

    /// List saved indexes, oldest first
    pub fn list(&self) -> Result<Vec<IndexManifest>> {
        let mut manifests = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            if entry.path().is_dir()
                && let Some(name) = entry.file_name().to_str()
            {
                match self.manifest(name) {
                    Ok(m) => manifests.push(m),
                    Err(e) => debug!(dir = %name, error = %e, "list: skipping directory without manifest"),
                }
            }
        }

        manifests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(manifests)
    }

    /// Delete a saved index and all its data
    pub fn delete(&self, id: &str) -> Result<()> {
        let index_path = self.base_path.join(id);
        if !index_path.join(MANIFEST_FILE).exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        fs::remove_dir_all(&index_path)?;
        info!(index_id = %id, "Deleted index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_index() -> VectorIndex {
        VectorIndex::from_nodes(vec![
            Node::new("paris", "Paris", 0, "Paris is the capital of France.", vec![1.0, 0.0, 0.0]),
            Node::new("paris", "Paris", 1, "It hosts the Louvre.", vec![0.9, 0.1, 0.0]),
            Node::new("lagos", "Lagos", 0, "Lagos is a city in Nigeria.", vec![0.0, 1.0, 0.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::open(temp.path().join("store")).unwrap();
        let index = sample_index();

        let manifest = store.save(&index, Some("please index: paris, lagos")).unwrap();
        assert_eq!(manifest.node_count, 3);
        assert_eq!(manifest.dimensions, 3);
        assert_eq!(manifest.documents, vec!["Paris".to_string(), "Lagos".to_string()]);

        let (loaded_manifest, loaded) = store.load(&manifest.id).unwrap();
        assert_eq!(loaded_manifest, manifest);
        assert_eq!(loaded.nodes(), index.nodes());
    }

    #[test]
    fn test_list_and_delete() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::open(temp.path()).unwrap();

        let first = store.save(&sample_index(), None).unwrap();
        let second = store.save(&sample_index(), Some("second")).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|m| m.id).collect();
        assert!(ids.contains(&first.id));
        assert!(ids.contains(&second.id));

        store.delete(&first.id).unwrap();
        let ids: Vec<String> = store.list().unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![second.id]);
    }

    #[test]
    fn test_stats() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::open(temp.path()).unwrap();
        let manifest = store.save(&sample_index(), None).unwrap();

        let stats = store.stats(&manifest.id).unwrap();
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.document_count, 2);
        let expected_text = "Paris is the capital of France.".len() + "It hosts the Louvre.".len() + "Lagos is a city in Nigeria.".len();
        assert_eq!(stats.text_bytes, expected_text as u64);
        assert!(stats.disk_bytes > stats.text_bytes);
        assert!(matches!(store.stats("nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_missing_index() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::open(temp.path()).unwrap();

        assert!(matches!(store.load("nope"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete("nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_list_skips_foreign_directories() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::open(temp.path()).unwrap();
        fs::create_dir_all(temp.path().join("not-an-index")).unwrap();

        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_load_detects_truncated_nodes() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::open(temp.path()).unwrap();
        let manifest = store.save(&sample_index(), None).unwrap();

        let nodes_path = temp.path().join(&manifest.id).join(NODES_FILE);
        let content = fs::read_to_string(&nodes_path).unwrap();
        let first_line = content.lines().next().unwrap().to_string();
        fs::write(&nodes_path, format!("{}\n", first_line)).unwrap();

        assert!(matches!(store.load(&manifest.id), Err(StoreError::Corrupt { .. })));
    }
}

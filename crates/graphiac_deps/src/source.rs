//! Resource snapshots handed over by the discovery step.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::{DepsError, DepsResult};
use crate::model::ResourceDescriptor;

/// Anything that can supply a resource snapshot.
pub trait ResourceSource {
    fn load(&self) -> DepsResult<Vec<ResourceDescriptor>>;
}

/// A snapshot either as a bare list or wrapped in `{ "resources": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    List(Vec<ResourceDescriptor>),
    Wrapped { resources: Vec<ResourceDescriptor> },
}

impl SnapshotDocument {
    fn into_resources(self) -> Vec<ResourceDescriptor> {
        match self {
            SnapshotDocument::List(resources) => resources,
            SnapshotDocument::Wrapped { resources } => resources,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnapshotFormat {
    Json,
    Yaml,
}

/// Snapshot stored as a JSON or YAML file.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn detect_format(&self) -> DepsResult<SnapshotFormat> {
        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => Ok(SnapshotFormat::Json),
            Some("yaml") | Some("yml") => Ok(SnapshotFormat::Yaml),
            _ => Err(DepsError::UnsupportedFormat(format!(
                "{} (expected .json, .yaml or .yml)",
                self.path.display()
            ))),
        }
    }
}

impl ResourceSource for SnapshotFile {
    fn load(&self) -> DepsResult<Vec<ResourceDescriptor>> {
        let format = self.detect_format()?;
        let content = fs::read_to_string(&self.path)?;

        let document: SnapshotDocument = match format {
            SnapshotFormat::Json => serde_json::from_str(&content)?,
            SnapshotFormat::Yaml => serde_yaml::from_str(&content)?,
        };
        let resources = document.into_resources();

        info!("Loaded {} resource(s) from {:?}", resources.len(), self.path);
        Ok(resources)
    }
}

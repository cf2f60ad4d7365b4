use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Version descriptor published at `{base}/version.json` and mirrored
/// locally after a completed pass. Compared by the single `build` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    pub build: String,
}

/// Model manifest published at `{base}/model.json`. Only the weight
/// groups matter to the synchronizer; other fields pass through untouched
/// in the mirrored copy.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModelManifest {
    #[serde(default)]
    pub weights_manifest: Vec<WeightsGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WeightsGroup {
    #[serde(default)]
    pub paths: Vec<String>,
}

/// Flat list of additional files to mirror, published at `{base}/files.json`.
pub type FileList = Vec<String>;

impl ModelManifest {
    /// Flatten the weight-group paths in manifest order, dropping duplicates.
    pub fn weight_paths(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        for group in &self.weights_manifest {
            for path in &group.paths {
                if seen.insert(path.clone()) {
                    paths.push(path.clone());
                }
            }
        }
        paths
    }
}

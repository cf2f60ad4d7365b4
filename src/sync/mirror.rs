use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{MIRROR_STATE_FILE, VERSION_FILE};

use super::manifest::VersionDescriptor;

/// Bookkeeping persisted next to the mirrored files: the build of the
/// last completed pass and the remote `Last-Modified` value recorded for
/// each mirrored file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MirrorState {
    build: Option<String>,
    files: BTreeMap<String, String>,
}

/// Local mirror of the remote assets: a flat directory that accumulates
/// downloaded files plus a state document. Files are only ever
/// overwritten, never deleted, so a failed pass leaves earlier downloads
/// usable and the next pass retries in full.
pub struct MirrorStore {
    root: PathBuf,
    state_path: PathBuf,
    state: MirrorState,
}

impl MirrorStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("create mirror directory {}", root.display()))?;
        let state_path = root.join(MIRROR_STATE_FILE);
        let state = load_state(&state_path)?;
        Ok(Self {
            root,
            state_path,
            state,
        })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Resolve a mirrored file name inside the root, rejecting names
    /// that would escape it.
    pub fn file_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(anyhow!("unsafe mirror path {name:?}")),
            }
        }
        Ok(self.root.join(relative))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.file_path(name)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    pub fn write_file(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.file_path(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent of {}", path.display()))?;
        }
        fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.file_path(name)?;
        let file =
            File::open(&path).with_context(|| format!("open mirrored {}", path.display()))?;
        serde_json::from_reader(file).with_context(|| format!("parse mirrored {name}"))
    }

    /// The mirrored version descriptor, if a pass has ever completed.
    pub fn local_version(&self) -> Result<Option<VersionDescriptor>> {
        if !self.contains(VERSION_FILE) {
            return Ok(None);
        }
        self.read_json(VERSION_FILE).map(Some)
    }

    pub fn recorded_last_modified(&self, name: &str) -> Option<&str> {
        self.state.files.get(name).map(String::as_str)
    }

    pub fn record_file(&mut self, name: &str, last_modified: Option<String>) {
        match last_modified {
            Some(value) => {
                self.state.files.insert(name.to_string(), value);
            }
            None => {
                self.state.files.remove(name);
            }
        }
    }

    /// Write the version descriptor and persist the state document.
    /// Called only after every download in a pass succeeded, so a crash
    /// mid-pass leaves the old descriptor in place and the next pass
    /// runs again (downloads are idempotent overwrites).
    pub fn commit_build(&mut self, descriptor: &VersionDescriptor) -> Result<()> {
        let serialized =
            serde_json::to_vec_pretty(descriptor).context("serialize version descriptor")?;
        self.write_file(VERSION_FILE, &serialized)?;
        self.state.build = Some(descriptor.build.clone());
        self.save()
    }

    fn save(&self) -> Result<()> {
        let file = File::create(&self.state_path)
            .with_context(|| format!("create {}", self.state_path.display()))?;
        serde_json::to_writer_pretty(file, &self.state).context("write mirror state")?;
        Ok(())
    }
}

fn load_state(path: &Path) -> Result<MirrorState> {
    if !path.exists() {
        return Ok(MirrorState::default());
    }
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    serde_json::from_reader(file).context("parse mirror state")
}

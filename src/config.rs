use std::path::PathBuf;

use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::Deserialize;

/// Remote and local name of the version descriptor.
pub const VERSION_FILE: &str = "version.json";

/// Remote and local name of the model manifest.
pub const MODEL_MANIFEST_FILE: &str = "model.json";

/// Remote and local name of the flat file list.
pub const FILE_LIST_FILE: &str = "files.json";

/// Bookkeeping document kept alongside the mirrored files.
pub const MIRROR_STATE_FILE: &str = "mirror-state.json";

/// Port the local static server binds by default. Port 0 asks the OS
/// for an ephemeral port instead.
pub const DEFAULT_SERVER_PORT: u16 = 8737;

/// Base URL the assets are mirrored from.
pub const DEFAULT_REMOTE_BASE: &str = "https://assets.neuvo.ai/view";

/// Origins the hosted page is allowed to navigate to.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["https://*.neuvo.ai", "https://*.neuvola.com"];

pub(crate) static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("ai", "Neuvo", "NeuvoView"));

/// Top-level configuration for the view engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Base URL of the remote content endpoint.
    pub remote_base_url: String,
    /// Directory holding the local mirror of the remote assets.
    pub mirror_dir: PathBuf,
    /// Port for the local static server (0 = ephemeral).
    pub server_port: u16,
    /// Origin allow-list handed to the view bridge.
    pub allowed_origins: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            remote_base_url: DEFAULT_REMOTE_BASE.into(),
            mirror_dir: default_mirror_dir(),
            server_port: DEFAULT_SERVER_PORT,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|origin| origin.to_string())
                .collect(),
        }
    }
}

fn default_mirror_dir() -> PathBuf {
    PROJECT_DIRS
        .as_ref()
        .map(|dirs| dirs.data_dir().join("mirror"))
        .unwrap_or_else(|| PathBuf::from("mirror"))
}

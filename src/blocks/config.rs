use super::finder::BlockFinder;
use super::BlockGate;
use crate::repository::group::GroupService;
use crate::repository::source::FileConfigSource;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, serde::Deserialize)]
pub struct Config {
    /// Path of the per-group block table.
    #[serde(default = "Config::default_path")]
    pub path: PathBuf,
    /// Rejection text shown to blocked users.
    #[serde(default = "Config::default_message")]
    pub message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            message: Self::default_message(),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        PathBuf::from("/etc/revgate/blocks.config")
    }

    pub fn default_message() -> String {
        String::from("You have been blocked!")
    }
}

impl Config {
    pub fn build(&self, groups: Arc<dyn GroupService + Send + Sync>) -> BlockGate {
        BlockGate::new(
            self.message.clone(),
            Arc::new(FileConfigSource::new(&self.path)),
            BlockFinder::new(groups),
        )
    }
}

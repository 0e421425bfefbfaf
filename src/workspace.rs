//! Per-request workspace directories

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

pub const WORKSPACE_PREFIX: &str = "proj_";

/// Exclusively owned `proj_<hex>` directory under the workspace root.
///
/// Removal is best-effort and happens exactly once: through [`Workspace::teardown`]
/// or, if the owner unwinds first, on drop.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    removed: bool,
}

impl Workspace {
    /// Creates a fresh directory. The root must already exist.
    pub fn create(root: &Path) -> io::Result<Self> {
        let name = format!("{}{}", WORKSPACE_PREFIX, Uuid::new_v4().simple());
        let path = root.join(name);

        fs::create_dir(&path)?;
        info!("Creating unique temporary directory: {}", path.display());

        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the directory tree on the blocking pool. Returns `false` when
    /// deletion failed; the failure is only logged.
    pub async fn teardown(mut self) -> bool {
        if self.removed {
            return true;
        }
        self.removed = true;

        let path = self.path.clone();
        match tokio::task::spawn_blocking(move || remove_tree(&path)).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Teardown task for {} failed: {}", self.path.display(), e);
                false
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.removed {
            self.removed = true;
            remove_tree(&self.path);
        }
    }
}

fn remove_tree(path: &Path) -> bool {
    if !path.exists() {
        return true;
    }

    match fs::remove_dir_all(path) {
        Ok(()) => {
            info!("Cleaned up temporary directory: {}", path.display());
            true
        }
        Err(e) => {
            warn!("Could not delete temporary directory {}: {}", path.display(), e);
            false
        }
    }
}

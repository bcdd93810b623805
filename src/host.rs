//! Local host state
//!
//! Answers the questions the acquisition workflow asks about this machine:
//! who we are, whether a volume's device node is present, and whether a
//! mount point is in use. Also owns mount point directory creation and removal.

use crate::error::{PdCacheError, PdCacheResult};
use async_trait::async_trait;
use gethostname::gethostname;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Local machine queries and mount point directory management
#[async_trait]
pub trait Host: Send + Sync {
    /// Name of this instance as known to the disk service
    fn hostname(&self) -> PdCacheResult<String>;

    /// Whether the device node for an attached volume exists
    async fn device_present(&self, device: &Path) -> bool;

    /// Whether something is mounted on `mount_path`
    async fn is_mounted(&self, mount_path: &Path) -> PdCacheResult<bool>;

    /// Create the mount point directory (idempotent)
    async fn create_mount_dir(&self, path: &Path) -> PdCacheResult<()>;

    /// Remove the mount point directory (missing directories are ignored)
    async fn remove_mount_dir(&self, path: &Path) -> PdCacheResult<()>;
}

/// The machine pdcache is running on
#[derive(Debug, Clone)]
pub struct LocalHost {
    mounts_table: PathBuf,
}

impl LocalHost {
    pub fn new(mounts_table: impl Into<PathBuf>) -> Self {
        Self {
            mounts_table: mounts_table.into(),
        }
    }
}

#[async_trait]
impl Host for LocalHost {
    fn hostname(&self) -> PdCacheResult<String> {
        let name = gethostname().to_string_lossy().trim().to_string();
        if name.is_empty() {
            return Err(PdCacheError::Hostname("empty hostname".to_string()));
        }
        Ok(name)
    }

    async fn device_present(&self, device: &Path) -> bool {
        fs::try_exists(device).await.unwrap_or(false)
    }

    async fn is_mounted(&self, mount_path: &Path) -> PdCacheResult<bool> {
        let table = fs::read_to_string(&self.mounts_table).await.map_err(|e| {
            PdCacheError::io(format!("reading {}", self.mounts_table.display()), e)
        })?;
        Ok(parse_mount_points(&table).iter().any(|p| p == mount_path))
    }

    async fn create_mount_dir(&self, path: &Path) -> PdCacheResult<()> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| PdCacheError::io(format!("creating mount point {}", path.display()), e))
    }

    async fn remove_mount_dir(&self, path: &Path) -> PdCacheResult<()> {
        match fs::remove_dir(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Mount point {} already gone", path.display());
                Ok(())
            }
            Err(e) => Err(PdCacheError::io(
                format!("removing mount point {}", path.display()),
                e,
            )),
        }
    }
}

/// Mount points listed in a `/proc/mounts`-style table
pub fn parse_mount_points(table: &str) -> Vec<PathBuf> {
    table
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(|field| PathBuf::from(unescape_mount_field(field)))
        .collect()
}

/// Undo the octal escapes (`\040` for space, ...) used in mount tables
fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(value) = u8::try_from(value) {
                    out.push(value);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

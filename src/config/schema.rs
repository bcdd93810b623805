//! Configuration schema for pdcache
//!
//! Configuration is stored at `~/.config/pdcache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Disk service settings
    pub disk: DiskConfig,

    /// Mount settings
    pub mount: MountConfig,

    /// Image tool settings
    pub image: ImageConfig,

    /// External command execution settings
    pub exec: ExecConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable audit logging of disk lifecycle events
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Cloud disk service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    /// Disk management CLI
    pub tool: String,

    /// Zone holding the volumes
    pub zone: String,

    /// Size of newly created volumes in GB
    pub size_gb: u32,

    /// Directory holding stable device links
    pub device_dir: PathBuf,

    /// Prefix of the device link name (`<prefix>-<volume>`)
    pub device_prefix: String,

    /// Instance to attach to (defaults to the local hostname)
    pub instance: Option<String>,

    /// Exit codes of `getdisk` that mean the volume does not exist
    pub not_found_exit_codes: Vec<i32>,

    /// Output fragments of `getdisk` that mean the volume does not exist
    pub not_found_patterns: Vec<String>,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            tool: "gcutil".to_string(),
            zone: "us-central1-a".to_string(),
            size_gb: 5,
            device_dir: PathBuf::from("/dev/disk/by-id"),
            device_prefix: "google".to_string(),
            instance: None,
            not_found_exit_codes: vec![],
            not_found_patterns: vec![
                "was not found".to_string(),
                "notFound".to_string(),
            ],
        }
    }
}

/// Mount configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    /// Base directory for all mount points
    pub base_dir: PathBuf,

    /// Filesystem type of cache volumes
    pub fs_type: String,

    /// Helper that formats (if needed) and mounts a device
    pub format_helper: String,

    /// Filesystem creation command handed to the helper
    pub mkfs_command: String,

    /// Mount binary
    pub mount_bin: String,

    /// Unmount binary
    pub umount_bin: String,

    /// Mount table consulted to detect existing mounts
    pub mounts_table: PathBuf,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("/docker-pds"),
            fs_type: "ext4".to_string(),
            format_helper: "/usr/share/google/safe_format_and_mount".to_string(),
            mkfs_command: "mkfs.ext4 -F".to_string(),
            mount_bin: "/bin/mount".to_string(),
            umount_bin: "/bin/umount".to_string(),
            mounts_table: PathBuf::from("/proc/self/mounts"),
        }
    }
}

/// Container image tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Image tool providing `save` and `load`
    pub tool: String,

    /// Shell used for redirection and pipes
    pub shell: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            tool: "docker".to_string(),
            shell: "sh".to_string(),
        }
    }
}

/// External command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Per-command timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,
}

impl ExecConfig {
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self { timeout_secs: 600 }
    }
}

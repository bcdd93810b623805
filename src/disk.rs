//! Cloud disk lifecycle
//!
//! Thin wrappers over the disk management CLI. Each operation is one
//! invocation through the [`CommandExecutor`].

use crate::config::schema::DiskConfig;
use crate::error::{PdCacheError, PdCacheResult};
use crate::exec::CommandExecutor;
use crate::naming::VolumeName;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// How a volume is attached to an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttachMode {
    /// Exclusive, used to populate a fresh volume
    ReadWrite,
    /// Shared, used to consume a populated cache
    ReadOnly,
}

impl AttachMode {
    /// Value of the `mode=` option of `attachdisk`
    pub fn as_flag(&self) -> &'static str {
        match self {
            Self::ReadWrite => "rw",
            Self::ReadOnly => "ro",
        }
    }
}

impl fmt::Display for AttachMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadWrite => write!(f, "read-write"),
            Self::ReadOnly => write!(f, "read-only"),
        }
    }
}

/// Device link under which the host exposes an attached volume
pub fn device_path(config: &DiskConfig, volume: &VolumeName) -> PathBuf {
    config
        .device_dir
        .join(format!("{}-{}", config.device_prefix, volume))
}

/// Disk lifecycle operations
pub struct DiskOps {
    exec: Arc<dyn CommandExecutor>,
    config: DiskConfig,
}

impl DiskOps {
    pub fn new(exec: Arc<dyn CommandExecutor>, config: DiskConfig) -> Self {
        Self { exec, config }
    }

    /// Size used for newly created volumes
    pub fn default_size_gb(&self) -> u32 {
        self.config.size_gb
    }

    /// Stable device link of an attached volume
    pub fn device_path(&self, volume: &VolumeName) -> PathBuf {
        device_path(&self.config, volume)
    }

    fn zone_flag(&self) -> String {
        format!("--zone={}", self.config.zone)
    }

    async fn tool(&self, args: Vec<String>) -> PdCacheResult<String> {
        self.exec.run(&self.config.tool, &args).await
    }

    /// Check whether the volume exists.
    ///
    /// Only a failure matching the configured not-found contract is turned
    /// into `Ok(false)`; anything else is returned as an error.
    pub async fn exists(&self, volume: &VolumeName) -> PdCacheResult<bool> {
        debug!("Checking volume {}", volume);

        match self
            .tool(vec![
                "getdisk".to_string(),
                self.zone_flag(),
                volume.to_string(),
            ])
            .await
        {
            Ok(_) => {
                debug!("Volume {} exists", volume);
                Ok(true)
            }
            Err(e) if self.is_not_found(&e) => {
                debug!("Volume {} does not exist", volume);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn is_not_found(&self, err: &PdCacheError) -> bool {
        let PdCacheError::CommandExit { code, output, .. } = err else {
            return false;
        };

        if code.is_some_and(|c| self.config.not_found_exit_codes.contains(&c)) {
            return true;
        }

        self.config
            .not_found_patterns
            .iter()
            .any(|pattern| output.contains(pattern.as_str()))
    }

    /// Provision a new volume. The caller must know it does not exist yet.
    pub async fn create(&self, volume: &VolumeName, size_gb: u32) -> PdCacheResult<()> {
        info!("Creating volume {} ({} GB)", volume, size_gb);

        self.tool(vec![
            "adddisk".to_string(),
            self.zone_flag(),
            format!("--size={size_gb}"),
            volume.to_string(),
        ])
        .await?;
        Ok(())
    }

    /// Attach the volume to `instance`
    pub async fn attach(
        &self,
        volume: &VolumeName,
        instance: &str,
        mode: AttachMode,
    ) -> PdCacheResult<()> {
        info!("Attaching volume {} to {} ({})", volume, instance, mode);

        self.tool(vec![
            "attachdisk".to_string(),
            self.zone_flag(),
            format!("--disk={},mode={}", volume, mode.as_flag()),
            instance.to_string(),
        ])
        .await?;
        Ok(())
    }

    /// Detach the volume from `instance`
    pub async fn detach(&self, volume: &VolumeName, instance: &str) -> PdCacheResult<()> {
        info!("Detaching volume {} from {}", volume, instance);

        self.tool(vec![
            "detachdisk".to_string(),
            self.zone_flag(),
            format!("--device_name={volume}"),
            instance.to_string(),
        ])
        .await?;
        Ok(())
    }
}

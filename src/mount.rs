//! Mounting cache volumes on the local host

use crate::config::schema::{DiskConfig, MountConfig};
use crate::disk::device_path;
use crate::error::PdCacheResult;
use crate::exec::CommandExecutor;
use crate::host::Host;
use crate::naming::VolumeName;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Format, mount and unmount operations
pub struct MountOps {
    exec: Arc<dyn CommandExecutor>,
    host: Arc<dyn Host>,
    config: MountConfig,
    disk: DiskConfig,
}

impl MountOps {
    pub fn new(
        exec: Arc<dyn CommandExecutor>,
        host: Arc<dyn Host>,
        config: MountConfig,
        disk: &DiskConfig,
    ) -> Self {
        Self {
            exec,
            host,
            config,
            disk: disk.clone(),
        }
    }

    /// Format the attached volume and mount it. Destroys existing contents.
    pub async fn format_and_mount(
        &self,
        volume: &VolumeName,
        mount_path: &Path,
    ) -> PdCacheResult<()> {
        let device = device_path(&self.disk, volume);
        info!(
            "Formatting {} as {} and mounting on {}",
            device.display(),
            self.config.fs_type,
            mount_path.display()
        );

        self.host.create_mount_dir(mount_path).await?;
        self.exec
            .run(
                &self.config.format_helper,
                &[
                    "-m".to_string(),
                    self.config.mkfs_command.clone(),
                    device.display().to_string(),
                    mount_path.display().to_string(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Mount an already formatted volume read-only
    pub async fn mount_only(&self, volume: &VolumeName, mount_path: &Path) -> PdCacheResult<()> {
        let device = device_path(&self.disk, volume);
        info!("Mounting {} on {}", device.display(), mount_path.display());

        self.host.create_mount_dir(mount_path).await?;
        self.exec
            .run(
                &self.config.mount_bin,
                &[
                    "-t".to_string(),
                    self.config.fs_type.clone(),
                    "-o".to_string(),
                    "ro".to_string(),
                    device.display().to_string(),
                    mount_path.display().to_string(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Unmount and remove the mount point
    pub async fn unmount(&self, mount_path: &Path) -> PdCacheResult<()> {
        info!("Unmounting {}", mount_path.display());

        self.exec
            .run(&self.config.umount_bin, &[mount_path.display().to_string()])
            .await?;
        self.host.remove_mount_dir(mount_path).await
    }

    pub async fn is_mounted(&self, mount_path: &Path) -> PdCacheResult<bool> {
        self.host.is_mounted(mount_path).await
    }
}

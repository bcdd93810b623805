//! Volume acquisition state machine
//!
//! ```text
//! Start -> CheckExistence -+-> CreatePath: Create -> Attach(rw) -> FormatAndMount -> NotPopulated
//!                          +-> ReusePath:  Attach(ro) -> MountOnly -> LoadFrom -> Done
//! ```
//!
//! Every decision re-queries the disk service or the local host; nothing is
//! cached between calls. Two hosts racing to create or attach the same volume
//! are not coordinated: only one host should hold a read-write attachment at
//! a time.

use crate::audit::AuditLog;
use crate::config::Config;
use crate::disk::{AttachMode, DiskOps};
use crate::error::{PdCacheError, PdCacheResult, Step};
use crate::exec::{CommandExecutor, ProcessExecutor};
use crate::host::{Host, LocalHost};
use crate::image::ImageTransfer;
use crate::mount::MountOps;
use crate::naming::CacheNames;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Observed state of one image cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    #[serde(flatten)]
    pub names: CacheNames,
    /// Device link of the volume on this host
    pub device: PathBuf,
    /// The disk service knows the volume
    pub exists: bool,
    /// The device link is present on this host
    pub attached: bool,
    /// The mount point is in the mount table
    pub mounted: bool,
}

/// Drives the populate, reuse and release workflows
pub struct CacheOrchestrator {
    disk: DiskOps,
    mounts: MountOps,
    images: ImageTransfer,
    host: Arc<dyn Host>,
    audit: AuditLog,
    base_dir: PathBuf,
    instance: Option<String>,
}

impl CacheOrchestrator {
    pub fn new(
        config: &Config,
        exec: Arc<dyn CommandExecutor>,
        host: Arc<dyn Host>,
        audit: AuditLog,
    ) -> Self {
        Self {
            disk: DiskOps::new(exec.clone(), config.disk.clone()),
            mounts: MountOps::new(
                exec.clone(),
                host.clone(),
                config.mount.clone(),
                &config.disk,
            ),
            images: ImageTransfer::new(exec, config.image.clone()),
            host,
            audit,
            base_dir: config.mount.base_dir.clone(),
            instance: config.disk.instance.clone(),
        }
    }

    /// Orchestrator backed by real processes and the local machine
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config,
            Arc::new(ProcessExecutor::from_config(&config.exec)),
            Arc::new(LocalHost::new(config.mount.mounts_table.clone())),
            AuditLog::new(config),
        )
    }

    /// Names derived for an image
    pub fn names(&self, image_id: &str) -> PdCacheResult<CacheNames> {
        CacheNames::derive(&self.base_dir, image_id)
    }

    fn instance(&self) -> PdCacheResult<String> {
        match &self.instance {
            Some(name) => Ok(name.clone()),
            None => self.host.hostname(),
        }
    }

    /// Make the image available locally from its cache volume.
    ///
    /// Returns [`PdCacheError::NotPopulated`] after provisioning a new volume:
    /// the volume is mounted read-write and empty, and the caller has to fill
    /// it (see [`CacheOrchestrator::release`]) before it can serve the image.
    pub async fn acquire(&self, image_id: &str) -> PdCacheResult<()> {
        let names = self.names(image_id)?;
        let instance = self.instance()?;
        info!(
            "Acquiring image {} via volume {} on {}",
            image_id, names.volume, instance
        );

        let exists = self
            .disk
            .exists(&names.volume)
            .await
            .map_err(|e| PdCacheError::at_step(Step::CheckExistence, e))?;

        if exists {
            self.reuse(&names, &instance).await
        } else {
            self.populate(&names, &instance).await
        }
    }

    async fn populate(&self, names: &CacheNames, instance: &str) -> PdCacheResult<()> {
        debug!("Volume {} missing, provisioning", names.volume);

        let size_gb = self.disk.default_size_gb();
        self.disk
            .create(&names.volume, size_gb)
            .await
            .map_err(|e| PdCacheError::at_step(Step::Create, e))?;
        self.audit
            .log(
                "disk.create",
                &serde_json::json!({"volume": names.volume, "size_gb": size_gb}),
            )
            .await;

        self.disk
            .attach(&names.volume, instance, AttachMode::ReadWrite)
            .await
            .map_err(|e| PdCacheError::at_step(Step::Attach, e))?;
        self.audit_attach(names, instance, AttachMode::ReadWrite).await;

        self.mounts
            .format_and_mount(&names.volume, &names.mount_path)
            .await
            .map_err(|e| PdCacheError::at_step(Step::FormatAndMount, e))?;

        info!(
            "Volume {} is ready at {} but empty",
            names.volume,
            names.mount_path.display()
        );
        Err(PdCacheError::NotPopulated {
            volume: names.volume.to_string(),
            image: names.image_id.clone(),
        })
    }

    async fn reuse(&self, names: &CacheNames, instance: &str) -> PdCacheResult<()> {
        debug!("Volume {} exists, reusing", names.volume);

        let device = self.disk.device_path(&names.volume);
        if self.host.device_present(&device).await {
            info!("Volume {} already attached at {}", names.volume, device.display());
        } else if let Err(e) = self
            .disk
            .attach(&names.volume, instance, AttachMode::ReadOnly)
            .await
        {
            warn!("Couldn't attach {}, perhaps already attached: {}", names.volume, e);
        } else {
            self.audit_attach(names, instance, AttachMode::ReadOnly).await;
        }

        let mounted = match self.mounts.is_mounted(&names.mount_path).await {
            Ok(mounted) => mounted,
            Err(e) => {
                debug!("Mount table unavailable: {}", e);
                false
            }
        };
        if mounted {
            info!("{} already mounted", names.mount_path.display());
        } else if let Err(e) = self
            .mounts
            .mount_only(&names.volume, &names.mount_path)
            .await
        {
            warn!(
                "Couldn't mount {}, perhaps already mounted: {}",
                names.mount_path.display(),
                e
            );
        }

        self.images
            .load_from(&names.image_id, &names.mount_path)
            .await
            .map_err(|e| PdCacheError::at_step(Step::Load, e))?;
        self.audit
            .log(
                "cache.load",
                &serde_json::json!({"image": names.image_id, "volume": names.volume}),
            )
            .await;

        info!("Image {} loaded from {}", names.image_id, names.volume);
        Ok(())
    }

    /// Save the image into its volume, then unmount and detach the volume.
    pub async fn release(&self, image_id: &str) -> PdCacheResult<()> {
        let names = self.names(image_id)?;
        let instance = self.instance()?;
        info!("Releasing volume {} for image {}", names.volume, image_id);

        self.images
            .save_to(&names.image_id, &names.mount_path)
            .await
            .map_err(|e| PdCacheError::at_step(Step::Save, e))?;
        self.audit
            .log(
                "cache.save",
                &serde_json::json!({"image": names.image_id, "volume": names.volume}),
            )
            .await;

        // An unreadable mount table is treated as mounted so umount still runs
        if self.mounts.is_mounted(&names.mount_path).await.unwrap_or(true) {
            self.mounts
                .unmount(&names.mount_path)
                .await
                .map_err(|e| PdCacheError::at_step(Step::Unmount, e))?;
        } else {
            info!("{} not mounted, skipping unmount", names.mount_path.display());
        }

        self.disk
            .detach(&names.volume, &instance)
            .await
            .map_err(|e| PdCacheError::at_step(Step::Detach, e))?;
        self.audit
            .log(
                "disk.detach",
                &serde_json::json!({"volume": names.volume, "instance": instance}),
            )
            .await;

        Ok(())
    }

    /// Report what the disk service and this host know about an image cache
    pub async fn status(&self, image_id: &str) -> PdCacheResult<CacheStatus> {
        let names = self.names(image_id)?;
        let exists = self.disk.exists(&names.volume).await?;
        let device = self.disk.device_path(&names.volume);
        let attached = self.host.device_present(&device).await;
        let mounted = self.mounts.is_mounted(&names.mount_path).await?;

        Ok(CacheStatus {
            names,
            device,
            exists,
            attached,
            mounted,
        })
    }

    async fn audit_attach(&self, names: &CacheNames, instance: &str, mode: AttachMode) {
        self.audit
            .log(
                "disk.attach",
                &serde_json::json!({
                    "volume": names.volume,
                    "instance": instance,
                    "mode": mode,
                }),
            )
            .await;
    }
}

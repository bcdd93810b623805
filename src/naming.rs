//! Volume and mount path derivation
//!
//! Everything a cache needs to be located is derived from the image ID;
//! nothing here touches the disk service or the filesystem.

use crate::error::{PdCacheError, PdCacheResult};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Number of image ID characters kept in a volume name
pub const NAME_WINDOW: usize = 60;

/// Tag prepended to every volume name
pub const VOLUME_PREFIX: &str = "d-";

/// Digest algorithm prefix that is ignored when deriving names
const DIGEST_PREFIX: &str = "sha256:";

/// Name of the cloud volume backing one image
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VolumeName(String);

impl VolumeName {
    /// Derive the volume name for an image ID
    pub fn for_image(image_id: &str) -> PdCacheResult<Self> {
        let id = image_id.strip_prefix(DIGEST_PREFIX).unwrap_or(image_id);

        if id.chars().count() < NAME_WINDOW {
            return Err(PdCacheError::ImageIdTooShort {
                id: image_id.to_string(),
                required: NAME_WINDOW,
            });
        }

        let window: String = id.chars().take(NAME_WINDOW).collect();
        if let Some(bad) = window
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(PdCacheError::InvalidImageId {
                id: image_id.to_string(),
                reason: format!("character {bad:?} is not allowed in a volume name"),
            });
        }

        Ok(Self(format!("{VOLUME_PREFIX}{window}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VolumeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VolumeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Local mount point for an image's volume
pub fn mount_path(base_dir: &Path, image_id: &str) -> PdCacheResult<PathBuf> {
    let volume = VolumeName::for_image(image_id)?;
    Ok(base_dir.join(volume.as_str()))
}

/// All names derived from one image ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheNames {
    /// Image ID as given by the caller
    pub image_id: String,
    /// Backing volume
    pub volume: VolumeName,
    /// Directory the volume is mounted on
    pub mount_path: PathBuf,
}

impl CacheNames {
    pub fn derive(base_dir: &Path, image_id: &str) -> PdCacheResult<Self> {
        let volume = VolumeName::for_image(image_id)?;
        let mount_path = base_dir.join(volume.as_str());
        Ok(Self {
            image_id: image_id.to_string(),
            volume,
            mount_path,
        })
    }

    /// File inside the mount point holding the saved image
    pub fn image_file(&self) -> PathBuf {
        self.mount_path.join(&self.image_id)
    }
}
